use bapsim_core::config::{AppConfig, LoadOptions};
use bapsim_core::{CatalogError, Dish, DishCatalog, DishRecord, JsonFileCatalog};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });

            let catalog = JsonFileCatalog::new(&config.catalog.path);
            match catalog.fetch_dishes() {
                Ok(records) => {
                    checks.push(DoctorCheck {
                        name: "catalog_readable",
                        status: CheckStatus::Pass,
                        details: format!(
                            "read {} rows from `{}`",
                            records.len(),
                            catalog.path().display()
                        ),
                    });
                    checks.push(check_rows(records));
                }
                Err(error) => {
                    checks.push(catalog_failure(&error));
                    checks.push(DoctorCheck {
                        name: "catalog_rows",
                        status: CheckStatus::Skipped,
                        details: "skipped because the catalog could not be read".to_string(),
                    });
                }
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["catalog_readable", "catalog_rows"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn catalog_failure(error: &CatalogError) -> DoctorCheck {
    DoctorCheck { name: "catalog_readable", status: CheckStatus::Fail, details: error.to_string() }
}

fn check_rows(records: Vec<DishRecord>) -> DoctorCheck {
    let total = records.len();
    let problems: Vec<String> = records
        .into_iter()
        .filter_map(|record| Dish::try_from(record).err())
        .map(|error| error.to_string())
        .collect();

    if problems.is_empty() {
        return DoctorCheck {
            name: "catalog_rows",
            status: CheckStatus::Pass,
            details: format!("all {total} rows are valid"),
        };
    }

    DoctorCheck {
        name: "catalog_rows",
        status: CheckStatus::Fail,
        details: format!("{} of {total} rows are malformed: {}", problems.len(), problems.join("; ")),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
