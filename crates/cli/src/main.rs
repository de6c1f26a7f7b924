use std::process::ExitCode;

fn main() -> ExitCode {
    bapsim_cli::run()
}
