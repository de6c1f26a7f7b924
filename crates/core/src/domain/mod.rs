pub mod dish;
pub mod store;
