pub mod config;
pub mod errors;
pub mod fields;
pub mod types;
