//! Host operations over `AppState`. The CLI in `cli.rs` calls these
//! directly; there is no IPC command registry.

pub mod complaints;
pub mod config;
pub mod upload;
pub mod verification;
