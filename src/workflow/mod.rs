//! Upload → extract → human verification → commit.

pub mod busy;
pub mod commit;
pub mod decisions;
pub mod editor;
pub mod pending_store;
pub mod selection;
pub mod session;
pub mod upload;
