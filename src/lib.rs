// Library surface for the binary and the integration tests.
// Terminal rendering stays in the binary (main.rs, ui.rs).
pub mod ads;
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod history;
pub mod notify;
pub mod performance;
pub mod question;
pub mod runtime;
pub mod schedule;
pub mod session;
pub mod shuffle;
pub mod timer;
pub mod words;
