pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod journal;
pub mod models;
pub mod store;

pub use cli::run;
pub use error::{JournalError, JournalResult};
pub use journal::Journal;
