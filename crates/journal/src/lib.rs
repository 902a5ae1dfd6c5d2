pub mod calendar;
pub mod capability;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod jobs;
pub mod models;
pub mod store;

pub use config::PointsConfig;
pub use db::Database;
pub use error::{JournalError, Result};
