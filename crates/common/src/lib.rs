pub mod config;
pub mod format;
pub mod jobs;
pub mod logger;
pub mod models;
pub mod traits;
