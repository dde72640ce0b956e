pub mod error;
pub mod json_store;
pub mod state_store;

pub use error::StorageError;
pub use json_store::{HistoryLimits, JsonStateStore};
pub use state_store::StateStore;
