pub mod catalog;
pub mod cli;
mod context;
pub mod diff;
pub mod history;
pub mod logging;
pub mod report;
pub mod repository;
mod settings;
pub mod snapshot;
pub mod storage;

pub use context::{AppContext, RefreshOutcome};
pub use settings::{RefreshSettings, Settings, StorageSettings};
pub use storage::StorageError;
