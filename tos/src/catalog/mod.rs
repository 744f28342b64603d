mod options;
mod stores;

pub use options::{OptionCatalog, UNKNOWN_OPTION};
pub use stores::{store_label, UNKNOWN_STORE};
