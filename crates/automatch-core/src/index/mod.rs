//! Content-addressed index of the local model library.

mod fingerprint;
mod listing;
mod store;
mod types;

pub use fingerprint::{compute_digest, mtime_secs};
pub use listing::{DiskListing, FolderListing};
pub use store::IndexStore;
pub use types::{IndexSnapshot, ModelEntry, ReconcileReport};
