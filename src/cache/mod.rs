// Cache module for local filesystem caching.
// Persists fetched tables as CSV files so repeat runs skip the network.

pub mod local;
pub mod paths;
pub mod store;

pub use local::{Acquired, LocalCache, Source};
pub use paths::{default_cache_dir, entry_file_name};
pub use store::{EntryStatus, read_table, write_table};
