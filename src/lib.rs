// acquire: fetch paginated JSON APIs into tables and cache them as CSV files.
// Library root re-exporting the fetcher, cache, configuration, and error types.

pub mod acquirer;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod table;

pub use acquirer::Acquirer;
pub use api::{ApiClient, Endpoint, PagedFetcher, Transport};
pub use cache::{Acquired, LocalCache, Source};
pub use config::{Config, DatasetSource};
pub use error::{AcquireError, Result};
pub use table::{Record, Scalar, Table};
