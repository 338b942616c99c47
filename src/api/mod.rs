// REST API module.
// Provides the HTTP transport, the page envelope schema, and the paginated fetcher.

pub mod client;
pub mod envelope;
pub mod fetcher;

pub use client::{ApiClient, Transport};
pub use envelope::Page;
pub use fetcher::{Endpoint, PagedFetcher, fetch_csv};
