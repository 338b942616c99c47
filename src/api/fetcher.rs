// Paginated fetcher.
// Follows next-page cursors until exhausted, accumulating every page into one table.

use std::collections::HashSet;

use reqwest::Url;
use tracing::{debug, info};

use crate::error::{AcquireError, Result};
use crate::table::Table;

use super::client::Transport;
use super::envelope::Page;

/// Where a paginated collection lives and which envelope field holds its records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: Url,
    pub endpoint_path: String,
    pub records_field: String,
}

impl Endpoint {
    pub fn new(
        mut host: Url,
        endpoint_path: impl Into<String>,
        records_field: impl Into<String>,
    ) -> Self {
        // Url::join drops the last path segment unless it ends with a slash.
        if !host.path().ends_with('/') {
            let path = format!("{}/", host.path());
            host.set_path(&path);
        }

        Self {
            host,
            endpoint_path: endpoint_path.into(),
            records_field: records_field.into(),
        }
    }

    /// URL of the first page.
    pub fn first_page_url(&self) -> Result<Url> {
        self.host
            .join(self.endpoint_path.trim_start_matches('/'))
            .map_err(|e| {
                AcquireError::Config(format!(
                    "invalid endpoint path {:?}: {}",
                    self.endpoint_path, e
                ))
            })
    }

    /// Resolve a server cursor (absolute URL, absolute path, or relative path) against the host.
    ///
    /// Resolution follows URL reference rules: a cursor starting with `/` is
    /// rooted at the host's origin and replaces any path prefix in `host`, while
    /// a cursor without a leading slash is appended under the host path.
    pub fn resolve_cursor(&self, cursor: &str) -> std::result::Result<Url, String> {
        self.host
            .join(cursor)
            .map_err(|e| format!("invalid next_page cursor {:?}: {}", cursor, e))
    }
}

/// Fetches every page behind an endpoint.
pub struct PagedFetcher<T> {
    transport: T,
    endpoint: Endpoint,
}

impl<T: Transport> PagedFetcher<T> {
    pub fn new(transport: T, endpoint: Endpoint) -> Self {
        Self {
            transport,
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Fetch all pages in order and return them as one table.
    ///
    /// Stops at the first null cursor. A cursor that is still present once the
    /// server-reported page count has been fetched, or one that points back at a
    /// page already fetched, is a `PaginationOverrun`.
    pub async fn fetch(&self) -> Result<Table> {
        let mut url = self.endpoint.first_page_url()?;
        let mut visited = HashSet::new();
        let mut table = Table::new();
        let mut fetched: u64 = 0;

        loop {
            visited.insert(url.clone());

            let body = self.transport.get_text(&url).await?;
            let page = Page::parse(&body, &self.endpoint.records_field).map_err(|reason| {
                AcquireError::MalformedResponse {
                    url: url.to_string(),
                    reason,
                }
            })?;
            fetched += 1;

            info!(
                page = page.page,
                max_page = page.max_page,
                records = page.records.len(),
                %url,
                "Fetched page {} of {}",
                page.page,
                page.max_page
            );
            table.extend_records(page.records);

            let Some(cursor) = page.next_page else {
                debug!(pages = fetched, rows = table.len(), "Pagination complete");
                return Ok(table);
            };

            if fetched >= page.max_page {
                return Err(AcquireError::PaginationOverrun {
                    url: url.to_string(),
                    reason: format!(
                        "server reported {} pages but page {} still has next_page {:?}",
                        page.max_page, fetched, cursor
                    ),
                });
            }

            let next = self.endpoint.resolve_cursor(&cursor).map_err(|reason| {
                AcquireError::MalformedResponse {
                    url: url.to_string(),
                    reason,
                }
            })?;

            if visited.contains(&next) {
                return Err(AcquireError::PaginationOverrun {
                    url: url.to_string(),
                    reason: format!("next_page {} was already fetched", next),
                });
            }

            url = next;
        }
    }
}

/// Fetch a plain CSV document and parse it as a table.
pub async fn fetch_csv<T: Transport>(transport: &T, url: &Url) -> Result<Table> {
    let body = transport.get_text(url).await?;
    let table =
        Table::read_csv(body.as_bytes()).map_err(|e| AcquireError::MalformedResponse {
            url: url.to_string(),
            reason: format!("invalid CSV: {}", e),
        })?;

    info!(%url, rows = table.len(), columns = table.columns().len(), "Fetched CSV");
    Ok(table)
}
