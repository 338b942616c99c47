// REST API HTTP client.
// Handles timeouts, status checking, and reading response bodies.

use std::future::Future;
use std::time::Duration;

use reqwest::{
    Client, Response, Url,
    header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT},
};
use tracing::debug;

use crate::error::{AcquireError, Result};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Something that can GET a URL and hand back the body as text.
pub trait Transport {
    fn get_text(&self, url: &Url) -> impl Future<Output = Result<String>>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get_text(&self, url: &Url) -> impl Future<Output = Result<String>> {
        (**self).get_text(url)
    }
}

/// HTTP client for the data API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
}

impl ApiClient {
    /// Create a new client with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/csv;q=0.9, */*;q=0.8"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("acquire/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| AcquireError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Make a GET request, failing on any non-success status.
    pub async fn get(&self, url: &Url) -> Result<Response> {
        debug!(%url, "GET");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| AcquireError::Request {
                url: url.to_string(),
                source,
            })?;

        check_response(response)
    }
}

impl Transport for ApiClient {
    async fn get_text(&self, url: &Url) -> Result<String> {
        let response = self.get(url).await?;
        response.text().await.map_err(|source| AcquireError::Request {
            url: url.to_string(),
            source,
        })
    }
}

/// Check response status and convert errors.
fn check_response(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    Err(AcquireError::Fetch {
        url: response.url().to_string(),
        status,
    })
}
