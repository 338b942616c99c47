// Dataset acquisition.
// Resolves a dataset name to its producer and runs it through the local cache.

use std::collections::BTreeMap;

use reqwest::Url;

use crate::api::{ApiClient, Endpoint, PagedFetcher, Transport, fetch_csv};
use crate::cache::{Acquired, EntryStatus, LocalCache};
use crate::config::{Config, DatasetSource};
use crate::error::{AcquireError, Result};

/// Named datasets served through one cache.
pub struct Acquirer<T> {
    transport: T,
    cache: LocalCache,
    host: Url,
    datasets: BTreeMap<String, DatasetSource>,
}

impl Acquirer<ApiClient> {
    /// Build an acquirer talking to the network, as configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = ApiClient::new(config.timeout())?;
        let cache = LocalCache::new(config.resolved_cache_dir());
        Ok(Self::new(
            client,
            cache,
            config.host_url()?,
            config.datasets.clone(),
        ))
    }
}

impl<T: Transport> Acquirer<T> {
    pub fn new(
        transport: T,
        cache: LocalCache,
        host: Url,
        datasets: BTreeMap<String, DatasetSource>,
    ) -> Self {
        Self {
            transport,
            cache,
            host,
            datasets,
        }
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    /// Configured datasets in name order.
    pub fn datasets(&self) -> impl Iterator<Item = (&str, &DatasetSource)> {
        self.datasets.iter().map(|(name, source)| (name.as_str(), source))
    }

    pub fn dataset(&self, name: &str) -> Result<&DatasetSource> {
        self.datasets
            .get(name)
            .ok_or_else(|| AcquireError::UnknownDataset(name.to_string()))
    }

    /// Get a dataset from its cache file, fetching and caching it on a miss.
    pub async fn acquire(&self, name: &str) -> Result<Acquired> {
        match self.dataset(name)? {
            DatasetSource::Api {
                endpoint,
                records_field,
            } => {
                let endpoint = Endpoint::new(self.host.clone(), endpoint, records_field);
                let fetcher = PagedFetcher::new(&self.transport, endpoint);
                self.cache.get(name, || fetcher.fetch()).await
            }
            DatasetSource::Csv { url } => {
                let url = Url::parse(url).map_err(|e| {
                    AcquireError::Config(format!("dataset {} has invalid url: {}", name, e))
                })?;
                self.cache
                    .get(name, || fetch_csv(&self.transport, &url))
                    .await
            }
        }
    }

    /// Cache state for a dataset.
    pub fn status(&self, name: &str) -> Result<Option<EntryStatus>> {
        self.dataset(name)?;
        self.cache.status(name)
    }

    /// Remove a dataset's cache file so the next acquire refetches it.
    pub fn clear(&self, name: &str) -> Result<bool> {
        self.dataset(name)?;
        self.cache.evict(name)
    }
}
