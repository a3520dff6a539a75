//! Instrument catalog ingestion and local caching.
//!
//! The scheduler needs a concrete source of instrument records to classify
//! and subscribe; this module implements the pluggable [`CatalogSource`]
//! trait it depends on, fetching from the broker's REST API with a local
//! JSON cache keyed on file modification time.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::client::BrokerClient;
use crate::constants::INSTRUMENTS_URL;
use crate::error::{RelayError, Result};
use crate::types::instrument::Instrument;

/// Produces the full instrument catalog the [`crate::scheduler`] classifies
/// and schedules. Pluggable so tests and alternate brokers can supply a
/// catalog without a network round trip.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Return the full instrument catalog, using a local cache when valid.
    async fn load(&self) -> Result<Vec<Instrument>>;
}

#[derive(Serialize, Deserialize)]
struct CachedCatalog {
    instruments: Vec<Instrument>,
}

/// Fetches the instrument catalog from the broker's REST API, cached on
/// disk for [`crate::constants::CATALOG_CACHE_TTL`] (default 24h) keyed by
/// file modification time.
pub struct HttpCatalogSource {
    client: BrokerClient,
    cache_path: PathBuf,
    ttl: Duration,
}

impl HttpCatalogSource {
    /// Construct a catalog source bound to an authenticated client and a
    /// cache file path.
    pub fn new(client: BrokerClient, cache_path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            client,
            cache_path: cache_path.into(),
            ttl,
        }
    }

    async fn fetch_and_cache(&self) -> Result<Vec<Instrument>> {
        let instruments: Vec<Instrument> = self.client.get(INSTRUMENTS_URL).await?;
        self.write_cache(&instruments)?;
        Ok(instruments)
    }

    fn write_cache(&self, instruments: &[Instrument]) -> Result<()> {
        let payload = CachedCatalog {
            instruments: instruments.to_vec(),
        };
        let json = serde_json::to_vec(&payload)?;
        std::fs::write(&self.cache_path, json)
            .map_err(|e| RelayError::Catalog(format!("failed to write cache: {e}")))?;
        Ok(())
    }

    fn read_cache(&self) -> Result<Vec<Instrument>> {
        let bytes = std::fs::read(&self.cache_path)
            .map_err(|e| RelayError::Catalog(format!("failed to read cache: {e}")))?;
        let cached: CachedCatalog = serde_json::from_slice(&bytes)?;
        Ok(cached.instruments)
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn load(&self) -> Result<Vec<Instrument>> {
        if is_cache_valid(&self.cache_path, self.ttl) {
            return self.read_cache();
        }

        match self.fetch_and_cache().await {
            Ok(instruments) => Ok(instruments),
            Err(e) => {
                if self.cache_path.exists() {
                    tracing::warn!(error = %e, "catalog fetch failed, falling back to stale cache");
                    self.read_cache()
                } else {
                    Err(RelayError::Catalog(format!(
                        "catalog fetch failed and no cache is present: {e}"
                    )))
                }
            }
        }
    }
}

/// Whether `path`'s last-modified time is within `ttl` of now. A missing
/// file is always invalid.
pub fn is_cache_valid(path: &Path, ttl: Duration) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    let Ok(modified) = metadata.modified() else {
        return false;
    };
    match SystemTime::now().duration_since(modified) {
        Ok(age) => age <= ttl,
        Err(_) => true, // mtime in the future; treat as fresh rather than erroring
    }
}

/// An in-memory catalog source for tests and offline scheduling, bypassing
/// both the network and the cache file.
pub struct StaticCatalogSource {
    instruments: Vec<Instrument>,
}

impl StaticCatalogSource {
    /// Wrap a pre-built instrument list.
    pub fn new(instruments: Vec<Instrument>) -> Self {
        Self { instruments }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalogSource {
    async fn load(&self) -> Result<Vec<Instrument>> {
        Ok(self.instruments.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::enums::{Exchange, Segment};

    #[test]
    fn missing_cache_file_is_invalid() {
        let path = Path::new("/tmp/tick-relay-test-catalog-does-not-exist.json");
        assert!(!is_cache_valid(path, Duration::from_secs(86_400)));
    }

    #[tokio::test]
    async fn static_source_returns_wrapped_catalog() {
        let instruments = vec![Instrument::new(1, "RELIANCE", Exchange::NSE, Segment::NSE)];
        let source = StaticCatalogSource::new(instruments.clone());
        assert_eq!(source.load().await.unwrap(), instruments);
    }
}
