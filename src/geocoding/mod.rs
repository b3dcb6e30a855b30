//! Geocoding module
//!
//! Resolves place names to coordinates in a fixed order:
//! - built-in city table (exact name or alias)
//! - bounded in-memory LRU cache of earlier remote hits
//! - remote forward geocoding (Mapbox)
//! - substring match against the city table

pub mod gazetteer;

use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use lru::LruCache;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::models::{GeocodeSource, GeocodedLocation};
use crate::{MapQueryError, Result};

/// Remote forward geocoding
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Best match for `query`, `None` when the provider knows no such place
    async fn forward(&self, query: &str) -> Result<Option<GeocodedLocation>>;
}

/// Layered geocoder: table, cache, remote provider, fuzzy table match
pub struct Geocoder {
    provider: Option<Arc<dyn GeocodingProvider>>,
    cache: Mutex<LruCache<String, GeocodedLocation>>,
}

impl Geocoder {
    pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

    /// Create a geocoder; without a provider only the built-in table is used
    pub fn new(provider: Option<Arc<dyn GeocodingProvider>>) -> Self {
        Self::with_capacity(provider, Self::DEFAULT_CACHE_CAPACITY)
    }

    /// Create a geocoder keeping at most `capacity` remote hits (minimum 1)
    pub fn with_capacity(provider: Option<Arc<dyn GeocodingProvider>>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            provider,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Number of remote hits currently cached
    pub async fn cache_len(&self) -> usize {
        self.cache.lock().await.len()
    }

    /// Whether a remote provider is configured
    #[must_use]
    pub fn has_remote(&self) -> bool {
        self.provider.is_some()
    }

    /// Resolve a single place name
    #[instrument(skip(self))]
    pub async fn geocode(&self, name: &str) -> Result<GeocodedLocation> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(MapQueryError::validation("Place name cannot be empty"));
        }

        if let Some(city) = gazetteer::lookup(trimmed) {
            debug!("Table hit for '{}': {}", trimmed, city.name);
            return Ok(GeocodedLocation {
                name: trimmed.to_string(),
                coordinates: city.coordinates(),
                place_name: Some(city.name.to_string()),
                source: GeocodeSource::Table,
            });
        }

        let key = gazetteer::normalize_place(trimmed);
        let cached = self.cache.lock().await.get(&key).cloned();
        if let Some(hit) = cached {
            debug!("Cache hit for '{}'", trimmed);
            return Ok(GeocodedLocation {
                name: trimmed.to_string(),
                source: GeocodeSource::Cache,
                ..hit
            });
        }

        if let Some(provider) = &self.provider {
            match provider.forward(trimmed).await {
                Ok(Some(mut hit)) if hit.coordinates.is_valid() => {
                    info!(
                        "Geocoded '{}' remotely to {}",
                        trimmed,
                        hit.coordinates.format_coordinates()
                    );
                    hit.name = trimmed.to_string();
                    hit.source = GeocodeSource::Remote;
                    self.cache.lock().await.put(key, hit.clone());
                    return Ok(hit);
                }
                Ok(Some(hit)) => {
                    warn!(
                        "Discarding out-of-range coordinates for '{}': {:?}",
                        trimmed, hit.coordinates
                    );
                }
                Ok(None) => debug!("Remote geocoder has no match for '{}'", trimmed),
                Err(e) => warn!("Remote geocoding failed for '{}': {}", trimmed, e),
            }
        }

        if let Some(city) = gazetteer::fuzzy_lookup(trimmed) {
            info!("Fuzzy match for '{}': {}", trimmed, city.name);
            return Ok(GeocodedLocation {
                name: trimmed.to_string(),
                coordinates: city.coordinates(),
                place_name: Some(city.name.to_string()),
                source: GeocodeSource::Fuzzy,
            });
        }

        Err(MapQueryError::not_found(format!("Location not found: {trimmed}")))
    }

    /// Resolve many names concurrently; results keep the input order
    pub async fn geocode_all<S: AsRef<str>>(&self, names: &[S]) -> Vec<Result<GeocodedLocation>> {
        join_all(names.iter().map(|name| self.geocode(name.as_ref()))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinates;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeProvider {
        calls: AtomicUsize,
        response: fn(&str) -> Result<Option<GeocodedLocation>>,
    }

    #[async_trait]
    impl GeocodingProvider for FakeProvider {
        async fn forward(&self, query: &str) -> Result<Option<GeocodedLocation>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.response)(query)
        }
    }

    fn provider(response: fn(&str) -> Result<Option<GeocodedLocation>>) -> Arc<FakeProvider> {
        Arc::new(FakeProvider {
            calls: AtomicUsize::new(0),
            response,
        })
    }

    fn springfield(query: &str) -> Result<Option<GeocodedLocation>> {
        Ok(Some(GeocodedLocation {
            name: query.to_string(),
            coordinates: Coordinates::new(-89.65, 39.78),
            place_name: Some("Springfield, Illinois, United States".into()),
            source: GeocodeSource::Remote,
        }))
    }

    #[tokio::test]
    async fn test_table_hit_skips_remote() {
        let fake = provider(springfield);
        let geocoder = Geocoder::new(Some(fake.clone()));
        let hit = geocoder.geocode("Paris").await.unwrap();
        assert_eq!(hit.source, GeocodeSource::Table);
        assert_eq!(hit.coordinates, Coordinates::new(2.3522, 48.8566));
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_remote_hit_is_cached() {
        let fake = provider(springfield);
        let geocoder = Geocoder::new(Some(fake.clone()));

        let first = geocoder.geocode("Springfield").await.unwrap();
        assert_eq!(first.source, GeocodeSource::Remote);
        assert_eq!(first.name, "Springfield");

        let second = geocoder.geocode("springfield").await.unwrap();
        assert_eq!(second.source, GeocodeSource::Cache);
        assert_eq!(second.name, "springfield");
        assert_eq!(second.coordinates, first.coordinates);
        assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_stays_within_capacity() {
        let fake = provider(springfield);
        let geocoder = Geocoder::with_capacity(Some(fake.clone()), 3);

        for i in 0..10 {
            geocoder.geocode(&format!("Springfield {i}")).await.unwrap();
            assert!(geocoder.cache_len().await <= 3);
        }
        assert_eq!(geocoder.cache_len().await, 3);
        assert_eq!(fake.calls.load(Ordering::SeqCst), 10);

        // most recent entries survive, the oldest were evicted
        let recent = geocoder.geocode("Springfield 9").await.unwrap();
        assert_eq!(recent.source, GeocodeSource::Cache);
        let evicted = geocoder.geocode("Springfield 0").await.unwrap();
        assert_eq!(evicted.source, GeocodeSource::Remote);
        assert_eq!(fake.calls.load(Ordering::SeqCst), 11);
        assert_eq!(geocoder.cache_len().await, 3);
    }

    #[tokio::test]
    async fn test_zero_capacity_still_caches_one() {
        let fake = provider(springfield);
        let geocoder = Geocoder::with_capacity(Some(fake.clone()), 0);
        geocoder.geocode("Springfield").await.unwrap();
        geocoder.geocode("Shelbyville").await.unwrap();
        assert_eq!(geocoder.cache_len().await, 1);
    }

    #[tokio::test]
    async fn test_remote_failure_falls_back_to_fuzzy() {
        let fake = provider(|_| Err(MapQueryError::api("503 Service Unavailable")));
        let geocoder = Geocoder::new(Some(fake));
        let hit = geocoder.geocode("Central Paris").await.unwrap();
        assert_eq!(hit.source, GeocodeSource::Fuzzy);
        assert_eq!(hit.place_name.as_deref(), Some("Paris"));
    }

    #[tokio::test]
    async fn test_invalid_remote_coordinates_are_ignored() {
        let fake = provider(|q| {
            Ok(Some(GeocodedLocation {
                name: q.to_string(),
                coordinates: Coordinates::new(500.0, 0.0),
                place_name: None,
                source: GeocodeSource::Remote,
            }))
        });
        let geocoder = Geocoder::new(Some(fake));
        let err = geocoder.geocode("Nowhere").await.unwrap_err();
        assert!(matches!(err, MapQueryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_without_provider() {
        let geocoder = Geocoder::new(None);
        assert!(!geocoder.has_remote());
        assert!(geocoder.geocode("Springfield").await.is_err());
        assert!(matches!(
            geocoder.geocode("   ").await,
            Err(MapQueryError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_geocode_all_keeps_order() {
        let geocoder = Geocoder::new(None);
        let results = geocoder.geocode_all(&["Tokyo", "Atlantis", "Berlin"]).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().place_name.as_deref(), Some("Tokyo"));
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().place_name.as_deref(), Some("Berlin"));
    }
}
