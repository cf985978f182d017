//! services/api/src/adapters/geocode.rs
//!
//! Geocoding adapter over the Google Geocoding HTTP API. Implements the
//! `GeocodingService` port: any provider error, rate limit or zero-result
//! response resolves to `None`, never an error. Identical queries within a
//! process share one lookup through the injected cache.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use along_core::cache::KeyValueCache;
use along_core::domain::Coordinates;
use along_core::ports::{GeocodedPlace, GeocodingService};

const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
    formatted_address: String,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// Cached geocode outcome; `None` memoizes "provider had no answer".
type CachedGeocode = Option<(f64, f64, String)>;

pub struct GoogleGeocodeAdapter {
    client: reqwest::Client,
    api_key: Option<String>,
    cache: Arc<dyn KeyValueCache<CachedGeocode>>,
}

impl GoogleGeocodeAdapter {
    pub fn new(api_key: Option<String>, cache: Arc<dyn KeyValueCache<CachedGeocode>>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            cache,
        }
    }

    async fn lookup(&self, query: &str, key: &str) -> Option<GeocodedPlace> {
        let response: GeocodeResponse = self
            .client
            .get(GEOCODE_URL)
            .query(&[("address", query), ("key", key)])
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| warn!(error = %e, query, "Geocoding request failed"))
            .ok()?
            .json()
            .await
            .map_err(|e| warn!(error = %e, query, "Failed to parse geocoding response"))
            .ok()?;

        let first = response.results.into_iter().next()?;
        debug!(query, address = %first.formatted_address, "Geocoded");
        Some(GeocodedPlace {
            coordinates: Coordinates {
                lat: first.geometry.location.lat,
                lng: first.geometry.location.lng,
            },
            formatted_address: first.formatted_address,
        })
    }
}

#[async_trait]
impl GeocodingService for GoogleGeocodeAdapter {
    async fn geocode(&self, query: &str) -> Option<GeocodedPlace> {
        // No key configured: every place stays ungeocoded but valid.
        let key = self.api_key.as_deref()?;

        if let Some(cached) = self.cache.get(query) {
            return cached.map(|(lat, lng, formatted_address)| GeocodedPlace {
                coordinates: Coordinates { lat, lng },
                formatted_address,
            });
        }

        let resolved = self.lookup(query, key).await;
        self.cache.set(
            query,
            resolved.as_ref().map(|p| {
                (
                    p.coordinates.lat,
                    p.coordinates.lng,
                    p.formatted_address.clone(),
                )
            }),
        );
        resolved
    }
}
