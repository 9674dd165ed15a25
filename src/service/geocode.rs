use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::AppError;

pub const UNKNOWN_LOCATION: &str = "Unknown Location";

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, ToSchema)]
pub struct GeoPoint {
    #[schema(example = 12.9716)]
    pub latitude: f64,
    #[schema(example = 77.5946)]
    pub longitude: f64,
}

impl GeoPoint {
    pub fn validate(&self) -> Result<(), AppError> {
        let lat_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
        let lon_ok = self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude);
        if lat_ok && lon_ok {
            Ok(())
        } else {
            Err(AppError::validation("Invalid location data"))
        }
    }

    /// Cache key: coordinates rounded to about 11 m.
    fn cache_key(&self) -> (i64, i64) {
        (
            (self.latitude * 10_000.0).round() as i64,
            (self.longitude * 10_000.0).round() as i64,
        )
    }
}

/// Coordinates to a human-readable address label.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse(&self, point: GeoPoint) -> Result<String, AppError>;
}

#[derive(Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
}

/// Reverse geocoding against a Nominatim-compatible endpoint.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<(i64, i64), String>,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str, timeout: Duration, cache_ttl: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("hrm-attendance/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(cache_ttl)
            .build();

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache,
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn reverse(&self, point: GeoPoint) -> Result<String, AppError> {
        let key = point.cache_key();
        if let Some(label) = self.cache.get(&key).await {
            return Ok(label);
        }

        let url = format!("{}/reverse", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("format", "json".to_string()),
                ("lat", point.latitude.to_string()),
                ("lon", point.longitude.to_string()),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::Upstream(format!("geocoder request failed: {e}")))?;

        let body: ReverseResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("geocoder returned bad body: {e}")))?;

        let label = body
            .display_name
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::Upstream("geocoder returned no address".to_string()))?;

        self.cache.insert(key, label.clone()).await;
        Ok(label)
    }
}
