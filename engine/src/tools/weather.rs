//! Open-Meteo weather lookup
//!
//! Geocodes a place name via the Open-Meteo geocoding API and fetches a
//! daily forecast from the Open-Meteo forecast API. Common abbreviations
//! ("DC", "nyc", "UK") are expanded as extra candidates before a name is
//! reported as unresolvable.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{LookupTool, Place};
use crate::config::WeatherConfig;

const REQUEST_TIMEOUT_SECS: u64 = 5;

/// Open-Meteo backed lookup tool
#[derive(Debug, Clone)]
pub struct WeatherLookup {
    geocoding_url: String,
    forecast_url: String,
    forecast_days: usize,
    client: Client,
}

impl WeatherLookup {
    /// Create a new lookup from config
    pub fn new(config: &WeatherConfig) -> Self {
        Self {
            geocoding_url: config.geocoding_url.clone(),
            forecast_url: config.forecast_url.clone(),
            forecast_days: config.forecast_days,
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Candidate spellings for a place name, most literal first.
    ///
    /// Expands a few common abbreviations so a failed literal lookup gets a
    /// best-effort retry before reporting not-found.
    fn name_variants(name: &str) -> Vec<String> {
        let normalized = name.trim().to_string();
        let mut variants = vec![normalized.clone()];

        if normalized.contains("D.C.") || normalized.contains("DC") {
            variants.push("Washington".to_string());
        }
        if normalized.eq_ignore_ascii_case("nyc") {
            variants.push("New York".to_string());
        }
        if normalized.contains("UK") {
            variants.push(normalized.replace("UK", "United Kingdom"));
        }

        variants
    }

    async fn geocode(&self, name: &str) -> Result<Option<Place>, reqwest::Error> {
        let url = format!("{}/v1/search", self.geocoding_url);
        let response: GeocodeResponse = self
            .client
            .get(&url)
            .query(&[
                ("name", name),
                ("count", "1"),
                ("language", "en"),
                ("format", "json"),
            ])
            .send()
            .await?
            .json()
            .await?;

        Ok(response.results.and_then(|mut results| {
            if results.is_empty() {
                None
            } else {
                let hit = results.remove(0);
                Some(Place {
                    name: hit.name,
                    latitude: hit.latitude,
                    longitude: hit.longitude,
                })
            }
        }))
    }
}

#[async_trait::async_trait]
impl LookupTool for WeatherLookup {
    async fn resolve_place(&self, name: &str) -> Option<Place> {
        for variant in Self::name_variants(name) {
            match self.geocode(&variant).await {
                Ok(Some(place)) => {
                    tracing::debug!(query = %variant, place = %place.name, "Geocoding hit");
                    return Some(place);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(query = %variant, error = %e, "Geocoding request failed");
                }
            }
        }

        None
    }

    async fn forecast(&self, place: &Place) -> String {
        let url = format!("{}/v1/forecast", self.forecast_url);
        let result = async {
            let response: ForecastResponse = self
                .client
                .get(&url)
                .query(&[
                    ("latitude", place.latitude.to_string()),
                    ("longitude", place.longitude.to_string()),
                    (
                        "daily",
                        "temperature_2m_max,temperature_2m_min,precipitation_sum".to_string(),
                    ),
                    ("timezone", "auto".to_string()),
                ])
                .send()
                .await?
                .json()
                .await?;
            Ok::<ForecastResponse, reqwest::Error>(response)
        }
        .await;

        let daily = match result {
            Ok(ForecastResponse { daily: Some(daily) }) => daily,
            Ok(ForecastResponse { daily: None }) => return "Weather data unavailable.".to_string(),
            Err(e) => return format!("Error fetching weather: {}", e),
        };

        let days = self.forecast_days.min(daily.time.len());
        let mut summary = Vec::with_capacity(days);
        for i in 0..days {
            let high = daily.temperature_2m_max.get(i).copied().unwrap_or_default();
            let low = daily.temperature_2m_min.get(i).copied().unwrap_or_default();
            let precip = daily.precipitation_sum.get(i).copied().unwrap_or_default();
            summary.push(format!(
                "{}: High {}°C, Low {}°C, Rain {}mm",
                daily.time[i], high, low, precip
            ));
        }

        format!("Forecast:\n{}", summary.join("\n"))
    }
}

/// Geocoding API response format
#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    results: Option<Vec<GeocodeHit>>,
}

#[derive(Debug, Deserialize)]
struct GeocodeHit {
    name: String,
    latitude: f64,
    longitude: f64,
}

/// Forecast API response format
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily: Option<DailySeries>,
}

#[derive(Debug, Deserialize)]
struct DailySeries {
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_max: Vec<f64>,
    #[serde(default)]
    temperature_2m_min: Vec<f64>,
    #[serde(default)]
    precipitation_sum: Vec<f64>,
}
