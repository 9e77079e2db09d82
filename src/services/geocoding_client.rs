// src/services/geocoding_client.rs
// DOCUMENTATION: Nominatim-compatible geocoding client
// PURPOSE: Look up city coordinates when an admin creates a city without them

use crate::config::Config;
use crate::errors::DirectoryError;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Geocoding API client
/// DOCUMENTATION: Thin wrapper over GET {base_url}/search
pub struct GeocodingClient {
    /// HTTP client for making requests
    client: Client,
    /// Base URL, without trailing slash
    base_url: String,
}

/// One search hit; Nominatim returns coordinates as strings
#[derive(Debug, Deserialize)]
pub struct GeocodingResult {
    pub lat: String,
    pub lon: String,
    pub display_name: Option<String>,
}

impl GeocodingClient {
    pub fn new(config: &Config) -> Result<Self, DirectoryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(config.geocoding_user_agent.clone())
            .build()
            .map_err(|e| DirectoryError::ExternalApiError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.geocoding_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve a free-text place to (lat, lng)
    /// Returns Ok(None) when the provider knows no match
    pub async fn search(&self, query: &str) -> Result<Option<(f64, f64)>, DirectoryError> {
        let url = format!("{}/search", self.base_url);
        log::debug!("Geocoding '{}'", query);

        let response = self
            .client
            .get(&url)
            .query(&[("format", "json"), ("limit", "1"), ("q", query)])
            .send()
            .await
            .map_err(|e| {
                log::error!("Geocoding request failed: {}", e);
                DirectoryError::ExternalApiError(format!("Geocoding request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(DirectoryError::ExternalApiError(format!(
                "Geocoding returned HTTP {}",
                response.status()
            )));
        }

        let results: Vec<GeocodingResult> = response.json().await.map_err(|e| {
            DirectoryError::ExternalApiError(format!("Invalid geocoding response: {}", e))
        })?;

        match results.first() {
            Some(hit) => parse_coordinates(hit).map(Some),
            None => {
                log::warn!("Geocoding found no match for '{}'", query);
                Ok(None)
            }
        }
    }
}

fn parse_coordinates(hit: &GeocodingResult) -> Result<(f64, f64), DirectoryError> {
    let lat: f64 = hit
        .lat
        .trim()
        .parse()
        .map_err(|_| DirectoryError::ExternalApiError(format!("bad latitude '{}'", hit.lat)))?;
    let lng: f64 = hit
        .lon
        .trim()
        .parse()
        .map_err(|_| DirectoryError::ExternalApiError(format!("bad longitude '{}'", hit.lon)))?;

    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(DirectoryError::ExternalApiError(format!(
            "coordinates out of range: {}, {}",
            lat, lng
        )));
    }
    Ok((lat, lng))
}
