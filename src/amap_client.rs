use crate::amap_models::{AmapEnvelope, GeocodeResponse, PlaceSearchResponse};
use crate::errors::AppError;
use crate::models::GeocodeResult;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Client for the AMap (Gaode) web-service REST API v3.
#[derive(Clone)]
pub struct AmapClient {
    client: reqwest::Client,
    base_url: String,
    key: String,
}

impl AmapClient {
    /// Creates a new `AmapClient` on top of a shared HTTP client.
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client; its timeout bounds every outbound call.
    /// * `base_url` - AMap base URL without trailing slash.
    /// * `key` - Web-service key, sent as the `key` query parameter.
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            key: key.into(),
        }
    }

    /// Builds the shared HTTP client with a per-request timeout.
    pub fn http_client(timeout: Duration) -> Result<reqwest::Client, AppError> {
        reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))
    }

    /// Geocodes a structured or free-form address.
    ///
    /// # Arguments
    ///
    /// * `address` - Cleaned address text.
    /// * `city` - Optional city name used to narrow the search.
    ///
    /// # Returns
    ///
    /// * `Result<Vec<GeocodeResult>, AppError>` - Candidate records, possibly empty.
    pub async fn geocode(
        &self,
        address: &str,
        city: Option<&str>,
    ) -> Result<Vec<GeocodeResult>, AppError> {
        let mut params = vec![("address", address)];
        if let Some(city) = city {
            params.push(("city", city));
        }

        let response: GeocodeResponse = self.get("/v3/geocode/geo", &params).await?;
        tracing::info!(
            "AMap geocode returned {} record(s)",
            response.geocodes.len()
        );

        Ok(response.geocodes.into_iter().map(GeocodeResult::from).collect())
    }

    /// Keyword (POI) search, first page with a single result.
    pub async fn search_places(
        &self,
        keywords: &str,
        city: Option<&str>,
    ) -> Result<Vec<GeocodeResult>, AppError> {
        let mut params = vec![("keywords", keywords), ("offset", "1"), ("page", "1")];
        if let Some(city) = city {
            params.push(("city", city));
        }

        let response: PlaceSearchResponse = self.get("/v3/place/text", &params).await?;
        tracing::info!("AMap place search returned {} POI(s)", response.pois.len());

        Ok(response.pois.into_iter().map(GeocodeResult::from).collect())
    }

    async fn get<T>(&self, path: &str, params: &[(&str, &str)]) -> Result<T, AppError>
    where
        T: DeserializeOwned + AmapEnvelope,
    {
        // Build URL with proper parameter encoding
        let mut query: Vec<(&str, &str)> = Vec::with_capacity(params.len() + 1);
        query.push(("key", self.key.as_str()));
        query.extend_from_slice(params);

        let url = reqwest::Url::parse_with_params(&format!("{}{}", self.base_url, path), &query)
            .map_err(|e| AppError::Internal(format!("Failed to build AMap URL: {}", e)))?;

        // Redact key from logs to prevent credential exposure
        tracing::debug!(
            "AMap request: {}{}?key=[REDACTED]&{}",
            self.base_url,
            path,
            params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&")
        );

        let response = self.client.get(url).send().await.map_err(|e| {
            let err = AppError::from(e.without_url());
            tracing::warn!("AMap request to {} failed: {}", path, err);
            err
        })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!("AMap {} returned HTTP {}", path, status);
            return Err(AppError::Upstream {
                info: format!("HTTP {}", status.as_u16()),
                infocode: None,
            });
        }

        let body: T = response.json().await.map_err(|e| {
            let err = AppError::from(e.without_url());
            tracing::warn!("Failed to read AMap {} response: {}", path, err);
            err
        })?;

        body.into_success().map_err(|err| {
            tracing::warn!("AMap {} reported failure: {}", path, err);
            err
        })
    }
}
