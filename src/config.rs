use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_AMAP_BASE_URL: &str = "https://restapi.amap.com";
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    /// AMap web-service key. Checked per request, so a missing key is a 500 rather than a boot failure.
    pub amap_key: Option<String>,
    pub amap_base_url: String,
    pub request_timeout_ms: u64,
    pub known_places_file: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            amap_key: std::env::var("GAODE_API_KEY")
                .or_else(|_| std::env::var("AMAP_KEY"))
                .ok()
                .filter(|key| !key.trim().is_empty()),
            amap_base_url: std::env::var("AMAP_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|url| {
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("AMAP_BASE_URL must start with http:// or https://");
                    }
                    Ok(url.trim_end_matches('/').to_string())
                })
                .transpose()?
                .unwrap_or_else(|| DEFAULT_AMAP_BASE_URL.to_string()),
            request_timeout_ms: std::env::var("AMAP_TIMEOUT_MS")
                .ok()
                .map(|raw| {
                    let ms: u64 = raw.trim().parse().map_err(|_| {
                        anyhow::anyhow!("AMAP_TIMEOUT_MS must be a number of milliseconds")
                    })?;
                    if ms == 0 {
                        anyhow::bail!("AMAP_TIMEOUT_MS must be greater than zero");
                    }
                    Ok(ms)
                })
                .transpose()?
                .unwrap_or(DEFAULT_TIMEOUT_MS),
            known_places_file: std::env::var("KNOWN_PLACES_FILE")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        };

        // Never log the key itself
        if config.amap_key.is_none() {
            tracing::warn!(
                "GAODE_API_KEY is not set; address queries will fail with a configuration error"
            );
        }
        tracing::debug!("AMap Base URL: {}", config.amap_base_url);
        tracing::debug!("Outbound timeout: {}ms", config.request_timeout_ms);
        if let Some(ref path) = config.known_places_file {
            tracing::info!("Known places file configured: {}", path);
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            amap_key: None,
            amap_base_url: DEFAULT_AMAP_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
            known_places_file: None,
        }
    }
}
