/// Address completion pipeline
///
/// 1. Clean the raw input
/// 2. Known-places map (no outbound call)
/// 3. Geocode lookup, biased by a major-city hint
/// 4. POI keyword search when the geocoder has nothing usable or fails
/// 5. Static fallback (city short-name table, else the cleaned input)
///
/// Recoverable outbound failures are demoted to the next step; only a missing or
/// rejected credential ends the request.
use crate::amap_client::AmapClient;
use crate::errors::AppError;
use crate::models::{NormalizedAddress, ResolutionMethod};
use crate::normalizer::{clean_input, Normalizer};
use std::sync::Arc;

pub struct AddressCompletionService {
    client: AmapClient,
    normalizer: Arc<Normalizer>,
}

impl AddressCompletionService {
    pub fn new(client: AmapClient, normalizer: Arc<Normalizer>) -> Self {
        Self { client, normalizer }
    }

    /// Runs the full pipeline for one raw address.
    pub async fn complete(&self, raw: &str) -> Result<NormalizedAddress, AppError> {
        let cleaned = clean_input(raw);
        if cleaned.is_empty() {
            return Err(AppError::BadRequest("地址不能为空".to_string()));
        }

        if let Some(known) = self.normalizer.resolve_known(&cleaned) {
            return Ok(known);
        }

        let city = self.normalizer.city_hint(&cleaned);
        if let Some(city) = city {
            tracing::debug!("Biasing lookup towards {}", city);
        }

        let mut last_error: Option<AppError> = None;

        match self.client.geocode(&cleaned, city).await {
            Ok(candidates) => {
                if let Some(result) =
                    self.normalizer
                        .resolve_candidates(&cleaned, candidates, ResolutionMethod::Geocode)
                {
                    tracing::info!(
                        "Geocode resolved to '{}' (confidence {})",
                        result.full_address,
                        result.confidence
                    );
                    return Ok(result);
                }
                tracing::info!("Geocode found no usable record, trying POI search");
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!("Geocode failed ({}), trying POI search", e.error_type());
                last_error = Some(e);
            }
        }

        match self.client.search_places(&cleaned, city).await {
            Ok(pois) => {
                if let Some(result) =
                    self.normalizer
                        .resolve_candidates(&cleaned, pois, ResolutionMethod::PoiSearch)
                {
                    tracing::info!(
                        "POI search resolved to '{}' (confidence {})",
                        result.full_address,
                        result.confidence
                    );
                    return Ok(result);
                }
                tracing::info!("POI search found no usable record");
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!("POI search failed ({})", e.error_type());
                last_error = Some(e);
            }
        }

        let fallback = self.normalizer.fallback(&cleaned, last_error.as_ref());
        tracing::info!(
            "Returning {:?} result with confidence {}",
            fallback.method,
            fallback.confidence
        );
        Ok(fallback)
    }
}
