use crate::integrations::amap_client::AmapClient;
use crate::core::completion::AddressCompletionService;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::{AddressQuery, QueryResponse};
use crate::normalizer::Normalizer;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{Method, StatusCode},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Shared application state injected into handlers.
///
/// Read-only after startup; requests share nothing mutable.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// HTTP client with the outbound timeout applied.
    pub http: reqwest::Client,
    /// Normalizer with the injected known-places map.
    pub normalizer: Arc<Normalizer>,
}

impl AppState {
    pub fn new(config: Config, normalizer: Normalizer) -> Result<Self, AppError> {
        let http = AmapClient::http_client(config.request_timeout())?;
        Ok(Self {
            config,
            http,
            normalizer: Arc::new(normalizer),
        })
    }
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-address-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /api/query
///
/// Completes a free-form address into province/city/district/township plus detail.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `payload` - JSON body `{ "address": "..." }`.
///
/// # Returns
///
/// * `Result<Json<QueryResponse>, AppError>` - 200 with the normalized address (including
///   degraded no-match results), or a categorized error.
pub async fn query_address(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AddressQuery>, JsonRejection>,
) -> Result<Json<QueryResponse>, AppError> {
    let Json(query) = payload.map_err(|rejection| {
        tracing::debug!("Invalid query body: {}", rejection.body_text());
        AppError::BadRequest("请求体必须是包含 address 字段的 JSON".to_string())
    })?;

    let address = query
        .address
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("缺少地址参数".to_string()))?;

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("address_query", %request_id);

    async move {
        tracing::info!("Received address query: \"{}\"", address);

        // Credential is read per request; its absence is a deployment error
        let key = state.config.amap_key.clone().ok_or_else(|| {
            AppError::Configuration("GAODE_API_KEY is not configured".to_string())
        })?;

        let client = AmapClient::new(state.http.clone(), state.config.amap_base_url.clone(), key);
        let service = AddressCompletionService::new(client, state.normalizer.clone());
        let normalized = service.complete(&address).await?;

        tracing::info!(
            "Completed address via {:?}: \"{}\"",
            normalized.method,
            normalized.full_address
        );

        Ok(Json(QueryResponse::new(&address, normalized)))
    }
    .instrument(span)
    .await
}

/// Any method other than POST on `/api/query`.
pub async fn method_not_allowed(method: Method) -> AppError {
    AppError::MethodNotAllowed(method.to_string())
}
