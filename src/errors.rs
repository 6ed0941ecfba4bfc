use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// AMap infocode for an invalid or unknown key.
pub const INVALID_KEY_INFOCODE: &str = "10001";

/// Application-specific error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Bad request error (invalid body or blank address).
    BadRequest(String),
    /// Request used a method other than POST.
    MethodNotAllowed(String),
    /// Server is missing required configuration (e.g. the API key).
    Configuration(String),
    /// Upstream rejected our credential.
    InvalidCredential,
    /// Upstream answered but reported a failure, or answered with an unreadable payload.
    Upstream {
        info: String,
        infocode: Option<String>,
    },
    /// Connection, DNS or transport failure talking to the upstream.
    Network(String),
    /// Outbound call exceeded the configured timeout.
    Timeout(String),
    /// Internal server error.
    Internal(String),
}

impl AppError {
    /// Builds the error for an upstream envelope whose `status` was not `"1"`.
    pub fn from_upstream_status(info: Option<&str>, infocode: Option<&str>) -> Self {
        if infocode == Some(INVALID_KEY_INFOCODE) {
            return AppError::InvalidCredential;
        }
        AppError::Upstream {
            info: info.unwrap_or("UNKNOWN_ERROR").to_string(),
            infocode: infocode.map(str::to_string),
        }
    }

    /// Machine-readable category, sent to clients as `errorType`.
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "validation",
            AppError::MethodNotAllowed(_) => "method_not_allowed",
            AppError::Configuration(_) => "configuration",
            AppError::InvalidCredential => "invalid_credential",
            AppError::Upstream { .. } => "upstream",
            AppError::Network(_) => "network",
            AppError::Timeout(_) => "timeout",
            AppError::Internal(_) => "internal",
        }
    }

    /// Message that is safe to show to the end user.
    ///
    /// Never contains transport error text or the credential.
    pub fn user_message(&self) -> String {
        match self {
            AppError::BadRequest(msg) => msg.clone(),
            AppError::MethodNotAllowed(method) => format!("方法 {} 不被允许", method),
            AppError::Configuration(_) => "服务器配置错误".to_string(),
            AppError::InvalidCredential => {
                "地图服务API Key配置无效，请检查您在后台设置的Key是否正确。".to_string()
            }
            AppError::Upstream { info, .. } => format!("地图服务返回错误: {}", info),
            AppError::Network(_) => "无法连接地图服务，请稍后重试。".to_string(),
            AppError::Timeout(_) => "地图服务响应超时，请稍后重试。".to_string(),
            AppError::Internal(_) => "服务器内部错误".to_string(),
        }
    }

    /// Errors that end the request instead of demoting to the fallback path.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::BadRequest(_)
                | AppError::MethodNotAllowed(_)
                | AppError::Configuration(_)
                | AppError::InvalidCredential
                | AppError::Internal(_)
        )
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            // Anything reaching the transport layer from the upstream side is unrecoverable
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::MethodNotAllowed(method) => write!(f, "Method not allowed: {}", method),
            AppError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            AppError::InvalidCredential => write!(f, "Upstream rejected the API key"),
            AppError::Upstream { info, infocode } => write!(
                f,
                "Upstream error: {} (infocode: {})",
                info,
                infocode.as_deref().unwrap_or("-")
            ),
            AppError::Network(msg) => write!(f, "Network error: {}", msg),
            AppError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Maps each variant to a status code and a `{message, errorType}` body.
    fn into_response(self) -> Response {
        match &self {
            AppError::Configuration(msg) => tracing::error!("Configuration error: {}", msg),
            AppError::InvalidCredential => {
                tracing::error!("AMap rejected the configured API key (infocode 10001)")
            }
            AppError::Internal(msg) => tracing::error!("Internal error: {}", msg),
            AppError::Upstream { .. } | AppError::Network(_) | AppError::Timeout(_) => {
                tracing::error!("Unrecovered upstream failure: {}", self)
            }
            AppError::BadRequest(msg) => tracing::debug!("Rejected request: {}", msg),
            AppError::MethodNotAllowed(method) => {
                tracing::debug!("Rejected method: {}", method)
            }
        }

        let status = self.status_code();
        let body = Json(json!({
            "message": self.user_message(),
            "errorType": self.error_type(),
        }));

        let mut response = (status, body).into_response();
        if status == StatusCode::METHOD_NOT_ALLOWED {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("POST"));
        }
        response
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(err.to_string())
        } else if err.is_decode() {
            AppError::Upstream {
                info: "响应格式无法解析".to_string(),
                infocode: None,
            }
        } else {
            AppError::Network(err.to_string())
        }
    }
}
