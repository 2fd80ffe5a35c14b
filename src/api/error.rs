use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Session expired, please sign in again")]
    SessionExpired,

    #[error("Rate limit exceeded: {0}")]
    RateLimitError(String),

    #[error("Invalid API response: {0}")]
    ParseError(String),

    #[error("{service} error: {code} - {message}")]
    ServiceError {
        service: &'static str,
        code: String,
        message: String,
    },

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Empty response from {0}")]
    EmptyResponse(&'static str),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::ParseError(err.to_string())
    }
}

/// Map a non-success response to an `ApiError`, reading the standard
/// `{"error": {"code", "message", "status"}}` body when present.
pub(crate) async fn error_from_response(service: &'static str, response: reqwest::Response) -> ApiError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let parsed: Option<serde_json::Value> = serde_json::from_str(&body).ok();
    let message = parsed
        .as_ref()
        .and_then(|v| v.pointer("/error/message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.clone());

    match status.as_u16() {
        401 | 403 => ApiError::AuthenticationError(message),
        404 => ApiError::NotFound(message),
        429 => ApiError::RateLimitError(message),
        code => ApiError::ServiceError {
            service,
            code: code.to_string(),
            message,
        },
    }
}
