use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Gate service errors. Policy rejections (banned, rate-limited, bad
/// credentials, invite problems) are NOT errors — use cases return them as
/// typed outcomes. Only infrastructure failures and authorization failures
/// on the admin surface land here. A database failure fails the request
/// closed.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl GateError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Log 500s only — tower-http TraceLayer already records
        // method/uri/status for every request, and 4xx here are expected
        // client errors. The anyhow chain carries the root cause; none of
        // it reaches the response body.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
