use axum::http::StatusCode;

/// `GET /healthz` — process is alive.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// `GET /readyz` — process is ready to take traffic. Services that need a
/// deeper check (database ping etc.) mount their own handler instead.
pub async fn readyz() -> StatusCode {
    StatusCode::OK
}
