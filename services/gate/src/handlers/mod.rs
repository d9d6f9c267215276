use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub mod invites;
pub mod login;
pub mod register;
pub mod session;

/// Policy-rejection response body, same `{kind, message}` shape as
/// `GateError` so clients have one error format.
pub(crate) fn reject(status: StatusCode, kind: &str, message: &str) -> Response {
    let body = serde_json::json!({
        "kind": kind,
        "message": message,
    });
    (status, Json(body)).into_response()
}
