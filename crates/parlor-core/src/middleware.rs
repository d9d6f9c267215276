use tower_http::request_id::{MakeRequestId, RequestId, SetRequestIdLayer};
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        Some(RequestId::new(
            Uuid::new_v4().to_string().parse().expect("uuid is ascii"),
        ))
    }
}

/// Layer that stamps every request with an `x-request-id` header.
/// Apply before the trace layer so the id shows up in request spans.
pub fn request_id_layer() -> SetRequestIdLayer<UuidRequestId> {
    SetRequestIdLayer::new(
        axum::http::HeaderName::from_static("x-request-id"),
        UuidRequestId,
    )
}
