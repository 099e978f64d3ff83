use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied request id that is reused as-is.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Request ID stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Accepts a caller id only if it is short visible ASCII; anything else is
/// replaced so it can be echoed in a header and logged verbatim.
fn usable_request_id(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let ok = !trimmed.is_empty()
        && trimmed.len() <= MAX_REQUEST_ID_LEN
        && trimmed.bytes().all(|b| b.is_ascii_graphic());
    ok.then_some(trimmed)
}

/// Reuses the caller's `x-request-id` or generates a `UUIDv4`, runs the
/// request inside a `request` span carrying it and echoes it on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(usable_request_id)
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));
    let span = tracing::info_span!("request", request_id = %id);
    let mut res = next.run(req).instrument(span).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, val);
    }
    res
}
