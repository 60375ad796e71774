use crate::server::envelope::{RequestContext, REQUEST_ID_HEADER};
use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};

/// Creates the `RequestContext` of an inbound request and echoes its id in
/// the `X-Request-ID` response header.
pub async fn assign_request_id(mut request: Request<Body>, next: Next) -> Response {
    let ctx = RequestContext::new();
    let header_value = HeaderValue::from_str(&ctx.request_id).ok();
    request.extensions_mut().insert(ctx);

    let mut response = next.run(request).await;
    if let Some(value) = header_value {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
