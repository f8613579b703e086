//! XACML REST endpoint.

use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use tracing::{info_span, Instrument};

use super::AppState;
use crate::network::middleware::REQUEST_ID_HEADER;

/// Runs every method on `/xacml` paths through the dispatcher.
///
/// The request counts as in flight until the response is built, and runs
/// inside a span carrying method, URI and request id.
pub async fn xacml_handler(State(state): State<AppState>, request: Request) -> Response {
    let _guard = state.shutdown.in_flight_guard();

    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_owned();
    let span = info_span!(
        "xacml_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    );

    state
        .dispatcher
        .handle(request)
        .instrument(span)
        .await
        .into_response()
}
