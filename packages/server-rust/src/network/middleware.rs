//! Transport-level Tower middleware for the gateway.
//!
//! The first layer listed is the outermost: it sees the request first and
//! the response last.

use axum::http::header::{
    HeaderName, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, WWW_AUTHENTICATE,
};
use axum::http::{Extensions, HeaderMap, HeaderValue, Method, StatusCode, Version};
use tower::layer::util::{Identity, Stack};
use tower::ServiceBuilder;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::compression::predicate::{And, DefaultPredicate, Predicate};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::config::NetworkConfig;

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

type CompressWhen = And<DefaultPredicate, fn(StatusCode, Version, &HeaderMap, &Extensions) -> bool>;

type HttpLayers = Stack<
    PropagateRequestIdLayer,
    Stack<
        TimeoutLayer,
        Stack<
            CorsLayer,
            Stack<
                CompressionLayer<CompressWhen>,
                Stack<
                    TraceLayer<SharedClassifier<ServerErrorsAsFailures>>,
                    Stack<SetRequestIdLayer<MakeRequestUuid>, Identity>,
                >,
            >,
        >,
    >,
>;

/// Builds the middleware stack, outermost first:
///
/// 1. `SetRequestId` assigns an `x-request-id` when the client sent none
/// 2. `Trace` logs each request and response
/// 3. `Compression` gzips accepted responses that do not declare a length
/// 4. `CORS` for browser-based PEPs
/// 5. `Timeout` answers 408 for requests that run too long
/// 6. `PropagateRequestId` echoes `x-request-id` on the response
///
/// Size limits and content negotiation are not here; the dispatcher owns
/// them so it can render their status codes itself.
#[must_use]
pub fn build_http_layers(config: &NetworkConfig) -> HttpLayers {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new().compress_when(compress_when()))
        .layer(build_cors_layer(&config.cors_origins))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(PropagateRequestIdLayer::new(request_id))
        .into_inner()
}

/// XACML responses declare an exact `Content-Length`, which compression
/// would strip; only bodies without one are compressed.
fn compress_when() -> CompressWhen {
    let unsized_body: fn(StatusCode, Version, &HeaderMap, &Extensions) -> bool =
        lacks_content_length;
    DefaultPredicate::new().and(unsized_body)
}

fn lacks_content_length(
    _status: StatusCode,
    _version: Version,
    headers: &HeaderMap,
    _extensions: &Extensions,
) -> bool {
    !headers.contains_key(CONTENT_LENGTH)
}

/// `*` allows any origin; otherwise unparseable origins are skipped.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins.iter().filter_map(|o| o.parse::<HeaderValue>().ok()))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .expose_headers([
            WWW_AUTHENTICATE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}
