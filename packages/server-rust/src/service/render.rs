//! Uniform response emission.

use axum::body::Body;
use axum::http::header::{ALLOW, CONTENT_LENGTH, CONTENT_TYPE, WWW_AUTHENTICATE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::warn;
use xacml_core::ContentType;

/// Methods the gateway answers, as advertised on 405.
pub const ALLOWED_METHODS: &str = "GET, POST";

/// A finished response, built once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub status: StatusCode,
    pub content_type: Option<ContentType>,
    pub body: Option<String>,
    pub www_authenticate: Option<String>,
    pub allow: bool,
}

impl Rendered {
    #[must_use]
    pub fn new(status: StatusCode, content_type: Option<ContentType>) -> Self {
        Self {
            status,
            content_type,
            body: None,
            www_authenticate: None,
            allow: false,
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: Option<&str>) -> Self {
        self.body = body.map(str::to_owned);
        self
    }

    #[must_use]
    pub fn with_challenge(mut self, challenge: String) -> Self {
        self.www_authenticate = Some(challenge);
        self
    }

    #[must_use]
    pub fn with_allow(mut self) -> Self {
        self.allow = true;
        self
    }
}

impl IntoResponse for Rendered {
    fn into_response(self) -> Response {
        let body = self.body.filter(|b| !b.trim().is_empty()).unwrap_or_default();
        let length = body.len();

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        if let Some(content_type) = self.content_type {
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static(content_type.header_value()),
            );
        }
        headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
        if let Some(challenge) = self.www_authenticate {
            match HeaderValue::from_str(&challenge) {
                Ok(value) => {
                    headers.insert(WWW_AUTHENTICATE, value);
                }
                Err(e) => warn!(error = %e, "challenge is not a valid header value"),
            }
        }
        if self.allow {
            headers.insert(ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
        }
        response
    }
}
