//! Request state machine: admission, classification, authentication, engine,
//! rendering.

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::AUTHORIZATION;
use axum::http::{Method, Request, StatusCode};
use http_body_util::LengthLimitError;
use tracing::{debug, warn};
use xacml_core::digest::is_digest_scheme;
use xacml_core::home::home_document;
use xacml_core::{classify, CredentialStore, RequestContext, RouteInfo, ValidationError};

use super::admission::AdmissionController;
use super::authenticator::DigestAuthenticator;
use super::config::GatewayConfig;
use super::nonce::NonceManager;
use super::outcome::FlowError;
use super::render::Rendered;
use crate::traits::PolicyDecisionPoint;

/// Per-method flow, selected from a fixed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// GET: XACML REST home document.
    Home,
    /// POST: decision request routed to the engine.
    Decision,
}

impl Flow {
    #[must_use]
    pub fn for_method(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(Self::Home),
            Method::POST => Some(Self::Decision),
            _ => None,
        }
    }
}

/// Owns everything a request needs; shared by all handlers through `Arc`.
pub struct Dispatcher {
    config: Arc<GatewayConfig>,
    admission: AdmissionController,
    authenticator: DigestAuthenticator,
    pdp: Arc<dyn PolicyDecisionPoint>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        config: GatewayConfig,
        nonces: NonceManager,
        credentials: Arc<dyn CredentialStore>,
        pdp: Arc<dyn PolicyDecisionPoint>,
    ) -> Self {
        let admission = AdmissionController::new(config.max_content_length);
        let authenticator = DigestAuthenticator::new(nonces, credentials, config.qop.clone());
        Self {
            config: Arc::new(config),
            admission,
            authenticator,
            pdp,
        }
    }

    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    #[must_use]
    pub fn nonces(&self) -> &NonceManager {
        self.authenticator.nonces()
    }

    /// Runs one request through the pipeline. Never fails: every outcome is a
    /// rendered response.
    pub async fn handle(&self, request: Request<Body>) -> Rendered {
        let (parts, body) = request.into_parts();
        let method = parts.method;
        let uri = parts.uri.to_string();

        let content_type = match self.admission.admit(&parts.headers) {
            Ok(content_type) => content_type,
            Err(e) => {
                warn!(%method, %uri, error = %e, "request rejected at admission");
                return Rendered::new(FlowError::from(e).status(), None);
            }
        };

        let Some(flow) = Flow::for_method(&method) else {
            debug!(%method, %uri, "method not allowed");
            return Rendered::new(FlowError::MethodNotAllowed.status(), Some(content_type))
                .with_allow();
        };

        let limit = self.admission.body_limit();
        let raw_body = match axum::body::to_bytes(body, limit).await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => {
                let error = if exceeds_length_limit(&e) {
                    FlowError::BodyTooLarge { limit }
                } else {
                    FlowError::BodyUnreadable
                };
                warn!(%method, %uri, %content_type, error = %e, "request body unreadable");
                return Rendered::new(error.status(), Some(content_type));
            }
        };

        let authorization = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let route = RouteInfo::resolve(&uri, &self.config.default_realm);
        let mut ctx = RequestContext::new(content_type, route, raw_body, authorization);

        if let Err(e) = classify(&mut ctx, &self.config.rules) {
            warn!(%method, %uri, %content_type, error = %e, "request body failed classification");
        }

        let outcome = match flow {
            Flow::Home => self.home(&mut ctx, &method),
            Flow::Decision => self.decide(&mut ctx, &method).await,
        };

        match outcome {
            Ok(()) => Rendered::new(StatusCode::OK, Some(content_type))
                .with_body(ctx.response_body()),
            Err(e) => {
                if let FlowError::Engine(source) = &e {
                    warn!(%method, %uri, %content_type, error = %source, "policy decision point failed");
                } else {
                    debug!(%method, %uri, %content_type, error = %e, "request denied");
                }
                let rendered = Rendered::new(e.status(), Some(content_type));
                if e.needs_challenge() {
                    rendered.with_challenge(self.authenticator.challenge(ctx.realm()))
                } else {
                    rendered
                }
            }
        }
    }

    /// GET: digest or a valid wrapper admits the caller to the home document.
    fn home(&self, ctx: &mut RequestContext, method: &Method) -> Result<(), FlowError> {
        if ctx.authorization().is_some_and(is_digest_scheme) {
            self.authenticate(ctx, method)?;
        } else if !ctx.has_valid_wrapper() {
            return Err(FlowError::CredentialsRequired);
        }

        ctx.set_response_body(home_document(ctx.common_type(), &self.config.pdp_path));
        Ok(())
    }

    /// POST: a decision request from a digest-authenticated caller goes to
    /// the engine.
    async fn decide(&self, ctx: &mut RequestContext, method: &Method) -> Result<(), FlowError> {
        if ctx.authorization().is_none() && ctx.raw_body().is_empty() {
            return Err(FlowError::CredentialsRequired);
        }
        if !ctx.has_decision_request() {
            return Err(ValidationError::MissingDecisionRequest.into());
        }

        if ctx.authorization().is_some_and(is_digest_scheme) {
            self.authenticate(ctx, method)?;
        } else if !ctx.has_valid_wrapper() {
            return Err(FlowError::CredentialsRequired);
        }

        if !ctx.authenticated() {
            return Err(FlowError::Forbidden);
        }

        let response = self.pdp.evaluate(ctx).await.map_err(FlowError::Engine)?;
        ctx.set_response_body(response);
        Ok(())
    }

    fn authenticate(&self, ctx: &mut RequestContext, method: &Method) -> Result<(), FlowError> {
        let header = ctx.authorization().unwrap_or_default();
        self.authenticator
            .authenticate(header, method.as_str(), ctx.realm(), ctx.raw_body())?;
        ctx.mark_digest_validated();
        ctx.mark_authenticated();
        Ok(())
    }
}

/// Whether a body read failed because the capped read hit its limit, as
/// opposed to the transport failing.
fn exceeds_length_limit(error: &axum::Error) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(error);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}
