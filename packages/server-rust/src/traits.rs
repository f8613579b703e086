use async_trait::async_trait;
use xacml_core::RequestContext;

/// Pluggable policy-evaluation engine.
///
/// Receives a fully classified and authenticated request and returns the
/// serialized XACML response in the request's format (XML or JSON).
/// Implementations: built-in `NotApplicable` responder, remote PDPs (future).
#[async_trait]
pub trait PolicyDecisionPoint: Send + Sync {
    /// Evaluates the decision request carried by `ctx`.
    async fn evaluate(&self, ctx: &RequestContext) -> anyhow::Result<String>;
}
