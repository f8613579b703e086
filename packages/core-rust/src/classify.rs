//! Request classification: wrapper detection, required-field validation and
//! decision-request discovery.

use tracing::debug;

use crate::content_type::CommonType;
use crate::context::{RequestContext, WrapperFields};
use crate::document::ParsedDocument;
use crate::error::{ClassifyError, ParseError, ValidationError};
use crate::schema::ValidationRules;

/// Parses the raw body and records what it contains on the context.
///
/// On a parse failure no flags change. A wrapper missing a required field is
/// still recorded, but [`RequestContext::has_decision_request`] stays false.
/// An empty body is not an error; it simply carries nothing.
///
/// # Errors
///
/// Returns [`ClassifyError::Parse`] for malformed bodies and
/// [`ClassifyError::Validation`] when a wrapper lacks `ID`, `IssueInstant` or
/// `Version`, or when a non-empty document holds no decision request.
pub fn classify(ctx: &mut RequestContext, rules: &ValidationRules) -> Result<(), ClassifyError> {
    if ctx.raw_body().iter().all(u8::is_ascii_whitespace) {
        return Ok(());
    }

    let body = std::str::from_utf8(ctx.raw_body()).map_err(|_| ParseError::Encoding)?;
    let parsed = match ctx.common_type() {
        CommonType::Xml => ParsedDocument::parse_xml(body)?,
        CommonType::Json => ParsedDocument::parse_json(body)?,
    };

    let query = parsed.query();
    let wrapper = query
        .root_attributes(&rules.wrapper_element)
        .map(|attrs| WrapperFields::from_attributes(&attrs));
    let contains_request = query.contains_element(&rules.decision_request_element);
    ctx.set_parsed(parsed);

    if let Some(wrapper) = wrapper {
        let missing = wrapper.missing_required();
        ctx.set_wrapper(wrapper, missing.is_none());
        if let Some(field) = missing {
            return Err(ValidationError::MissingWrapperField(field).into());
        }
        debug!("authorization query wrapper present");
    }

    if contains_request {
        ctx.mark_decision_request();
        Ok(())
    } else {
        Err(ValidationError::MissingDecisionRequest.into())
    }
}
