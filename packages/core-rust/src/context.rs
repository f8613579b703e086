use crate::content_type::{CommonType, ContentType};
use crate::document::ParsedDocument;
use crate::schema::REQUIRED_WRAPPER_FIELDS;

/// Path segment that introduces the meta alias of the hosted PDP.
pub const META_ALIAS_SEGMENT: &str = "metaAlias";

/// Routing identifiers resolved from the request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub request_uri: String,
    /// Path suffix after the `metaAlias` segment, e.g. `/sub/pdp`.
    pub meta_alias: Option<String>,
    pub realm: String,
    pub pdp_entity_id: Option<String>,
}

impl RouteInfo {
    /// Resolves routing identifiers from a request URI.
    ///
    /// The realm is the meta alias without its last segment (`/` when the alias
    /// has a single segment). Without a meta alias, `default_realm` applies.
    #[must_use]
    pub fn resolve(request_uri: &str, default_realm: &str) -> Self {
        let path = request_uri
            .split_once('?')
            .map_or(request_uri, |(path, _)| path);

        let meta_alias = path
            .split_once(&format!("/{META_ALIAS_SEGMENT}/"))
            .map(|(_, rest)| format!("/{}", rest.trim_end_matches('/')))
            .filter(|alias| alias.len() > 1);

        let (realm, pdp_entity_id) = match meta_alias.as_deref() {
            Some(alias) => match alias.rsplit_once('/') {
                Some(("", last)) => ("/".to_string(), Some(last.to_string())),
                Some((parent, last)) => (parent.to_string(), Some(last.to_string())),
                None => (default_realm.to_string(), None),
            },
            None => (default_realm.to_string(), None),
        };

        Self {
            request_uri: request_uri.to_string(),
            meta_alias,
            realm,
            pdp_entity_id,
        }
    }
}

/// Attributes copied from an `XACMLAuthzDecisionQuery` wrapper.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrapperFields {
    pub id: Option<String>,
    pub issue_instant: Option<String>,
    pub version: Option<String>,
    pub destination: Option<String>,
    pub consent: Option<String>,
}

impl WrapperFields {
    /// Builds the fields from root attributes, matching names
    /// case-insensitively on their local part.
    #[must_use]
    pub fn from_attributes(attributes: &[(String, String)]) -> Self {
        let mut fields = Self::default();
        for (key, value) in attributes {
            let slot = match crate::document::local_name(key).to_ascii_lowercase().as_str() {
                "id" => &mut fields.id,
                "issueinstant" => &mut fields.issue_instant,
                "version" => &mut fields.version,
                "destination" => &mut fields.destination,
                "consent" => &mut fields.consent,
                _ => continue,
            };
            *slot = Some(value.clone());
        }
        fields
    }

    /// First required field that is absent or blank.
    #[must_use]
    pub fn missing_required(&self) -> Option<&'static str> {
        let values = [&self.id, &self.issue_instant, &self.version];
        REQUIRED_WRAPPER_FIELDS
            .into_iter()
            .zip(values)
            .find(|(_, value)| !value.as_deref().is_some_and(|v| !v.trim().is_empty()))
            .map(|(name, _)| name)
    }
}

/// Per-request state threaded through admission, classification,
/// authentication and rendering.
///
/// Created after admission succeeds and dropped once the response is rendered.
/// The authentication flags only ever move from `false` to `true`.
#[derive(Debug, Clone)]
pub struct RequestContext {
    content_type: ContentType,
    route: RouteInfo,
    raw_body: Vec<u8>,
    parsed: Option<ParsedDocument>,
    authorization: Option<String>,
    wrapper: Option<WrapperFields>,
    wrapper_valid: bool,
    has_decision_request: bool,
    digest_validated: bool,
    authenticated: bool,
    response_body: Option<String>,
}

impl RequestContext {
    #[must_use]
    pub fn new(
        content_type: ContentType,
        route: RouteInfo,
        raw_body: Vec<u8>,
        authorization: Option<String>,
    ) -> Self {
        Self {
            content_type,
            route,
            raw_body,
            parsed: None,
            authorization,
            wrapper: None,
            wrapper_valid: false,
            has_decision_request: false,
            digest_validated: false,
            authenticated: false,
            response_body: None,
        }
    }

    #[must_use]
    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    #[must_use]
    pub fn common_type(&self) -> CommonType {
        self.content_type.common_type()
    }

    #[must_use]
    pub fn route(&self) -> &RouteInfo {
        &self.route
    }

    #[must_use]
    pub fn realm(&self) -> &str {
        &self.route.realm
    }

    #[must_use]
    pub fn raw_body(&self) -> &[u8] {
        &self.raw_body
    }

    #[must_use]
    pub fn parsed(&self) -> Option<&ParsedDocument> {
        self.parsed.as_ref()
    }

    #[must_use]
    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    /// Wrapper fields, if a wrapper element was found (valid or not).
    #[must_use]
    pub fn wrapper(&self) -> Option<&WrapperFields> {
        self.wrapper.as_ref()
    }

    /// True only for a wrapper whose required fields are all present.
    #[must_use]
    pub fn has_valid_wrapper(&self) -> bool {
        self.wrapper.is_some() && self.wrapper_valid
    }

    #[must_use]
    pub fn has_decision_request(&self) -> bool {
        self.has_decision_request
    }

    #[must_use]
    pub fn digest_validated(&self) -> bool {
        self.digest_validated
    }

    #[must_use]
    pub fn authenticated(&self) -> bool {
        self.authenticated
    }

    #[must_use]
    pub fn response_body(&self) -> Option<&str> {
        self.response_body.as_deref()
    }

    pub(crate) fn set_parsed(&mut self, parsed: ParsedDocument) {
        self.parsed = Some(parsed);
    }

    pub(crate) fn set_wrapper(&mut self, wrapper: WrapperFields, valid: bool) {
        self.wrapper = Some(wrapper);
        self.wrapper_valid = valid;
    }

    pub(crate) fn mark_decision_request(&mut self) {
        self.has_decision_request = true;
    }

    pub fn mark_digest_validated(&mut self) {
        self.digest_validated = true;
    }

    pub fn mark_authenticated(&mut self) {
        self.authenticated = true;
    }

    /// Stores the body to render. Only the first call has an effect.
    pub fn set_response_body(&mut self, body: String) {
        if self.response_body.is_none() {
            self.response_body = Some(body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_nested_meta_alias() {
        let route = RouteInfo::resolve("/xacml/pdp/metaAlias/sub/pdp", "/");
        assert_eq!(route.meta_alias.as_deref(), Some("/sub/pdp"));
        assert_eq!(route.realm, "/sub");
        assert_eq!(route.pdp_entity_id.as_deref(), Some("pdp"));
    }

    #[test]
    fn single_segment_alias_uses_root_realm() {
        let route = RouteInfo::resolve("/xacml/pdp/metaAlias/pdp?x=1", "/other");
        assert_eq!(route.meta_alias.as_deref(), Some("/pdp"));
        assert_eq!(route.realm, "/");
        assert_eq!(route.pdp_entity_id.as_deref(), Some("pdp"));
        assert_eq!(route.request_uri, "/xacml/pdp/metaAlias/pdp?x=1");
    }

    #[test]
    fn no_meta_alias_falls_back_to_default_realm() {
        let route = RouteInfo::resolve("/xacml/pdp", "/default");
        assert!(route.meta_alias.is_none());
        assert!(route.pdp_entity_id.is_none());
        assert_eq!(route.realm, "/default");
    }

    #[test]
    fn empty_meta_alias_is_ignored() {
        let route = RouteInfo::resolve("/xacml/metaAlias/", "/");
        assert!(route.meta_alias.is_none());
    }

    #[test]
    fn wrapper_fields_match_case_insensitively() {
        let fields = WrapperFields::from_attributes(&[
            ("id".into(), "q-1".into()),
            ("ISSUEINSTANT".into(), "2013-01-01T00:00:00Z".into()),
            ("Version".into(), "2.0".into()),
            ("Consent".into(), "urn:x".into()),
            ("xmlns:samlp".into(), "urn:ns".into()),
        ]);
        assert_eq!(fields.id.as_deref(), Some("q-1"));
        assert_eq!(fields.consent.as_deref(), Some("urn:x"));
        assert!(fields.destination.is_none());
        assert_eq!(fields.missing_required(), None);
    }

    #[test]
    fn blank_required_field_is_missing() {
        let fields = WrapperFields {
            id: Some("q".into()),
            issue_instant: Some("  ".into()),
            version: Some("2.0".into()),
            ..WrapperFields::default()
        };
        assert_eq!(fields.missing_required(), Some("IssueInstant"));
        assert_eq!(WrapperFields::default().missing_required(), Some("ID"));
    }

    #[test]
    fn flags_are_monotonic_and_body_is_set_once() {
        let mut ctx = RequestContext::new(
            ContentType::XacmlXml,
            RouteInfo::resolve("/xacml", "/"),
            Vec::new(),
            None,
        );
        assert!(!ctx.authenticated());
        ctx.mark_digest_validated();
        ctx.mark_authenticated();
        ctx.mark_authenticated();
        assert!(ctx.digest_validated() && ctx.authenticated());

        ctx.set_response_body("first".into());
        ctx.set_response_body("second".into());
        assert_eq!(ctx.response_body(), Some("first"));
    }
}
