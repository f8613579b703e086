//! Parsed request trees and the structural queries asked of them.
//!
//! The classifier never needs a query language: it only asks whether an
//! element with a given local name exists, and what attributes the root
//! carries. Both the XML tree and a JSON value answer those two questions.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::Value;

use crate::error::ParseError;

/// Declaration prepended to bodies that arrive without one.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Deepest element nesting accepted in an XML body. Same bound serde_json
/// applies to JSON.
pub const MAX_NESTING_DEPTH: usize = 128;

/// The two questions the classifier asks of a parsed body.
pub trait StructuralQuery {
    /// Attributes of the root element, if its local name is `name`.
    fn root_attributes(&self, name: &str) -> Option<Vec<(String, String)>>;

    /// Whether an element named `name` is reachable from the root.
    fn contains_element(&self, name: &str) -> bool;
}

/// Strips a namespace prefix (`xacml-samlp:Request` -> `Request`).
#[must_use]
pub fn local_name(qualified: &str) -> &str {
    qualified
        .rsplit_once(':')
        .map_or(qualified, |(_, local)| local)
}

/// Namespace-unaware XML element with its attributes and child elements.
/// Text content is not retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    #[must_use]
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self, ParseError> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|_| ParseError::Encoding)?
            .to_string();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| ParseError::Xml(e.to_string()))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|_| ParseError::Encoding)?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| ParseError::Xml(e.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    /// Parses an XML document into its root element.
    ///
    /// A standard declaration is prepended when the body lacks one. Entity
    /// references other than the predefined ones are rejected, never expanded.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Xml`] for malformed or empty documents, multiple
    /// roots, unbalanced tags, or nesting deeper than [`MAX_NESTING_DEPTH`].
    pub fn parse(body: &str) -> Result<Self, ParseError> {
        let body = body.trim_start();
        let document = if body.starts_with("<?") {
            body.to_string()
        } else {
            format!("{XML_DECLARATION}{body}")
        };

        let mut reader = Reader::from_str(&document);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let finished = match reader.read_event() {
                Ok(Event::Start(start)) => {
                    if stack.len() >= MAX_NESTING_DEPTH {
                        return Err(ParseError::Xml("nesting too deep".into()));
                    }
                    stack.push(Self::from_start(&start)?);
                    None
                }
                Ok(Event::Empty(start)) => Some(Self::from_start(&start)?),
                Ok(Event::End(_)) => Some(
                    stack
                        .pop()
                        .ok_or_else(|| ParseError::Xml("unexpected closing tag".into()))?,
                ),
                Ok(Event::Eof) => break,
                Err(e) => return Err(ParseError::Xml(e.to_string())),
                Ok(_) => None,
            };

            if let Some(element) = finished {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(element);
                } else if root.is_none() {
                    root = Some(element);
                } else {
                    return Err(ParseError::Xml("multiple root elements".into()));
                }
            }
        }

        if !stack.is_empty() {
            return Err(ParseError::Xml("unclosed element at end of document".into()));
        }
        root.ok_or_else(|| ParseError::Xml("document has no root element".into()))
    }

    /// Depth-first search by local name, including `self`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        let mut pending = vec![self];
        while let Some(element) = pending.pop() {
            if element.local_name() == name {
                return Some(element);
            }
            pending.extend(element.children.iter().rev());
        }
        None
    }
}

impl StructuralQuery for XmlElement {
    fn root_attributes(&self, name: &str) -> Option<Vec<(String, String)>> {
        (self.local_name() == name).then(|| self.attributes.clone())
    }

    fn contains_element(&self, name: &str) -> bool {
        self.find(name).is_some()
    }
}

impl StructuralQuery for Value {
    fn root_attributes(&self, name: &str) -> Option<Vec<(String, String)>> {
        let object = self.as_object()?;
        let wrapper = object
            .iter()
            .find(|(key, _)| local_name(key) == name)
            .map(|(_, value)| value)?
            .as_object()?;

        Some(
            wrapper
                .iter()
                .filter_map(|(key, value)| {
                    let scalar = match value {
                        Value::String(s) => s.clone(),
                        Value::Number(n) => n.to_string(),
                        Value::Bool(b) => b.to_string(),
                        _ => return None,
                    };
                    Some((key.clone(), scalar))
                })
                .collect(),
        )
    }

    fn contains_element(&self, name: &str) -> bool {
        let mut pending = vec![self];
        while let Some(value) = pending.pop() {
            match value {
                Value::Object(object) => {
                    if object.keys().any(|key| local_name(key) == name) {
                        return true;
                    }
                    pending.extend(object.values());
                }
                Value::Array(items) => pending.extend(items),
                _ => {}
            }
        }
        false
    }
}

/// Parsed body, owned exclusively by its request context.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedDocument {
    Xml(XmlElement),
    Json(Value),
}

impl ParsedDocument {
    /// Parses a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Json`] when the body is not valid JSON.
    pub fn parse_json(body: &str) -> Result<Self, ParseError> {
        serde_json::from_str(body)
            .map(Self::Json)
            .map_err(|e| ParseError::Json(e.to_string()))
    }

    /// Parses an XML body.
    ///
    /// # Errors
    ///
    /// See [`XmlElement::parse`].
    pub fn parse_xml(body: &str) -> Result<Self, ParseError> {
        XmlElement::parse(body).map(Self::Xml)
    }

    #[must_use]
    pub fn query(&self) -> &dyn StructuralQuery {
        match self {
            Self::Xml(root) => root,
            Self::Json(value) => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const WRAPPED: &str = r#"<xacml-samlp:XACMLAuthzDecisionQuery
        xmlns:xacml-samlp="urn:oasis:names:tc:xacml:2.0:profile:saml2.0:v2:schema:protocol"
        ID="q-1" IssueInstant="2013-01-01T00:00:00Z" Version="2.0">
        <xacml-ctx:Request xmlns:xacml-ctx="urn:oasis:names:tc:xacml:3.0:core:schema:wd-17"
            ReturnPolicyIdList="false" CombinedDecision="false">
            <xacml-ctx:Attributes Category="urn:oasis:names:tc:xacml:1.0:subject-category:access-subject"/>
        </xacml-ctx:Request>
    </xacml-samlp:XACMLAuthzDecisionQuery>"#;

    #[test]
    fn parses_without_declaration() {
        let root = XmlElement::parse("<Request/>").unwrap();
        assert_eq!(root.name, "Request");
        assert!(root.children.is_empty());
    }

    #[test]
    fn parses_with_declaration_and_leading_whitespace() {
        let root =
            XmlElement::parse("\n  <?xml version=\"1.0\"?><Request><Attributes/></Request>")
                .unwrap();
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].name, "Attributes");
    }

    #[test]
    fn keeps_prefixed_names_and_matches_local_names() {
        let root = XmlElement::parse(WRAPPED).unwrap();
        assert_eq!(root.name, "xacml-samlp:XACMLAuthzDecisionQuery");
        assert_eq!(root.local_name(), "XACMLAuthzDecisionQuery");
        assert!(root.contains_element("Request"));
        assert!(root.contains_element("Attributes"));
        assert!(!root.contains_element("Response"));
    }

    #[test]
    fn root_attributes_only_for_matching_root() {
        let root = XmlElement::parse(WRAPPED).unwrap();
        let attrs = root.root_attributes("XACMLAuthzDecisionQuery").unwrap();
        assert!(attrs.contains(&("ID".to_string(), "q-1".to_string())));
        assert!(root.root_attributes("Request").is_none());
    }

    #[test]
    fn attribute_entities_are_unescaped() {
        let root = XmlElement::parse(r#"<Request Note="a &amp; b"/>"#).unwrap();
        assert_eq!(root.attributes[0].1, "a & b");
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(XmlElement::parse("").is_err());
        assert!(XmlElement::parse("<Request>").is_err());
        assert!(XmlElement::parse("<Request></Response>").is_err());
        assert!(XmlElement::parse("<A/><B/>").is_err());
        assert!(XmlElement::parse("not xml at all").is_err());
    }

    #[test]
    fn nesting_at_the_limit_is_accepted() {
        let body = format!(
            "{}<Request/>{}",
            "<a>".repeat(MAX_NESTING_DEPTH),
            "</a>".repeat(MAX_NESTING_DEPTH)
        );
        let root = XmlElement::parse(&body).unwrap();
        assert!(root.contains_element("Request"));
    }

    #[test]
    fn deeply_nested_documents_are_rejected() {
        let depth = 20_000;
        let body = format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
        assert_eq!(
            XmlElement::parse(&body),
            Err(ParseError::Xml("nesting too deep".into()))
        );
    }

    #[test]
    fn find_returns_first_match_in_document_order() {
        let root =
            XmlElement::parse(r#"<Root><A><Hit n="1"/></A><Hit n="2"/></Root>"#).unwrap();
        let hit = root.find("Hit").unwrap();
        assert_eq!(hit.attributes[0].1, "1");
        assert!(root.find("Miss").is_none());
    }

    #[test]
    fn json_wrapper_and_request_detection() {
        let value = json!({
            "XACMLAuthzDecisionQuery": {
                "ID": "q-1",
                "IssueInstant": "2013-01-01T00:00:00Z",
                "Version": 2,
                "Request": { "Category": [] }
            }
        });
        let attrs = value.root_attributes("XACMLAuthzDecisionQuery").unwrap();
        assert!(attrs.contains(&("Version".to_string(), "2".to_string())));
        assert!(!attrs.iter().any(|(k, _)| k == "Request"));
        assert!(value.contains_element("Request"));
    }

    #[test]
    fn json_request_inside_arrays_is_reachable() {
        let value = json!({ "batch": [ { "other": 1 }, { "Request": {} } ] });
        assert!(value.contains_element("Request"));
        assert!(value.root_attributes("XACMLAuthzDecisionQuery").is_none());
    }

    #[test]
    fn parsed_document_dispatches_queries() {
        let xml = ParsedDocument::parse_xml("<Request/>").unwrap();
        let json = ParsedDocument::parse_json(r#"{"Request":{}}"#).unwrap();
        assert!(xml.query().contains_element("Request"));
        assert!(json.query().contains_element("Request"));
        assert!(matches!(
            ParsedDocument::parse_json("{"),
            Err(ParseError::Json(_))
        ));
    }
}
