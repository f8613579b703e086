//! XACML REST profile home document.

use serde_json::json;

use crate::content_type::CommonType;

/// Link relation identifying the PDP resource.
pub const PDP_RELATION: &str = "http://docs.oasis-open.org/ns/xacml/relation/pdp";

/// Renders the entry-point document listing the PDP resource.
#[must_use]
pub fn home_document(format: CommonType, pdp_href: &str) -> String {
    match format {
        CommonType::Json => json!({
            "resources": {
                PDP_RELATION: { "href": pdp_href }
            }
        })
        .to_string(),
        CommonType::Xml => format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                r#"<resources xmlns="http://ietf.org/ns/home-documents" "#,
                r#"xmlns:atom="http://www.w3.org/2005/Atom">"#,
                r#"<resource rel="{rel}"><atom:link href="{href}"/></resource>"#,
                "</resources>"
            ),
            rel = PDP_RELATION,
            href = escape_attribute(pdp_href),
        ),
    }
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::XmlElement;

    #[test]
    fn json_home_lists_pdp() {
        let doc: serde_json::Value =
            serde_json::from_str(&home_document(CommonType::Json, "/xacml/pdp")).unwrap();
        assert_eq!(doc["resources"][PDP_RELATION]["href"], "/xacml/pdp");
    }

    #[test]
    fn xml_home_is_well_formed() {
        let rendered = home_document(CommonType::Xml, "/xacml/pdp?a=1&b=2");
        let root = XmlElement::parse(&rendered).unwrap();
        assert_eq!(root.local_name(), "resources");
        let link = root.find("link").unwrap();
        assert_eq!(link.attributes[0].1, "/xacml/pdp?a=1&b=2");
    }
}
