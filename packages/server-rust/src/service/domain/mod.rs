//! Built-in policy decision points.

use async_trait::async_trait;
use serde_json::json;
use xacml_core::{CommonType, RequestContext};

use crate::traits::PolicyDecisionPoint;

const XACML_CORE_NAMESPACE: &str = "urn:oasis:names:tc:xacml:3.0:core:schema:wd-17";
const STATUS_OK: &str = "urn:oasis:names:tc:xacml:1.0:status:ok";

/// Answers every decision request with `NotApplicable`.
///
/// Stands in for a real engine so the gateway can run and be probed end to
/// end without policies loaded.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotApplicableDecisionPoint;

#[async_trait]
impl PolicyDecisionPoint for NotApplicableDecisionPoint {
    async fn evaluate(&self, ctx: &RequestContext) -> anyhow::Result<String> {
        Ok(match ctx.common_type() {
            CommonType::Json => json!({
                "Response": [{
                    "Decision": "NotApplicable",
                    "Status": { "StatusCode": { "Value": STATUS_OK } }
                }]
            })
            .to_string(),
            CommonType::Xml => format!(
                concat!(
                    r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                    r#"<Response xmlns="{ns}"><Result><Decision>NotApplicable</Decision>"#,
                    r#"<Status><StatusCode Value="{status}"/></Status></Result></Response>"#
                ),
                ns = XACML_CORE_NAMESPACE,
                status = STATUS_OK,
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use xacml_core::{ContentType, RouteInfo, XmlElement};

    use super::*;

    fn context(content_type: ContentType) -> RequestContext {
        RequestContext::new(
            content_type,
            RouteInfo::resolve("/xacml/pdp", "/"),
            Vec::new(),
            None,
        )
    }

    #[tokio::test]
    async fn xml_response_is_not_applicable() {
        let body = NotApplicableDecisionPoint
            .evaluate(&context(ContentType::XacmlXml))
            .await
            .unwrap();
        let root = XmlElement::parse(&body).unwrap();
        assert_eq!(root.local_name(), "Response");
        assert!(root.find("Decision").is_some());
        assert!(body.contains("<Decision>NotApplicable</Decision>"));
    }

    #[tokio::test]
    async fn json_response_is_not_applicable() {
        let body = NotApplicableDecisionPoint
            .evaluate(&context(ContentType::Json))
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["Response"][0]["Decision"], "NotApplicable");
    }
}
