//! Closed set of media types accepted by the XACML REST endpoint.
//!
//! Every later stage branches on [`CommonType`] to pick the XML or JSON code
//! path, so normalization happens exactly once, at admission.

use serde::{Deserialize, Serialize};

/// Serialization family shared by a group of media types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommonType {
    Xml,
    Json,
}

/// A recognized request/response media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    /// `application/xacml+xml`
    XacmlXml,
    /// `application/xml`
    Xml,
    /// `text/xml`
    TextXml,
    /// `application/samlassertion+xml`
    SamlAssertionXml,
    /// `application/xacml+json`
    XacmlJson,
    /// `application/json`
    Json,
    /// `application/json-home`
    JsonHome,
}

impl ContentType {
    /// Every recognized media type, in matching order.
    pub const ALL: [ContentType; 7] = [
        ContentType::XacmlXml,
        ContentType::Xml,
        ContentType::TextXml,
        ContentType::SamlAssertionXml,
        ContentType::XacmlJson,
        ContentType::Json,
        ContentType::JsonHome,
    ];

    /// The bare media type, without parameters.
    #[must_use]
    pub const fn media_type(self) -> &'static str {
        match self {
            Self::XacmlXml => "application/xacml+xml",
            Self::Xml => "application/xml",
            Self::TextXml => "text/xml",
            Self::SamlAssertionXml => "application/samlassertion+xml",
            Self::XacmlJson => "application/xacml+json",
            Self::Json => "application/json",
            Self::JsonHome => "application/json-home",
        }
    }

    /// The value written to the response `Content-Type` header.
    #[must_use]
    pub const fn header_value(self) -> &'static str {
        match self {
            Self::XacmlXml => "application/xacml+xml; charset=UTF-8",
            Self::Xml => "application/xml; charset=UTF-8",
            Self::TextXml => "text/xml; charset=UTF-8",
            Self::SamlAssertionXml => "application/samlassertion+xml; charset=UTF-8",
            Self::XacmlJson => "application/xacml+json; charset=UTF-8",
            Self::Json => "application/json; charset=UTF-8",
            Self::JsonHome => "application/json-home; charset=UTF-8",
        }
    }

    #[must_use]
    pub const fn common_type(self) -> CommonType {
        match self {
            Self::XacmlXml | Self::Xml | Self::TextXml | Self::SamlAssertionXml => CommonType::Xml,
            Self::XacmlJson | Self::Json | Self::JsonHome => CommonType::Json,
        }
    }

    /// Normalizes a raw `Content-Type` header value.
    ///
    /// Matching is case-insensitive and ignores parameters such as `charset`.
    /// Returns `None` for anything outside the closed set.
    ///
    /// # Examples
    ///
    /// ```
    /// use xacml_core::{CommonType, ContentType};
    ///
    /// let ct = ContentType::normalize("Application/XACML+XML; charset=utf-8").unwrap();
    /// assert_eq!(ct, ContentType::XacmlXml);
    /// assert_eq!(ct.common_type(), CommonType::Xml);
    /// assert!(ContentType::normalize("text/plain").is_none());
    /// ```
    #[must_use]
    pub fn normalize(raw: &str) -> Option<Self> {
        let essence = raw.split(';').next().unwrap_or_default().trim();
        Self::ALL
            .into_iter()
            .find(|ct| ct.media_type().eq_ignore_ascii_case(essence))
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.media_type())
    }
}
