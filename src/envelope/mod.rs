//! Structured response envelope returned to chat callers.
//!
//! The formatting pass asks the hosted model for a JSON payload with a
//! summary and a list of parts, but nothing forces the model to put the data
//! in the right slot. [`normalize`] is the one place that turns that payload
//! into a [`ResponseEnvelope`] whose parts carry exactly one payload each,
//! matching their [`PartKind`].
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use studymode::envelope::{normalize, PartKind};
//!
//! let raw = json!({
//!     "content": "Summary",
//!     "parts": [{"type": "text", "text": null, "resource": "Hi"}]
//! });
//!
//! let envelope = normalize(&raw).unwrap();
//! assert_eq!(envelope.parts()[0].kind(), PartKind::Text);
//! assert_eq!(envelope.parts()[0].text_content(), Some("Hi"));
//! ```

mod normalize;
mod schema;

pub use normalize::normalize;
pub use schema::{producer_schema, SCHEMA_NAME};

use crate::error::StudyError;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// MIME type used when a resource omits one.
pub const DEFAULT_MIME_TYPE: &str = "text/uri-list";

/// Discriminant selecting which payload a part carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PartKind {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "ui-resource")]
    UiResource,
}

impl PartKind {
    /// Every kind in the canonical vocabulary.
    pub const ALL: [PartKind; 2] = [PartKind::Text, PartKind::UiResource];

    /// Wire value of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            PartKind::Text => "text",
            PartKind::UiResource => "ui-resource",
        }
    }
}

impl FromStr for PartKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(PartKind::Text),
            "ui-resource" => Ok(PartKind::UiResource),
            _ => Err(format!("Unknown part kind: {}", s)),
        }
    }
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag identifying an object as a UI resource.
///
/// `UIResource` is the only value emitted. Producers that still send the
/// older `resource` tag are mapped onto it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ResourceTag {
    #[default]
    #[serde(rename = "UIResource")]
    UiResource,
}

impl ResourceTag {
    /// Legacy tag accepted on input and mapped to [`ResourceTag::UiResource`].
    pub const LEGACY: &'static str = "resource";

    /// Parse a tag, mapping the legacy value. Returns `None` for anything else.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "UIResource" | Self::LEGACY => Some(ResourceTag::UiResource),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        "UIResource"
    }
}

/// A referenced external resource (image, component, document).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    uri: String,
    mime_type: String,
    label: String,
    kind_tag: ResourceTag,
}

impl ResourceDescriptor {
    /// Create a resource with the default MIME type.
    pub fn new(uri: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            label: label.into(),
            kind_tag: ResourceTag::UiResource,
        }
    }

    /// Set the MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind_tag(&self) -> ResourceTag {
        self.kind_tag
    }
}

/// One unit of an envelope's payload.
///
/// Each variant carries exactly the payload its kind allows. On the wire
/// both `textContent` and `resource` are always present, with the inactive
/// one set to `null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePart {
    Text(String),
    UiResource(ResourceDescriptor),
}

impl ResponsePart {
    pub fn text(text: impl Into<String>) -> Self {
        ResponsePart::Text(text.into())
    }

    pub fn resource(resource: ResourceDescriptor) -> Self {
        ResponsePart::UiResource(resource)
    }

    /// The discriminant of this part.
    pub fn kind(&self) -> PartKind {
        match self {
            ResponsePart::Text(_) => PartKind::Text,
            ResponsePart::UiResource(_) => PartKind::UiResource,
        }
    }

    /// Text payload, `None` for resource parts.
    pub fn text_content(&self) -> Option<&str> {
        match self {
            ResponsePart::Text(text) => Some(text),
            ResponsePart::UiResource(_) => None,
        }
    }

    /// Resource payload, `None` for text parts.
    pub fn resource_descriptor(&self) -> Option<&ResourceDescriptor> {
        match self {
            ResponsePart::Text(_) => None,
            ResponsePart::UiResource(resource) => Some(resource),
        }
    }
}

impl Serialize for ResponsePart {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ResponsePart", 3)?;
        state.serialize_field("kind", &self.kind())?;
        state.serialize_field("textContent", &self.text_content())?;
        state.serialize_field("resource", &self.resource_descriptor())?;
        state.end()
    }
}

/// Top-level response returned for a chat request.
///
/// Deserializing goes through [`normalize`], so an envelope read from JSON
/// satisfies the same invariants as one built by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub struct ResponseEnvelope {
    content: String,
    parts: Vec<ResponsePart>,
}

impl ResponseEnvelope {
    pub fn new(content: impl Into<String>, parts: Vec<ResponsePart>) -> Self {
        Self {
            content: content.into(),
            parts,
        }
    }

    /// Summary of the full response.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Parts in producer order.
    pub fn parts(&self) -> &[ResponsePart] {
        &self.parts
    }
}

impl TryFrom<serde_json::Value> for ResponseEnvelope {
    type Error = StudyError;

    fn try_from(value: serde_json::Value) -> std::result::Result<Self, Self::Error> {
        normalize(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_part_kind_parse() {
        assert_eq!("text".parse::<PartKind>().unwrap(), PartKind::Text);
        assert_eq!("UI-Resource".parse::<PartKind>().unwrap(), PartKind::UiResource);
        assert!("reasoning".parse::<PartKind>().is_err());
    }

    #[test]
    fn test_resource_tag_mapping() {
        assert_eq!(ResourceTag::parse("UIResource"), Some(ResourceTag::UiResource));
        assert_eq!(ResourceTag::parse("resource"), Some(ResourceTag::UiResource));
        assert_eq!(ResourceTag::parse("component"), None);
    }

    #[test]
    fn test_part_wire_shape() {
        let text = serde_json::to_value(ResponsePart::text("Hi")).unwrap();
        assert_eq!(text, json!({"kind": "text", "textContent": "Hi", "resource": null}));

        let resource = ResponsePart::resource(
            ResourceDescriptor::new("https://example.com/a.png", "A diagram").with_mime_type("image/png"),
        );
        assert_eq!(
            serde_json::to_value(resource).unwrap(),
            json!({
                "kind": "ui-resource",
                "textContent": null,
                "resource": {
                    "uri": "https://example.com/a.png",
                    "mimeType": "image/png",
                    "label": "A diagram",
                    "kindTag": "UIResource"
                }
            })
        );
    }

    #[test]
    fn test_descriptor_default_mime_type() {
        let resource = ResourceDescriptor::new("ui://greeting", "Greeting");
        assert_eq!(resource.mime_type(), DEFAULT_MIME_TYPE);
        assert_eq!(resource.kind_tag().as_str(), "UIResource");
    }

    #[test]
    fn test_deserialize_runs_normalizer() {
        let json = r#"{"content": "Summary", "parts": [{"kind": "ui-resource", "text": null, "resource": null}]}"#;
        let err = serde_json::from_str::<ResponseEnvelope>(json).unwrap_err();
        assert!(err.to_string().contains("part 0"));
    }
}
