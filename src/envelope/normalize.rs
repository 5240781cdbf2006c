//! Reconciliation of raw model output into a [`ResponseEnvelope`].
//!
//! Construction happens in two explicit phases. Each raw part is first read
//! into an untyped [`RawPart`] (discriminant plus whatever sits in the text
//! and resource slots), the slots are reconciled against the discriminant,
//! and only then is the typed [`ResponsePart`] built.

use super::{PartKind, ResourceDescriptor, ResourceTag, ResponseEnvelope, ResponsePart, DEFAULT_MIME_TYPE};
use crate::error::{Result, StudyError};
use serde_json::{Map, Value};
use tracing::debug;

// Keys are tried in order; the first non-null value wins. The first key of
// each list is the envelope's own output vocabulary, which keeps
// normalization idempotent.
const KIND_KEYS: &[&str] = &["kind", "type"];
const TEXT_KEYS: &[&str] = &["textContent", "text"];
const RESOURCE_KEYS: &[&str] = &["resource"];
const URI_KEYS: &[&str] = &["uri"];
const MIME_KEYS: &[&str] = &["mimeType", "mime_type"];
const LABEL_KEYS: &[&str] = &["label", "text"];
const TAG_KEYS: &[&str] = &["kindTag", "type", "kind"];

/// Validate and normalize a raw structured payload.
///
/// Fails with [`StudyError::MalformedEnvelope`] when the top-level shape is
/// wrong and with [`StudyError::SchemaViolation`] on the first part that
/// cannot be reconciled. No partial envelope is ever returned.
pub fn normalize(raw: &Value) -> Result<ResponseEnvelope> {
    let map = raw.as_object().ok_or_else(|| {
        StudyError::MalformedEnvelope(format!("expected an object, got {}", type_name(raw)))
    })?;

    let content = coerce_content(map.get("content"))?;

    let items = match map.get("parts") {
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(StudyError::MalformedEnvelope(format!(
                "'parts' must be an array, got {}",
                type_name(other)
            )))
        }
        None => return Err(StudyError::MalformedEnvelope("missing 'parts'".to_string())),
    };

    let parts = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            RawPart::parse(index, item)
                .map(RawPart::reconcile)
                .and_then(|raw| raw.into_part(index))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ResponseEnvelope::new(content, parts))
}

fn coerce_content(value: Option<&Value>) -> Result<String> {
    match value {
        None | Some(Value::Null) => Err(StudyError::MalformedEnvelope("missing 'content'".to_string())),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(other) => Err(StudyError::MalformedEnvelope(format!(
            "'content' must be a string, got {}",
            type_name(other)
        ))),
    }
}

/// A part after parsing, before its slots agree with its kind.
#[derive(Debug, Clone, PartialEq)]
struct RawPart {
    kind: PartKind,
    text: Option<Value>,
    resource: Option<Value>,
}

impl RawPart {
    fn parse(index: usize, value: &Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| {
            StudyError::schema(index, format!("expected an object, got {}", type_name(value)))
        })?;

        let kind = match first_present(map, KIND_KEYS) {
            Some(Value::String(s)) => s.parse::<PartKind>().map_err(|e| StudyError::schema(index, e))?,
            Some(other) => {
                return Err(StudyError::schema(
                    index,
                    format!("'kind' must be a string, got {}", type_name(other)),
                ))
            }
            None => return Err(StudyError::schema(index, "missing 'kind'")),
        };

        Ok(Self {
            kind,
            text: first_present(map, TEXT_KEYS).cloned(),
            resource: first_present(map, RESOURCE_KEYS).cloned(),
        })
    }

    /// Move a payload sitting in the wrong slot into the slot `kind` selects.
    fn reconcile(mut self) -> Self {
        match self.kind {
            PartKind::UiResource => {
                let has_mapping = self.resource.as_ref().is_some_and(is_valid_mapping);
                if self.text.is_some() && !has_mapping {
                    debug!("Moving text slot into resource slot for ui-resource part");
                    self.resource = self.text.take().map(reinterpret_as_mapping);
                }
            }
            PartKind::Text => {
                let has_string = self.text.as_ref().is_some_and(Value::is_string);
                if self.resource.is_some() && !has_string {
                    debug!("Moving resource slot into text slot for text part");
                    self.text = self.resource.take();
                }
            }
        }
        self
    }

    fn into_part(self, index: usize) -> Result<ResponsePart> {
        match self.kind {
            PartKind::Text => {
                if self.resource.is_some() {
                    return Err(StudyError::schema(index, "text part must not carry a resource"));
                }
                match self.text {
                    Some(Value::String(text)) => Ok(ResponsePart::Text(text)),
                    Some(other) => Err(StudyError::schema(
                        index,
                        format!("text must be a string, got {}", type_name(&other)),
                    )),
                    None => Err(StudyError::schema(index, "text part has no text")),
                }
            }
            PartKind::UiResource => {
                if self.text.is_some() {
                    return Err(StudyError::schema(index, "ui-resource part must not carry text"));
                }
                match self.resource {
                    Some(Value::Object(map)) => parse_resource(index, &map).map(ResponsePart::UiResource),
                    Some(other) => Err(StudyError::schema(
                        index,
                        format!("resource must be an object, got {}", type_name(&other)),
                    )),
                    None => Err(StudyError::schema(index, "ui-resource part has no resource")),
                }
            }
        }
    }
}

fn parse_resource(index: usize, map: &Map<String, Value>) -> Result<ResourceDescriptor> {
    let uri = string_field(index, map, URI_KEYS, "uri")?
        .filter(|uri| !uri.trim().is_empty())
        .ok_or_else(|| StudyError::schema(index, "resource is missing 'uri'"))?;

    let label = string_field(index, map, LABEL_KEYS, "label")?
        .ok_or_else(|| StudyError::schema(index, "resource is missing 'label'"))?;

    let mime_type = string_field(index, map, MIME_KEYS, "mimeType")?
        .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());

    if let Some(tag) = string_field(index, map, TAG_KEYS, "kindTag")? {
        if ResourceTag::parse(&tag).is_none() {
            return Err(StudyError::schema(index, format!("unknown resource tag '{}'", tag)));
        }
        if tag == ResourceTag::LEGACY {
            debug!("Mapping legacy resource tag to UIResource");
        }
    }

    Ok(ResourceDescriptor::new(uri, label).with_mime_type(mime_type))
}

fn is_valid_mapping(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| parse_resource(0, map).is_ok())
}

/// Read an optional string field; present values of another type are errors.
fn string_field(
    index: usize,
    map: &Map<String, Value>,
    keys: &[&str],
    name: &str,
) -> Result<Option<String>> {
    match first_present(map, keys) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(StudyError::schema(
            index,
            format!("resource '{}' must be a string, got {}", name, type_name(other)),
        )),
    }
}

fn first_present<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find(|value| !value.is_null())
}

/// A resource smuggled through the text slot may arrive as JSON text.
fn reinterpret_as_mapping(value: Value) -> Value {
    match value {
        Value::String(s) => serde_json::from_str::<Value>(&s)
            .ok()
            .filter(Value::is_object)
            .unwrap_or(Value::String(s)),
        other => other,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
