//! JSON schema handed to the model for the formatting pass.

use super::{PartKind, DEFAULT_MIME_TYPE};
use serde_json::{json, Value};

/// Schema name sent alongside [`producer_schema`].
pub const SCHEMA_NAME: &str = "AgentResponse";

/// Schema for the payload the formatting pass should produce.
///
/// This uses the producer vocabulary (`type`, `text`, `resource`), not the
/// envelope's output vocabulary. Whatever comes back still goes through
/// [`normalize`](super::normalize).
pub fn producer_schema() -> Value {
    let kinds: Vec<&str> = PartKind::ALL.iter().map(PartKind::as_str).collect();

    json!({
        "type": "object",
        "properties": {
            "content": {
                "type": "string",
                "description": "A short summary of the full response"
            },
            "parts": {
                "type": "array",
                "description": "The parts that make up the response",
                "items": {
                    "type": "object",
                    "properties": {
                        "type": {
                            "type": "string",
                            "enum": kinds,
                            "description": "text for plain text, ui-resource for components, images, files or external resources"
                        },
                        "text": {
                            "type": ["string", "null"],
                            "description": "Text content, only for text parts"
                        },
                        "resource": {
                            "anyOf": [
                                { "type": "null" },
                                {
                                    "type": "object",
                                    "properties": {
                                        "uri": { "type": "string", "description": "The URI of the resource" },
                                        "mimeType": {
                                            "type": "string",
                                            "description": format!("The MIME type of the resource (default {})", DEFAULT_MIME_TYPE)
                                        },
                                        "text": { "type": "string", "description": "A description or label for the resource" },
                                        "type": { "type": "string", "enum": ["UIResource"] }
                                    },
                                    "required": ["uri", "text"]
                                }
                            ],
                            "description": "UIResource object, only for ui-resource parts"
                        }
                    },
                    "required": ["type"]
                }
            }
        },
        "required": ["content", "parts"]
    })
}
