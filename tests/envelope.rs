//! Contract tests for the response envelope normalizer.

use serde_json::{json, Value};
use studymode::envelope::{normalize, PartKind, ResourceDescriptor, ResponseEnvelope, ResponsePart};
use studymode::StudyError;

fn messy_payload() -> Value {
    json!({
        "content": "Photosynthesis turns light into chemical energy.",
        "parts": [
            {"type": "text", "text": "Plants capture light in chloroplasts.", "resource": null},
            {"type": "text", "text": null, "resource": "Which gas do plants release?"},
            {
                "type": "ui-resource",
                "text": {"uri": "https://example.com/leaf.png", "mimeType": "image/png", "text": "Leaf cross-section"},
                "resource": null
            },
            {
                "kind": "ui-resource",
                "resource": {"uri": "ui://greeting", "label": "Greeting", "type": "resource"}
            }
        ]
    })
}

#[test]
fn every_part_carries_exactly_one_payload() {
    let envelope = normalize(&messy_payload()).unwrap();
    let value = serde_json::to_value(&envelope).unwrap();

    for (part, wire) in envelope.parts().iter().zip(value["parts"].as_array().unwrap()) {
        match part.kind() {
            PartKind::Text => {
                assert!(wire["textContent"].is_string());
                assert!(wire["resource"].is_null());
            }
            PartKind::UiResource => {
                assert!(wire["textContent"].is_null());
                assert!(wire["resource"].is_object());
            }
        }
    }
}

#[test]
fn normalizing_twice_changes_nothing() {
    let once = normalize(&messy_payload()).unwrap();
    let twice = normalize(&serde_json::to_value(&once).unwrap()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn missing_content_is_malformed() {
    let result = normalize(&json!({"parts": [{"kind": "text", "text": "Hi"}]}));
    assert!(matches!(result, Err(StudyError::MalformedEnvelope(_))));
}

#[test]
fn empty_resource_part_is_a_schema_violation() {
    let result = normalize(&json!({
        "content": "Summary",
        "parts": [{"kind": "ui-resource", "text": null, "resource": null}]
    }));
    assert!(matches!(result, Err(StudyError::SchemaViolation { part: 0, .. })));
}

#[test]
fn envelope_round_trips_through_json() {
    let raw = json!({
        "content": "Summary",
        "parts": [{"kind": "text", "text": "Hi", "resource": null}]
    });

    let envelope = normalize(&raw).unwrap();
    assert_eq!(envelope, ResponseEnvelope::new("Summary", vec![ResponsePart::text("Hi")]));

    let encoded = serde_json::to_string(&envelope).unwrap();
    let decoded: ResponseEnvelope = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, envelope);

    let wire: Value = serde_json::from_str(&encoded).unwrap();
    assert_eq!(
        wire,
        json!({
            "content": "Summary",
            "parts": [{"kind": "text", "textContent": "Hi", "resource": null}]
        })
    );
}

#[test]
fn built_envelope_matches_wire_shape() {
    let envelope = ResponseEnvelope::new(
        "Two parts",
        vec![
            ResponsePart::text("Hello"),
            ResponsePart::resource(ResourceDescriptor::new("https://example.com", "Example")),
        ],
    );

    assert_eq!(
        serde_json::to_value(&envelope).unwrap(),
        json!({
            "content": "Two parts",
            "parts": [
                {"kind": "text", "textContent": "Hello", "resource": null},
                {
                    "kind": "ui-resource",
                    "textContent": null,
                    "resource": {
                        "uri": "https://example.com",
                        "mimeType": "text/uri-list",
                        "label": "Example",
                        "kindTag": "UIResource"
                    }
                }
            ]
        })
    );
}
