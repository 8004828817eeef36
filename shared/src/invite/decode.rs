use std::collections::HashSet;

use serde_json::{Map, Value};
use thiserror::Error;

use super::migrate::{is_legacy_document, LegacyCard};
use super::presets::default_elements;
use super::template::{
    InviteTemplate, DEFAULT_BASE_COLOR, DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH,
};

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Template document is not an object")]
    NotAnObject,

    #[error("Malformed template document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid canvas size {width}x{height}")]
    InvalidCanvas { width: f64, height: f64 },

    #[error("Duplicate element id: {0}")]
    DuplicateElementId(String),
}

/// Parses a stored template document into a validated [`InviteTemplate`].
///
/// Absent fields take the defaults of a fresh template; an absent element list
/// yields the default elements. Documents in the retired fixed-slot card shape
/// are converted to the canvas model on the way in.
pub fn decode_template(value: Value) -> Result<InviteTemplate, DecodeError> {
    let Value::Object(mut doc) = value else {
        return Err(DecodeError::NotAnObject);
    };

    let template = if is_legacy_document(&doc) {
        let card: LegacyCard = serde_json::from_value(Value::Object(doc))?;
        card.into_template()
    } else {
        fill_default(&mut doc, "baseColor", || Value::from(DEFAULT_BASE_COLOR));
        fill_default(&mut doc, "backgroundImage", || Value::from(""));
        fill_default(&mut doc, "canvasWidth", || Value::from(DEFAULT_CANVAS_WIDTH));
        fill_default(&mut doc, "canvasHeight", || Value::from(DEFAULT_CANVAS_HEIGHT));
        if is_absent(&doc, "elements") {
            doc.insert("elements".into(), serde_json::to_value(default_elements())?);
        }
        serde_json::from_value(Value::Object(doc))?
    };

    validate(&template)?;
    Ok(template)
}

fn is_absent(doc: &Map<String, Value>, key: &str) -> bool {
    doc.get(key).map_or(true, Value::is_null)
}

fn fill_default(doc: &mut Map<String, Value>, key: &str, value: impl FnOnce() -> Value) {
    if is_absent(doc, key) {
        doc.insert(key.to_string(), value());
    }
}

pub(crate) fn validate(template: &InviteTemplate) -> Result<(), DecodeError> {
    let (width, height) = (template.canvas_width, template.canvas_height);
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(DecodeError::InvalidCanvas { width, height });
    }

    let mut seen = HashSet::new();
    for el in &template.elements {
        if !seen.insert(el.id.as_str()) {
            return Err(DecodeError::DuplicateElementId(el.id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invite::ElementKind;
    use serde_json::json;

    #[test]
    fn fills_missing_fields_with_defaults() {
        let template = decode_template(json!({ "baseColor": "#000000" })).unwrap();
        assert_eq!(template.base_color, "#000000");
        assert_eq!(template.canvas_width, 600.0);
        assert_eq!(template.elements.len(), 5);
        assert!(template.background_image.is_none());
    }

    #[test]
    fn keeps_stored_elements() {
        let template = decode_template(json!({
            "backgroundImage": "https://cdn/bg.png",
            "baseColor": "#fff",
            "canvasWidth": 500,
            "canvasHeight": 700,
            "updatedAt": 1700000000000i64,
            "elements": [
                { "id": "pic", "type": "image", "url": "https://cdn/a.png",
                  "x": 1, "y": 2, "width": 3, "height": 4, "zIndex": 9, "opacity": 0.4 }
            ]
        }))
        .unwrap();

        assert_eq!(template.background_image.as_deref(), Some("https://cdn/bg.png"));
        assert_eq!(template.updated_at, Some(1700000000000));
        assert_eq!(template.elements.len(), 1);
        assert!(matches!(template.elements[0].kind, ElementKind::Image(_)));
    }

    #[test]
    fn rejects_wrong_shapes() {
        assert!(matches!(decode_template(json!([1, 2])), Err(DecodeError::NotAnObject)));
        assert!(matches!(
            decode_template(json!({ "elements": "nope" })),
            Err(DecodeError::Malformed(_))
        ));
        assert!(matches!(
            decode_template(json!({ "elements": [{ "id": "a", "type": "video", "x": 0, "y": 0, "width": 1, "height": 1 }] })),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_non_positive_canvas() {
        let err = decode_template(json!({ "canvasWidth": 0, "elements": [] })).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidCanvas { .. }));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let el = json!({ "id": "a", "type": "text", "text": "x", "x": 0, "y": 0, "width": 1, "height": 1 });
        let err = decode_template(json!({ "elements": [el.clone(), el] })).unwrap_err();
        assert!(matches!(err, DecodeError::DuplicateElementId(id) if id == "a"));
    }

    #[test]
    fn converts_legacy_cards() {
        let template = decode_template(json!({
            "baseColor": "#fde68a",
            "font": "fun",
            "titleColor": "#be123c",
            "decorations": { "balloons": true }
        }))
        .unwrap();

        assert_eq!(template.base_color, "#fde68a");
        assert!(template
            .elements
            .iter()
            .any(|e| matches!(&e.kind, ElementKind::Text(t) if t.text == "{{eventName}}")));
    }
}
