//! Conversion from the retired fixed-slot card documents.
//!
//! Those documents described a card by a handful of colours, a font keyword,
//! a border style and three decoration toggles, with the text laid out by the
//! page. They are rewritten as canvas elements whose text uses substitution
//! tokens, so a migrated card prints the same fields as before.

use log::{error, info, warn};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::element::{FontFamily, FontWeight, ImageContent, InviteElement, ElementKind};
use super::presets::text;
use super::template::{InviteTemplate, DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH};
use crate::store::{StoreError, TemplateStore};

const LEGACY_KEYS: [&str; 5] = ["font", "borderStyle", "titleColor", "textColor", "decorations"];

/// A document is legacy when it has no element list but carries any of the
/// fixed-slot styling fields.
pub fn is_legacy_document(doc: &Map<String, Value>) -> bool {
    doc.get("elements").map_or(true, Value::is_null) && LEGACY_KEYS.iter().any(|k| doc.contains_key(*k))
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct LegacyCard {
    #[serde(default)]
    pub base_color: Option<String>,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub font: Option<String>,
    #[serde(default)]
    pub title_color: Option<String>,
    #[serde(default)]
    pub text_color: Option<String>,
    #[serde(default)]
    pub decorations: LegacyDecorations,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

#[derive(Deserialize, Debug, Default)]
pub struct LegacyDecorations {
    #[serde(default)]
    pub balloons: bool,
    #[serde(default)]
    pub confetti: bool,
    #[serde(default)]
    pub stars: bool,
}

impl LegacyCard {
    fn family(&self) -> FontFamily {
        match self.font.as_deref() {
            Some("handwritten") => FontFamily::Caveat,
            Some("fun") => FontFamily::Fredoka,
            Some("elegant") => FontFamily::PlayfairDisplay,
            _ => FontFamily::Inherit,
        }
    }

    pub fn into_template(self) -> InviteTemplate {
        let family = self.family();
        let body_color = self.text_color.clone().unwrap_or_else(|| "#374151".into());
        let title_color = self.title_color.clone().unwrap_or_else(|| "#111827".into());

        let mut elements = Vec::new();
        let decorations = [
            (self.decorations.balloons, "balloons", 170.0),
            (self.decorations.confetti, "confetti", 260.0),
            (self.decorations.stars, "stars", 170.0),
        ];
        for (enabled, name, height) in decorations {
            if enabled {
                elements.push(InviteElement {
                    id: format!("decoration-{}", name),
                    x: 0.0,
                    y: 0.0,
                    width: DEFAULT_CANVAS_WIDTH,
                    height,
                    z_index: 1,
                    kind: ElementKind::Image(ImageContent {
                        url: format!("/decorations/{}.png", name),
                        opacity: 1.0,
                    }),
                });
            }
        }

        elements.extend([
            text("intro", "Você foi convidado para", (60.0, 200.0, 480.0, 40.0))
                .color(&body_color)
                .family(family)
                .build(),
            text("title", "{{eventName}}", (60.0, 250.0, 480.0, 80.0))
                .size(32.0)
                .color(&title_color)
                .family(family)
                .weight(FontWeight::Bold)
                .build(),
            text("guest", "🎈 Convidado: {{guestName}}", (60.0, 340.0, 480.0, 50.0))
                .size(20.0)
                .color(&body_color)
                .family(family)
                .build(),
            text("date", "{{eventDate}}", (60.0, 400.0, 480.0, 40.0))
                .color(&body_color)
                .family(family)
                .build(),
            text("location", "📍 Local: {{eventLocal}}", (60.0, 450.0, 480.0, 40.0))
                .color(&body_color)
                .family(family)
                .build(),
            text(
                "message",
                "Estamos ansiosos para celebrar com você! 🎉✨",
                (60.0, 520.0, 480.0, 60.0),
            )
            .size(16.0)
            .color(&body_color)
            .family(family)
            .build(),
        ]);

        let mut template = InviteTemplate {
            background_image: None,
            base_color: self.base_color.unwrap_or_else(|| "#ffffff".into()),
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            elements,
            updated_at: self.updated_at,
        };
        template.set_background_image(self.background_image);
        template
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct MigrationReport {
    pub scanned: usize,
    pub migrated: usize,
    pub failed: usize,
}

/// Rewrites every legacy template document in the store in the canvas shape.
/// Documents already in the canvas shape are left untouched.
pub async fn migrate_all<S>(store: &S) -> Result<MigrationReport, StoreError>
where
    S: TemplateStore + ?Sized,
{
    let mut report = MigrationReport::default();

    for event_id in store.list_template_event_ids().await? {
        report.scanned += 1;

        let Some(Value::Object(doc)) = store.get_template(&event_id).await? else {
            continue;
        };
        if !is_legacy_document(&doc) {
            continue;
        }

        let card: LegacyCard = match serde_json::from_value(Value::Object(doc)) {
            Ok(card) => card,
            Err(e) => {
                warn!("Skipping unreadable legacy template for event {}: {}", event_id, e);
                report.failed += 1;
                continue;
            }
        };

        match store.put_template(&event_id, &card.into_template()).await {
            Ok(()) => {
                info!("Migrated legacy template for event {}", event_id);
                report.migrated += 1;
            }
            Err(e) => {
                error!("Failed to write migrated template for event {}: {}", event_id, e);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::mock_store::MockStore;
    use serde_json::json;

    #[test]
    fn detects_legacy_shape() {
        let legacy = json!({ "baseColor": "#fff", "font": "elegant" });
        let canvas = json!({ "baseColor": "#fff", "elements": [] });
        assert!(is_legacy_document(legacy.as_object().unwrap()));
        assert!(!is_legacy_document(canvas.as_object().unwrap()));
    }

    #[test]
    fn decorations_sit_under_text() {
        let card = LegacyCard {
            font: Some("handwritten".into()),
            decorations: LegacyDecorations {
                balloons: true,
                stars: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let template = card.into_template();
        let order: Vec<&str> = template.paint_order().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(&order[..2], &["decoration-balloons", "decoration-stars"]);
        assert!(template.elements.iter().skip(2).all(|e| match &e.kind {
            ElementKind::Text(t) => t.font_family == FontFamily::Caveat,
            _ => false,
        }));
    }

    #[tokio::test]
    async fn migrates_only_legacy_documents() {
        let store = MockStore::new();
        store.insert_raw_template("legacy", json!({ "baseColor": "#fff", "font": "fun" }));
        store.insert_raw_template("modern", json!({ "baseColor": "#000", "canvasWidth": 600, "canvasHeight": 800, "elements": [] }));

        let report = migrate_all(&store).await.unwrap();
        assert_eq!(report, MigrationReport { scanned: 2, migrated: 1, failed: 0 });

        let migrated = store.get_template("legacy").await.unwrap().unwrap();
        assert!(migrated["elements"].as_array().is_some_and(|e| !e.is_empty()));
        let untouched = store.get_template("modern").await.unwrap().unwrap();
        assert_eq!(untouched["elements"], json!([]));
    }
}
