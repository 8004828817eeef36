use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::element::{
    FontFamily, FontStyle, FontWeight, InviteElement, TextAlign, TextContent,
};
use super::template::{
    InviteTemplate, DEFAULT_BASE_COLOR, DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH,
};

/// Named starting layouts the editor can apply wholesale.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Kids,
    Elegant,
    Minimal,
}

#[derive(Error, Debug, PartialEq)]
#[error("Unknown preset: {0}")]
pub struct UnknownPreset(pub String);

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Kids, Preset::Elegant, Preset::Minimal];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Kids => "kids",
            Preset::Elegant => "elegant",
            Preset::Minimal => "minimal",
        }
    }

    pub fn base_color(&self) -> &'static str {
        match self {
            Preset::Kids => "#fee2e2",
            Preset::Elegant => "#0f172a",
            Preset::Minimal => "#f9fafb",
        }
    }

    pub fn elements(&self) -> Vec<InviteElement> {
        use FontFamily::*;
        use FontStyle::Italic;
        use FontWeight::Bold;

        match self {
            Preset::Kids => vec![
                text("title", "Festa de Aniversário! 🎈", (60.0, 60.0, 480.0, 80.0))
                    .size(30.0)
                    .color("#b91c1c")
                    .family(Fredoka)
                    .weight(Bold)
                    .build(),
                text("guest", "Convidado: João da Silva", (80.0, 150.0, 440.0, 60.0))
                    .size(22.0)
                    .color("#111827")
                    .family(Caveat)
                    .build(),
                text(
                    "details",
                    "📍 Salão Encantado\n🗓 20 de Março de 2025\n⏰ 18h",
                    (80.0, 230.0, 440.0, 120.0),
                )
                .color("#374151")
                .build(),
                text("msg", "Venha se divertir com a gente! ✨", (80.0, 380.0, 440.0, 80.0))
                    .color("#b91c1c")
                    .family(Fredoka)
                    .build(),
            ],
            Preset::Elegant => vec![
                text("title", "Jantar Especial", (60.0, 80.0, 480.0, 80.0))
                    .size(34.0)
                    .color("#e5e7eb")
                    .family(PlayfairDisplay)
                    .weight(Bold)
                    .build(),
                text("guest", "Convidado: João da Silva", (80.0, 170.0, 440.0, 60.0))
                    .size(20.0)
                    .color("#facc15")
                    .family(Caveat)
                    .build(),
                text(
                    "details",
                    "📍 Espaço Gourmet\n🗓 20 de Março de 2025\n⏰ 20h",
                    (80.0, 250.0, 440.0, 120.0),
                )
                .color("#e5e7eb")
                .build(),
                text(
                    "msg",
                    "Sua presença tornará a noite ainda mais especial.",
                    (80.0, 400.0, 440.0, 80.0),
                )
                .size(16.0)
                .color("#9ca3af")
                .family(PlayfairDisplay)
                .style(Italic)
                .build(),
            ],
            Preset::Minimal => vec![
                text("title", "Convite", (60.0, 80.0, 480.0, 80.0))
                    .size(30.0)
                    .weight(Bold)
                    .build(),
                text("guest", "Convidado: João da Silva", (80.0, 170.0, 440.0, 60.0))
                    .size(20.0)
                    .build(),
                text("details", "📍 Local\n🗓 Data\n⏰ Horário", (80.0, 250.0, 440.0, 120.0))
                    .color("#4b5563")
                    .build(),
            ],
        }
    }

    /// Overwrites elements and base styling of `template`. Canvas size is kept.
    pub fn apply_to(&self, template: &mut InviteTemplate) {
        template.base_color = self.base_color().to_string();
        template.background_image = None;
        template.elements = self.elements();
    }
}

impl FromStr for Preset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownPreset(s.to_string()))
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Layout used for events that have never saved a template
pub fn default_template() -> InviteTemplate {
    InviteTemplate {
        background_image: None,
        base_color: DEFAULT_BASE_COLOR.to_string(),
        canvas_width: DEFAULT_CANVAS_WIDTH,
        canvas_height: DEFAULT_CANVAS_HEIGHT,
        elements: default_elements(),
        updated_at: None,
    }
}

pub(crate) fn default_elements() -> Vec<InviteElement> {
    use FontFamily::*;

    vec![
        text("title", "Nome do Evento", (80.0, 80.0, 440.0, 80.0))
            .size(32.0)
            .color("#1e293b")
            .family(PlayfairDisplay)
            .weight(FontWeight::Bold)
            .build(),
        text(
            "subtitle",
            "Você foi convidado para uma grande celebração! 🎉",
            (70.0, 170.0, 460.0, 80.0),
        )
        .color("#475569")
        .build(),
        text("guestName", "Convidado: João da Silva", (80.0, 260.0, 440.0, 60.0))
            .size(22.0)
            .color("#0f172a")
            .family(Caveat)
            .build(),
        text(
            "details",
            "📍 Salão Encantado\n🗓 20 de Março de 2025\n⏰ 18h",
            (80.0, 340.0, 440.0, 120.0),
        )
        .color("#475569")
        .build(),
        text(
            "message",
            "Estamos ansiosos para celebrar com você! ✨",
            (80.0, 500.0, 440.0, 80.0),
        )
        .size(16.0)
        .color("#1e293b")
        .family(Fredoka)
        .build(),
    ]
}

/// Builder for the centred z-index 3 text blocks every preset is made of
pub(crate) struct TextBuilder {
    id: &'static str,
    rect: (f64, f64, f64, f64),
    content: TextContent,
}

pub(crate) fn text(id: &'static str, body: &str, rect: (f64, f64, f64, f64)) -> TextBuilder {
    TextBuilder {
        id,
        rect,
        content: TextContent {
            text: body.to_string(),
            font_size: 18.0,
            color: "#111827".to_string(),
            font_family: FontFamily::Inherit,
            align: TextAlign::Center,
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
        },
    }
}

impl TextBuilder {
    pub(crate) fn size(mut self, size: f64) -> Self {
        self.content.font_size = size;
        self
    }

    pub(crate) fn color(mut self, color: &str) -> Self {
        self.content.color = color.to_string();
        self
    }

    pub(crate) fn family(mut self, family: FontFamily) -> Self {
        self.content.font_family = family;
        self
    }

    pub(crate) fn weight(mut self, weight: FontWeight) -> Self {
        self.content.font_weight = weight;
        self
    }

    pub(crate) fn style(mut self, style: FontStyle) -> Self {
        self.content.font_style = style;
        self
    }

    pub(crate) fn build(self) -> InviteElement {
        let (x, y, w, h) = self.rect;
        InviteElement::text(self.id, 3, self.content).with_box(x, y, w, h)
    }
}
