use serde::{Deserialize, Serialize};

/// One positioned unit on the invitation canvas.
///
/// Stored flat, with the variant named by a `type` field:
/// `{"id": "title", "type": "text", "x": 80, ..., "zIndex": 3, "text": "..."}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InviteElement {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_z_index")]
    pub z_index: i64,
    #[serde(flatten)]
    pub kind: ElementKind,
}

fn default_z_index() -> i64 {
    1
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Text(TextContent),
    Image(ImageContent),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_text_color")]
    pub color: String,
    #[serde(default)]
    pub font_family: FontFamily,
    #[serde(default)]
    pub align: TextAlign,
    #[serde(default)]
    pub font_weight: FontWeight,
    #[serde(default)]
    pub font_style: FontStyle,
}

fn default_font_size() -> f64 {
    18.0
}

fn default_text_color() -> String {
    "#111827".to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageContent {
    pub url: String,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_opacity() -> f64 {
    1.0
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// Font selector offered by the editor. Names outside the known set fall back
/// to the canvas default so stored documents never fail on an unknown font.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(from = "String", into = "String")]
pub enum FontFamily {
    #[default]
    Inherit,
    Caveat,
    Fredoka,
    PlayfairDisplay,
}

impl FontFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            FontFamily::Inherit => "inherit",
            FontFamily::Caveat => "Caveat",
            FontFamily::Fredoka => "Fredoka",
            FontFamily::PlayfairDisplay => "Playfair Display",
        }
    }

    /// CSS font stack used when painting
    pub fn font_stack(&self) -> &'static str {
        match self {
            FontFamily::Inherit => "sans-serif",
            FontFamily::Caveat => "Caveat, cursive",
            FontFamily::Fredoka => "Fredoka, sans-serif",
            FontFamily::PlayfairDisplay => "'Playfair Display', serif",
        }
    }
}

impl From<String> for FontFamily {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Caveat" => FontFamily::Caveat,
            "Fredoka" => FontFamily::Fredoka,
            "Playfair Display" => FontFamily::PlayfairDisplay,
            _ => FontFamily::Inherit,
        }
    }
}

impl From<FontFamily> for String {
    fn from(value: FontFamily) -> Self {
        value.as_str().to_string()
    }
}

impl InviteElement {
    pub fn text(id: impl Into<String>, z_index: i64, content: TextContent) -> Self {
        Self {
            id: id.into(),
            x: 80.0,
            y: 80.0,
            width: 250.0,
            height: 60.0,
            z_index,
            kind: ElementKind::Text(content),
        }
    }

    pub fn image(id: impl Into<String>, z_index: i64, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x: 50.0,
            y: 50.0,
            width: 200.0,
            height: 120.0,
            z_index,
            kind: ElementKind::Image(ImageContent {
                url: url.into(),
                opacity: 0.9,
            }),
        }
    }

    pub fn with_box(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
        self
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, ElementKind::Text(_))
    }

    /// Short human label, as shown in the editor's layer list
    pub fn label(&self) -> String {
        match &self.kind {
            ElementKind::Text(t) => {
                let head: String = t.text.chars().take(15).collect();
                let ellipsis = if t.text.chars().count() > 15 { "..." } else { "" };
                format!("Texto: \"{}{}\"", head, ellipsis)
            }
            ElementKind::Image(_) => "Imagem".to_string(),
        }
    }
}

impl Default for TextContent {
    fn default() -> Self {
        Self {
            text: "Novo texto".to_string(),
            font_size: default_font_size(),
            color: default_text_color(),
            font_family: FontFamily::Inherit,
            align: TextAlign::Left,
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
        }
    }
}

/// Partial update merged into an element. Fields that do not belong to the
/// element's variant are ignored.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub z_index: Option<i64>,
    pub text: Option<String>,
    pub font_size: Option<f64>,
    pub color: Option<String>,
    pub font_family: Option<FontFamily>,
    pub align: Option<TextAlign>,
    pub font_weight: Option<FontWeight>,
    pub font_style: Option<FontStyle>,
    pub url: Option<String>,
    pub opacity: Option<f64>,
}

impl ElementPatch {
    pub fn apply(self, element: &mut InviteElement) {
        if let Some(x) = self.x {
            element.x = x;
        }
        if let Some(y) = self.y {
            element.y = y;
        }
        if let Some(width) = self.width {
            element.width = width;
        }
        if let Some(height) = self.height {
            element.height = height;
        }
        if let Some(z) = self.z_index {
            element.z_index = z;
        }

        match &mut element.kind {
            ElementKind::Text(t) => {
                if let Some(text) = self.text {
                    t.text = text;
                }
                if let Some(size) = self.font_size {
                    t.font_size = size;
                }
                if let Some(color) = self.color {
                    t.color = color;
                }
                if let Some(family) = self.font_family {
                    t.font_family = family;
                }
                if let Some(align) = self.align {
                    t.align = align;
                }
                if let Some(weight) = self.font_weight {
                    t.font_weight = weight;
                }
                if let Some(style) = self.font_style {
                    t.font_style = style;
                }
            }
            ElementKind::Image(img) => {
                if let Some(url) = self.url {
                    img.url = url;
                }
                if let Some(opacity) = self.opacity {
                    img.opacity = opacity;
                }
            }
        }
    }
}
