//! Visual tree construction.
//!
//! A template is laid out as absolutely positioned boxes in canvas pixels,
//! painted bottom to top by z-index. The whole canvas is then scaled by one
//! uniform factor anchored at its top centre; individual boxes are never
//! rescaled on their own.

use serde::Serialize;

use crate::invite::{
    substitute, ElementKind, FontFamily, FontStyle, FontWeight, InviteElement, InviteTemplate,
    SubstitutionContext, TextAlign,
};

/// Below this viewport width the editor canvas is shrunk to fit
pub const EDITOR_COMPACT_BREAKPOINT: f64 = 640.0;
/// Below this viewport width the public card is shrunk to fit
pub const PUBLIC_COMPACT_BREAKPOINT: f64 = 480.0;

pub const MIN_FONT_SIZE: f64 = 1.0;
pub const MAX_FONT_SIZE: f64 = 400.0;
const FALLBACK_FONT_SIZE: f64 = 18.0;

pub const TEXT_PADDING: f64 = 4.0;
pub const LINE_HEIGHT: f64 = 1.2;
// Rough advance of an average glyph, in ems, used for soft wrapping
const AVG_GLYPH_WIDTH: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    Editor,
    Public,
}

impl RenderMode {
    pub fn compact_breakpoint(&self) -> f64 {
        match self {
            RenderMode::Editor => EDITOR_COMPACT_BREAKPOINT,
            RenderMode::Public => PUBLIC_COMPACT_BREAKPOINT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions<'a> {
    pub mode: RenderMode,
    /// Width of the hosting viewport, if known
    pub viewport_width: Option<f64>,
    /// Element to outline (editor only)
    pub selected: Option<&'a str>,
}

impl<'a> RenderOptions<'a> {
    pub fn public(viewport_width: Option<f64>) -> Self {
        Self {
            mode: RenderMode::Public,
            viewport_width,
            selected: None,
        }
    }

    pub fn editor(viewport_width: Option<f64>, selected: Option<&'a str>) -> Self {
        Self {
            mode: RenderMode::Editor,
            viewport_width,
            selected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasTransform {
    pub scale: f64,
}

impl CanvasTransform {
    /// CSS equivalent, for hosts embedding the tree in a page
    pub fn css(&self) -> String {
        format!("scale({})", self.scale)
    }

    pub fn origin(&self) -> &'static str {
        "top center"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualTree {
    pub width: f64,
    pub height: f64,
    pub background_color: String,
    pub background_image: Option<String>,
    pub transform: CanvasTransform,
    /// Bottom to top
    pub nodes: Vec<VisualNode>,
}

impl VisualTree {
    pub fn scaled_width(&self) -> f64 {
        self.width * self.transform.scale
    }

    pub fn scaled_height(&self) -> f64 {
        self.height * self.transform.scale
    }

    /// Every image reference painted by the tree, background first
    pub fn image_urls(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = self.background_image.iter().map(String::as_str).collect();
        for node in &self.nodes {
            if let Paint::Image(img) = &node.paint {
                if !urls.contains(&img.url.as_str()) {
                    urls.push(&img.url);
                }
            }
        }
        urls
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualNode {
    pub element_id: String,
    pub bounds: Rect,
    pub z_index: i64,
    pub selected: bool,
    pub paint: Paint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Paint {
    Text(TextPaint),
    Image(ImagePaint),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextPaint {
    pub lines: Vec<String>,
    pub font_size: f64,
    pub color: String,
    pub font_family: FontFamily,
    pub align: TextAlign,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePaint {
    pub url: String,
    pub opacity: f64,
}

/// Uniform canvas scale for a viewport. Only compact viewports (narrower than
/// the mode's breakpoint) scale; the canvas is then fit to the viewport width.
pub fn compute_scale(canvas_width: f64, viewport_width: Option<f64>, breakpoint: f64) -> f64 {
    match viewport_width {
        Some(vw) if vw.is_finite() && vw > 0.0 && vw < breakpoint && canvas_width > 0.0 => {
            vw / canvas_width
        }
        _ => 1.0,
    }
}

pub fn clamp_opacity(opacity: f64) -> f64 {
    if opacity.is_nan() {
        1.0
    } else {
        opacity.clamp(0.0, 1.0)
    }
}

pub fn clamp_font_size(size: f64) -> f64 {
    if size.is_nan() {
        FALLBACK_FONT_SIZE
    } else {
        size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
    }
}

/// Lays out `template`. Text is expanded with `ctx` when given; without a
/// context tokens are painted as typed, which is what the editor shows.
pub fn render(
    template: &InviteTemplate,
    ctx: Option<&SubstitutionContext>,
    options: &RenderOptions<'_>,
) -> VisualTree {
    let nodes = template
        .paint_order()
        .into_iter()
        .map(|el| layout_element(el, ctx, options))
        .collect();

    VisualTree {
        width: template.canvas_width,
        height: template.canvas_height,
        background_color: template.base_color.clone(),
        background_image: template.background_image.clone(),
        transform: CanvasTransform {
            scale: compute_scale(
                template.canvas_width,
                options.viewport_width,
                options.mode.compact_breakpoint(),
            ),
        },
        nodes,
    }
}

fn layout_element(
    el: &InviteElement,
    ctx: Option<&SubstitutionContext>,
    options: &RenderOptions<'_>,
) -> VisualNode {
    let bounds = Rect {
        x: el.x,
        y: el.y,
        width: el.width.max(0.0),
        height: el.height.max(0.0),
    };

    let paint = match &el.kind {
        ElementKind::Text(t) => {
            let body = match ctx {
                Some(ctx) => substitute(&t.text, ctx),
                None => t.text.clone(),
            };
            let font_size = clamp_font_size(t.font_size);
            let available = (bounds.width - 2.0 * TEXT_PADDING).max(0.0);
            Paint::Text(TextPaint {
                lines: wrap_lines(&body, font_size, available),
                font_size,
                color: t.color.clone(),
                font_family: t.font_family,
                align: t.align,
                font_weight: t.font_weight,
                font_style: t.font_style,
            })
        }
        ElementKind::Image(img) => Paint::Image(ImagePaint {
            url: img.url.clone(),
            opacity: clamp_opacity(img.opacity),
        }),
    };

    VisualNode {
        element_id: el.id.clone(),
        bounds,
        z_index: el.z_index,
        selected: options.mode == RenderMode::Editor && options.selected == Some(el.id.as_str()),
        paint,
    }
}

/// Hard breaks on `\n`, then greedy word wrap against an estimated glyph
/// width. Words longer than a line are left whole.
fn wrap_lines(text: &str, font_size: f64, available: f64) -> Vec<String> {
    let max_chars = ((available / (font_size * AVG_GLYPH_WIDTH)).floor() as usize).max(1);

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split(' ') {
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if !current.is_empty() && needed > max_chars {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }
    lines
}
