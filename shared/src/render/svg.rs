//! SVG serialisation of a [`VisualTree`]

use super::tree::{
    ImagePaint, Paint, Rect, TextPaint, VisualNode, VisualTree, LINE_HEIGHT, TEXT_PADDING,
};
use crate::invite::{FontStyle, FontWeight, TextAlign};

const SELECTION_STROKE: &str = "#38bdf8";

/// Serialises the tree as it would appear on screen, scale included
pub fn to_svg(tree: &VisualTree) -> String {
    to_svg_with(tree, &|url| url.to_string())
}

/// Like [`to_svg`], mapping every image reference through `resolve_href`
/// (used by export to inline fetched images as data URIs)
pub fn to_svg_with(tree: &VisualTree, resolve_href: &dyn Fn(&str) -> String) -> String {
    let mut builder = SvgBuilder::new(resolve_href);
    builder.open(tree);
    builder.background(tree);
    for node in &tree.nodes {
        builder.node(node);
    }
    builder.finish()
}

struct SvgBuilder<'a> {
    out: String,
    resolve_href: &'a dyn Fn(&str) -> String,
}

impl<'a> SvgBuilder<'a> {
    fn new(resolve_href: &'a dyn Fn(&str) -> String) -> Self {
        Self {
            out: String::new(),
            resolve_href,
        }
    }

    fn open(&mut self, tree: &VisualTree) {
        let scale = tree.transform.scale;
        self.out.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\">\n",
            fmt_num(tree.scaled_width()),
            fmt_num(tree.scaled_height()),
            fmt_num(tree.scaled_width()),
            fmt_num(tree.scaled_height()),
        ));
        // Single canvas transform. Scaling about the top centre of a box that
        // is itself resized to the scaled width reduces to a plain scale.
        self.out.push_str(&format!(
            "  <g transform=\"scale({})\" data-transform-origin=\"{}\">\n",
            fmt_num(scale),
            tree.transform.origin()
        ));
    }

    fn background(&mut self, tree: &VisualTree) {
        self.out.push_str(&format!(
            "    <rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"{}\"/>\n",
            fmt_num(tree.width),
            fmt_num(tree.height),
            escape_xml(&tree.background_color)
        ));
        if let Some(url) = &tree.background_image {
            // background-size: cover; background-position: center
            self.out.push_str(&format!(
                "    <image x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"xMidYMid slice\" xlink:href=\"{}\"/>\n",
                fmt_num(tree.width),
                fmt_num(tree.height),
                escape_xml(&(self.resolve_href)(url))
            ));
        }
    }

    fn node(&mut self, node: &VisualNode) {
        self.out.push_str(&format!(
            "    <g data-element-id=\"{}\">\n",
            escape_xml(&node.element_id)
        ));
        match &node.paint {
            Paint::Text(text) => self.text(&node.bounds, text),
            Paint::Image(image) => self.image(&node.bounds, image),
        }
        if node.selected {
            self.out.push_str(&format!(
                "      <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1\" stroke-dasharray=\"4 2\"/>\n",
                fmt_num(node.bounds.x),
                fmt_num(node.bounds.y),
                fmt_num(node.bounds.width),
                fmt_num(node.bounds.height),
                SELECTION_STROKE
            ));
        }
        self.out.push_str("    </g>\n");
    }

    fn text(&mut self, bounds: &Rect, text: &TextPaint) {
        let (anchor, x) = match text.align {
            TextAlign::Left => ("start", bounds.x + TEXT_PADDING),
            TextAlign::Center => ("middle", bounds.x + bounds.width / 2.0),
            TextAlign::Right => ("end", bounds.x + bounds.width - TEXT_PADDING),
        };
        let line_height = text.font_size * LINE_HEIGHT;
        let block = line_height * text.lines.len() as f64;
        // Vertically centred block; baseline sits ~0.8em below each line top
        let top = bounds.y + (bounds.height - block) / 2.0;
        let first_baseline = top + (line_height - text.font_size) / 2.0 + text.font_size * 0.8;

        let weight = match text.font_weight {
            FontWeight::Normal => "normal",
            FontWeight::Bold => "bold",
        };
        let style = match text.font_style {
            FontStyle::Normal => "normal",
            FontStyle::Italic => "italic",
        };

        self.out.push_str(&format!(
            "      <text x=\"{}\" y=\"{}\" font-size=\"{}\" fill=\"{}\" font-family=\"{}\" font-weight=\"{}\" font-style=\"{}\" text-anchor=\"{}\" xml:space=\"preserve\">",
            fmt_num(x),
            fmt_num(first_baseline),
            fmt_num(text.font_size),
            escape_xml(&text.color),
            escape_xml(text.font_family.font_stack()),
            weight,
            style,
            anchor
        ));
        for (i, line) in text.lines.iter().enumerate() {
            let dy = if i == 0 { 0.0 } else { line_height };
            self.out.push_str(&format!(
                "<tspan x=\"{}\" dy=\"{}\">{}</tspan>",
                fmt_num(x),
                fmt_num(dy),
                escape_xml(line)
            ));
        }
        self.out.push_str("</text>\n");
    }

    fn image(&mut self, bounds: &Rect, image: &ImagePaint) {
        self.out.push_str(&format!(
            "      <image x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" opacity=\"{}\" preserveAspectRatio=\"none\" xlink:href=\"{}\"/>\n",
            fmt_num(bounds.x),
            fmt_num(bounds.y),
            fmt_num(bounds.width),
            fmt_num(bounds.height),
            fmt_num(image.opacity),
            escape_xml(&(self.resolve_href)(&image.url))
        ));
    }

    fn finish(mut self) -> String {
        self.out.push_str("  </g>\n</svg>\n");
        self.out
    }
}

fn fmt_num(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
