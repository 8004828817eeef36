//! Raster export of a rendered canvas.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, error, info, warn};
use once_cell::sync::Lazy;
use resvg::{tiny_skia, usvg};
use thiserror::Error;

use super::svg::to_svg_with;
use super::tree::VisualTree;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to fetch image {url}: {reason}")]
    ImageFetch { url: String, reason: String },

    #[error("Failed to parse rendered SVG: {0}")]
    Svg(String),

    #[error("Cannot allocate a {width}x{height} image")]
    Allocation { width: u32, height: u32 },

    #[error("Failed to encode PNG: {0}")]
    Encode(String),

    #[error("Render task failed: {0}")]
    Render(String),
}

/// System fonts, scanned once per process
static FONT_DB: Lazy<Arc<usvg::fontdb::Database>> = Lazy::new(|| {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    info!("Loaded {} font faces for export", db.len());
    Arc::new(db)
});

#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    /// Output pixels per canvas pixel
    pub pixel_ratio: f32,
}

impl ExportOptions {
    /// Editor download: true canvas size
    pub const EDITOR: ExportOptions = ExportOptions { pixel_ratio: 1.0 };
    /// Public download: high density
    pub const PUBLIC: ExportOptions = ExportOptions { pixel_ratio: 3.0 };
}

#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl FetchedImage {
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

/// Source of the image bytes referenced by a template
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, ExportError>;
}

/// Fetches images over HTTP; relative references (e.g. bundled decoration
/// assets) are resolved against `base_url`.
///
/// Only the base URL's own origin and `https` URLs on `allowed_hosts` (or
/// their subdomains) are fetched; anything else fails the export.
pub struct HttpImageFetcher {
    client: reqwest::Client,
    base_url: Option<url::Url>,
    allowed_hosts: Vec<String>,
}

impl HttpImageFetcher {
    pub fn new(base_url: Option<&str>, allowed_hosts: &[String]) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.and_then(|b| url::Url::parse(b).ok()),
            allowed_hosts: allowed_hosts.iter().map(|h| h.to_lowercase()).collect(),
        }
    }

    fn is_permitted(&self, url: &url::Url) -> bool {
        if let Some(base) = &self.base_url {
            if url.origin() == base.origin() {
                return true;
            }
        }
        let Some(host) = url.host_str().map(str::to_lowercase) else {
            return false;
        };
        url.scheme() == "https"
            && self
                .allowed_hosts
                .iter()
                .any(|allowed| host == *allowed || host.ends_with(&format!(".{}", allowed)))
    }

    fn resolve(&self, reference: &str) -> Result<url::Url, ExportError> {
        let fail = |reason: String| ExportError::ImageFetch {
            url: reference.to_string(),
            reason,
        };

        let parsed = match url::Url::parse(reference) {
            Ok(u) => Ok(u),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base_url {
                Some(base) => base.join(reference),
                None => Err(url::ParseError::RelativeUrlWithoutBase),
            },
            Err(e) => Err(e),
        }
        .map_err(|e| fail(e.to_string()))?;

        if !self.is_permitted(&parsed) {
            warn!("Refusing to fetch image from {}", parsed);
            return Err(fail("host is not allowed".into()));
        }
        Ok(parsed)
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, reference: &str) -> Result<FetchedImage, ExportError> {
        let fail = |reason: String| ExportError::ImageFetch {
            url: reference.to_string(),
            reason,
        };

        let url = self.resolve(reference)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(format!("HTTP {}", status)));
        }

        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());
        let bytes = response.bytes().await.map_err(|e| fail(e.to_string()))?.to_vec();
        let mime = mime
            .filter(|m| m.starts_with("image/"))
            .unwrap_or_else(|| sniff_mime(&bytes).to_string());

        Ok(FetchedImage { bytes, mime })
    }
}

fn sniff_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ if bytes.starts_with(b"<svg") || bytes.starts_with(b"<?xml") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Sets a tree's canvas scale to 1 for as long as it lives and puts the
/// previous scale back when dropped, whichever way the scope is left.
pub struct ScaleOverride<'a> {
    tree: &'a mut VisualTree,
    saved: f64,
}

impl<'a> ScaleOverride<'a> {
    pub fn neutralize(tree: &'a mut VisualTree) -> Self {
        let saved = tree.transform.scale;
        tree.transform.scale = 1.0;
        Self { tree, saved }
    }

    pub fn tree(&self) -> &VisualTree {
        self.tree
    }
}

impl Drop for ScaleOverride<'_> {
    fn drop(&mut self) {
        self.tree.transform.scale = self.saved;
    }
}

/// Rasterises `tree` at true canvas size (times `options.pixel_ratio`) and
/// returns PNG bytes. The tree's display scale is suspended during export
/// and restored afterwards, on success or failure.
pub async fn export_png(
    tree: &mut VisualTree,
    fetcher: &dyn ImageFetcher,
    options: ExportOptions,
) -> Result<Vec<u8>, ExportError> {
    let guard = ScaleOverride::neutralize(tree);

    let mut inlined: HashMap<String, String> = HashMap::new();
    for url in guard.tree().image_urls() {
        debug!("Fetching image for export: {}", url);
        let image = fetcher.fetch(url).await.map_err(|e| {
            error!("Export aborted: {}", e);
            e
        })?;
        inlined.insert(url.to_string(), image.data_uri());
    }

    let svg = to_svg_with(guard.tree(), &|url| {
        inlined.get(url).cloned().unwrap_or_else(|| url.to_string())
    });
    let (width, height) = (guard.tree().width, guard.tree().height);
    let png = tokio::task::spawn_blocking(move || rasterize(&svg, width, height, options))
        .await
        .map_err(|e| ExportError::Render(e.to_string()))??;

    info!(
        "Exported {}x{} canvas at ratio {} ({} bytes)",
        guard.tree().width,
        guard.tree().height,
        options.pixel_ratio,
        png.len()
    );
    Ok(png)
}

fn rasterize(
    svg: &str,
    canvas_width: f64,
    canvas_height: f64,
    options: ExportOptions,
) -> Result<Vec<u8>, ExportError> {
    let opt = usvg::Options {
        fontdb: Arc::clone(&FONT_DB),
        ..usvg::Options::default()
    };

    let parsed = usvg::Tree::from_str(svg, &opt).map_err(|e| ExportError::Svg(e.to_string()))?;

    let ratio = if options.pixel_ratio.is_finite() && options.pixel_ratio > 0.0 {
        options.pixel_ratio
    } else {
        1.0
    };
    let width = (canvas_width as f32 * ratio).round().max(1.0) as u32;
    let height = (canvas_height as f32 * ratio).round().max(1.0) as u32;

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or(ExportError::Allocation { width, height })?;
    resvg::render(
        &parsed,
        tiny_skia::Transform::from_scale(ratio, ratio),
        &mut pixmap.as_mut(),
    );

    pixmap
        .encode_png()
        .map_err(|e| ExportError::Encode(e.to_string()))
}
