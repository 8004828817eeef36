//! Layout and paint of invitation templates.

pub mod export;
pub mod svg;
pub mod tree;

pub use export::{
    export_png, ExportError, ExportOptions, FetchedImage, HttpImageFetcher, ImageFetcher,
    ScaleOverride,
};
pub use svg::to_svg;
pub use tree::{
    compute_scale, render, CanvasTransform, ImagePaint, Paint, Rect, RenderMode, RenderOptions,
    TextPaint, VisualNode, VisualTree,
};
