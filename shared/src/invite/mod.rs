//! Invitation card model: positioned elements on a fixed-size canvas.

pub mod decode;
pub mod element;
pub mod migrate;
pub mod presets;
pub mod substitute;
pub mod template;

pub use decode::{decode_template, DecodeError};
pub use element::{
    ElementKind, ElementPatch, FontFamily, FontStyle, FontWeight, ImageContent, InviteElement,
    TextAlign, TextContent,
};
pub use presets::{default_template, Preset, UnknownPreset};
pub use substitute::{substitute, SubstitutionContext};
pub use template::InviteTemplate;
