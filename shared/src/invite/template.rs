use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::element::InviteElement;

pub const DEFAULT_CANVAS_WIDTH: f64 = 600.0;
pub const DEFAULT_CANVAS_HEIGHT: f64 = 800.0;
pub const DEFAULT_BASE_COLOR: &str = "#ffffff";

/// Persisted layout of an event's invitation card.
///
/// `elements` keeps storage order; paint order is always derived by a stable
/// sort on z-index (see [`InviteTemplate::paint_order`]).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InviteTemplate {
    #[serde(
        default,
        serialize_with = "serialize_background",
        deserialize_with = "deserialize_background"
    )]
    pub background_image: Option<String>,
    pub base_color: String,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub elements: Vec<InviteElement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

// The stored document uses "" for "no background image".
fn serialize_background<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(value.as_deref().unwrap_or(""))
}

fn deserialize_background<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

impl InviteTemplate {
    pub fn element(&self, id: &str) -> Option<&InviteElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn element_mut(&mut self, id: &str) -> Option<&mut InviteElement> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    /// Highest z-index in use; 1 for an empty canvas
    pub fn max_z_index(&self) -> i64 {
        self.elements.iter().map(|e| e.z_index).max().unwrap_or(1)
    }

    /// Lowest z-index in use; 1 for an empty canvas
    pub fn min_z_index(&self) -> i64 {
        self.elements.iter().map(|e| e.z_index).min().unwrap_or(1)
    }

    /// Renumbers z-indices to 1..=n over the distinct values in use. Paint
    /// order is unchanged, ties included.
    pub fn compact_z_indices(&mut self) {
        let mut levels: Vec<i64> = self.elements.iter().map(|e| e.z_index).collect();
        levels.sort_unstable();
        levels.dedup();
        for el in &mut self.elements {
            if let Ok(rank) = levels.binary_search(&el.z_index) {
                el.z_index = rank as i64 + 1;
            }
        }
    }

    /// Elements bottom to top. Equal z-indices keep storage order.
    pub fn paint_order(&self) -> Vec<&InviteElement> {
        let mut ordered: Vec<&InviteElement> = self.elements.iter().collect();
        // slice::sort_by_key is stable
        ordered.sort_by_key(|e| e.z_index);
        ordered
    }

    pub fn set_background_image(&mut self, url: Option<String>) {
        self.background_image = url.filter(|u| !u.trim().is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invite::presets::default_template;

    fn with_z(ids_and_z: &[(&str, i64)]) -> InviteTemplate {
        let mut template = default_template();
        template.elements = ids_and_z
            .iter()
            .map(|(id, z)| InviteElement::image(*id, *z, "x.png"))
            .collect();
        template
    }

    #[test]
    fn paint_order_is_ascending_and_stable() {
        let template = with_z(&[("c", 5), ("a", 1), ("b", 5), ("d", -2)]);
        let ids: Vec<&str> = template.paint_order().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "a", "c", "b"]);
    }

    #[test]
    fn extremes_of_empty_canvas_are_one() {
        let template = with_z(&[]);
        assert_eq!(template.max_z_index(), 1);
        assert_eq!(template.min_z_index(), 1);
    }

    #[test]
    fn compacting_keeps_paint_order_and_ties() {
        let mut template = with_z(&[("a", i64::MAX), ("b", -40), ("c", i64::MAX), ("d", i64::MIN)]);
        let before: Vec<String> = template.paint_order().iter().map(|e| e.id.clone()).collect();

        template.compact_z_indices();

        let after: Vec<String> = template.paint_order().iter().map(|e| e.id.clone()).collect();
        assert_eq!(before, after);
        let zs: Vec<i64> = template.elements.iter().map(|e| e.z_index).collect();
        assert_eq!(zs, vec![3, 2, 3, 1]);
    }

    #[test]
    fn background_round_trips_through_empty_string() {
        let mut template = with_z(&[]);
        template.set_background_image(Some("  ".into()));
        assert!(template.background_image.is_none());

        let value = serde_json::to_value(&template).unwrap();
        assert_eq!(value["backgroundImage"], "");
    }
}
