//! In-memory editing session over one event's invitation template.
//!
//! Mutations apply immediately to the session's copy; nothing reaches the
//! store until [`EditorSession::save`]. Saving overwrites the stored document
//! wholesale, so when two sessions edit the same event the last save wins.

use log::{error, info, warn};
use serde::Serialize;
use uuid::Uuid;

use crate::invite::{
    ElementPatch, InviteElement, InviteTemplate, Preset, SubstitutionContext, TextContent,
};
use crate::models::now_millis;
use crate::render::{
    export_png, render, ExportError, ExportOptions, ImageFetcher, RenderOptions, VisualTree,
};
use crate::store::{StoreError, TemplateStore};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSession {
    event_id: String,
    template: InviteTemplate,
    selected_id: Option<String>,
}

impl EditorSession {
    pub fn new(event_id: impl Into<String>, template: InviteTemplate) -> Self {
        Self {
            event_id: event_id.into(),
            template,
            selected_id: None,
        }
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn template(&self) -> &InviteTemplate {
        &self.template
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn selected(&self) -> Option<&InviteElement> {
        self.selected_id
            .as_deref()
            .and_then(|id| self.template.element(id))
    }

    /// Selects `id`; an unknown id (or `None`) clears the selection
    pub fn select(&mut self, id: Option<&str>) {
        self.selected_id = id
            .filter(|id| self.template.element(id).is_some())
            .map(str::to_string);
    }

    /// A z-index above every element. Saturated layers are compacted first.
    fn z_above_all(&mut self) -> i64 {
        if let Some(z) = self.template.max_z_index().checked_add(1) {
            return z;
        }
        warn!("Z-indices of event {} saturated, compacting", self.event_id);
        self.template.compact_z_indices();
        self.template.max_z_index() + 1
    }

    /// A z-index below every element. Saturated layers are compacted first.
    fn z_below_all(&mut self) -> i64 {
        if let Some(z) = self.template.min_z_index().checked_sub(1) {
            return z;
        }
        warn!("Z-indices of event {} saturated, compacting", self.event_id);
        self.template.compact_z_indices();
        self.template.min_z_index() - 1
    }

    fn push_on_top(&mut self, build: impl FnOnce(String, i64) -> InviteElement) -> &InviteElement {
        let id = Uuid::new_v4().to_string();
        let z = self.z_above_all();
        self.template.elements.push(build(id.clone(), z));
        self.selected_id = Some(id);
        // just pushed
        &self.template.elements[self.template.elements.len() - 1]
    }

    /// Adds a default text block above everything else and selects it
    pub fn add_text_element(&mut self) -> &InviteElement {
        self.push_on_top(|id, z| InviteElement::text(id, z, TextContent::default()))
    }

    /// Adds an image above everything else and selects it
    pub fn add_image_element(&mut self, url: impl Into<String>) -> &InviteElement {
        let url = url.into();
        self.push_on_top(|id, z| InviteElement::image(id, z, url))
    }

    /// Merges `patch` into element `id`. Returns false (and changes nothing)
    /// when there is no such element.
    pub fn update_element(&mut self, id: &str, patch: ElementPatch) -> bool {
        match self.template.element_mut(id) {
            Some(el) => {
                patch.apply(el);
                true
            }
            None => false,
        }
    }

    pub fn delete_element(&mut self, id: &str) -> bool {
        let before = self.template.elements.len();
        self.template.elements.retain(|e| e.id != id);
        if self.selected_id.as_deref() == Some(id) {
            self.selected_id = None;
        }
        self.template.elements.len() != before
    }

    /// Moves `id` strictly above every other element, measured now
    pub fn bring_to_front(&mut self, id: &str) -> bool {
        if self.template.element(id).is_none() {
            return false;
        }
        let top = self.z_above_all();
        self.set_z(id, top)
    }

    /// Moves `id` strictly below every other element, measured now
    pub fn send_to_back(&mut self, id: &str) -> bool {
        if self.template.element(id).is_none() {
            return false;
        }
        let bottom = self.z_below_all();
        self.set_z(id, bottom)
    }

    fn set_z(&mut self, id: &str, z: i64) -> bool {
        match self.template.element_mut(id) {
            Some(el) => {
                el.z_index = z;
                true
            }
            None => false,
        }
    }

    /// Replaces elements and base styling with `preset` and clears selection
    pub fn apply_preset(&mut self, preset: Preset) {
        preset.apply_to(&mut self.template);
        self.selected_id = None;
    }

    pub fn set_base_color(&mut self, color: impl Into<String>) {
        self.template.base_color = color.into();
    }

    /// `None` or an empty string removes the background image
    pub fn set_background_image(&mut self, url: Option<String>) {
        self.template.set_background_image(url);
    }

    /// Visual tree of the editor canvas, selection outlined, tokens unexpanded
    pub fn render(&self, viewport_width: Option<f64>) -> VisualTree {
        render(
            &self.template,
            None,
            &RenderOptions::editor(viewport_width, self.selected_id.as_deref()),
        )
    }

    /// Persists the session's template as a full snapshot stamped with the
    /// current time. No version check is made against the stored document.
    pub async fn save<S>(&mut self, store: &S) -> Result<i64, StoreError>
    where
        S: TemplateStore + ?Sized,
    {
        let stamped = now_millis();
        let mut snapshot = self.template.clone();
        snapshot.updated_at = Some(stamped);

        store.put_template(&self.event_id, &snapshot).await.map_err(|e| {
            error!("Failed to save template for event {}: {}", self.event_id, e);
            e
        })?;

        self.mark_saved(stamped);
        info!("Saved template for event {}", self.event_id);
        Ok(stamped)
    }

    /// Records a save made from a copy of this session
    pub fn mark_saved(&mut self, stamped: i64) {
        self.template.updated_at = Some(stamped);
    }

    /// PNG of the canvas at its true size. Session state is untouched whether
    /// or not the export succeeds.
    pub async fn export_raster(
        &self,
        fetcher: &dyn ImageFetcher,
        preview_ctx: Option<&SubstitutionContext>,
    ) -> Result<Vec<u8>, ExportError> {
        let mut tree = render(&self.template, preview_ctx, &RenderOptions::editor(None, None));
        export_png(&mut tree, fetcher, ExportOptions::EDITOR).await
    }
}
