//! Template Editor
//!
//! Owns the draft template under construction. All element and field edits
//! land on the draft; [`TemplateEditor::commit`] is the only operation that
//! hands a finished template to the outside world.

use serde::{Deserialize, Serialize};
use specta::Type;
use tracing::{debug, info, warn};

use super::models::{
    Element, ElementKindTag, ElementPatch, Template, DEFAULT_BACKGROUND_COLOR,
    DEFAULT_DURATION_SEC, MAX_DURATION_SEC, MIN_DURATION_SEC,
};
use crate::core::{numeric_input_or, AspectRatio, ElementId, ValidationError};

// =============================================================================
// Draft Defaults
// =============================================================================

/// Field values of a fresh draft
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct DraftDefaults {
    pub name: String,
    pub duration: u32,
    pub aspect_ratio: AspectRatio,
    pub background_color: String,
}

impl Default for DraftDefaults {
    fn default() -> Self {
        Self {
            name: String::new(),
            duration: DEFAULT_DURATION_SEC,
            aspect_ratio: AspectRatio::default(),
            background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
        }
    }
}

impl DraftDefaults {
    /// Builds an empty template from these defaults
    pub fn to_template(&self) -> Template {
        Template {
            name: self.name.clone(),
            duration: clamp_duration(self.duration),
            aspect_ratio: self.aspect_ratio,
            background_color: self.background_color.clone(),
            ..Template::default()
        }
    }
}

// =============================================================================
// Field Edits
// =============================================================================

/// A scalar field edit on the draft
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum TemplateField {
    Name(String),
    /// Raw duration input; coerced to whole seconds
    Duration(String),
    AspectRatio(AspectRatio),
    BackgroundColor(String),
}

fn clamp_duration(duration: u32) -> u32 {
    duration.clamp(MIN_DURATION_SEC, MAX_DURATION_SEC)
}

// =============================================================================
// Template Editor
// =============================================================================

/// Draft template state
#[derive(Clone, Debug)]
pub struct TemplateEditor {
    draft: Template,
    defaults: DraftDefaults,
    next_element_id: ElementId,
}

impl Default for TemplateEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEditor {
    /// Creates an editor with an empty draft
    pub fn new() -> Self {
        Self::with_defaults(DraftDefaults::default())
    }

    /// Creates an editor whose fresh drafts use `defaults`
    pub fn with_defaults(defaults: DraftDefaults) -> Self {
        Self {
            draft: defaults.to_template(),
            defaults,
            next_element_id: 1,
        }
    }

    /// Creates an editor seeded with a copy of a stored template
    pub fn from_template(template: &Template, defaults: DraftDefaults) -> Self {
        let next_element_id = template.max_element_id().map_or(1, |id| id.saturating_add(1));
        Self {
            draft: template.clone(),
            defaults,
            next_element_id,
        }
    }

    /// Replaces the draft with a copy of `template`
    pub fn load(&mut self, template: &Template) {
        debug!("Loading template {:?} into editor", template.id);
        self.draft = template.clone();
        self.next_element_id = template.max_element_id().map_or(1, |id| id.saturating_add(1));
    }

    /// Discards the draft and starts a fresh one
    pub fn reset(&mut self) {
        self.draft = self.defaults.to_template();
        self.next_element_id = 1;
    }

    pub fn draft(&self) -> &Template {
        &self.draft
    }

    pub fn defaults(&self) -> &DraftDefaults {
        &self.defaults
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.draft.element(id)
    }

    /// Whether the draft differs from a fresh default draft
    pub fn is_dirty(&self) -> bool {
        self.draft != self.defaults.to_template()
    }

    // -------------------------------------------------------------------------
    // Field edits
    // -------------------------------------------------------------------------

    /// Updates one scalar field of the draft
    pub fn set_field(&mut self, field: TemplateField) {
        match field {
            TemplateField::Name(name) => self.draft.name = name,
            TemplateField::Duration(input) => {
                let duration = numeric_input_or("duration", &input, DEFAULT_DURATION_SEC);
                let clamped = clamp_duration(duration);
                if clamped != duration {
                    warn!(
                        "Duration {}s out of range, clamped to {}s",
                        duration, clamped
                    );
                }
                // Existing element windows keep their captured end times.
                self.draft.duration = clamped;
            }
            TemplateField::AspectRatio(ratio) => self.draft.aspect_ratio = ratio,
            TemplateField::BackgroundColor(color) => self.draft.background_color = color,
        }
    }

    // -------------------------------------------------------------------------
    // Element edits
    // -------------------------------------------------------------------------

    /// Appends a new element with default values and returns its id
    pub fn add_element(&mut self, tag: ElementKindTag) -> ElementId {
        let id = self.allocate_element_id();
        let element = Element::new(id, tag, self.draft.duration_sec());
        debug!("Adding {} element {} to draft", tag, id);
        self.draft.elements.push(element);
        id
    }

    /// Merges `patch` into the element with `id`.
    ///
    /// Returns false (and changes nothing) when no such element exists.
    pub fn update_element(&mut self, id: ElementId, patch: &ElementPatch) -> bool {
        match self.draft.element_mut(id) {
            Some(element) => {
                element.apply(patch);
                true
            }
            None => {
                warn!("update_element: element {} not found in draft", id);
                false
            }
        }
    }

    /// Removes the element with `id`. Returns false when absent.
    pub fn remove_element(&mut self, id: ElementId) -> bool {
        let before = self.draft.elements.len();
        self.draft.elements.retain(|e| e.id != id);
        let removed = self.draft.elements.len() != before;
        if !removed {
            warn!("remove_element: element {} not found in draft", id);
        }
        removed
    }

    /// Finalizes the draft.
    ///
    /// On success the draft is handed back and the editor starts a fresh one.
    /// A blank name leaves the draft untouched so the user can fix it.
    pub fn commit(&mut self) -> Result<Template, ValidationError> {
        self.draft.validate()?;

        let fresh = self.defaults.to_template();
        let committed = std::mem::replace(&mut self.draft, fresh);
        self.next_element_id = 1;

        info!(
            "Committed template '{}' ({} elements)",
            committed.name,
            committed.elements.len()
        );
        Ok(committed)
    }

    fn allocate_element_id(&mut self) -> ElementId {
        // Skip ids already taken (e.g. by elements of a seeded template).
        while self.draft.element(self.next_element_id).is_some() {
            self.next_element_id = self.next_element_id.wrapping_add(1);
        }
        let id = self.next_element_id;
        self.next_element_id = self.next_element_id.wrapping_add(1);
        id
    }
}
