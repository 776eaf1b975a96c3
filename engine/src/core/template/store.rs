//! Template Store
//!
//! The template library: an ordered collection of saved templates plus the
//! currently selected one.

use tracing::{debug, info, warn};

use super::models::Template;
use crate::core::TemplateId;

/// Ordered, in-memory template library
#[derive(Clone, Debug, Default)]
pub struct TemplateStore {
    templates: Vec<Template>,
    current: Option<TemplateId>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a committed draft as a new template.
    ///
    /// Assigns a fresh id and creation timestamp, appends it, and makes it
    /// current. Any id the draft carried is replaced.
    pub fn add(&mut self, mut draft: Template) -> &Template {
        let id = ulid::Ulid::new().to_string();
        draft.id = Some(id.clone());
        draft.created_at = Some(chrono::Utc::now().to_rfc3339());

        info!("Added template '{}' ({})", draft.name, id);
        self.templates.push(draft);
        self.current = Some(id);

        let last = self.templates.len() - 1;
        &self.templates[last]
    }

    /// Replaces the stored template with the same id, keeping its position,
    /// and makes it current.
    ///
    /// Templates without an id or with an unknown id are ignored; the
    /// collection and the selection stay as they were. Returns whether a
    /// replacement happened.
    pub fn update(&mut self, template: Template) -> bool {
        let Some(id) = template.id.clone() else {
            warn!("update: template '{}' has no id, ignoring", template.name);
            return false;
        };

        match self.position(&id) {
            Some(index) => {
                let slot = &mut self.templates[index];
                let created_at = slot.created_at.clone();
                *slot = template;
                // The creation timestamp is set once, on add.
                if created_at.is_some() {
                    slot.created_at = created_at;
                }
                debug!("Updated template {} in place at {}", id, index);
                self.current = Some(id);
                true
            }
            None => {
                warn!("update: template {} not found, ignoring", id);
                false
            }
        }
    }

    /// Routes a committed template to [`update`](Self::update) when it is
    /// already stored, otherwise to [`add`](Self::add).
    pub fn save(&mut self, template: Template) -> &Template {
        let existing = template
            .id
            .as_deref()
            .and_then(|id| self.position(id));

        match existing {
            Some(index) => {
                self.update(template);
                &self.templates[index]
            }
            None => self.add(template),
        }
    }

    /// Removes the template with `id`, clearing the selection if it was
    /// current. Returns the removed template.
    pub fn remove(&mut self, id: &str) -> Option<Template> {
        let index = self.position(id)?;
        let removed = self.templates.remove(index);

        if self.current.as_deref() == Some(id) {
            self.current = None;
        }
        info!("Removed template '{}' ({})", removed.name, id);
        Some(removed)
    }

    /// Makes the template with `id` current
    pub fn select(&mut self, id: &str) -> Option<&Template> {
        let index = self.position(id)?;
        self.current = Some(id.to_string());
        Some(&self.templates[index])
    }

    pub fn clear_selection(&mut self) {
        self.current = None;
    }

    /// All templates in insertion order
    pub fn list(&self) -> &[Template] {
        &self.templates
    }

    /// The selected template, if any
    pub fn current(&self) -> Option<&Template> {
        self.current.as_deref().and_then(|id| self.get(id))
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates
            .iter()
            .find(|t| t.id.as_deref() == Some(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.templates
            .iter()
            .position(|t| t.id.as_deref() == Some(id))
    }
}
