//! Studio
//!
//! Ties the draft editor, the template library and the preview together the
//! way a front end uses them: edits go to the draft, saving commits the draft
//! into the store, opening a stored template seeds the editor with a copy.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::export::{self, ExportKind};
use crate::core::settings::StudioSettings;
use crate::core::template::{Element, Template, TemplateEditor, TemplateStore};
use crate::core::timeline::{self, PlaybackClock};
use crate::core::{CoreError, CoreResult, TimeSec};

/// Editor + library + preview state for one user session
#[derive(Debug)]
pub struct Studio {
    store: TemplateStore,
    editor: TemplateEditor,
    settings: StudioSettings,
}

impl Default for Studio {
    fn default() -> Self {
        Self::new()
    }
}

impl Studio {
    pub fn new() -> Self {
        Self::with_settings(StudioSettings::default())
    }

    pub fn with_settings(mut settings: StudioSettings) -> Self {
        settings.normalize();
        Self {
            store: TemplateStore::new(),
            editor: TemplateEditor::with_defaults(settings.draft_defaults()),
            settings,
        }
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    pub fn editor(&self) -> &TemplateEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut TemplateEditor {
        &mut self.editor
    }

    pub fn settings(&self) -> &StudioSettings {
        &self.settings
    }

    /// Commits the draft into the library.
    ///
    /// A draft opened from a stored template replaces it in place; any other
    /// draft is added as a new template. Either way the saved template becomes
    /// current and the editor starts a fresh draft. A blank name fails with
    /// `EmptyName` and leaves the draft as it was.
    pub fn save(&mut self) -> CoreResult<&Template> {
        let committed = self.editor.commit()?;
        Ok(self.store.save(committed))
    }

    /// Selects a stored template and loads a copy of it into the editor
    pub fn open(&mut self, id: &str) -> CoreResult<&Template> {
        let template = self
            .store
            .select(id)
            .ok_or_else(|| CoreError::MissingReference(format!("template {id}")))?;
        self.editor.load(template);
        debug!("Opened template {} for editing", id);
        Ok(template)
    }

    /// Discards the draft and starts a new one
    pub fn new_draft(&mut self) {
        self.editor.reset();
    }

    /// Deletes a stored template. Returns it when it existed.
    pub fn delete(&mut self, id: &str) -> Option<Template> {
        self.store.remove(id)
    }

    /// The template shown in the preview panel
    pub fn current(&self) -> Option<&Template> {
        self.store.current()
    }

    /// Elements of the current template visible at `time`
    pub fn visible_at(&self, time: TimeSec) -> Vec<&Element> {
        self.current()
            .map(|t| timeline::visible_elements(t, time))
            .unwrap_or_default()
    }

    /// A stopped playback clock for the current template
    pub fn preview_clock(&self) -> Option<PlaybackClock> {
        self.current().map(|t| {
            PlaybackClock::with_interval(t.duration_sec(), self.settings.playback.tick_interval())
        })
    }

    /// Renders a stored template as an export document
    pub fn export(&self, id: &str, kind: ExportKind) -> CoreResult<String> {
        let template = self.stored(id)?;
        export::export_json(template, kind)
    }

    /// Writes the export for a stored template into `dir`, or into the
    /// configured output directory (current directory when unset)
    pub fn write_export(
        &self,
        id: &str,
        kind: ExportKind,
        dir: Option<&Path>,
    ) -> CoreResult<PathBuf> {
        let template = self.stored(id)?;
        let dir = dir
            .map(Path::to_path_buf)
            .or_else(|| self.settings.export.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."));
        let path = export::write_export(&dir, template, kind)?;
        info!("Wrote {} export for {}", kind, id);
        Ok(path)
    }

    fn stored(&self, id: &str) -> CoreResult<&Template> {
        self.store
            .get(id)
            .ok_or_else(|| CoreError::MissingReference(format!("template {id}")))
    }
}
