//! Template Export
//!
//! Write-only JSON artifacts produced from a template:
//!
//! - `capcut`: track-based document for the "Export for CapCut" action
//! - raw export: the template serialized verbatim (library export)
//!
//! There is no import path for either format.

pub mod capcut;

pub use capcut::{CapCutClip, CapCutDocument, CapCutTrack, TrackType, CAPCUT_FORMAT_VERSION};

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use specta::Type;
use tracing::info;

use crate::core::template::Template;
use crate::core::{fs, CoreError, CoreResult};

/// Which export document to produce
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub enum ExportKind {
    /// Track-based CapCut document
    #[default]
    CapCut,
    /// Raw template dump
    Template,
}

impl ExportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::CapCut => "capcut",
            ExportKind::Template => "template",
        }
    }

    /// Suffix appended to the sanitized template name
    pub fn file_suffix(&self) -> &'static str {
        match self {
            ExportKind::CapCut => "_capcut.json",
            ExportKind::Template => "_template.json",
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "capcut" => Ok(ExportKind::CapCut),
            "template" | "raw" => Ok(ExportKind::Template),
            other => Err(CoreError::Internal(format!("Unknown export kind: {other}"))),
        }
    }
}

/// Serializes the CapCut document for `template`
pub fn export_capcut_json(template: &Template) -> CoreResult<String> {
    CapCutDocument::from_template(template).to_json_pretty()
}

/// Serializes `template` verbatim
pub fn export_raw_json(template: &Template) -> CoreResult<String> {
    Ok(serde_json::to_string_pretty(template)?)
}

/// Renders `template` as the requested document
pub fn export_json(template: &Template, kind: ExportKind) -> CoreResult<String> {
    match kind {
        ExportKind::CapCut => export_capcut_json(template),
        ExportKind::Template => export_raw_json(template),
    }
}

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Download file name for a template: whitespace runs become `_`, then the
/// kind suffix is appended. Path separators are replaced as well so the name
/// always stays inside the export directory.
pub fn export_file_name(name: &str, kind: ExportKind) -> String {
    let collapsed = whitespace_runs().replace_all(name, "_");
    let safe: String = collapsed
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c => c,
        })
        .collect();
    format!("{safe}{}", kind.file_suffix())
}

/// Writes the export for `template` into `dir` and returns the file path
pub fn write_export(dir: &Path, template: &Template, kind: ExportKind) -> CoreResult<PathBuf> {
    let json = export_json(template, kind)?;
    let path = dir.join(export_file_name(&template.name, kind));
    fs::atomic_write_bytes(&path, json.as_bytes())?;
    info!("Exported '{}' as {} to {}", template.name, kind, path.display());
    Ok(path)
}
