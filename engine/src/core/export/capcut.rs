//! CapCut Export Document
//!
//! Converts a template into the track-based JSON layout used by the
//! "Export for CapCut" action: one background video track holding a color
//! clip, followed by one track per element.

use serde::{Deserialize, Serialize};
use specta::Type;

use crate::core::template::{Element, ElementKind, Template};
use crate::core::timeline::visibility::{effective_end, effective_start};
use crate::core::{AspectRatio, CoreResult, TimeSec};

/// Format version written into every document
pub const CAPCUT_FORMAT_VERSION: &str = "1.0";

/// Top-level export document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
pub struct CapCutDocument {
    pub version: String,
    pub template: CapCutTemplate,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct CapCutTemplate {
    pub name: String,
    pub duration: u32,
    pub aspect_ratio: AspectRatio,
    pub background_color: String,
    pub tracks: Vec<CapCutTrack>,
}

/// Track type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    Video,
    Text,
    Image,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
pub struct CapCutTrack {
    #[serde(rename = "type")]
    pub track_type: TrackType,
    pub clips: Vec<CapCutClip>,
}

/// A clip on a track; the background track carries a color clip, element
/// tracks carry overlay clips.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(untagged)]
pub enum CapCutClip {
    Color(ColorClip),
    Overlay(OverlayClip),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
pub enum ColorClipType {
    Color,
}

/// Solid background clip covering the whole template
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct ColorClip {
    #[serde(rename = "type")]
    pub clip_type: ColorClipType,
    pub color: String,
    pub duration: u32,
    pub start_time: TimeSec,
}

/// Element clip
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct OverlayClip {
    /// Text content or image source
    pub content: String,
    pub start_time: TimeSec,
    pub end_time: TimeSec,
    pub position: ClipPosition,
    pub style: ClipStyle,
    pub animation: String,
}

/// Position in percent of the canvas
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
pub struct ClipPosition {
    pub x: f64,
    pub y: f64,
}

/// Text styling; empty for image clips
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct ClipStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
}

impl CapCutDocument {
    /// Builds the export document for `template`
    pub fn from_template(template: &Template) -> Self {
        let background = CapCutTrack {
            track_type: TrackType::Video,
            clips: vec![CapCutClip::Color(ColorClip {
                clip_type: ColorClipType::Color,
                color: template.background_color.clone(),
                duration: template.duration,
                start_time: 0.0,
            })],
        };

        let tracks = std::iter::once(background)
            .chain(
                template
                    .elements
                    .iter()
                    .map(|element| element_track(element, template.duration_sec())),
            )
            .collect();

        Self {
            version: CAPCUT_FORMAT_VERSION.to_string(),
            template: CapCutTemplate {
                name: template.name.clone(),
                duration: template.duration,
                aspect_ratio: template.aspect_ratio,
                background_color: template.background_color.clone(),
                tracks,
            },
        }
    }

    /// Pretty-printed JSON
    pub fn to_json_pretty(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn element_track(element: &Element, template_duration: TimeSec) -> CapCutTrack {
    let (track_type, style) = match &element.kind {
        ElementKind::Text {
            font_size,
            color,
            font_family,
            ..
        } => (
            TrackType::Text,
            ClipStyle {
                font_size: Some(*font_size),
                color: Some(color.clone()),
                font_family: Some(font_family.clone()),
            },
        ),
        ElementKind::Image { .. } => (TrackType::Image, ClipStyle::default()),
    };

    CapCutTrack {
        track_type,
        clips: vec![CapCutClip::Overlay(OverlayClip {
            content: element.content_or_src().to_string(),
            start_time: effective_start(element),
            end_time: effective_end(element, template_duration),
            position: ClipPosition {
                x: element.x,
                y: element.y,
            },
            style,
            animation: element.animation.clone(),
        })],
    }
}
