//! Template Models
//!
//! Core data structures for templates and their overlay elements.

use serde::{Deserialize, Serialize};
use specta::Type;

use crate::core::{numeric_input_or, AspectRatio, ElementId, TemplateId, TimeSec};

// =============================================================================
// Defaults
// =============================================================================

/// Default template duration in seconds
pub const DEFAULT_DURATION_SEC: u32 = 15;

/// Shortest allowed template duration in seconds
pub const MIN_DURATION_SEC: u32 = 1;

/// Longest allowed template duration in seconds
pub const MAX_DURATION_SEC: u32 = 300;

/// Default canvas background
pub const DEFAULT_BACKGROUND_COLOR: &str = "#000000";

pub const DEFAULT_TEXT_CONTENT: &str = "Your Text Here";
pub const DEFAULT_FONT_SIZE: u32 = 24;
pub const DEFAULT_TEXT_COLOR: &str = "#ffffff";
pub const DEFAULT_FONT_FAMILY: &str = "Arial";
pub const DEFAULT_IMAGE_SIZE: u32 = 200;

/// Elements are dropped at the canvas center (percent coordinates)
pub const DEFAULT_POSITION_PERCENT: f64 = 50.0;

// =============================================================================
// Element
// =============================================================================

/// Variant-specific payload of an element
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ElementKind {
    /// Text overlay
    Text {
        content: String,
        /// Font size in px
        #[serde(rename = "fontSize")]
        font_size: u32,
        /// Text color in hex format
        color: String,
        #[serde(rename = "fontFamily")]
        font_family: String,
    },
    /// Image overlay
    Image {
        /// Image URL; empty until the user picks one
        src: String,
        /// Width in px
        width: u32,
        /// Height in px
        height: u32,
    },
}

impl ElementKind {
    /// Returns the default payload for a given tag
    pub fn default_for(tag: ElementKindTag) -> Self {
        match tag {
            ElementKindTag::Text => ElementKind::Text {
                content: DEFAULT_TEXT_CONTENT.to_string(),
                font_size: DEFAULT_FONT_SIZE,
                color: DEFAULT_TEXT_COLOR.to_string(),
                font_family: DEFAULT_FONT_FAMILY.to_string(),
            },
            ElementKindTag::Image => ElementKind::Image {
                src: String::new(),
                width: DEFAULT_IMAGE_SIZE,
                height: DEFAULT_IMAGE_SIZE,
            },
        }
    }

    pub fn tag(&self) -> ElementKindTag {
        match self {
            ElementKind::Text { .. } => ElementKindTag::Text,
            ElementKind::Image { .. } => ElementKindTag::Image,
        }
    }
}

/// Discriminant of [`ElementKind`], used when creating elements
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub enum ElementKindTag {
    Text,
    Image,
}

impl ElementKindTag {
    /// Returns the lowercase name used as a track type on export
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKindTag::Text => "text",
            ElementKindTag::Image => "image",
        }
    }

    /// Entrance animation tag assigned to new elements of this kind
    pub fn default_animation(&self) -> &'static str {
        match self {
            ElementKindTag::Text => "fadeIn",
            ElementKindTag::Image => "slideIn",
        }
    }
}

impl std::fmt::Display for ElementKindTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A positioned overlay on the template canvas
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    /// Horizontal position, percent of canvas width
    pub x: f64,
    /// Vertical position, percent of canvas height
    pub y: f64,
    /// Visibility window start
    pub start_time: TimeSec,
    /// Visibility window end. Captured from the template duration when the
    /// element is created and not re-synced afterwards.
    pub end_time: TimeSec,
    /// Free-form animation tag, interpreted by renderers only
    pub animation: String,
    pub kind: ElementKind,
}

impl Element {
    /// Creates an element with the default payload for `tag`
    pub fn new(id: ElementId, tag: ElementKindTag, end_time: TimeSec) -> Self {
        Self {
            id,
            x: DEFAULT_POSITION_PERCENT,
            y: DEFAULT_POSITION_PERCENT,
            start_time: 0.0,
            end_time,
            animation: tag.default_animation().to_string(),
            kind: ElementKind::default_for(tag),
        }
    }

    pub fn tag(&self) -> ElementKindTag {
        self.kind.tag()
    }

    /// Text content for text elements, source URL for images
    pub fn content_or_src(&self) -> &str {
        match &self.kind {
            ElementKind::Text { content, .. } => content,
            ElementKind::Image { src, .. } => src,
        }
    }

    /// Merges the set fields of `patch` into this element.
    ///
    /// Fields that belong to the other variant are ignored.
    pub fn apply(&mut self, patch: &ElementPatch) {
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(start) = patch.start_time {
            self.start_time = start;
        }
        if let Some(end) = patch.end_time {
            self.end_time = end;
        }
        if let Some(animation) = &patch.animation {
            self.animation = animation.clone();
        }

        match &mut self.kind {
            ElementKind::Text {
                content,
                font_size,
                color,
                font_family,
            } => {
                if let Some(v) = &patch.content {
                    *content = v.clone();
                }
                if let Some(v) = patch.font_size {
                    *font_size = v;
                }
                if let Some(v) = &patch.color {
                    *color = v.clone();
                }
                if let Some(v) = &patch.font_family {
                    *font_family = v.clone();
                }
            }
            ElementKind::Image { src, width, height } => {
                if let Some(v) = &patch.src {
                    *src = v.clone();
                }
                if let Some(v) = patch.width {
                    *width = v;
                }
                if let Some(v) = patch.height {
                    *height = v;
                }
            }
        }
    }
}

// =============================================================================
// Element Patch
// =============================================================================

/// Partial element update. `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub start_time: Option<TimeSec>,
    pub end_time: Option<TimeSec>,
    pub animation: Option<String>,
    // Text
    pub content: Option<String>,
    pub font_size: Option<u32>,
    pub color: Option<String>,
    pub font_family: Option<String>,
    // Image
    pub src: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ElementPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the element to the given percent coordinates
    pub fn position(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Sets the visibility window
    pub fn window(mut self, start: TimeSec, end: TimeSec) -> Self {
        self.start_time = Some(start);
        self.end_time = Some(end);
        self
    }

    pub fn animation(mut self, animation: impl Into<String>) -> Self {
        self.animation = Some(animation.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn font_size(mut self, size: u32) -> Self {
        self.font_size = Some(size);
        self
    }

    /// Sets the font size from raw input, falling back to 24
    pub fn font_size_input(self, input: &str) -> Self {
        self.font_size(numeric_input_or("fontSize", input, DEFAULT_FONT_SIZE))
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = Some(family.into());
        self
    }

    pub fn src(mut self, src: impl Into<String>) -> Self {
        self.src = Some(src.into());
        self
    }

    /// Sets the image size in px
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Sets the image width from raw input, falling back to 200
    pub fn width_input(mut self, input: &str) -> Self {
        self.width = Some(numeric_input_or("width", input, DEFAULT_IMAGE_SIZE));
        self
    }

    /// Sets the image height from raw input, falling back to 200
    pub fn height_input(mut self, input: &str) -> Self {
        self.height = Some(numeric_input_or("height", input, DEFAULT_IMAGE_SIZE));
        self
    }

    /// Returns true when the patch sets nothing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// =============================================================================
// Template
// =============================================================================

/// Main template structure
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Store-assigned id; `None` until the template is first saved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<TemplateId>,
    /// Display name
    pub name: String,
    /// Duration in whole seconds
    pub duration: u32,
    pub aspect_ratio: AspectRatio,
    /// Canvas background (hex)
    pub background_color: String,
    /// Overlays in list order (later elements draw on top)
    pub elements: Vec<Element>,
    /// RFC 3339 timestamp of the first save
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Template {
    /// Creates an unsaved template with default settings
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the duration
    pub fn with_duration(mut self, duration: u32) -> Self {
        self.duration = duration;
        self
    }

    /// Sets the aspect ratio
    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    /// Sets the background color
    pub fn with_background(mut self, color: impl Into<String>) -> Self {
        self.background_color = color.into();
        self
    }

    /// Appends an element
    pub fn with_element(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }

    /// Duration as fractional seconds for timeline math
    pub fn duration_sec(&self) -> TimeSec {
        self.duration as TimeSec
    }

    /// Whether the store has assigned this template an id
    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    /// Largest element id in use, if any
    pub fn max_element_id(&self) -> Option<ElementId> {
        self.elements.iter().map(|e| e.id).max()
    }

    /// Checks that the template can be committed (non-blank name)
    pub fn validate(&self) -> Result<(), crate::core::ValidationError> {
        if self.name.trim().is_empty() {
            return Err(crate::core::ValidationError::EmptyName);
        }
        Ok(())
    }
}

impl Default for Template {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            duration: DEFAULT_DURATION_SEC,
            aspect_ratio: AspectRatio::default(),
            background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
            elements: Vec::new(),
            created_at: None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Element Tests
    // ========================================================================

    #[test]
    fn test_text_element_defaults() {
        let element = Element::new(1, ElementKindTag::Text, 15.0);

        assert_eq!(element.x, 50.0);
        assert_eq!(element.y, 50.0);
        assert_eq!(element.start_time, 0.0);
        assert_eq!(element.end_time, 15.0);
        assert_eq!(element.animation, "fadeIn");
        assert_eq!(
            element.kind,
            ElementKind::Text {
                content: "Your Text Here".to_string(),
                font_size: 24,
                color: "#ffffff".to_string(),
                font_family: "Arial".to_string(),
            }
        );
    }

    #[test]
    fn test_image_element_defaults() {
        let element = Element::new(2, ElementKindTag::Image, 8.0);

        assert_eq!(element.animation, "slideIn");
        assert_eq!(element.tag(), ElementKindTag::Image);
        assert_eq!(element.content_or_src(), "");
        assert_eq!(
            element.kind,
            ElementKind::Image {
                src: String::new(),
                width: 200,
                height: 200,
            }
        );
    }

    #[test]
    fn test_apply_patch_merges_only_set_fields() {
        let mut element = Element::new(1, ElementKindTag::Text, 10.0);
        element.apply(&ElementPatch::new().content("Hello").position(10.0, 20.0));

        assert_eq!(element.content_or_src(), "Hello");
        assert_eq!(element.x, 10.0);
        assert_eq!(element.y, 20.0);
        assert_eq!(element.end_time, 10.0);
        assert_eq!(element.animation, "fadeIn");
    }

    #[test]
    fn test_apply_patch_ignores_other_variant_fields() {
        let mut image = Element::new(1, ElementKindTag::Image, 10.0);
        let before = image.clone();
        image.apply(&ElementPatch::new().content("ignored").font_size(99));
        assert_eq!(image, before);

        let mut text = Element::new(2, ElementKindTag::Text, 10.0);
        let before = text.clone();
        text.apply(&ElementPatch::new().src("https://example.com/a.png").size(10, 10));
        assert_eq!(text, before);
    }

    #[test]
    fn test_patch_numeric_inputs_fall_back() {
        let patch = ElementPatch::new()
            .font_size_input("huge")
            .width_input("0")
            .height_input("480");

        assert_eq!(patch.font_size, Some(24));
        assert_eq!(patch.width, Some(200));
        assert_eq!(patch.height, Some(480));
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(ElementPatch::new().is_empty());
        assert!(!ElementPatch::new().color("#ff0000").is_empty());
    }

    #[test]
    fn test_element_serialization_is_tagged() {
        let element = Element::new(7, ElementKindTag::Text, 5.0);
        let json = serde_json::to_value(&element).unwrap();

        assert_eq!(json["id"], 7);
        assert_eq!(json["startTime"], 0.0);
        assert_eq!(json["endTime"], 5.0);
        assert_eq!(json["kind"]["type"], "text");
        assert_eq!(json["kind"]["fontSize"], 24);
        assert_eq!(json["kind"]["fontFamily"], "Arial");
    }

    // ========================================================================
    // Template Tests
    // ========================================================================

    #[test]
    fn test_template_defaults() {
        let template = Template::default();

        assert!(template.id.is_none());
        assert!(template.name.is_empty());
        assert_eq!(template.duration, 15);
        assert_eq!(template.aspect_ratio, AspectRatio::Vertical);
        assert_eq!(template.background_color, "#000000");
        assert!(template.elements.is_empty());
        assert!(template.created_at.is_none());
        assert!(!template.is_saved());
    }

    #[test]
    fn test_template_builder_pattern() {
        let template = Template::new("Intro")
            .with_duration(5)
            .with_aspect_ratio(AspectRatio::Horizontal)
            .with_background("#112233")
            .with_element(Element::new(1, ElementKindTag::Text, 5.0));

        assert_eq!(template.name, "Intro");
        assert_eq!(template.duration_sec(), 5.0);
        assert_eq!(template.elements.len(), 1);
        assert_eq!(template.max_element_id(), Some(1));
        assert!(template.element(1).is_some());
        assert!(template.element(2).is_none());
    }

    #[test]
    fn test_template_validate_blank_name() {
        assert!(Template::new("  \t").validate().is_err());
        assert!(Template::new("Ok").validate().is_ok());
    }

    #[test]
    fn test_template_serialization() {
        let template = Template::new("Test Template").with_aspect_ratio(AspectRatio::Square);

        let json = serde_json::to_value(&template).unwrap();
        assert!(json.get("id").is_none());
        assert!(json.get("createdAt").is_none());
        assert_eq!(json["aspectRatio"], "1:1");
        assert_eq!(json["backgroundColor"], "#000000");

        let parsed: Template = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, template);
    }
}
