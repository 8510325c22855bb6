use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::refine::geom::{Rect, serialize_rounded, serialize_rounded_pair};

pub const DEFAULT_SUBJECT_CENTER: [f64; 2] = [0.5, 0.5];
pub const DEFAULT_SUBJECT_RATIO: [f64; 2] = [0.3, 0.3];
pub const DEFAULT_CONFIDENCE: f64 = 0.5;
pub const UNDERLAY_KIND: &str = "underlay";

/// Pixel size of the image a proposal was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDims {
    pub width: u32,
    pub height: u32,
}

impl ImageDims {
    pub fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self { width, height })
    }
}

// Proposed layout, as returned by the model. Every field is optional and
// tolerant: a value of the wrong shape reads as absent instead of failing
// the whole document.

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProposedLayout {
    #[serde(default, deserialize_with = "lenient")]
    pub subject_layout: Option<ProposedSubject>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub nongraphic_layout: Vec<ProposedText>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub graphic_layout: Vec<ProposedGraphic>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProposedSubject {
    #[serde(default, deserialize_with = "lenient")]
    pub center: Option<[f64; 2]>,
    #[serde(default, deserialize_with = "lenient")]
    pub ratio: Option<[f64; 2]>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProposedText {
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub bbox: Option<Rect>,
    #[serde(default, deserialize_with = "lenient")]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProposedGraphic {
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub kind: Option<String>,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub bbox: Option<Rect>,
    #[serde(default, deserialize_with = "lenient")]
    pub confidence: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProposedSubject {
    pub fn center_or_default(&self) -> [f64; 2] {
        self.center.unwrap_or(DEFAULT_SUBJECT_CENTER)
    }

    pub fn ratio_or_default(&self) -> [f64; 2] {
        self.ratio.unwrap_or(DEFAULT_SUBJECT_RATIO)
    }
}

// Refined layout. Every rectangle is present and lies in the unit square.

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub subject_layout: SubjectLayout,
    pub nongraphic_layout: Vec<TextRegion>,
    pub graphic_layout: Vec<GraphicRegion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubjectLayout {
    #[serde(serialize_with = "serialize_rounded_pair")]
    pub center: [f64; 2],
    #[serde(serialize_with = "serialize_rounded_pair")]
    pub ratio: [f64; 2],
}

impl SubjectLayout {
    /// The subject rectangle before clipping; may reach outside the image.
    pub fn raw_rect(&self) -> Rect {
        let [cx, cy] = self.center;
        let [rw, rh] = self.ratio;
        Rect::from_center(cx, cy, rw, rh)
    }

    pub fn rect(&self) -> Rect {
        self.raw_rect().clip()
    }
}

impl Default for SubjectLayout {
    fn default() -> Self {
        Self {
            center: DEFAULT_SUBJECT_CENTER,
            ratio: DEFAULT_SUBJECT_RATIO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRegion {
    #[serde(rename = "type")]
    pub kind: String,
    pub bbox: Rect,
    #[serde(serialize_with = "serialize_rounded")]
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphicRegion {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    /// Id of the text region an underlay sits behind.
    #[serde(rename = "for", skip_serializing_if = "Option::is_none")]
    pub linked_text: Option<String>,
    pub bbox: Rect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<UnderlayStyle>,
    #[serde(serialize_with = "serialize_rounded")]
    pub confidence: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GraphicRegion {
    pub fn is_underlay(&self) -> bool {
        self.kind == UNDERLAY_KIND
    }
}

/// Rendering hints carried by an underlay; not interpreted here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnderlayStyle {
    pub shape: String,
    #[serde(serialize_with = "serialize_rounded")]
    pub radius: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub opacity: f64,
}

/// Bounding box of a scored candidate, as seen by overlap suppression.
pub(crate) trait Scored {
    fn bbox(&self) -> &Rect;
    fn confidence(&self) -> f64;
}

impl Scored for TextRegion {
    fn bbox(&self) -> &Rect {
        &self.bbox
    }

    fn confidence(&self) -> f64 {
        self.confidence
    }
}

impl Scored for GraphicRegion {
    fn bbox(&self) -> &Rect {
        &self.bbox
    }

    fn confidence(&self) -> f64 {
        self.confidence
    }
}

pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

pub(crate) fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_a_well_formed_layout() {
        let layout: ProposedLayout = serde_json::from_value(json!({
            "subject_layout": { "center": [0.5, 0.6], "ratio": [0.3, 0.4] },
            "nongraphic_layout": [
                { "type": "headline", "bbox": [0.1, 0.05, 0.5, 0.1], "confidence": 0.8 }
            ],
            "graphic_layout": [
                { "type": "logo", "content": "", "bbox": [0.7, 0.05, 0.2, 0.1], "confidence": 0.6 }
            ]
        }))
        .unwrap();

        let subject = layout.subject_layout.unwrap();
        assert_eq!(subject.center, Some([0.5, 0.6]));
        assert_eq!(subject.ratio, Some([0.3, 0.4]));
        assert_eq!(layout.nongraphic_layout.len(), 1);
        assert_eq!(layout.nongraphic_layout[0].kind.as_deref(), Some("headline"));
        assert_eq!(layout.graphic_layout[0].content, Some(json!("")));
    }

    #[test]
    fn malformed_fields_read_as_absent() {
        let layout: ProposedLayout = serde_json::from_value(json!({
            "subject_layout": { "center": "middle", "ratio": [0.3] },
            "nongraphic_layout": [
                { "type": "headline", "bbox": [0.1, 0.2, 0.3], "confidence": "high" },
                "not a candidate",
                { "type": "subhead" }
            ],
            "graphic_layout": { "type": "logo" }
        }))
        .unwrap();

        let subject = layout.subject_layout.unwrap();
        assert_eq!(subject.center_or_default(), DEFAULT_SUBJECT_CENTER);
        assert_eq!(subject.ratio_or_default(), DEFAULT_SUBJECT_RATIO);
        assert_eq!(layout.nongraphic_layout.len(), 2);
        assert!(layout.nongraphic_layout[0].bbox.is_none());
        assert!(layout.nongraphic_layout[0].confidence.is_none());
        assert!(layout.graphic_layout.is_empty());
    }

    #[test]
    fn unknown_candidate_fields_survive() {
        let text: ProposedText = serde_json::from_value(json!({
            "type": "headline",
            "bbox": [0.1, 0.1, 0.5, 0.1],
            "copy": "Glow all day"
        }))
        .unwrap();
        assert_eq!(text.extra.get("copy"), Some(&json!("Glow all day")));
    }

    #[test]
    fn zero_dimensions_are_unknown() {
        assert!(ImageDims::new(0, 480).is_none());
        assert_eq!(
            ImageDims::new(640, 480),
            Some(ImageDims {
                width: 640,
                height: 480
            })
        );
    }
}
