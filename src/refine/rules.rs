use tracing::debug;

use crate::layout::{DEFAULT_CONFIDENCE, GraphicRegion, ProposedGraphic, ProposedText, TextRegion};

use super::RefineConfig;
use super::geom::{Rect, iou};

const DEFAULT_TEXT_KIND: &str = "text";
const DEFAULT_GRAPHIC_KIND: &str = "graphic";

pub(super) fn filter_texts(
    texts: Vec<ProposedText>,
    subject: &Rect,
    config: &RefineConfig,
) -> Vec<TextRegion> {
    texts
        .into_iter()
        .filter_map(|text| {
            let Some(bbox) = text.bbox.map(|bbox| bbox.clip()) else {
                debug!("text candidate without a usable bbox dropped");
                return None;
            };
            if !is_text_placement_valid(&bbox, subject, config) {
                return None;
            }
            Some(TextRegion {
                kind: text.kind.unwrap_or_else(|| DEFAULT_TEXT_KIND.to_string()),
                bbox,
                confidence: confidence_or_default(text.confidence),
                id: text.id,
                extra: text.extra,
            })
        })
        .collect()
}

fn is_text_placement_valid(bbox: &Rect, subject: &Rect, config: &RefineConfig) -> bool {
    let overlap = iou(bbox, subject);
    if overlap >= config.text_subject_iou_max {
        debug!("text {:?} covers the subject (iou {:.3})", bbox, overlap);
        return false;
    }
    if !bbox.within_margin(config.text_edge_margin) {
        debug!("text {:?} too close to the image edge", bbox);
        return false;
    }
    if bbox.aspect_ratio() < config.text_min_aspect {
        debug!("text {:?} not landscape enough", bbox);
        return false;
    }
    true
}

pub(super) fn filter_graphics(
    graphics: Vec<ProposedGraphic>,
    subject: &Rect,
    config: &RefineConfig,
) -> Vec<GraphicRegion> {
    graphics
        .into_iter()
        .filter_map(|graphic| {
            let Some(bbox) = graphic.bbox.map(|bbox| bbox.clip()) else {
                debug!("graphic candidate without a usable bbox dropped");
                return None;
            };
            let kind = graphic
                .kind
                .unwrap_or_else(|| DEFAULT_GRAPHIC_KIND.to_string());
            let region = GraphicRegion {
                kind,
                content: graphic.content,
                linked_text: None,
                bbox,
                style: None,
                confidence: confidence_or_default(graphic.confidence),
                extra: graphic.extra,
            };
            // Underlays are derived from the final text regions.
            if region.is_underlay() {
                debug!("proposed underlay dropped");
                return None;
            }
            let overlap = iou(&bbox, subject);
            if overlap > config.graphic_subject_iou_max {
                debug!("graphic {:?} covers the subject (iou {:.3})", bbox, overlap);
                return None;
            }
            Some(region)
        })
        .collect()
}

fn confidence_or_default(value: Option<f64>) -> f64 {
    value
        .filter(|value| value.is_finite())
        .map(|value| value.clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_CONFIDENCE)
}
