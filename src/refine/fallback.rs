use serde_json::{Map, Value};
use tracing::debug;

use crate::layout::{GraphicRegion, TextRegion};

use super::RefineConfig;
use super::geom::{Rect, iou};

const FALLBACK_CONFIDENCE: f64 = 0.5;
const FALLBACK_TEXT_KIND: &str = "headline";
const FALLBACK_GRAPHIC_KIND: &str = "logo";

/// Two full-width headline bands, top and bottom, when no text survived.
pub(super) fn ensure_texts(texts: &mut Vec<TextRegion>, subject: &Rect, config: &RefineConfig) {
    if !texts.is_empty() {
        return;
    }
    let margin = config.fallback_margin;
    let height = config.headline_h;
    let width = 1.0 - 2.0 * margin;
    let top = Rect::new(margin, margin, width, height).clip();
    let bottom = Rect::new(margin, 1.0 - margin - height, width, height).clip();

    debug!("no text regions left; injecting top and bottom bands");
    for band in [top, bottom] {
        texts.push(TextRegion {
            kind: FALLBACK_TEXT_KIND.to_string(),
            bbox: shrink_if_occluding(band, subject, config),
            confidence: FALLBACK_CONFIDENCE,
            id: None,
            extra: Map::new(),
        });
    }
}

// Single correction; a halved band that still overlaps is accepted.
fn shrink_if_occluding(band: Rect, subject: &Rect, config: &RefineConfig) -> Rect {
    if iou(&band, subject) < config.band_shrink_iou {
        return band;
    }
    Rect {
        h: (band.h * 0.5).max(config.band_min_h),
        ..band
    }
}

/// One logo in the top-right corner, or top-left when that covers the subject.
pub(super) fn ensure_graphics(
    graphics: &mut Vec<GraphicRegion>,
    subject: &Rect,
    config: &RefineConfig,
) {
    if !graphics.is_empty() {
        return;
    }
    let margin = config.fallback_margin;
    let (logo_w, logo_h) = config.logo_box;
    let mut logo = Rect::new(1.0 - margin - logo_w, margin, logo_w, logo_h).clip();
    if iou(&logo, subject) >= config.logo_relocate_iou {
        logo = Rect::new(margin, margin, logo_w, logo_h).clip();
    }

    debug!("no graphic regions left; injecting logo at {:?}", logo);
    graphics.push(GraphicRegion {
        kind: FALLBACK_GRAPHIC_KIND.to_string(),
        content: Some(Value::String(String::new())),
        linked_text: None,
        bbox: logo,
        style: None,
        confidence: FALLBACK_CONFIDENCE,
        extra: Map::new(),
    });
}
