mod fallback;
pub mod geom;
mod normalize;
mod rules;
mod suppress;
mod underlay;

use tracing::debug;

use crate::layout::{ImageDims, Layout, ProposedLayout, SubjectLayout};

/// Thresholds and box sizes used by [`refine`].
#[derive(Debug, Clone, PartialEq)]
pub struct RefineConfig {
    /// Text whose IoU with the subject reaches this is dropped.
    pub text_subject_iou_max: f64,
    /// Minimum distance between text and every image edge.
    pub text_edge_margin: f64,
    /// Minimum `w / h` of a text box.
    pub text_min_aspect: f64,
    /// Graphics whose IoU with the subject exceeds this are dropped.
    pub graphic_subject_iou_max: f64,
    pub text_nms_iou: f64,
    pub graphic_nms_iou: f64,
    /// Height of the injected headline bands.
    pub headline_h: f64,
    /// Inset of injected bands and logo from the image border.
    pub fallback_margin: f64,
    pub band_shrink_iou: f64,
    pub band_min_h: f64,
    /// `(w, h)` of the injected logo.
    pub logo_box: (f64, f64),
    pub logo_relocate_iou: f64,
    pub underlay_pad: f64,
    pub underlay_radius: f64,
    pub underlay_opacity: f64,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            text_subject_iou_max: 0.2,
            text_edge_margin: 0.03,
            text_min_aspect: 1.8,
            graphic_subject_iou_max: 0.4,
            text_nms_iou: 0.3,
            graphic_nms_iou: 0.3,
            headline_h: 0.12,
            fallback_margin: 0.04,
            band_shrink_iou: 0.1,
            band_min_h: 0.05,
            logo_box: (0.25, 0.10),
            logo_relocate_iou: 0.3,
            underlay_pad: 0.015,
            underlay_radius: 0.08,
            underlay_opacity: 0.6,
        }
    }
}

/// Turns a raw layout proposal into a clean placement plan.
///
/// Stages run once, in order: normalize coordinates, filter text and graphic
/// candidates against the subject, suppress overlaps within each category,
/// inject fallbacks for empty categories, then add one underlay per text.
/// Never fails; the result always holds at least one text and one graphic.
pub fn refine(
    proposal: Option<ProposedLayout>,
    dims: Option<ImageDims>,
    config: &RefineConfig,
) -> Layout {
    let proposal = normalize::normalize_layout(proposal.unwrap_or_default(), dims);
    let subject_layout = proposal
        .subject_layout
        .as_ref()
        .map(|subject| SubjectLayout {
            center: subject.center_or_default(),
            ratio: subject.ratio_or_default(),
        })
        .unwrap_or_default();
    let subject = subject_layout.rect();

    let proposed_texts = proposal.nongraphic_layout.len();
    let proposed_graphics = proposal.graphic_layout.len();
    let texts = rules::filter_texts(proposal.nongraphic_layout, &subject, config);
    let graphics = rules::filter_graphics(proposal.graphic_layout, &subject, config);

    let mut texts = suppress::suppress_overlaps(texts, config.text_nms_iou);
    let mut graphics = suppress::suppress_overlaps(graphics, config.graphic_nms_iou);
    debug!(
        "kept {}/{} text and {}/{} graphic candidates",
        texts.len(),
        proposed_texts,
        graphics.len(),
        proposed_graphics
    );

    fallback::ensure_texts(&mut texts, &subject, config);
    fallback::ensure_graphics(&mut graphics, &subject, config);
    for (idx, text) in texts.iter_mut().enumerate() {
        if text.id.is_none() {
            text.id = Some(format!("text#{idx}"));
        }
    }

    let underlays = underlay::underlays_for(&texts, config);
    graphics.extend(underlays);

    Layout {
        subject_layout,
        nongraphic_layout: texts,
        graphic_layout: graphics,
    }
}
