use serde::Serialize;

use crate::layout::Layout;
use crate::refine::geom::Rect;

const FREE_SPACE_MIN: f64 = 0.25;

/// Placement summary handed to a background-generation prompt.
///
/// `logo_boxes` lists every graphic except synthesized underlays, so the
/// summary reads the same whether or not underlays were added; each
/// underlay only pads a box already listed in `text_boxes`.
/// `subject_bbox` is the subject rectangle before clipping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackgroundContext {
    pub subject_bbox: Rect,
    pub text_boxes: Vec<Rect>,
    pub logo_boxes: Vec<Rect>,
    pub free_space_hints: Vec<String>,
}

/// An area the background compositor must leave clean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservedRegion {
    #[serde(rename = "type")]
    pub kind: String,
    pub bbox: Rect,
    #[serde(rename = "for", skip_serializing_if = "Option::is_none")]
    pub linked_text: Option<String>,
}

pub fn summarize_for_background(layout: &Layout) -> BackgroundContext {
    let subject = layout.subject_layout.raw_rect();

    let mut free_space_hints = Vec::new();
    let sides = [
        (subject.y, "top has ample negative space"),
        (1.0 - subject.bottom(), "bottom has ample negative space"),
        (subject.x, "left side has ample negative space"),
        (1.0 - subject.right(), "right side has ample negative space"),
    ];
    for (space, hint) in sides {
        if space > FREE_SPACE_MIN {
            free_space_hints.push(hint.to_string());
        }
    }

    BackgroundContext {
        subject_bbox: subject,
        text_boxes: layout.nongraphic_layout.iter().map(|text| text.bbox).collect(),
        logo_boxes: layout
            .graphic_layout
            .iter()
            .filter(|graphic| !graphic.is_underlay())
            .map(|graphic| graphic.bbox)
            .collect(),
        free_space_hints,
    }
}

pub fn reserved_regions(layout: &Layout) -> Vec<ReservedRegion> {
    let texts = layout.nongraphic_layout.iter().map(|text| ReservedRegion {
        kind: text.kind.clone(),
        bbox: text.bbox,
        linked_text: None,
    });
    let graphics = layout.graphic_layout.iter().map(|graphic| ReservedRegion {
        kind: graphic.kind.clone(),
        bbox: graphic.bbox,
        linked_text: graphic.linked_text.clone(),
    });
    texts.chain(graphics).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{ProposedLayout, ProposedSubject};
    use crate::refine::{RefineConfig, refine};

    fn layout_with_subject(center: [f64; 2], ratio: [f64; 2]) -> Layout {
        let proposal = ProposedLayout {
            subject_layout: Some(ProposedSubject {
                center: Some(center),
                ratio: Some(ratio),
            }),
            ..ProposedLayout::default()
        };
        refine(Some(proposal), None, &RefineConfig::default())
    }

    #[test]
    fn small_centered_subject_frees_every_side() {
        let context = summarize_for_background(&layout_with_subject([0.5, 0.5], [0.3, 0.3]));
        assert_eq!(context.free_space_hints.len(), 4);
        assert_eq!(context.text_boxes.len(), 2);
        assert_eq!(context.logo_boxes.len(), 1);
    }

    #[test]
    fn subject_near_bottom_right_frees_top_and_left() {
        let context = summarize_for_background(&layout_with_subject([0.75, 0.8], [0.4, 0.3]));
        assert_eq!(
            context.free_space_hints,
            [
                "top has ample negative space",
                "left side has ample negative space"
            ]
        );
    }

    #[test]
    fn subject_bbox_is_not_clipped() {
        let context = summarize_for_background(&layout_with_subject([0.1, 0.5], [0.4, 0.2]));
        assert!(context.subject_bbox.x < 0.0);
    }

    #[test]
    fn reserved_regions_cover_texts_logos_and_underlays() {
        let layout = layout_with_subject([0.5, 0.5], [0.3, 0.3]);
        let regions = reserved_regions(&layout);
        assert_eq!(regions.len(), 5);
        let linked: Vec<_> = regions
            .iter()
            .filter_map(|region| region.linked_text.as_deref())
            .collect();
        assert_eq!(linked, ["headline#0", "headline#1"]);
    }
}
