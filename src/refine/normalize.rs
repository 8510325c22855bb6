use crate::layout::{ImageDims, ProposedLayout, ProposedSubject};

use super::geom::{Rect, clip01};

/// Brings every coordinate of a proposal into the unit square.
///
/// Each rectangle (and the subject center and ratio separately) is inspected
/// on its own: when any component exceeds 1.0 the values are taken as pixels
/// and divided by the image size. Without known dimensions only clipping is
/// applied.
pub(crate) fn normalize_layout(layout: ProposedLayout, dims: Option<ImageDims>) -> ProposedLayout {
    let subject = layout.subject_layout.unwrap_or_default();
    let center = normalize_pair(subject.center_or_default(), dims);
    let ratio = normalize_pair(subject.ratio_or_default(), dims);

    let nongraphic_layout = layout
        .nongraphic_layout
        .into_iter()
        .map(|mut text| {
            text.bbox = text.bbox.map(|bbox| normalize_rect(bbox, dims));
            text
        })
        .collect();
    let graphic_layout = layout
        .graphic_layout
        .into_iter()
        .map(|mut graphic| {
            graphic.bbox = graphic.bbox.map(|bbox| normalize_rect(bbox, dims));
            graphic
        })
        .collect();

    ProposedLayout {
        subject_layout: Some(ProposedSubject {
            center: Some(center),
            ratio: Some(ratio),
        }),
        nongraphic_layout,
        graphic_layout,
    }
}

fn normalize_pair(pair: [f64; 2], dims: Option<ImageDims>) -> [f64; 2] {
    let [mut a, mut b] = pair;
    if let Some(dims) = dims
        && a.max(b) > 1.0
    {
        a /= dims.width as f64;
        b /= dims.height as f64;
    }
    [clip01(a), clip01(b)]
}

pub(crate) fn normalize_rect(rect: Rect, dims: Option<ImageDims>) -> Rect {
    let Some(dims) = dims else {
        return rect.clip();
    };
    if rect.max_component() <= 1.0 {
        return rect.clip();
    }
    let width = dims.width as f64;
    let height = dims.height as f64;
    Rect::new(
        rect.x / width,
        rect.y / height,
        rect.w / width,
        rect.h / height,
    )
    .clip()
}
