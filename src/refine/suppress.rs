use std::cmp::Ordering;

use crate::layout::Scored;

use super::geom::iou;

/// Greedy non-max suppression: highest confidence first, ties in input order.
/// A candidate is kept only while its IoU with every kept one stays below
/// `threshold`.
pub(super) fn suppress_overlaps<T: Scored>(items: Vec<T>, threshold: f64) -> Vec<T> {
    let mut sorted = items;
    sorted.sort_by(|a, b| {
        b.confidence()
            .partial_cmp(&a.confidence())
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<T> = Vec::new();
    for item in sorted {
        if kept
            .iter()
            .all(|existing| iou(existing.bbox(), item.bbox()) < threshold)
        {
            kept.push(item);
        }
    }
    kept
}
