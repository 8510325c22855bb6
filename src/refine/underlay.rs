use serde_json::Map;

use crate::layout::{GraphicRegion, TextRegion, UNDERLAY_KIND, UnderlayStyle};

use super::RefineConfig;

const UNDERLAY_SHAPE: &str = "rounded";
const UNDERLAY_CONFIDENCE_BOOST: f64 = 0.1;
const UNDERLAY_CONFIDENCE_MAX: f64 = 0.9;

/// One translucent backing box per text region, linked by `"<type>#<index>"`.
pub(super) fn underlays_for(texts: &[TextRegion], config: &RefineConfig) -> Vec<GraphicRegion> {
    texts
        .iter()
        .enumerate()
        .map(|(idx, text)| GraphicRegion {
            kind: UNDERLAY_KIND.to_string(),
            content: None,
            linked_text: Some(format!("{}#{}", text.kind, idx)),
            bbox: text.bbox.expand(config.underlay_pad),
            style: Some(UnderlayStyle {
                shape: UNDERLAY_SHAPE.to_string(),
                radius: config.underlay_radius,
                opacity: config.underlay_opacity,
            }),
            confidence: (text.confidence + UNDERLAY_CONFIDENCE_BOOST).min(UNDERLAY_CONFIDENCE_MAX),
            extra: Map::new(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refine::geom::Rect;

    fn text(kind: &str, bbox: Rect, confidence: f64) -> TextRegion {
        TextRegion {
            kind: kind.to_string(),
            bbox,
            confidence,
            id: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn underlay_wraps_its_text() {
        let texts = vec![
            text("headline", Rect::new(0.1, 0.05, 0.5, 0.1), 0.8),
            text("subhead", Rect::new(0.1, 0.8, 0.6, 0.08), 0.5),
        ];
        let underlays = underlays_for(&texts, &RefineConfig::default());

        assert_eq!(underlays.len(), 2);
        assert_eq!(underlays[0].linked_text.as_deref(), Some("headline#0"));
        assert_eq!(underlays[1].linked_text.as_deref(), Some("subhead#1"));
        for (underlay, text) in underlays.iter().zip(&texts) {
            assert!(underlay.is_underlay());
            assert!(underlay.bbox.contains(&text.bbox));
        }

        let bbox = underlays[0].bbox;
        assert!((bbox.x - 0.085).abs() < 1e-9);
        assert!((bbox.y - 0.035).abs() < 1e-9);
        assert!((bbox.w - 0.53).abs() < 1e-9);
        assert!((bbox.h - 0.13).abs() < 1e-9);
    }

    #[test]
    fn confidence_is_boosted_and_capped() {
        let texts = vec![
            text("headline", Rect::new(0.1, 0.1, 0.5, 0.1), 0.85),
            text("headline", Rect::new(0.1, 0.7, 0.5, 0.1), 0.4),
        ];
        let underlays = underlays_for(&texts, &RefineConfig::default());
        assert_eq!(underlays[0].confidence, 0.9);
        assert!((underlays[1].confidence - 0.5).abs() < 1e-12);
    }

    #[test]
    fn style_hints_follow_config() {
        let config = RefineConfig {
            underlay_radius: 0.12,
            underlay_opacity: 0.4,
            ..RefineConfig::default()
        };
        let underlays = underlays_for(
            &[text("headline", Rect::new(0.1, 0.1, 0.5, 0.1), 0.5)],
            &config,
        );
        let style = underlays[0].style.as_ref().unwrap();
        assert_eq!(style.shape, "rounded");
        assert_eq!(style.radius, 0.12);
        assert_eq!(style.opacity, 0.4);
    }

    #[test]
    fn underlay_at_image_edge_is_clipped() {
        let underlays = underlays_for(
            &[text("headline", Rect::new(0.0, 0.9, 1.0, 0.1), 0.5)],
            &RefineConfig::default(),
        );
        let bbox = underlays[0].bbox;
        assert_eq!(bbox.x, 0.0);
        assert!(bbox.right() <= 1.0);
        assert!(bbox.bottom() <= 1.0);
    }
}
