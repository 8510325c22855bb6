use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::Path;
use tracing::info;

pub mod hints;
pub mod layout;
pub mod logging;
pub mod media;
pub mod proposal;
pub mod refine;
pub mod settings;

pub use hints::{BackgroundContext, ReservedRegion, reserved_regions, summarize_for_background};
pub use layout::{GraphicRegion, ImageDims, Layout, ProposedLayout, SubjectLayout, TextRegion};
pub use proposal::{ModelResponse, Proposal, RefinedProposal, parse_response, refine_proposal};
pub use refine::geom::{Rect, iou};
pub use refine::{RefineConfig, refine};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub response_path: Option<String>,
    pub image_path: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub save_path: Option<String>,
    /// `Some(None)` asks for the configured number of colours.
    pub palette: Option<Option<usize>>,
    pub with_summary: bool,
    pub with_reserved: bool,
    pub settings_path: Option<String>,
}

/// Refines one model reply and returns the JSON document, or a short
/// confirmation when `save_path` is set.
pub fn run(config: Config, input: Option<String>) -> Result<String> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;

    let reply = match config.response_path.as_deref() {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read model response: {}", path))?,
        None => input.unwrap_or_default(),
    };
    if reply.trim().is_empty() {
        return Err(anyhow!("model response is empty"));
    }
    let proposal = match parse_response(&reply) {
        ModelResponse::Structured(proposal) => proposal,
        ModelResponse::Unstructured(raw) => {
            return Err(anyhow!(
                "model response is not a JSON layout proposal ({} chars)",
                raw.chars().count()
            ));
        }
    };

    let dims = resolve_dims(&config);
    if dims.is_none() {
        info!("image size unknown; coordinates are assumed to be normalized");
    }
    let mut refined = refine_proposal(proposal, dims, &settings.refine);

    if let Some(colors) = config.palette {
        let image_path = config
            .image_path
            .as_deref()
            .ok_or_else(|| anyhow!("--with-palette requires --image"))?;
        let colors = colors.unwrap_or(settings.palette_colors);
        if colors == 0 {
            return Err(anyhow!("--with-palette needs at least one colour"));
        }
        refined.set_palette(media::extract_palette(Path::new(image_path), colors));
    }
    if config.with_summary {
        refined.background_context = Some(summarize_for_background(&refined.layout));
    }
    if config.with_reserved {
        refined.reserved_regions = Some(reserved_regions(&refined.layout));
    }

    let output = serde_json::to_string_pretty(&refined)
        .with_context(|| "failed to serialize refined layout")?;
    if let Some(save_path) = config.save_path.as_deref() {
        fs::write(save_path, &output)
            .with_context(|| format!("failed to write output: {}", save_path))?;
        return Ok(format!("saved: {}", save_path));
    }
    Ok(output)
}

fn resolve_dims(config: &Config) -> Option<ImageDims> {
    if let (Some(width), Some(height)) = (config.width, config.height) {
        return ImageDims::new(width, height);
    }
    config
        .image_path
        .as_deref()
        .and_then(|path| media::image_dimensions(Path::new(path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use tempfile::tempdir;

    const PIXEL_REPLY: &str = r#"```json
{
  "product": {"type": "serum"},
  "layout": {
    "subject_layout": {"center": [500, 400], "ratio": [300, 240]},
    "nongraphic_layout": [
      {"type": "headline", "bbox": [100, 80, 500, 80], "confidence": 0.7}
    ],
    "graphic_layout": []
  }
}
```"#;

    #[test]
    fn refines_stdin_reply_with_explicit_size() {
        let config = Config {
            width: Some(1000),
            height: Some(800),
            with_summary: true,
            with_reserved: true,
            ..Config::default()
        };
        let output = run(config, Some(PIXEL_REPLY.to_string())).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["layout"]["subject_layout"]["center"], json!([0.5, 0.5]));
        assert_eq!(
            value["layout"]["nongraphic_layout"][0]["bbox"],
            json!([0.1, 0.1, 0.5, 0.1])
        );
        assert_eq!(value["layout"]["nongraphic_layout"][0]["id"], json!("text#0"));
        assert_eq!(value["reserved_regions"].as_array().unwrap().len(), 3);
        assert!(value["background_context"]["free_space_hints"].is_array());
    }

    #[test]
    fn unstructured_reply_is_an_error() {
        let err = run(Config::default(), Some("sorry, I cannot help".to_string())).unwrap_err();
        assert!(err.to_string().contains("not a JSON layout proposal"));

        let err = run(Config::default(), Some("  \n".to_string())).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn reads_reply_and_image_from_files_and_saves() {
        let dir = tempdir().expect("tempdir");
        let reply_path = dir.path().join("reply.json");
        let image_path = dir.path().join("product.png");
        let save_path = dir.path().join("out.json");
        fs::write(&reply_path, PIXEL_REPLY).expect("write reply");
        image::RgbImage::from_pixel(1000, 800, image::Rgb([240, 240, 240]))
            .save(&image_path)
            .expect("save image");

        let config = Config {
            response_path: Some(reply_path.to_string_lossy().to_string()),
            image_path: Some(image_path.to_string_lossy().to_string()),
            save_path: Some(save_path.to_string_lossy().to_string()),
            palette: Some(None),
            ..Config::default()
        };
        let message = run(config, None).unwrap();
        assert!(message.starts_with("saved: "));

        let saved: Value =
            serde_json::from_str(&fs::read_to_string(&save_path).unwrap()).unwrap();
        let palette = saved["background"]["palette"].as_array().unwrap();
        assert_eq!(palette.len(), 1);
        assert_eq!(saved["layout"]["subject_layout"]["ratio"], json!([0.3, 0.3]));
    }

    #[test]
    fn palette_without_image_is_an_error() {
        let config = Config {
            palette: Some(Some(3)),
            ..Config::default()
        };
        let err = run(config, Some(r#"{"layout": {}}"#.to_string())).unwrap_err();
        assert!(err.to_string().contains("--with-palette requires --image"));
    }

    #[test]
    fn zero_palette_colours_is_an_error() {
        let config = Config {
            image_path: Some("product.png".to_string()),
            palette: Some(Some(0)),
            ..Config::default()
        };
        let err = run(config, Some(r#"{"layout": {}}"#.to_string())).unwrap_err();
        assert!(err.to_string().contains("at least one colour"));
    }

    #[test]
    fn explicit_size_wins_over_image() {
        let config = Config {
            image_path: Some("does-not-exist.png".to_string()),
            width: Some(640),
            height: Some(480),
            ..Config::default()
        };
        assert_eq!(resolve_dims(&config), ImageDims::new(640, 480));
        let config = Config {
            width: Some(640),
            ..Config::default()
        };
        assert_eq!(resolve_dims(&config), None);
    }
}
