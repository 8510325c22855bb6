use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::refine::RefineConfig;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");
const DEFAULT_PALETTE_COLORS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub refine: RefineConfig,
    pub palette_colors: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refine: RefineConfig::default(),
            palette_colors: DEFAULT_PALETTE_COLORS,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    text: Option<TextSettings>,
    graphic: Option<GraphicSettings>,
    fallback: Option<FallbackSettings>,
    underlay: Option<UnderlaySettings>,
    palette: Option<PaletteSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct TextSettings {
    subject_iou_max: Option<f64>,
    edge_margin: Option<f64>,
    min_aspect: Option<f64>,
    nms_iou: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct GraphicSettings {
    subject_iou_max: Option<f64>,
    nms_iou: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct FallbackSettings {
    headline_height: Option<f64>,
    margin: Option<f64>,
    band_shrink_iou: Option<f64>,
    band_min_height: Option<f64>,
    logo_width: Option<f64>,
    logo_height: Option<f64>,
    logo_relocate_iou: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct UnderlaySettings {
    pad: Option<f64>,
    radius: Option<f64>,
    opacity: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct PaletteSettings {
    colors: Option<usize>,
}

/// Embedded defaults, then `settings.toml` / `settings.local.toml` in the
/// working directory, then the same pair under `~/.layout-refiner`, then
/// `extra_path`, which must exist.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut ordered_paths = vec![
        PathBuf::from("settings.toml"),
        PathBuf::from("settings.local.toml"),
    ];
    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }
    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }
    load_layered(&ordered_paths)
}

fn load_layered(paths: &[PathBuf]) -> Result<Settings> {
    let mut settings = Settings::default();
    let defaults: SettingsFile =
        toml::from_str(DEFAULT_SETTINGS_TOML).with_context(|| "failed to parse default settings")?;
    settings.merge(defaults);

    for path in paths {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }
    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        let config = &mut self.refine;
        if let Some(text) = incoming.text {
            set_unit(&mut config.text_subject_iou_max, text.subject_iou_max);
            set_unit(&mut config.text_edge_margin, text.edge_margin);
            if let Some(aspect) = text.min_aspect {
                if aspect.is_finite() && aspect >= 0.0 {
                    config.text_min_aspect = aspect;
                }
            }
            set_unit(&mut config.text_nms_iou, text.nms_iou);
        }
        if let Some(graphic) = incoming.graphic {
            set_unit(&mut config.graphic_subject_iou_max, graphic.subject_iou_max);
            set_unit(&mut config.graphic_nms_iou, graphic.nms_iou);
        }
        if let Some(fallback) = incoming.fallback {
            set_unit(&mut config.headline_h, fallback.headline_height);
            set_unit(&mut config.fallback_margin, fallback.margin);
            set_unit(&mut config.band_shrink_iou, fallback.band_shrink_iou);
            set_unit(&mut config.band_min_h, fallback.band_min_height);
            set_unit(&mut config.logo_box.0, fallback.logo_width);
            set_unit(&mut config.logo_box.1, fallback.logo_height);
            set_unit(&mut config.logo_relocate_iou, fallback.logo_relocate_iou);
        }
        if let Some(underlay) = incoming.underlay {
            set_unit(&mut config.underlay_pad, underlay.pad);
            set_unit(&mut config.underlay_radius, underlay.radius);
            set_unit(&mut config.underlay_opacity, underlay.opacity);
        }
        if let Some(palette) = incoming.palette {
            if let Some(colors) = palette.colors {
                if colors > 0 {
                    self.palette_colors = colors;
                }
            }
        }
    }
}

// Fractions of the image or IoU values; anything outside [0, 1] is ignored.
fn set_unit(target: &mut f64, value: Option<f64>) {
    if let Some(value) = value {
        if (0.0..=1.0).contains(&value) {
            *target = value;
        }
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".layout-refiner"))
        }
    })
}
