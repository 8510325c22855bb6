use anyhow::{Context, Result};
use image::GenericImageView;
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

use crate::layout::ImageDims;

const THUMBNAIL_SIDE: u32 = 256;
const FALLBACK_PALETTE: [&str; 2] = ["#ffffff", "#000000"];

/// Pixel size of the image at `path`, read from the header only.
pub fn image_dimensions(path: &Path) -> Option<ImageDims> {
    match image::image_dimensions(path) {
        Ok((width, height)) => {
            let dims = ImageDims::new(width, height);
            if dims.is_none() {
                warn!("image {} has no pixels", path.display());
            }
            dims
        }
        Err(err) => {
            warn!("failed to read image size of {}: {}", path.display(), err);
            None
        }
    }
}

/// The `colors` dominant colours of the image as `#rrggbb`, most frequent
/// first. Falls back to white and black when the image cannot be read.
pub fn extract_palette(path: &Path, colors: usize) -> Vec<String> {
    match load_palette(path, colors) {
        Ok(palette) if !palette.is_empty() => palette,
        Ok(_) => fallback_palette(),
        Err(err) => {
            warn!("palette extraction failed: {:#}", err);
            fallback_palette()
        }
    }
}

fn load_palette(path: &Path, colors: usize) -> Result<Vec<String>> {
    let image = image::open(path)
        .with_context(|| format!("failed to decode image: {}", path.display()))?;
    let (width, height) = image.dimensions();
    let image = if width > THUMBNAIL_SIDE || height > THUMBNAIL_SIDE {
        image.thumbnail(THUMBNAIL_SIDE, THUMBNAIL_SIDE)
    } else {
        image
    };
    let rgb = image.to_rgb8();
    Ok(palette_from_pixels(rgb.pixels().map(|pixel| pixel.0), colors))
}

fn fallback_palette() -> Vec<String> {
    FALLBACK_PALETTE.iter().map(|hex| hex.to_string()).collect()
}

#[derive(Default)]
struct ColorBucket {
    count: u64,
    r: u64,
    g: u64,
    b: u64,
}

impl ColorBucket {
    fn mean_hex(&self) -> String {
        let count = self.count.max(1);
        format!(
            "#{:02x}{:02x}{:02x}",
            (self.r + count / 2) / count,
            (self.g + count / 2) / count,
            (self.b + count / 2) / count
        )
    }
}

// 5 bits per channel, ranked by pixel count.
pub(crate) fn palette_from_pixels<I>(pixels: I, colors: usize) -> Vec<String>
where
    I: IntoIterator<Item = [u8; 3]>,
{
    let mut buckets: HashMap<u16, ColorBucket> = HashMap::new();
    for [r, g, b] in pixels {
        let key = ((r as u16 >> 3) << 10) | ((g as u16 >> 3) << 5) | (b as u16 >> 3);
        let bucket = buckets.entry(key).or_default();
        bucket.count += 1;
        bucket.r += r as u64;
        bucket.g += g as u64;
        bucket.b += b as u64;
    }

    let mut ranked: Vec<(u16, ColorBucket)> = buckets.into_iter().collect();
    ranked.sort_by(|(key_a, a), (key_b, b)| b.count.cmp(&a.count).then(key_a.cmp(key_b)));

    let mut palette: Vec<String> = Vec::new();
    for (_, bucket) in ranked {
        if palette.len() >= colors {
            break;
        }
        let hex = bucket.mean_hex();
        if !palette.contains(&hex) {
            palette.push(hex);
        }
    }
    palette
}
