use serde::de::Deserializer;
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

const OUTPUT_SCALE: f64 = 1_000_000.0;

/// Axis-aligned rectangle `(x, y, w, h)` in image-relative units.
///
/// Serialized as a `[x, y, w, h]` array, the shape layout proposals use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle of size `(w, h)` centred on `(cx, cy)`.
    pub fn from_center(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self::new(cx - w / 2.0, cy - h / 2.0, w, h)
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn area(&self) -> f64 {
        (self.w * self.h).max(0.0)
    }

    pub fn max_component(&self) -> f64 {
        self.x.max(self.y).max(self.w).max(self.h)
    }

    /// Clamps every component to `[0, 1]`, then shrinks `w`/`h` so the
    /// rectangle ends inside the unit square. `x`/`y` are never moved left/up.
    pub fn clip(&self) -> Self {
        let x = clip01(self.x);
        let y = clip01(self.y);
        let mut w = clip01(self.w);
        let mut h = clip01(self.h);
        if x + w > 1.0 {
            w = (1.0 - x).max(0.0);
        }
        if y + h > 1.0 {
            h = (1.0 - y).max(0.0);
        }
        Self::new(x, y, w, h)
    }

    /// Grows the rectangle by `pad` on all four sides, then clips.
    pub fn expand(&self, pad: f64) -> Self {
        Self::new(
            self.x - pad,
            self.y - pad,
            self.w + 2.0 * pad,
            self.h + 2.0 * pad,
        )
        .clip()
    }

    pub fn contains(&self, other: &Rect) -> bool {
        self.x <= other.x
            && self.y <= other.y
            && self.right() >= other.right()
            && self.bottom() >= other.bottom()
    }

    pub fn within_margin(&self, margin: f64) -> bool {
        self.x >= margin
            && self.y >= margin
            && self.right() <= 1.0 - margin
            && self.bottom() <= 1.0 - margin
    }

    /// `w / h`; a zero-height box counts as infinitely wide.
    pub fn aspect_ratio(&self) -> f64 {
        if self.h > 0.0 {
            self.w / self.h
        } else {
            f64::INFINITY
        }
    }
}

pub fn clip01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

pub(crate) fn round_output(value: f64) -> f64 {
    (value * OUTPUT_SCALE).round() / OUTPUT_SCALE
}

pub fn iou(a: &Rect, b: &Rect) -> f64 {
    let ix1 = a.x.max(b.x);
    let iy1 = a.y.max(b.y);
    let ix2 = a.right().min(b.right());
    let iy2 = a.bottom().min(b.bottom());

    let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
    let union = a.area() + b.area() - inter;
    if union > 0.0 { inter / union } else { 0.0 }
}

impl Serialize for Rect {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(4))?;
        for value in [self.x, self.y, self.w, self.h] {
            seq.serialize_element(&round_output(value))?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Rect {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [x, y, w, h] = <[f64; 4]>::deserialize(deserializer)?;
        Ok(Self::new(x, y, w, h))
    }
}

pub(crate) fn serialize_rounded<S: Serializer>(
    value: &f64,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_output(*value))
}

pub(crate) fn serialize_rounded_pair<S: Serializer>(
    value: &[f64; 2],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    [round_output(value[0]), round_output(value[1])].serialize(serializer)
}
