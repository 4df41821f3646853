//! Bounding boxes and aspect-preserving fit.

use serde::{Deserialize, Serialize};

/// Bounding box an asset is resized into.
///
/// Images smaller than the box keep their size unless `allow_upscale` is
/// set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub allow_upscale: bool,
}

impl TargetSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            allow_upscale: false,
        }
    }

    /// Let small images grow to fill the box.
    #[must_use]
    pub const fn with_upscale(mut self) -> Self {
        self.allow_upscale = true;
        self
    }

    /// A square box, as used for thumbnails.
    pub const fn square(side: u32) -> Self {
        Self::new(side, side)
    }

    /// A box so large that any image keeps its source dimensions.
    pub const fn original() -> Self {
        Self::new(u32::MAX, u32::MAX)
    }
}

impl Default for TargetSize {
    fn default() -> Self {
        Self::original()
    }
}

/// Dimensions of `src` scaled to fit inside `target`.
///
/// The scale factor is `min(tw / sw, th / sh)`, capped at `1.0` unless
/// `allow_upscale` is set. Each resulting side is at least one pixel and
/// never exceeds the target. Zero-sized sources are returned unchanged.
pub fn fit_dimensions(src: (u32, u32), target: TargetSize, allow_upscale: bool) -> (u32, u32) {
    let (sw, sh) = src;
    if sw == 0 || sh == 0 {
        return src;
    }

    let tw = target.width.max(1);
    let th = target.height.max(1);
    let mut scale = (f64::from(tw) / f64::from(sw)).min(f64::from(th) / f64::from(sh));
    if !allow_upscale {
        scale = scale.min(1.0);
    }

    // `as` saturates, so huge upscales stay within u32.
    let width = ((f64::from(sw) * scale).round() as u32).clamp(1, tw);
    let height = ((f64::from(sh) * scale).round() as u32).clamp(1, th);
    (width, height)
}
