use crate::{RevealSurface, TRANSPARENT};

/// Fraction of fully transparent pixels, in `[0, 1]`.
///
/// Scans every pixel, so crossing the reveal threshold is reproducible for a given sequence of erasures. An empty
/// surface reports `0.0`.
pub fn revealed_fraction(surface: &RevealSurface) -> f64 {
    let total = surface.total_pixels();
    if total == 0 {
        return 0.0;
    }

    let transparent = surface.pixels().filter(|&alpha| alpha == TRANSPARENT).count();
    transparent as f64 / total as f64
}
