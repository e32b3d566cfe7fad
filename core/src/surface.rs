use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::EraseOutcome;

/// Alpha value of a single coating pixel.
pub type Alpha = u8;

pub const OPAQUE: Alpha = Alpha::MAX;
pub const TRANSPARENT: Alpha = 0;

/// Surface dimension in pixels.
pub type Px = u32;

/// Surface size `(width, height)`.
pub type Px2 = (Px, Px);

/// Pointer position in surface pixel space, may lie outside the surface.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Translates a viewport position (as touch events report it) into a position relative to `origin`, the
    /// top-left corner of the surface's bounding box.
    pub fn relative_to(self, origin: Point) -> Self {
        Self::new(self.x - origin.x, self.y - origin.y)
    }
}

/// Erasable opacity mask overlaying a card, indexed as `(x, y)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevealSurface {
    alpha: Array2<Alpha>,
}

impl RevealSurface {
    pub fn new((width, height): Px2) -> Self {
        Self {
            alpha: Array2::from_elem((width as usize, height as usize), OPAQUE),
        }
    }

    pub fn size(&self) -> Px2 {
        let (width, height) = self.alpha.dim();
        (width as Px, height as Px)
    }

    pub fn total_pixels(&self) -> usize {
        self.alpha.len()
    }

    pub fn alpha_at(&self, (x, y): Px2) -> Alpha {
        self.alpha[(x as usize, y as usize)]
    }

    pub fn pixels(&self) -> impl Iterator<Item = Alpha> + '_ {
        self.alpha.iter().copied()
    }

    /// Puts the full coating back.
    pub fn refill(&mut self) {
        self.alpha.fill(OPAQUE);
    }

    /// Clears every pixel whose centre lies within `radius` of `center`.
    ///
    /// Only the part of the disc overlapping the surface is touched. Pixels never become opaque again.
    pub fn erase_disc(&mut self, center: Point, radius: f64) -> EraseOutcome {
        if !(center.x.is_finite() && center.y.is_finite() && radius.is_finite()) || radius <= 0.0 {
            return EraseOutcome::NoChange;
        }

        let (width, height) = self.alpha.dim();
        let Some(xs) = pixel_span(center.x, radius, width) else {
            return EraseOutcome::NoChange;
        };
        let Some(ys) = pixel_span(center.y, radius, height) else {
            return EraseOutcome::NoChange;
        };

        let radius_sq = radius * radius;
        let mut outcome = EraseOutcome::NoChange;
        for x in xs {
            let dx = x as f64 + 0.5 - center.x;
            for y in ys.clone() {
                let dy = y as f64 + 0.5 - center.y;
                if dx * dx + dy * dy > radius_sq {
                    continue;
                }
                let pixel = &mut self.alpha[(x, y)];
                if *pixel != TRANSPARENT {
                    *pixel = TRANSPARENT;
                    outcome = EraseOutcome::Erased;
                }
            }
        }
        outcome
    }
}

/// Range of pixel indices along one axis that a disc around `center` can reach, clamped to `0..len`.
fn pixel_span(center: f64, radius: f64, len: usize) -> Option<core::ops::Range<usize>> {
    let start = (center - radius).floor().max(0.0);
    let end = (center + radius).ceil().min(len as f64);
    if start >= end {
        None
    } else {
        Some(start as usize..end as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transparent_count(surface: &RevealSurface) -> usize {
        surface.pixels().filter(|&a| a == TRANSPARENT).count()
    }

    #[test]
    fn new_surface_is_fully_opaque() {
        let surface = RevealSurface::new((4, 3));

        assert_eq!(surface.size(), (4, 3));
        assert_eq!(surface.total_pixels(), 12);
        assert!(surface.pixels().all(|a| a == OPAQUE));
    }

    #[test]
    fn erase_disc_clears_pixels_by_centre_distance() {
        let mut surface = RevealSurface::new((5, 5));

        let outcome = surface.erase_disc(Point::new(2.5, 2.5), 1.0);

        assert_eq!(outcome, EraseOutcome::Erased);
        assert_eq!(surface.alpha_at((2, 2)), TRANSPARENT);
        assert_eq!(surface.alpha_at((1, 2)), TRANSPARENT);
        assert_eq!(surface.alpha_at((3, 2)), TRANSPARENT);
        assert_eq!(surface.alpha_at((2, 1)), TRANSPARENT);
        assert_eq!(surface.alpha_at((2, 3)), TRANSPARENT);
        assert_eq!(surface.alpha_at((1, 1)), OPAQUE);
        assert_eq!(transparent_count(&surface), 5);
    }

    #[test]
    fn erasing_same_spot_twice_reports_no_change() {
        let mut surface = RevealSurface::new((10, 10));

        assert!(surface.erase_disc(Point::new(5.0, 5.0), 3.0).has_update());
        assert!(!surface.erase_disc(Point::new(5.0, 5.0), 3.0).has_update());
    }

    #[test]
    fn erase_disc_clips_to_the_surface() {
        let mut surface = RevealSurface::new((10, 10));

        assert!(surface.erase_disc(Point::new(-2.0, -2.0), 4.0).has_update());
        assert_eq!(surface.alpha_at((0, 0)), TRANSPARENT);

        let before = surface.clone();
        assert_eq!(
            surface.erase_disc(Point::new(100.0, 5.0), 25.0),
            EraseOutcome::NoChange
        );
        assert_eq!(surface, before);
    }

    #[test]
    fn erase_disc_ignores_degenerate_input() {
        let mut surface = RevealSurface::new((10, 10));

        assert_eq!(
            surface.erase_disc(Point::new(f64::NAN, 1.0), 5.0),
            EraseOutcome::NoChange
        );
        assert_eq!(
            surface.erase_disc(Point::new(5.0, 5.0), 0.0),
            EraseOutcome::NoChange
        );
        assert_eq!(transparent_count(&surface), 0);
    }

    #[test]
    fn refill_restores_coating() {
        let mut surface = RevealSurface::new((10, 10));
        surface.erase_disc(Point::new(5.0, 5.0), 4.0);

        surface.refill();

        assert_eq!(transparent_count(&surface), 0);
    }

    #[test]
    fn touch_points_translate_by_surface_origin() {
        let viewport = Point::new(130.0, 245.5);
        let origin = Point::new(100.0, 200.0);

        assert_eq!(viewport.relative_to(origin), Point::new(30.0, 45.5));
    }
}
