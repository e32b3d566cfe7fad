use serde::{Deserialize, Serialize};

pub use card::*;
pub use controller::*;
pub use coverage::*;
pub use error::*;
pub use history::*;
pub use palette::*;
pub use reveal::*;
pub use surface::*;
pub use url::*;

mod card;
mod controller;
mod coverage;
mod error;
mod history;
mod palette;
mod reveal;
mod surface;
mod url;

/// Tunables for the scratch interaction.
///
/// Both values are UX constants picked by feel. The defaults must stay at `0.5` and `25.0` so cards reveal the same
/// way everywhere, but embedders may override them.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealConfig {
    /// Fraction of the coating that has to be scratched off, the card reveals once coverage is strictly above it.
    pub threshold: f64,
    /// Radius of the erased disc in surface pixels.
    pub brush_radius: f64,
}

impl RevealConfig {
    pub const DEFAULT_THRESHOLD: f64 = 0.5;
    pub const DEFAULT_BRUSH_RADIUS: f64 = 25.0;

    pub const fn new_unchecked(threshold: f64, brush_radius: f64) -> Self {
        Self {
            threshold,
            brush_radius,
        }
    }

    pub fn new(threshold: f64, brush_radius: f64) -> Self {
        let threshold = if threshold.is_finite() {
            threshold.clamp(0.0, 1.0)
        } else {
            Self::DEFAULT_THRESHOLD
        };
        let brush_radius = if brush_radius.is_finite() && brush_radius > 0.0 {
            brush_radius
        } else {
            Self::DEFAULT_BRUSH_RADIUS
        };
        Self::new_unchecked(threshold, brush_radius)
    }
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self::new_unchecked(Self::DEFAULT_THRESHOLD, Self::DEFAULT_BRUSH_RADIUS)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum EraseOutcome {
    NoChange,
    Erased,
}

impl EraseOutcome {
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Erased => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_keeps_ux_constants() {
        let config = RevealConfig::default();

        assert_eq!(config.threshold, 0.5);
        assert_eq!(config.brush_radius, 25.0);
    }

    #[test]
    fn new_config_sanitizes_bad_values() {
        let config = RevealConfig::new(f64::NAN, -3.0);
        assert_eq!(config, RevealConfig::default());

        let config = RevealConfig::new(1.7, 10.0);
        assert_eq!(config.threshold, 1.0);
        assert_eq!(config.brush_radius, 10.0);
    }
}
