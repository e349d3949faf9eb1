//! rh-core: Shared types and utilities for ReHype
//!
//! This crate provides the foundational types used across all ReHype crates:
//! the immutable [`Signal`] buffer, sample and mid/side helpers, and the
//! core error type.

mod error;
mod sample;
mod signal;

pub use error::*;
pub use sample::*;
pub use signal::*;

/// Decibel value wrapper
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Decibels(pub f64);

impl Decibels {
    pub const ZERO: Self = Self(0.0);
    pub const NEG_INF: Self = Self(f64::NEG_INFINITY);

    #[inline]
    pub fn from_gain(gain: f64) -> Self {
        if gain <= 0.0 {
            Self::NEG_INF
        } else {
            Self(20.0 * gain.log10())
        }
    }

    #[inline]
    pub fn to_gain(self) -> f64 {
        if self.0 <= -144.0 {
            0.0
        } else {
            10.0_f64.powf(self.0 / 20.0)
        }
    }
}

impl Default for Decibels {
    fn default() -> Self {
        Self::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_decibel_conversion() {
        assert_abs_diff_eq!(Decibels(-6.0206).to_gain(), 0.5, epsilon = 1e-4);
        assert_abs_diff_eq!(Decibels::from_gain(1.0).0, 0.0);
        assert_eq!(Decibels::from_gain(0.0), Decibels::NEG_INF);
        assert_eq!(Decibels(-200.0).to_gain(), 0.0);
    }
}
