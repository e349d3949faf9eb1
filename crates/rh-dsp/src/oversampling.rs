//! Offline oversampling
//!
//! Runs a block through a non-linear process at a higher sample rate:
//! - Zero-stuffing interpolation with a Kaiser-windowed sinc lowpass
//! - The caller's processing closure at the oversampled rate
//! - The same lowpass again, then decimation
//!
//! Filtering is centred (zero-phase) since whole buffers are available, so
//! the output is sample-aligned with the input and reports no latency.

use rh_core::Sample;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

// ═══════════════════════════════════════════════════════════════════════════════
// OVERSAMPLING MODES
// ═══════════════════════════════════════════════════════════════════════════════

/// Oversampling factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OversampleFactor {
    /// No oversampling (1x)
    X1,
    /// 2x oversampling
    X2,
    /// 4x oversampling
    #[default]
    X4,
    /// 8x oversampling
    X8,
}

impl OversampleFactor {
    pub fn factor(&self) -> usize {
        match self {
            Self::X1 => 1,
            Self::X2 => 2,
            Self::X4 => 4,
            Self::X8 => 8,
        }
    }

    /// Filter order for this factor (taps = order + 1)
    fn filter_order(&self) -> usize {
        match self {
            Self::X1 => 0,
            Self::X2 => 32,
            Self::X4 => 64,
            Self::X8 => 96,
        }
    }
}

/// Oversampling quality preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OversampleQuality {
    /// Wider transition band, less attenuation
    Fast,
    #[default]
    Standard,
    /// Narrow transition band
    High,
}

impl OversampleQuality {
    /// Transition band width (fraction of the base-rate Nyquist)
    fn transition_width(&self) -> f64 {
        match self {
            Self::Fast => 0.2,
            Self::Standard => 0.1,
            Self::High => 0.05,
        }
    }

    /// Stopband attenuation in dB
    fn stopband_atten(&self) -> f64 {
        match self {
            Self::Fast => 60.0,
            Self::Standard => 96.0,
            Self::High => 120.0,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// OVERSAMPLER
// ═══════════════════════════════════════════════════════════════════════════════

/// Whole-buffer oversampler
#[derive(Debug, Clone)]
pub struct Oversampler {
    factor: OversampleFactor,
    quality: OversampleQuality,
    /// Anti-imaging / anti-aliasing lowpass at the oversampled rate
    coeffs: Vec<f64>,
}

impl Oversampler {
    pub fn new(factor: OversampleFactor, quality: OversampleQuality) -> Self {
        let ratio = factor.factor();
        let coeffs = if ratio == 1 {
            vec![1.0]
        } else {
            let num_taps = factor.filter_order() + 1;
            let cutoff = 0.5 / ratio as f64;
            let transition = quality.transition_width() / ratio as f64;
            design_lowpass(num_taps, cutoff, transition, quality.stopband_atten())
        };

        log::debug!(
            "oversampler {:?}/{:?}: {} taps",
            factor,
            quality,
            coeffs.len()
        );

        Self {
            factor,
            quality,
            coeffs,
        }
    }

    pub fn factor(&self) -> OversampleFactor {
        self.factor
    }

    pub fn quality(&self) -> OversampleQuality {
        self.quality
    }

    pub fn num_taps(&self) -> usize {
        self.coeffs.len()
    }

    /// Latency in base-rate samples
    pub fn latency(&self) -> usize {
        0
    }

    /// Upsample `input`, run `process` on the oversampled buffer in place,
    /// and return the decimated result (same length as `input`).
    pub fn process<F>(&self, input: &[Sample], mut process: F) -> Vec<Sample>
    where
        F: FnMut(&mut [Sample]),
    {
        let ratio = self.factor.factor();
        if ratio == 1 {
            let mut out = input.to_vec();
            process(&mut out);
            return out;
        }

        // Zero-stuff with gain compensation
        let mut stuffed = vec![0.0; input.len() * ratio];
        for (i, &x) in input.iter().enumerate() {
            stuffed[i * ratio] = x * ratio as f64;
        }

        let mut upsampled = convolve_centered(&stuffed, &self.coeffs);
        process(&mut upsampled);
        let filtered = convolve_centered(&upsampled, &self.coeffs);

        filtered.into_iter().step_by(ratio).collect()
    }
}

/// Linear-phase FIR applied with its group delay removed
fn convolve_centered(input: &[Sample], coeffs: &[f64]) -> Vec<Sample> {
    let len = input.len() as isize;
    let center = (coeffs.len() / 2) as isize;

    (0..len)
        .map(|n| {
            coeffs
                .iter()
                .enumerate()
                .filter_map(|(k, &h)| {
                    let idx = n + center - k as isize;
                    (0..len).contains(&idx).then(|| h * input[idx as usize])
                })
                .sum()
        })
        .collect()
}

/// Kaiser-windowed sinc lowpass, unity gain at DC
fn design_lowpass(num_taps: usize, cutoff: f64, transition: f64, atten_db: f64) -> Vec<f64> {
    let m = num_taps.saturating_sub(1) as f64;
    if m == 0.0 {
        return vec![1.0];
    }

    // Kaiser beta from desired attenuation
    let beta = if atten_db > 50.0 {
        0.1102 * (atten_db - 8.7)
    } else if atten_db >= 21.0 {
        0.5842 * (atten_db - 21.0).powf(0.4) + 0.07886 * (atten_db - 21.0)
    } else {
        0.0
    };

    // Passband edge sits below the base-rate Nyquist
    let fc = cutoff - transition / 2.0;
    let alpha = m / 2.0;
    let i0_beta = bessel_i0(beta);

    let mut coeffs: Vec<f64> = (0..num_taps)
        .map(|i| {
            let n = i as f64 - alpha;

            let sinc = if n.abs() < 1e-10 {
                2.0 * fc
            } else {
                (2.0 * PI * fc * n).sin() / (PI * n)
            };

            let arg = 1.0 - (n / alpha).powi(2);
            let window = if arg > 0.0 {
                bessel_i0(beta * arg.sqrt()) / i0_beta
            } else {
                0.0
            };

            sinc * window
        })
        .collect();

    let sum: f64 = coeffs.iter().sum();
    if sum.abs() > 1e-10 {
        for c in &mut coeffs {
            *c /= sum;
        }
    }

    coeffs
}

/// Modified Bessel function of the first kind, order 0 (polynomial approximation)
fn bessel_i0(x: f64) -> f64 {
    let ax = x.abs();
    if ax < 3.75 {
        let y = (x / 3.75).powi(2);
        1.0 + y
            * (3.5156229
                + y * (3.0899424
                    + y * (1.2067492 + y * (0.2659732 + y * (0.0360768 + y * 0.0045813)))))
    } else {
        let y = 3.75 / ax;
        (ax.exp() / ax.sqrt())
            * (0.39894228
                + y * (0.01328592
                    + y * (0.00225319
                        + y * (-0.00157565
                            + y * (0.00916281
                                + y * (-0.02057706
                                    + y * (0.02635537 + y * (-0.01647633 + y * 0.00392377))))))))
    }
}
