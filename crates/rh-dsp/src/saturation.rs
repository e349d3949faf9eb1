//! Waveshaping saturation
//!
//! Includes:
//! - Lookup-table waveshaper with linear interpolation
//! - Oversampled waveshaper for alias-reduced processing

use rh_core::{CoreError, CoreResult, Sample};

use crate::oversampling::{OversampleFactor, OversampleQuality, Oversampler};
use crate::{MonoProcessor, Processor};

/// Table resolution of the enhancement curve
pub const ENHANCE_TABLE_SIZE: usize = 44100;

/// Enhancement transfer curve: `tanh(2x) * 0.5`
#[inline]
pub fn enhance_curve(x: f64) -> f64 {
    (2.0 * x).tanh() * 0.5
}

/// Lookup-table waveshaper
///
/// The table samples the curve symmetrically over [-1, 1]
/// (`x_i = i / (n - 1) * 2 - 1`), so an odd curve maps zero to zero.
/// Input outside [-1, 1] is clamped to the table edges.
#[derive(Debug, Clone)]
pub struct Waveshaper {
    table: Vec<f64>,
}

impl Waveshaper {
    /// Sample `curve` into a table of `size` points
    pub fn new<F>(size: usize, curve: F) -> CoreResult<Self>
    where
        F: Fn(f64) -> f64,
    {
        if size < 2 {
            return Err(CoreError::InvalidParam(format!(
                "waveshaper table needs at least 2 points, got {}",
                size
            )));
        }

        let last = (size - 1) as f64;
        let table: Vec<f64> = (0..size).map(|i| curve(i as f64 / last * 2.0 - 1.0)).collect();

        if table.iter().any(|v| !v.is_finite()) {
            return Err(CoreError::Dsp("waveshaper curve produced non-finite values".into()));
        }

        Ok(Self { table })
    }

    /// The enhancement curve at its default resolution
    pub fn enhance() -> CoreResult<Self> {
        Self::new(ENHANCE_TABLE_SIZE, enhance_curve)
    }

    pub fn table_size(&self) -> usize {
        self.table.len()
    }

    /// Shape one sample
    #[inline]
    pub fn shape(&self, input: Sample) -> Sample {
        let x = if input.is_nan() { 0.0 } else { input.clamp(-1.0, 1.0) };
        let last = self.table.len() - 1;
        let pos = (x + 1.0) * 0.5 * last as f64;
        let idx = (pos.floor() as usize).min(last);
        if idx == last {
            return self.table[last];
        }
        let frac = pos - idx as f64;
        let a = self.table[idx];
        let b = self.table[idx + 1];
        a + (b - a) * frac
    }
}

impl Processor for Waveshaper {
    fn reset(&mut self) {}
}

impl MonoProcessor for Waveshaper {
    #[inline(always)]
    fn process_sample(&mut self, input: Sample) -> Sample {
        self.shape(input)
    }
}

/// Waveshaper run at an oversampled rate
#[derive(Debug, Clone)]
pub struct OversampledWaveshaper {
    shaper: Waveshaper,
    oversampler: Oversampler,
}

impl OversampledWaveshaper {
    pub fn new(shaper: Waveshaper, factor: OversampleFactor) -> Self {
        Self {
            shaper,
            oversampler: Oversampler::new(factor, OversampleQuality::Standard),
        }
    }

    pub fn factor(&self) -> OversampleFactor {
        self.oversampler.factor()
    }

    /// Shape a whole channel; output is time-aligned with the input
    pub fn process(&self, input: &[Sample]) -> Vec<Sample> {
        let shaper = &self.shaper;
        self.oversampler.process(input, |buffer| {
            for sample in buffer.iter_mut() {
                *sample = shaper.shape(*sample);
            }
        })
    }
}
