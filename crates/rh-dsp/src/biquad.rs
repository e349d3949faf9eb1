//! Biquad filters in Transposed Direct Form II
//!
//! Coefficients follow the RBJ cookbook. Every design goes through
//! [`BiquadCoeffs::design`], which rejects parameters that would produce an
//! unstable or meaningless filter (centre at or above Nyquist, non-positive Q).

use rh_core::{CoreError, CoreResult, Sample};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::{MonoProcessor, Processor};

/// Biquad filter types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterType {
    Lowpass,
    Highpass,
    Bandpass,
    Allpass,
    Peaking,
}

/// Linear Q for a low/high-pass resonance given in dB.
///
/// At the cutoff a lowpass or highpass section has magnitude `Q`, so a
/// resonance of `q_db` gives exactly `q_db` of gain there.
#[inline]
pub fn q_from_resonance_db(q_db: f64) -> f64 {
    10.0_f64.powf(q_db / 20.0)
}

/// Prewarped angular frequency shared by every RBJ design
struct Warp {
    cos: f64,
    alpha: f64,
}

impl Warp {
    fn new(freq: f64, q: f64, sample_rate: f64) -> Self {
        let w0 = 2.0 * PI * freq / sample_rate;
        Self {
            cos: w0.cos(),
            alpha: w0.sin() / (2.0 * q),
        }
    }

    /// `[1 + alpha*k, -2 cos, 1 - alpha*k]`
    #[inline]
    fn denominator(&self, k: f64) -> [f64; 3] {
        [1.0 + self.alpha * k, -2.0 * self.cos, 1.0 - self.alpha * k]
    }
}

/// Biquad coefficients
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// Validate parameters and design a filter of the given type.
    ///
    /// `gain_db` is only used by [`FilterType::Peaking`].
    pub fn design(
        filter_type: FilterType,
        freq: f64,
        q: f64,
        gain_db: f64,
        sample_rate: f64,
    ) -> CoreResult<Self> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(CoreError::InvalidParam(format!(
                "sample rate {} is not positive",
                sample_rate
            )));
        }

        let nyquist = sample_rate * 0.5;
        if !freq.is_finite() || freq <= 0.0 || freq >= nyquist {
            log::debug!(
                "rejecting {:?} at {} Hz (nyquist {} Hz)",
                filter_type,
                freq,
                nyquist
            );
            return Err(CoreError::Dsp(format!(
                "{:?} frequency {} Hz outside (0, {}) Hz",
                filter_type, freq, nyquist
            )));
        }

        if !q.is_finite() || q <= 0.0 {
            return Err(CoreError::InvalidParam(format!("Q must be positive, got {}", q)));
        }

        if !gain_db.is_finite() {
            return Err(CoreError::InvalidParam("gain must be finite".into()));
        }

        Ok(match filter_type {
            FilterType::Lowpass => Self::lowpass(freq, q, sample_rate),
            FilterType::Highpass => Self::highpass(freq, q, sample_rate),
            FilterType::Bandpass => Self::bandpass(freq, q, sample_rate),
            FilterType::Allpass => Self::allpass(freq, q, sample_rate),
            FilterType::Peaking => Self::peaking(freq, q, gain_db, sample_rate),
        })
    }

    /// Second-order lowpass, -3 dB at `freq` for Q = 0.707
    pub fn lowpass(freq: f64, q: f64, sample_rate: f64) -> Self {
        let w = Warp::new(freq, q, sample_rate);
        let edge = (1.0 - w.cos) * 0.5;
        Self::normalized([edge, 2.0 * edge, edge], w.denominator(1.0))
    }

    /// Second-order highpass
    pub fn highpass(freq: f64, q: f64, sample_rate: f64) -> Self {
        let w = Warp::new(freq, q, sample_rate);
        let edge = (1.0 + w.cos) * 0.5;
        Self::normalized([edge, -2.0 * edge, edge], w.denominator(1.0))
    }

    /// Bandpass with unity gain at the centre frequency
    pub fn bandpass(freq: f64, q: f64, sample_rate: f64) -> Self {
        let w = Warp::new(freq, q, sample_rate);
        Self::normalized([w.alpha, 0.0, -w.alpha], w.denominator(1.0))
    }

    /// Allpass: flat magnitude, 180° phase shift at `freq`
    pub fn allpass(freq: f64, q: f64, sample_rate: f64) -> Self {
        let w = Warp::new(freq, q, sample_rate);
        let [a0, a1, a2] = w.denominator(1.0);
        Self::normalized([a2, a1, a0], [a0, a1, a2])
    }

    /// Peaking bell, `gain_db` at `freq`
    pub fn peaking(freq: f64, q: f64, gain_db: f64, sample_rate: f64) -> Self {
        let a = 10.0_f64.powf(gain_db / 40.0);
        let w = Warp::new(freq, q, sample_rate);
        let [b0, b1, b2] = w.denominator(a);
        Self::normalized([b0, b1, b2], w.denominator(1.0 / a))
    }

    /// Bypass (unity gain, no filtering)
    pub fn bypass() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        }
    }

    #[inline]
    fn normalized(b: [f64; 3], a: [f64; 3]) -> Self {
        Self {
            b0: b[0] / a[0],
            b1: b[1] / a[0],
            b2: b[2] / a[0],
            a1: a[1] / a[0],
            a2: a[2] / a[0],
        }
    }

    /// Magnitude response at `freq`
    pub fn magnitude_at(&self, freq: f64, sample_rate: f64) -> f64 {
        let w = 2.0 * PI * freq / sample_rate;
        let (c1, s1) = (w.cos(), w.sin());
        let (c2, s2) = ((2.0 * w).cos(), (2.0 * w).sin());

        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);

        ((num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im)).sqrt()
    }
}

/// Transposed Direct Form II biquad filter
#[derive(Debug, Clone)]
pub struct BiquadTDF2 {
    coeffs: BiquadCoeffs,
    z1: f64,
    z2: f64,
    sample_rate: f64,
}

impl BiquadTDF2 {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            coeffs: BiquadCoeffs::bypass(),
            z1: 0.0,
            z2: 0.0,
            sample_rate,
        }
    }

    pub fn with_coeffs(coeffs: BiquadCoeffs, sample_rate: f64) -> Self {
        Self {
            coeffs,
            z1: 0.0,
            z2: 0.0,
            sample_rate,
        }
    }

    /// Design and construct in one step
    pub fn design(
        filter_type: FilterType,
        freq: f64,
        q: f64,
        gain_db: f64,
        sample_rate: f64,
    ) -> CoreResult<Self> {
        let coeffs = BiquadCoeffs::design(filter_type, freq, q, gain_db, sample_rate)?;
        Ok(Self::with_coeffs(coeffs, sample_rate))
    }

    #[inline]
    pub fn coeffs(&self) -> &BiquadCoeffs {
        &self.coeffs
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Filter a whole buffer into a new vector
    pub fn filter(&mut self, input: &[Sample]) -> Vec<Sample> {
        input.iter().map(|&x| self.process_sample(x)).collect()
    }
}

impl Processor for BiquadTDF2 {
    fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

impl MonoProcessor for BiquadTDF2 {
    #[inline(always)]
    fn process_sample(&mut self, input: Sample) -> Sample {
        let output = self.coeffs.b0 * input + self.z1;
        self.z1 = self.coeffs.b1 * input - self.coeffs.a1 * output + self.z2;
        self.z2 = self.coeffs.b2 * input - self.coeffs.a2 * output;
        output
    }
}

/// Serial chain of biquads; each section feeds the next
#[derive(Debug, Clone, Default)]
pub struct BiquadCascade {
    sections: Vec<BiquadTDF2>,
}

impl BiquadCascade {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, section: BiquadTDF2) {
        self.sections.push(section);
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn sections(&self) -> &[BiquadTDF2] {
        &self.sections
    }

    /// Filter a whole buffer into a new vector
    pub fn filter(&mut self, input: &[Sample]) -> Vec<Sample> {
        input.iter().map(|&x| self.process_sample(x)).collect()
    }
}

impl Processor for BiquadCascade {
    fn reset(&mut self) {
        for section in &mut self.sections {
            section.reset();
        }
    }
}

impl MonoProcessor for BiquadCascade {
    #[inline]
    fn process_sample(&mut self, input: Sample) -> Sample {
        self.sections
            .iter_mut()
            .fold(input, |x, section| section.process_sample(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const SR: f64 = 48000.0;

    #[test]
    fn test_bypass() {
        let mut filter = BiquadTDF2::new(SR);

        let input = 0.5;
        let output = filter.process_sample(input);
        assert!((output - input).abs() < 1e-10);
    }

    #[test]
    fn test_lowpass_dc() {
        let mut filter = BiquadTDF2::with_coeffs(BiquadCoeffs::lowpass(1000.0, 0.707, SR), SR);

        // DC signal should pass through lowpass
        for _ in 0..1000 {
            filter.process_sample(1.0);
        }
        let output = filter.process_sample(1.0);
        assert!((output - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_highpass_dc() {
        let mut filter = BiquadTDF2::with_coeffs(BiquadCoeffs::highpass(1000.0, 0.707, SR), SR);

        // DC signal should be blocked by highpass
        for _ in 0..1000 {
            filter.process_sample(1.0);
        }
        let output = filter.process_sample(1.0);
        assert!(output.abs() < 0.01);
    }

    #[test]
    fn test_reset() {
        let mut filter = BiquadTDF2::with_coeffs(BiquadCoeffs::lowpass(1000.0, 0.707, SR), SR);

        for _ in 0..100 {
            filter.process_sample(1.0);
        }

        filter.reset();

        assert_eq!(filter.z1, 0.0);
        assert_eq!(filter.z2, 0.0);
    }

    #[test]
    fn test_resonance_db_sets_cutoff_gain() {
        assert_abs_diff_eq!(q_from_resonance_db(0.0), 1.0);
        assert_abs_diff_eq!(q_from_resonance_db(1.0), 1.122018, epsilon = 1e-6);

        let lp = BiquadCoeffs::lowpass(200.0, q_from_resonance_db(1.0), SR);
        let cutoff_db = 20.0 * lp.magnitude_at(200.0, SR).log10();
        assert_abs_diff_eq!(cutoff_db, 1.0, epsilon = 1e-6);

        let hp = BiquadCoeffs::highpass(20.0, q_from_resonance_db(0.7), SR);
        let cutoff_db = 20.0 * hp.magnitude_at(20.0, SR).log10();
        assert_abs_diff_eq!(cutoff_db, 0.7, epsilon = 1e-6);
    }

    #[test]
    fn test_peaking_gain_at_centre_only() {
        let coeffs = BiquadCoeffs::peaking(1000.0, 1.0, 6.0, SR);
        let centre_db = 20.0 * coeffs.magnitude_at(1000.0, SR).log10();
        assert_abs_diff_eq!(centre_db, 6.0, epsilon = 1e-6);

        // Unit gain far from the band
        assert_abs_diff_eq!(coeffs.magnitude_at(20.0, SR), 1.0, epsilon = 0.01);
        assert_abs_diff_eq!(coeffs.magnitude_at(20000.0, SR), 1.0, epsilon = 0.02);
    }

    #[test]
    fn test_allpass_is_flat() {
        let coeffs = BiquadCoeffs::allpass(1000.0, 1.0, SR);
        for freq in [50.0, 500.0, 1000.0, 5000.0, 15000.0] {
            assert_abs_diff_eq!(coeffs.magnitude_at(freq, SR), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_bandpass_unity_peak() {
        let coeffs = BiquadCoeffs::bandpass(60.0, 0.5, SR);
        assert_abs_diff_eq!(coeffs.magnitude_at(60.0, SR), 1.0, epsilon = 1e-9);
        assert!(coeffs.magnitude_at(5000.0, SR) < 0.05);
    }

    #[test]
    fn test_design_rejects_bad_params() {
        assert!(BiquadCoeffs::design(FilterType::Peaking, 12000.0, 1.0, 2.0, 22050.0).is_err());
        assert!(BiquadCoeffs::design(FilterType::Peaking, 0.0, 1.0, 2.0, SR).is_err());
        assert!(BiquadCoeffs::design(FilterType::Lowpass, 200.0, 0.0, 0.0, SR).is_err());
        assert!(BiquadCoeffs::design(FilterType::Lowpass, 200.0, 1.0, f64::NAN, SR).is_err());
        assert!(BiquadCoeffs::design(FilterType::Lowpass, 200.0, 1.0, 0.0, 0.0).is_err());
        assert!(BiquadCoeffs::design(FilterType::Lowpass, 200.0, 1.0, 0.0, SR).is_ok());
    }

    #[test]
    fn test_cascade_applies_sections_in_order() {
        let mut cascade = BiquadCascade::new();
        cascade.push(BiquadTDF2::with_coeffs(BiquadCoeffs::peaking(100.0, 1.0, 3.0, SR), SR));
        cascade.push(BiquadTDF2::with_coeffs(BiquadCoeffs::peaking(3000.0, 1.0, -3.0, SR), SR));

        let mut a = cascade.sections()[0].clone();
        let mut b = cascade.sections()[1].clone();

        let input: Vec<f64> = (0..64).map(|i| ((i as f64) * 0.37).sin()).collect();
        let expected = b.filter(&a.filter(&input));
        let output = cascade.filter(&input);

        for (x, y) in output.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_zero_in_zero_out() {
        let mut filter = BiquadTDF2::design(FilterType::Peaking, 60.0, 1.8, 4.0, SR).unwrap();
        let out = filter.filter(&[0.0; 256]);
        assert!(out.iter().all(|&s| s == 0.0));
    }
}
