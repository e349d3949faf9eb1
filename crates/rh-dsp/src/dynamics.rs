//! Dynamics processors: envelope follower and compressor
//!
//! Feed-forward design with a peak envelope follower driving a soft-knee
//! gain computer. The same compressor doubles as a brickwall-style limiter
//! when run with a zero knee and a high ratio.

use rh_core::Sample;

use crate::{FrameProcessor, MonoProcessor, Processor};

/// Envelope below this level is treated as silence (no gain change)
const SILENCE_FLOOR: f64 = 1e-10;

/// Envelope follower for dynamics processing
#[derive(Debug, Clone)]
pub struct EnvelopeFollower {
    attack_coeff: f64,
    release_coeff: f64,
    envelope: f64,
    sample_rate: f64,
}

impl EnvelopeFollower {
    pub fn new(sample_rate: f64) -> Self {
        let mut follower = Self {
            attack_coeff: 0.0,
            release_coeff: 0.0,
            envelope: 0.0,
            sample_rate,
        };
        follower.set_times(10.0, 100.0);
        follower
    }

    /// Set attack and release times in milliseconds
    pub fn set_times(&mut self, attack_ms: f64, release_ms: f64) {
        self.attack_coeff = Self::coeff(attack_ms, self.sample_rate);
        self.release_coeff = Self::coeff(release_ms, self.sample_rate);
    }

    #[inline]
    fn coeff(time_ms: f64, sample_rate: f64) -> f64 {
        (-1.0 / (time_ms * 0.001 * sample_rate)).exp()
    }

    /// Feed a rectified detector value; returns the new envelope
    #[inline(always)]
    pub fn process(&mut self, input: Sample) -> f64 {
        let abs_input = input.abs();
        let coeff = if abs_input > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope = abs_input + coeff * (self.envelope - abs_input);
        self.envelope
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }

    pub fn current(&self) -> f64 {
        self.envelope
    }
}

/// Feed-forward soft-knee compressor
///
/// Used per sample through [`MonoProcessor`] or per frame through
/// [`FrameProcessor`]; the frame path links all channels to one detector
/// (max absolute value across the frame) so the stereo image does not shift.
#[derive(Debug, Clone)]
pub struct Compressor {
    threshold_db: f64,
    ratio: f64,
    knee_db: f64,
    attack_ms: f64,
    release_ms: f64,

    envelope: EnvelopeFollower,
    gain_reduction: f64,
}

impl Compressor {
    pub fn new(sample_rate: f64) -> Self {
        let mut comp = Self {
            threshold_db: -20.0,
            ratio: 4.0,
            knee_db: 6.0,
            attack_ms: 10.0,
            release_ms: 100.0,
            envelope: EnvelopeFollower::new(sample_rate),
            gain_reduction: 0.0,
        };
        comp.envelope.set_times(comp.attack_ms, comp.release_ms);
        comp
    }

    pub fn set_threshold(&mut self, db: f64) {
        self.threshold_db = db.clamp(-100.0, 0.0);
    }

    pub fn set_ratio(&mut self, ratio: f64) {
        self.ratio = ratio.clamp(1.0, 20.0);
    }

    pub fn set_knee(&mut self, db: f64) {
        self.knee_db = db.clamp(0.0, 40.0);
    }

    pub fn set_times(&mut self, attack_ms: f64, release_ms: f64) {
        self.attack_ms = attack_ms.clamp(0.01, 1000.0);
        self.release_ms = release_ms.clamp(1.0, 1000.0);
        self.envelope.set_times(self.attack_ms, self.release_ms);
    }

    pub fn threshold_db(&self) -> f64 {
        self.threshold_db
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn knee_db(&self) -> f64 {
        self.knee_db
    }

    /// Current gain reduction in dB (positive = attenuation)
    pub fn gain_reduction_db(&self) -> f64 {
        self.gain_reduction
    }

    /// Static curve: gain reduction in dB for a detector level in dB
    #[inline]
    pub fn gain_reduction_for(&self, input_db: f64) -> f64 {
        let slope = 1.0 - 1.0 / self.ratio;

        if self.knee_db <= 0.0 {
            return if input_db > self.threshold_db {
                (input_db - self.threshold_db) * slope
            } else {
                0.0
            };
        }

        let half_knee = self.knee_db / 2.0;
        let knee_start = self.threshold_db - half_knee;
        let knee_end = self.threshold_db + half_knee;

        if input_db < knee_start {
            0.0
        } else if input_db > knee_end {
            (input_db - self.threshold_db) * slope
        } else {
            let x = input_db - knee_start;
            (slope * x * x) / (2.0 * self.knee_db)
        }
    }

    /// Advance the envelope with `detector` and return the linear gain to apply
    #[inline]
    pub fn gain_for(&mut self, detector: f64) -> f64 {
        let envelope = self.envelope.process(detector);

        if envelope < SILENCE_FLOOR {
            self.gain_reduction = 0.0;
            return 1.0;
        }

        let env_db = 20.0 * envelope.log10();
        let gr_db = self.gain_reduction_for(env_db);
        self.gain_reduction = gr_db;

        10.0_f64.powf(-gr_db / 20.0)
    }
}

impl Processor for Compressor {
    fn reset(&mut self) {
        self.envelope.reset();
        self.gain_reduction = 0.0;
    }
}

impl MonoProcessor for Compressor {
    #[inline(always)]
    fn process_sample(&mut self, input: Sample) -> Sample {
        input * self.gain_for(input)
    }
}

impl FrameProcessor for Compressor {
    #[inline]
    fn process_frame(&mut self, frame: &mut [Sample]) {
        let detector = frame.iter().fold(0.0_f64, |acc, s| acc.max(s.abs()));
        let gain = self.gain_for(detector);
        for sample in frame.iter_mut() {
            *sample *= gain;
        }
    }
}
