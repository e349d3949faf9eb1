//! rh-dsp: DSP processors for ReHype
//!
//! Platform-independent numeric building blocks for offline rendering.
//!
//! ## Modules
//! - `biquad` - TDF-II biquad filters (lowpass, highpass, bandpass, allpass, peaking)
//! - `dynamics` - Envelope follower and feed-forward soft-knee compressor
//! - `saturation` - Lookup-table waveshaper, oversampled waveshaper
//! - `oversampling` - Kaiser-windowed FIR interpolation/decimation
//! - `delay` - Fixed delay line

pub mod biquad;
pub mod delay;
pub mod dynamics;
pub mod oversampling;
pub mod saturation;

use rh_core::Sample;

/// Trait for all DSP processors
pub trait Processor: Send + Sync {
    /// Reset processor state
    fn reset(&mut self);

    /// Get latency in samples
    fn latency(&self) -> usize {
        0
    }
}

/// Mono processor trait
pub trait MonoProcessor: Processor {
    /// Process a single sample
    fn process_sample(&mut self, input: Sample) -> Sample;

    /// Process a block of samples
    fn process_block(&mut self, buffer: &mut [Sample]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }
}

/// Processor that handles all channels of a frame at once (linked detection)
pub trait FrameProcessor: Processor {
    /// Process one frame in place; `frame` holds one sample per channel
    fn process_frame(&mut self, frame: &mut [Sample]);
}
