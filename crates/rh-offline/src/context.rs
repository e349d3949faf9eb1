//! Per-call rendering backend

use rh_core::{Sample, Signal};

use crate::error::{OfflineError, OfflineResult};

/// Lowest sample rate the renderer accepts
pub const MIN_SAMPLE_RATE: u32 = 3000;
/// Highest sample rate the renderer accepts
pub const MAX_SAMPLE_RATE: u32 = 768_000;

/// Rendering backend for a single call.
///
/// Fixes the output geometry (channels, frames, rate) up front. Every
/// `enhance` / `separate` call builds its own context, so no render state
/// is shared between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderContext {
    channel_count: usize,
    frame_count: usize,
    sample_rate: u32,
}

impl RenderContext {
    /// Create the backend for `signal`.
    ///
    /// Zero-length input has nothing to render into and yields
    /// `EngineUnavailable`; sample rates outside the supported range are
    /// `InvalidInput`.
    pub fn new(signal: &Signal) -> OfflineResult<Self> {
        if signal.is_empty() {
            return Err(OfflineError::EngineUnavailable(
                "cannot render a zero-length signal".into(),
            ));
        }

        let sample_rate = signal.sample_rate();
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate) {
            return Err(OfflineError::InvalidInput(format!(
                "sample rate {} Hz outside {}..={} Hz",
                sample_rate, MIN_SAMPLE_RATE, MAX_SAMPLE_RATE
            )));
        }

        Ok(Self {
            channel_count: signal.channel_count(),
            frame_count: signal.frame_count(),
            sample_rate,
        })
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Check that a rendered signal has this context's geometry
    pub fn check_output(&self, signal: &Signal, channels: usize) -> OfflineResult<()> {
        if signal.frame_count() != self.frame_count
            || signal.sample_rate() != self.sample_rate
            || signal.channel_count() != channels
        {
            return Err(OfflineError::InvalidInput(format!(
                "rendered {}ch/{} frames/{} Hz, expected {}ch/{} frames/{} Hz",
                signal.channel_count(),
                signal.frame_count(),
                signal.sample_rate(),
                channels,
                self.frame_count,
                self.sample_rate
            )));
        }
        Ok(())
    }

    /// Wrap one rendered channel as a mono signal at the context rate
    pub fn mono_output(&self, samples: Vec<Sample>) -> OfflineResult<Signal> {
        let signal = Signal::mono(samples, self.sample_rate)?;
        self.check_output(&signal, 1)?;
        Ok(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_length_is_unavailable() {
        let signal = Signal::mono(vec![], 44100).unwrap();
        assert!(matches!(
            RenderContext::new(&signal),
            Err(OfflineError::EngineUnavailable(_))
        ));
    }

    #[test]
    fn test_unsupported_rate_is_invalid() {
        let signal = Signal::mono(vec![0.0; 8], 1000).unwrap();
        assert!(matches!(
            RenderContext::new(&signal),
            Err(OfflineError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_geometry_checks() {
        let signal = Signal::stereo(vec![0.0; 16], vec![0.0; 16], 48000).unwrap();
        let ctx = RenderContext::new(&signal).unwrap();
        assert_eq!(ctx.channel_count(), 2);
        assert_eq!(ctx.frame_count(), 16);
        assert!(ctx.check_output(&signal, 2).is_ok());
        assert!(ctx.check_output(&signal, 1).is_err());

        assert!(ctx.mono_output(vec![0.0; 16]).is_ok());
        assert!(ctx.mono_output(vec![0.0; 15]).is_err());
    }
}
