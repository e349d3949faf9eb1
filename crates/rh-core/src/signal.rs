//! Immutable multi-channel signal

use crate::error::{CoreError, CoreResult};
use crate::sample::{Sample, StereoSample};
use crate::Decibels;

/// Maximum channel count handled by the processing core (mono/stereo)
pub const MAX_CHANNELS: usize = 2;

/// Decoded audio signal: planar channel data plus sample rate.
///
/// Construction validates the layout once; afterwards the signal is
/// read-only. Processing stages never mutate a `Signal`, they build a new one
/// (see [`Signal::with_channels`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    channels: Vec<Vec<Sample>>,
    sample_rate: u32,
}

impl Signal {
    /// Create a signal from planar channel data.
    ///
    /// Fails when the channel count is not 1 or 2, channels differ in
    /// length, the sample rate is zero, or any sample is NaN/infinite.
    pub fn new(channels: Vec<Vec<Sample>>, sample_rate: u32) -> CoreResult<Self> {
        if channels.is_empty() || channels.len() > MAX_CHANNELS {
            return Err(CoreError::InvalidSignal(format!(
                "expected 1 or {} channels, got {}",
                MAX_CHANNELS,
                channels.len()
            )));
        }

        if sample_rate == 0 {
            return Err(CoreError::InvalidSignal("sample rate must be positive".into()));
        }

        let frames = channels[0].len();
        if let Some((idx, ch)) = channels.iter().enumerate().find(|(_, ch)| ch.len() != frames) {
            return Err(CoreError::InvalidSignal(format!(
                "channel {} has {} frames, channel 0 has {}",
                idx,
                ch.len(),
                frames
            )));
        }

        for (idx, ch) in channels.iter().enumerate() {
            if let Some(pos) = ch.iter().position(|s| !s.is_finite()) {
                return Err(CoreError::InvalidSignal(format!(
                    "non-finite sample at channel {} frame {}",
                    idx, pos
                )));
            }
        }

        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Mono signal
    pub fn mono(samples: Vec<Sample>, sample_rate: u32) -> CoreResult<Self> {
        Self::new(vec![samples], sample_rate)
    }

    /// Stereo signal
    pub fn stereo(left: Vec<Sample>, right: Vec<Sample>, sample_rate: u32) -> CoreResult<Self> {
        Self::new(vec![left, right], sample_rate)
    }

    /// All-zero signal
    pub fn silence(channel_count: usize, frames: usize, sample_rate: u32) -> CoreResult<Self> {
        Self::new(vec![vec![0.0; frames]; channel_count], sample_rate)
    }

    /// Build from interleaved samples
    pub fn from_interleaved(
        samples: &[Sample],
        channel_count: usize,
        sample_rate: u32,
    ) -> CoreResult<Self> {
        if channel_count == 0 || samples.len() % channel_count != 0 {
            return Err(CoreError::InvalidSignal(format!(
                "{} interleaved samples do not divide into {} channels",
                samples.len(),
                channel_count
            )));
        }

        let channels = (0..channel_count)
            .map(|ch| {
                samples
                    .iter()
                    .skip(ch)
                    .step_by(channel_count)
                    .copied()
                    .collect()
            })
            .collect();

        Self::new(channels, sample_rate)
    }

    /// Build a new signal with the same sample rate from replacement channels.
    pub fn with_channels(&self, channels: Vec<Vec<Sample>>) -> CoreResult<Self> {
        Self::new(channels, self.sample_rate)
    }

    /// Build a new signal by transforming every channel.
    pub fn map_channels<F>(&self, mut f: F) -> CoreResult<Self>
    where
        F: FnMut(usize, &[Sample]) -> Vec<Sample>,
    {
        let channels = self
            .channels
            .iter()
            .enumerate()
            .map(|(idx, ch)| f(idx, ch))
            .collect();
        self.with_channels(channels)
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.channels[0].len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }

    #[inline]
    pub fn is_mono(&self) -> bool {
        self.channels.len() == 1
    }

    #[inline]
    pub fn is_stereo(&self) -> bool {
        self.channels.len() == 2
    }

    #[inline]
    pub fn channels(&self) -> &[Vec<Sample>] {
        &self.channels
    }

    #[inline]
    pub fn channel(&self, idx: usize) -> Option<&[Sample]> {
        self.channels.get(idx).map(Vec::as_slice)
    }

    /// Left (first) channel
    #[inline]
    pub fn left(&self) -> &[Sample] {
        &self.channels[0]
    }

    /// Right channel; for mono signals this is the single channel
    #[inline]
    pub fn right(&self) -> &[Sample] {
        self.channels.get(1).unwrap_or(&self.channels[0])
    }

    /// Frame as a stereo pair (mono is duplicated)
    #[inline]
    pub fn stereo_frame(&self, frame: usize) -> StereoSample {
        StereoSample::new(self.left()[frame], self.right()[frame])
    }

    /// Interleaved copy of the sample data
    pub fn interleaved(&self) -> Vec<Sample> {
        let frames = self.frame_count();
        let mut out = Vec::with_capacity(frames * self.channels.len());
        for frame in 0..frames {
            for ch in &self.channels {
                out.push(ch[frame]);
            }
        }
        out
    }

    /// Downmix to mono (channel average)
    pub fn to_mono(&self) -> Signal {
        if self.is_mono() {
            return self.clone();
        }

        let count = self.channels.len() as f64;
        let mono = (0..self.frame_count())
            .map(|frame| self.channels.iter().map(|ch| ch[frame]).sum::<f64>() / count)
            .collect();

        Signal {
            channels: vec![mono],
            sample_rate: self.sample_rate,
        }
    }

    /// Peak absolute sample value (linear)
    pub fn peak(&self) -> f64 {
        self.channels
            .iter()
            .flat_map(|ch| ch.iter())
            .map(|s| s.abs())
            .fold(0.0, f64::max)
    }

    /// Peak level in dBFS
    pub fn peak_db(&self) -> Decibels {
        Decibels::from_gain(self.peak())
    }

    /// RMS over all channels
    pub fn rms(&self) -> f64 {
        let count = self.frame_count() * self.channels.len();
        if count == 0 {
            return 0.0;
        }
        let sum: f64 = self
            .channels
            .iter()
            .flat_map(|ch| ch.iter())
            .map(|s| s * s)
            .sum();
        (sum / count as f64).sqrt()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    pub fn into_channels(self) -> Vec<Vec<Sample>> {
        self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_rejects_bad_layouts() {
        assert!(Signal::new(vec![], 44100).is_err());
        assert!(Signal::new(vec![vec![0.0]; 3], 44100).is_err());
        assert!(Signal::new(vec![vec![0.0; 4], vec![0.0; 3]], 44100).is_err());
        assert!(Signal::mono(vec![0.0; 4], 0).is_err());
        assert!(Signal::mono(vec![0.0, f64::NAN], 44100).is_err());
        assert!(Signal::mono(vec![f64::INFINITY], 44100).is_err());
    }

    #[test]
    fn test_zero_length_is_constructible() {
        let signal = Signal::stereo(vec![], vec![], 48000).unwrap();
        assert!(signal.is_empty());
        assert_eq!(signal.channel_count(), 2);
    }

    #[test]
    fn test_interleave_round_trip() {
        let signal = Signal::from_interleaved(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6], 2, 44100).unwrap();
        assert_eq!(signal.left(), &[0.1, 0.3, 0.5]);
        assert_eq!(signal.right(), &[0.2, 0.4, 0.6]);
        assert_eq!(signal.interleaved(), vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);

        assert!(Signal::from_interleaved(&[0.1, 0.2, 0.3], 2, 44100).is_err());
    }

    #[test]
    fn test_mono_right_aliases_left() {
        let signal = Signal::mono(vec![0.5, -0.5], 44100).unwrap();
        assert_eq!(signal.right(), signal.left());
        assert_eq!(signal.stereo_frame(1), StereoSample::mono(-0.5));
    }

    #[test]
    fn test_to_mono_averages() {
        let signal = Signal::stereo(vec![0.5, -0.5, 0.25], vec![0.3, -0.3, 0.15], 44100).unwrap();
        let mono = signal.to_mono();
        assert!(mono.is_mono());
        assert_abs_diff_eq!(mono.left()[0], 0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(mono.left()[1], -0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(mono.left()[2], 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_metering() {
        let signal = Signal::stereo(vec![0.5, -0.8], vec![0.3, -0.2], 4).unwrap();
        assert_abs_diff_eq!(signal.peak(), 0.8);
        assert_abs_diff_eq!(signal.duration_secs(), 0.5);
        assert!(signal.peak_db().0 < 0.0);

        let silent = Signal::silence(1, 16, 44100).unwrap();
        assert_eq!(silent.peak(), 0.0);
        assert_eq!(silent.rms(), 0.0);
        assert_eq!(silent.peak_db(), Decibels::NEG_INF);
    }

    #[test]
    fn test_map_channels_revalidates() {
        let signal = Signal::mono(vec![0.5, 0.5], 44100).unwrap();
        let halved = signal.map_channels(|_, ch| ch.iter().map(|s| s * 0.5).collect()).unwrap();
        assert_eq!(halved.left(), &[0.25, 0.25]);

        let broken = signal.map_channels(|_, ch| ch.iter().map(|_| f64::NAN).collect());
        assert!(broken.is_err());
    }
}
