//! Stem separation
//!
//! Classical decomposition into four mono stems:
//! - vocals: mid channel `(L + R) / 2`
//! - instruments: side channel `(L - R) / 2`
//! - drums: low-passed mono mix, +1 dB resonance at 200 Hz
//! - bass: band-passed mono mix
//!
//! Vocals and instruments reconstruct the input exactly
//! (`L = vocals + instruments`, `R = vocals - instruments`).

use rh_core::{Sample, Signal};
use rh_dsp::biquad::{q_from_resonance_db, BiquadTDF2, FilterType};
use serde::{Deserialize, Serialize};

use crate::context::RenderContext;
use crate::error::OfflineResult;
use crate::request::{source_stem, SeparationRequest};

/// Drum stem low-pass cutoff
pub const DRUMS_CUTOFF_HZ: f64 = 200.0;
/// Drum stem low-pass resonance in dB (+1 dB at the cutoff)
pub const DRUMS_RESONANCE_DB: f64 = 1.0;
/// Bass stem band-pass centre
pub const BASS_LOW_HZ: f64 = 60.0;
/// Upper edge used to derive the bass band-pass Q
pub const BASS_HIGH_HZ: f64 = 250.0;

/// Available stem types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StemType {
    /// Centre-panned content
    Vocals,
    /// Stereo difference content
    Instruments,
    /// Low end of the mix below 200 Hz
    Drums,
    /// Narrow band around 60 Hz
    Bass,
}

impl StemType {
    /// Fixed role order
    pub const ALL: [StemType; 4] = [Self::Vocals, Self::Instruments, Self::Drums, Self::Bass];

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            StemType::Vocals => "Vocals",
            StemType::Instruments => "Instruments",
            StemType::Drums => "Drums",
            StemType::Bass => "Bass",
        }
    }

    /// Get short name for file naming
    pub fn short_name(&self) -> &'static str {
        match self {
            StemType::Vocals => "vocals",
            StemType::Instruments => "instruments",
            StemType::Drums => "drums",
            StemType::Bass => "bass",
        }
    }

    /// `<stem>_<source>.wav`
    pub fn file_name(&self, source: &str) -> String {
        format!("{}_{}.wav", self.short_name(), source_stem(source))
    }
}

/// The four separated stems, each mono
#[derive(Debug, Clone, PartialEq)]
pub struct StemSet {
    pub vocals: Signal,
    pub instruments: Signal,
    pub drums: Signal,
    pub bass: Signal,
}

impl StemSet {
    pub fn get(&self, stem: StemType) -> &Signal {
        match stem {
            StemType::Vocals => &self.vocals,
            StemType::Instruments => &self.instruments,
            StemType::Drums => &self.drums,
            StemType::Bass => &self.bass,
        }
    }

    /// Stems in role order
    pub fn iter(&self) -> impl Iterator<Item = (StemType, &Signal)> {
        StemType::ALL.into_iter().map(move |stem| (stem, self.get(stem)))
    }

    pub fn into_array(self) -> [(StemType, Signal); 4] {
        [
            (StemType::Vocals, self.vocals),
            (StemType::Instruments, self.instruments),
            (StemType::Drums, self.drums),
            (StemType::Bass, self.bass),
        ]
    }
}

/// Stem separation engine. Stateless; share freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeparationEngine;

impl SeparationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Split `signal` into stems. Fails as a whole; never returns a partial set.
    pub fn separate(&self, signal: &Signal) -> OfflineResult<StemSet> {
        self.separate_with(signal, &SeparationRequest::default())
    }

    pub fn separate_with(
        &self,
        signal: &Signal,
        _request: &SeparationRequest,
    ) -> OfflineResult<StemSet> {
        log::info!(
            "separate: {} ch, {} frames @ {} Hz",
            signal.channel_count(),
            signal.frame_count(),
            signal.sample_rate()
        );

        let ctx = RenderContext::new(signal)?;
        let sample_rate = ctx.sample_rate() as f64;

        let frames = signal.frame_count();
        let mut vocals = Vec::with_capacity(frames);
        let mut instruments = Vec::with_capacity(frames);
        for i in 0..frames {
            let ms = signal.stereo_frame(i).to_mid_side();
            vocals.push(ms.mid);
            instruments.push(ms.side);
        }

        let mix = signal.to_mono();
        let bass_q = BASS_LOW_HZ / (BASS_HIGH_HZ - BASS_LOW_HZ).max(1.0);

        let drums = Self::filter(
            mix.left(),
            FilterType::Lowpass,
            DRUMS_CUTOFF_HZ,
            q_from_resonance_db(DRUMS_RESONANCE_DB),
            sample_rate,
        )?;
        let bass = Self::filter(
            mix.left(),
            FilterType::Bandpass,
            BASS_LOW_HZ,
            bass_q,
            sample_rate,
        )?;

        let stems = StemSet {
            vocals: ctx.mono_output(vocals)?,
            instruments: ctx.mono_output(instruments)?,
            drums: ctx.mono_output(drums)?,
            bass: ctx.mono_output(bass)?,
        };

        log::debug!(
            "separate: peaks vocals {:.3}, instruments {:.3}, drums {:.3}, bass {:.3}",
            stems.vocals.peak(),
            stems.instruments.peak(),
            stems.drums.peak(),
            stems.bass.peak()
        );

        Ok(stems)
    }

    fn filter(
        input: &[Sample],
        filter_type: FilterType,
        freq: f64,
        q: f64,
        sample_rate: f64,
    ) -> OfflineResult<Vec<Sample>> {
        let mut filter = BiquadTDF2::design(filter_type, freq, q, 0.0, sample_rate)?;
        Ok(filter.filter(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OfflineError;

    #[test]
    fn test_stem_names() {
        assert_eq!(StemType::Vocals.file_name("song.mp3"), "vocals_song.wav");
        assert_eq!(StemType::Bass.display_name(), "Bass");
        assert_eq!(StemType::ALL.len(), 4);
    }

    #[test]
    fn test_mono_input_has_silent_instruments() {
        let signal = Signal::mono(vec![0.5, -0.25, 0.125, 0.0], 44100).unwrap();
        let stems = SeparationEngine::new().separate(&signal).unwrap();
        assert_eq!(stems.vocals.left(), signal.left());
        assert!(stems.instruments.left().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_iter_order_and_shape() {
        let signal = Signal::stereo(vec![0.1; 64], vec![0.2; 64], 22050).unwrap();
        let stems = SeparationEngine::new().separate(&signal).unwrap();

        let order: Vec<StemType> = stems.iter().map(|(stem, _)| stem).collect();
        assert_eq!(order, StemType::ALL.to_vec());

        for (_, stem) in stems.iter() {
            assert!(stem.is_mono());
            assert_eq!(stem.frame_count(), 64);
            assert_eq!(stem.sample_rate(), 22050);
        }

        let array = stems.clone().into_array();
        assert_eq!(array[2].0, StemType::Drums);
        assert_eq!(&array[2].1, stems.get(StemType::Drums));
    }

    #[test]
    fn test_zero_length_fails_atomically() {
        let signal = Signal::stereo(vec![], vec![], 44100).unwrap();
        assert!(matches!(
            SeparationEngine::new().separate(&signal),
            Err(OfflineError::EngineUnavailable(_))
        ));
    }
}
