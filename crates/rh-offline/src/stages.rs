//! Enhancement stages
//!
//! Seven independent signal transforms, applied in a fixed order by the
//! enhancement pipeline. Each stage owns only its parameters; filters,
//! envelope followers and delay lines are built inside [`Stage::apply`] so
//! every render starts from clean state.

use rh_core::{Decibels, Sample, Signal};
use rh_dsp::biquad::{q_from_resonance_db, BiquadCascade, BiquadCoeffs, BiquadTDF2, FilterType};
use rh_dsp::delay::DelayLine;
use rh_dsp::dynamics::Compressor;
use rh_dsp::oversampling::OversampleFactor;
use rh_dsp::saturation::{OversampledWaveshaper, Waveshaper};
use rh_dsp::FrameProcessor;
use serde::Serialize;

use crate::config::OfflineConfig;
use crate::error::{OfflineError, OfflineResult};
use crate::genre::{GenreProfile, GenreProfileTable};
use crate::request::{CodecProfile, EnhancementLevel, EnhancementRequest};

// ═══════════════════════════════════════════════════════════════════════════════
// STAGE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Stage identity, in canonical pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StageKind {
    NoiseFloor,
    GenreEq,
    Compression,
    Saturation,
    StereoWidening,
    CodecShaping,
    Limiter,
}

impl StageKind {
    pub const ALL: [StageKind; 7] = [
        Self::NoiseFloor,
        Self::GenreEq,
        Self::Compression,
        Self::Saturation,
        Self::StereoWidening,
        Self::CodecShaping,
        Self::Limiter,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::NoiseFloor => "NoiseFloor",
            Self::GenreEq => "GenreEq",
            Self::Compression => "Compression",
            Self::Saturation => "Saturation",
            Self::StereoWidening => "StereoWidening",
            Self::CodecShaping => "CodecShaping",
            Self::Limiter => "Limiter",
        }
    }

    /// Position in the pipeline (0-based)
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// What a stage did with its input
#[derive(Debug, Clone, PartialEq)]
pub enum StageResult {
    /// New signal for the next stage
    Replaced(Signal),
    /// Leave the input untouched
    Bypass,
}

/// Record of a stage that failed and was bypassed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageWarning {
    pub stage: StageKind,
    pub message: String,
}

/// One transform in the enhancement chain
pub trait Stage: Send + Sync {
    fn kind(&self) -> StageKind;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Transform `signal`. Errors are recoverable: the pipeline bypasses the stage.
    fn apply(&self, signal: &Signal) -> OfflineResult<StageResult>;
}

/// How a stage run ended
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    Applied,
    Bypassed,
    Failed(StageWarning),
}

impl StageOutcome {
    pub fn warning(&self) -> Option<&StageWarning> {
        match self {
            Self::Failed(warning) => Some(warning),
            _ => None,
        }
    }

    /// True when the output is the unchanged input
    pub fn is_bypass(&self) -> bool {
        !matches!(self, Self::Applied)
    }
}

/// Run `stage`, falling back to the unchanged input if it fails
pub fn run_stage(stage: &dyn Stage, signal: Signal) -> (Signal, StageOutcome) {
    match stage.apply(&signal) {
        Ok(StageResult::Replaced(output)) => {
            log::debug!("{}: applied", stage.name());
            (output, StageOutcome::Applied)
        }
        Ok(StageResult::Bypass) => {
            log::debug!("{}: bypassed", stage.name());
            (signal, StageOutcome::Bypassed)
        }
        Err(e) => {
            log::warn!("{} failed, bypassing: {}", stage.name(), e);
            let warning = StageWarning {
                stage: stage.kind(),
                message: e.to_string(),
            };
            (signal, StageOutcome::Failed(warning))
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Filter every channel with its own copy of one filter design
fn filter_channels(signal: &Signal, coeffs: &[BiquadCoeffs]) -> OfflineResult<Signal> {
    let sample_rate = signal.sample_rate() as f64;
    let output = signal.map_channels(|_, samples| {
        let mut cascade = BiquadCascade::new();
        for &c in coeffs {
            cascade.push(BiquadTDF2::with_coeffs(c, sample_rate));
        }
        cascade.filter(samples)
    })?;
    Ok(output)
}

/// Run a compressor over all channels with one linked detector
fn compress_linked(signal: &Signal, comp: &mut Compressor) -> Vec<Vec<Sample>> {
    let mut channels = signal.channels().to_vec();
    let mut frame = vec![0.0; channels.len()];

    for i in 0..signal.frame_count() {
        for (slot, ch) in frame.iter_mut().zip(&channels) {
            *slot = ch[i];
        }
        comp.process_frame(&mut frame);
        for (ch, &s) in channels.iter_mut().zip(&frame) {
            ch[i] = s;
        }
    }

    channels
}

// ═══════════════════════════════════════════════════════════════════════════════
// 1. NOISE FLOOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Broadband gain reduction that grows with the level
#[derive(Debug, Clone)]
pub struct NoiseFloorStage {
    gain: f64,
}

impl NoiseFloorStage {
    pub fn new(level: EnhancementLevel) -> Self {
        Self {
            gain: (1.0 - level.as_f64() * 0.05).max(0.1),
        }
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }
}

impl Stage for NoiseFloorStage {
    fn kind(&self) -> StageKind {
        StageKind::NoiseFloor
    }

    fn apply(&self, signal: &Signal) -> OfflineResult<StageResult> {
        let gain = self.gain;
        let output = signal.map_channels(|_, ch| ch.iter().map(|s| s * gain).collect())?;
        Ok(StageResult::Replaced(output))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// 2. GENRE EQ
// ═══════════════════════════════════════════════════════════════════════════════

/// Cascade of peaking bands from the genre profile
#[derive(Debug, Clone)]
pub struct GenreEqStage {
    profile: GenreProfile,
}

impl GenreEqStage {
    pub fn new(genre: &str) -> Self {
        Self::with_profile(GenreProfileTable::lookup(genre))
    }

    pub fn with_profile(profile: GenreProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &GenreProfile {
        &self.profile
    }

    /// Designs for every band the sample rate can represent
    fn design_bands(&self, sample_rate: f64) -> Vec<BiquadCoeffs> {
        self.profile
            .bands
            .iter()
            .filter_map(|band| {
                let b = band.clamped();
                match BiquadCoeffs::design(
                    FilterType::Peaking,
                    b.frequency_hz,
                    b.q,
                    b.gain_db,
                    sample_rate,
                ) {
                    Ok(coeffs) => Some(coeffs),
                    Err(e) => {
                        log::warn!(
                            "{} EQ: skipping {} Hz band: {}",
                            self.profile.name,
                            b.frequency_hz,
                            e
                        );
                        None
                    }
                }
            })
            .collect()
    }
}

impl Stage for GenreEqStage {
    fn kind(&self) -> StageKind {
        StageKind::GenreEq
    }

    fn apply(&self, signal: &Signal) -> OfflineResult<StageResult> {
        let coeffs = self.design_bands(signal.sample_rate() as f64);
        if coeffs.is_empty() {
            return Err(OfflineError::stage(
                self.name(),
                format!(
                    "no '{}' band fits below Nyquist at {} Hz",
                    self.profile.name,
                    signal.sample_rate()
                ),
            ));
        }

        Ok(StageResult::Replaced(filter_channels(signal, &coeffs)?))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// 3. COMPRESSION
// ═══════════════════════════════════════════════════════════════════════════════

/// Level-dependent soft-knee bus compression
#[derive(Debug, Clone)]
pub struct CompressionStage {
    threshold_db: f64,
    ratio: f64,
    knee_db: f64,
    attack_ms: f64,
    release_ms: f64,
}

impl CompressionStage {
    pub fn new(level: EnhancementLevel) -> Self {
        let level = level.as_f64();
        Self {
            threshold_db: (-24.0 + level * 2.0).clamp(-50.0, 0.0),
            ratio: (4.0 + level * 0.5).clamp(1.0, 20.0),
            knee_db: 30.0,
            attack_ms: 3.0,
            release_ms: 250.0,
        }
    }

    pub fn threshold_db(&self) -> f64 {
        self.threshold_db
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }
}

impl Stage for CompressionStage {
    fn kind(&self) -> StageKind {
        StageKind::Compression
    }

    fn apply(&self, signal: &Signal) -> OfflineResult<StageResult> {
        let mut comp = Compressor::new(signal.sample_rate() as f64);
        comp.set_threshold(self.threshold_db);
        comp.set_ratio(self.ratio);
        comp.set_knee(self.knee_db);
        comp.set_times(self.attack_ms, self.release_ms);

        let channels = compress_linked(signal, &mut comp);
        Ok(StageResult::Replaced(signal.with_channels(channels)?))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// 4. SATURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Oversampled `tanh` waveshaping
#[derive(Debug, Clone)]
pub struct SaturationStage {
    oversampling: OversampleFactor,
}

impl SaturationStage {
    pub fn new(oversampling: OversampleFactor) -> Self {
        Self { oversampling }
    }
}

impl Default for SaturationStage {
    fn default() -> Self {
        Self::new(OversampleFactor::X4)
    }
}

impl Stage for SaturationStage {
    fn kind(&self) -> StageKind {
        StageKind::Saturation
    }

    fn apply(&self, signal: &Signal) -> OfflineResult<StageResult> {
        let shaper = Waveshaper::enhance().map_err(|e| OfflineError::stage(self.name(), e))?;
        let shaper = OversampledWaveshaper::new(shaper, self.oversampling);

        let output = signal.map_channels(|_, ch| shaper.process(ch))?;
        Ok(StageResult::Replaced(output))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// 5. STEREO WIDENING
// ═══════════════════════════════════════════════════════════════════════════════

/// Haas-style widening: the right channel is delayed
#[derive(Debug, Clone)]
pub struct StereoWideningStage {
    delay_ms: f64,
}

impl StereoWideningStage {
    pub const DEFAULT_DELAY_MS: f64 = 10.0;

    pub fn new() -> Self {
        Self {
            delay_ms: Self::DEFAULT_DELAY_MS,
        }
    }
}

impl Default for StereoWideningStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for StereoWideningStage {
    fn kind(&self) -> StageKind {
        StageKind::StereoWidening
    }

    fn apply(&self, signal: &Signal) -> OfflineResult<StageResult> {
        if !signal.is_stereo() {
            return Ok(StageResult::Bypass);
        }

        let mut delay = DelayLine::from_ms(self.delay_ms, signal.sample_rate() as f64);
        let right = delay.delay(signal.right());
        let output = signal.with_channels(vec![signal.left().to_vec(), right])?;
        Ok(StageResult::Replaced(output))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// 6. CODEC SHAPING
// ═══════════════════════════════════════════════════════════════════════════════

/// Final tonal colour per codec profile
#[derive(Debug, Clone)]
pub struct CodecShapingStage {
    profile: CodecProfile,
}

impl CodecShapingStage {
    /// Resonance of the SpatialWide 20 Hz high-pass, in dB
    pub const SPATIAL_RESONANCE_DB: f64 = 0.7;

    pub fn new(profile: CodecProfile) -> Self {
        Self { profile }
    }

    fn design(&self, sample_rate: f64) -> OfflineResult<BiquadCoeffs> {
        let coeffs = match self.profile {
            CodecProfile::SpatialWide => BiquadCoeffs::design(
                FilterType::Highpass,
                20.0,
                q_from_resonance_db(Self::SPATIAL_RESONANCE_DB),
                0.0,
                sample_rate,
            ),
            CodecProfile::EnhancedStereo => {
                BiquadCoeffs::design(FilterType::Peaking, 1000.0, 1.0, 1.0, sample_rate)
            }
            CodecProfile::Lossless | CodecProfile::StandardStereo => {
                BiquadCoeffs::design(FilterType::Allpass, 1000.0, 1.0, 0.0, sample_rate)
            }
        };
        coeffs.map_err(|e| OfflineError::stage(self.name(), e))
    }
}

impl Stage for CodecShapingStage {
    fn kind(&self) -> StageKind {
        StageKind::CodecShaping
    }

    fn apply(&self, signal: &Signal) -> OfflineResult<StageResult> {
        let coeffs = self.design(signal.sample_rate() as f64)?;
        Ok(StageResult::Replaced(filter_channels(signal, &[coeffs])?))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// 7. LIMITER
// ═══════════════════════════════════════════════════════════════════════════════

/// Fast compressor followed by a hard ceiling
#[derive(Debug, Clone)]
pub struct LimiterStage {
    ceiling_db: f64,
}

impl LimiterStage {
    pub const CEILING_DB: f64 = -0.1;

    pub fn new() -> Self {
        Self {
            ceiling_db: Self::CEILING_DB,
        }
    }

    /// Linear ceiling no output sample exceeds
    pub fn ceiling(&self) -> f64 {
        Decibels(self.ceiling_db).to_gain()
    }
}

impl Default for LimiterStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for LimiterStage {
    fn kind(&self) -> StageKind {
        StageKind::Limiter
    }

    fn apply(&self, signal: &Signal) -> OfflineResult<StageResult> {
        let mut comp = Compressor::new(signal.sample_rate() as f64);
        comp.set_threshold(self.ceiling_db);
        comp.set_knee(0.0);
        comp.set_ratio(20.0);
        comp.set_times(1.0, 10.0);

        let ceiling = self.ceiling();
        let mut channels = compress_linked(signal, &mut comp);
        for ch in &mut channels {
            for s in ch.iter_mut() {
                *s = s.clamp(-ceiling, ceiling);
            }
        }

        Ok(StageResult::Replaced(signal.with_channels(channels)?))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STAGE LIBRARY
// ═══════════════════════════════════════════════════════════════════════════════

/// The seven stages for one request, in canonical order
pub struct StageLibrary {
    stages: Vec<Box<dyn Stage>>,
}

impl std::fmt::Debug for StageLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageLibrary")
            .field("stages", &self.stages.iter().map(|s| s.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl StageLibrary {
    pub fn build(request: &EnhancementRequest, config: &OfflineConfig) -> Self {
        let level = request.level();
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(NoiseFloorStage::new(level)),
            Box::new(GenreEqStage::new(&request.genre)),
            Box::new(CompressionStage::new(level)),
            Box::new(SaturationStage::new(config.saturation_oversampling)),
            Box::new(StereoWideningStage::new()),
            Box::new(CodecShapingStage::new(request.codec_profile)),
            Box::new(LimiterStage::new()),
        ];
        Self { stages }
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Stage> {
        self.stages.iter().map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
