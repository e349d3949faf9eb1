//! Enhancement pipeline
//!
//! Runs the seven stages in fixed order over one signal:
//! 1. Noise floor gain
//! 2. Genre EQ
//! 3. Compression
//! 4. Saturation
//! 5. Stereo widening
//! 6. Codec shaping
//! 7. Limiter
//!
//! A failing stage is bypassed and recorded; only a render backend that
//! cannot be built aborts the call.

use rh_core::Signal;

use crate::config::OfflineConfig;
use crate::context::RenderContext;
use crate::error::OfflineResult;
use crate::genre::GenreProfileTable;
use crate::progress::{NoProgress, ProgressObserver};
use crate::request::{CodecProfile, EnhancementLevel, EnhancementRequest};
use crate::stages::{run_stage, Stage, StageKind, StageLibrary, StageOutcome, StageWarning};

/// Result of one enhancement render
#[derive(Debug, Clone)]
pub struct EnhancementReport {
    pub signal: Signal,
    /// Stages that failed and were bypassed
    pub warnings: Vec<StageWarning>,
    /// Every stage whose output is its unchanged input
    pub bypassed: Vec<StageKind>,
    pub level: EnhancementLevel,
    /// Genre profile actually used
    pub genre: &'static str,
    pub codec_profile: CodecProfile,
}

impl EnhancementReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Offline enhancement renderer. Stateless between calls; share freely.
#[derive(Debug, Clone, Default)]
pub struct EnhancementPipeline {
    config: OfflineConfig,
}

impl EnhancementPipeline {
    pub fn new(config: OfflineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OfflineConfig {
        &self.config
    }

    /// Render `signal` through all stages
    pub fn enhance(&self, signal: &Signal, request: &EnhancementRequest) -> OfflineResult<Signal> {
        Ok(self.enhance_with_report(signal, request)?.signal)
    }

    /// Render and report which stages were bypassed and why
    pub fn enhance_with_report(
        &self,
        signal: &Signal,
        request: &EnhancementRequest,
    ) -> OfflineResult<EnhancementReport> {
        self.enhance_observed(signal, request, &NoProgress)
    }

    /// Render while reporting progress to `observer`
    pub fn enhance_observed(
        &self,
        signal: &Signal,
        request: &EnhancementRequest,
        observer: &dyn ProgressObserver,
    ) -> OfflineResult<EnhancementReport> {
        let level = request.level();
        let profile = GenreProfileTable::lookup(&request.genre);

        log::info!(
            "enhance: {} ch, {} frames @ {} Hz, level {} ({}), genre '{}' -> {}, codec {}, preserve_melody={}",
            signal.channel_count(),
            signal.frame_count(),
            signal.sample_rate(),
            level.get(),
            level.preset().name,
            request.genre,
            profile.name,
            request.codec_profile.id(),
            request.preserve_melody
        );

        let library = StageLibrary::build(request, &self.config);
        let run = self.render_stages(signal, library.iter(), observer)?;

        Ok(EnhancementReport {
            signal: run.signal,
            warnings: run.warnings,
            bypassed: run.bypassed,
            level,
            genre: profile.name,
            codec_profile: request.codec_profile,
        })
    }

    /// Run `stages` in order over `signal` inside one render context
    pub(crate) fn render_stages<'a>(
        &self,
        signal: &Signal,
        stages: impl IntoIterator<Item = &'a dyn Stage>,
        observer: &dyn ProgressObserver,
    ) -> OfflineResult<StageRun> {
        let ctx = match RenderContext::new(signal) {
            Ok(ctx) => ctx,
            Err(e) => {
                log::warn!("enhance aborted: {}", e);
                observer.render_finished(false);
                return Err(e);
            }
        };

        let mut current = signal.clone();
        let mut warnings = Vec::new();
        let mut bypassed = Vec::new();

        for stage in stages {
            observer.stage_started(stage.kind());
            let (output, outcome) = run_stage(stage, current);
            current = output;

            if outcome.is_bypass() {
                bypassed.push(stage.kind());
                observer.stage_bypassed(stage.kind(), outcome.warning());
            }
            match outcome {
                StageOutcome::Failed(warning) if self.config.collect_warnings => {
                    warnings.push(warning)
                }
                _ => {}
            }
        }

        if let Err(e) = ctx.check_output(&current, ctx.channel_count()) {
            observer.render_finished(false);
            return Err(e);
        }

        log::info!(
            "enhance: done, peak {:.2} dBFS, {} stage(s) bypassed",
            current.peak_db().0,
            bypassed.len()
        );
        observer.render_finished(true);

        Ok(StageRun {
            signal: current,
            warnings,
            bypassed,
        })
    }
}

/// Output of one pass over a stage list
#[derive(Debug)]
pub(crate) struct StageRun {
    pub signal: Signal,
    pub warnings: Vec<StageWarning>,
    pub bypassed: Vec<StageKind>,
}
