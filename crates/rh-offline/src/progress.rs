//! Render progress reporting

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::stages::{StageKind, StageWarning};

// ═══════════════════════════════════════════════════════════════════════════════
// PIPELINE STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Render execution state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PipelineState {
    #[default]
    Idle,
    Processing,
    Complete,
    Failed,
}

// ═══════════════════════════════════════════════════════════════════════════════
// OBSERVER
// ═══════════════════════════════════════════════════════════════════════════════

/// Receives render events. All methods default to no-ops.
pub trait ProgressObserver: Send + Sync {
    fn stage_started(&self, _stage: StageKind) {}

    fn stage_bypassed(&self, _stage: StageKind, _warning: Option<&StageWarning>) {}

    /// `success` is false when the render aborted with a fatal error
    fn render_finished(&self, _success: bool) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}

// ═══════════════════════════════════════════════════════════════════════════════
// TRACKER
// ═══════════════════════════════════════════════════════════════════════════════

/// Snapshot of a render's progress
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineProgress {
    pub state: PipelineState,
    /// Stage currently running (or last run)
    pub current_stage: Option<StageKind>,
    /// Stages finished so far
    pub completed_stages: usize,
    /// 0.0 - 1.0
    pub fraction: f64,
    pub bypassed: Vec<StageKind>,
}

/// Thread-safe observer callers can poll while a render runs elsewhere
#[derive(Debug, Default)]
pub struct ProgressTracker {
    inner: RwLock<PipelineProgress>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PipelineState {
        self.inner.read().state
    }

    pub fn fraction(&self) -> f64 {
        self.inner.read().fraction
    }

    /// 0-based index of the current stage
    pub fn stage_index(&self) -> Option<usize> {
        self.inner.read().current_stage.map(|s| s.index())
    }

    pub fn progress(&self) -> PipelineProgress {
        self.inner.read().clone()
    }

    pub fn reset(&self) {
        *self.inner.write() = PipelineProgress::default();
    }
}

impl ProgressObserver for ProgressTracker {
    fn stage_started(&self, stage: StageKind) {
        let mut progress = self.inner.write();
        if stage.index() == 0 {
            // First stage of a new render
            *progress = PipelineProgress::default();
        } else if progress.current_stage.is_some() {
            progress.completed_stages = (progress.completed_stages + 1).min(StageKind::ALL.len());
        }
        progress.state = PipelineState::Processing;
        progress.current_stage = Some(stage);
        progress.fraction = progress.completed_stages as f64 / StageKind::ALL.len() as f64;
    }

    fn stage_bypassed(&self, stage: StageKind, _warning: Option<&StageWarning>) {
        self.inner.write().bypassed.push(stage);
    }

    fn render_finished(&self, success: bool) {
        let mut progress = self.inner.write();
        if success {
            progress.state = PipelineState::Complete;
            progress.completed_stages = StageKind::ALL.len();
            progress.fraction = 1.0;
        } else {
            progress.state = PipelineState::Failed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_walks_through_stages() {
        let tracker = ProgressTracker::new();
        assert_eq!(tracker.state(), PipelineState::Idle);
        assert_eq!(tracker.stage_index(), None);

        tracker.stage_started(StageKind::NoiseFloor);
        assert_eq!(tracker.state(), PipelineState::Processing);
        assert_eq!(tracker.fraction(), 0.0);

        tracker.stage_started(StageKind::GenreEq);
        assert_eq!(tracker.stage_index(), Some(1));
        assert!((tracker.fraction() - 1.0 / 7.0).abs() < 1e-12);

        tracker.stage_bypassed(StageKind::GenreEq, None);
        tracker.render_finished(true);

        let progress = tracker.progress();
        assert_eq!(progress.state, PipelineState::Complete);
        assert_eq!(progress.fraction, 1.0);
        assert_eq!(progress.bypassed, vec![StageKind::GenreEq]);
    }

    #[test]
    fn test_failed_render() {
        let tracker = ProgressTracker::new();
        tracker.render_finished(false);
        assert_eq!(tracker.state(), PipelineState::Failed);

        tracker.reset();
        assert_eq!(tracker.state(), PipelineState::Idle);
    }

    #[test]
    fn test_reused_tracker_starts_over() {
        let tracker = ProgressTracker::new();
        for _ in 0..3 {
            for stage in StageKind::ALL {
                tracker.stage_started(stage);
                assert!(tracker.fraction() <= 1.0);
            }
            tracker.stage_bypassed(StageKind::StereoWidening, None);
            tracker.render_finished(true);
        }

        tracker.stage_started(StageKind::NoiseFloor);
        let progress = tracker.progress();
        assert_eq!(progress.state, PipelineState::Processing);
        assert_eq!(progress.completed_stages, 0);
        assert_eq!(progress.fraction, 0.0);
        assert!(progress.bypassed.is_empty());

        tracker.stage_started(StageKind::GenreEq);
        assert_eq!(tracker.progress().completed_stages, 1);
    }
}
