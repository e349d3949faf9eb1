//! Batch rendering on a rayon pool

use rayon::prelude::*;
use rh_core::Signal;

use crate::config::OfflineConfig;
use crate::error::OfflineResult;
use crate::pipeline::{EnhancementPipeline, EnhancementReport};
use crate::request::{output_file_name, EnhancementRequest};

/// One independent enhancement render
#[derive(Debug, Clone)]
pub struct EnhanceJob {
    /// Source name, used for the output file name
    pub name: String,
    pub signal: Signal,
    pub request: EnhancementRequest,
}

impl EnhanceJob {
    pub fn new(name: impl Into<String>, signal: Signal, request: EnhancementRequest) -> Self {
        Self {
            name: name.into(),
            signal,
            request,
        }
    }

    /// `enhanced_<name>.wav`
    pub fn output_file_name(&self) -> String {
        output_file_name(&self.name)
    }
}

/// Per-job outcome; a failed job does not affect the others
#[derive(Debug)]
pub struct JobResult {
    pub name: String,
    pub result: OfflineResult<EnhancementReport>,
}

impl JobResult {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Renders many jobs in parallel, one render context per job
#[derive(Debug, Clone)]
pub struct BatchRenderer {
    pipeline: EnhancementPipeline,
    max_parallel: usize,
}

impl BatchRenderer {
    pub fn new(config: OfflineConfig) -> Self {
        let threads = if config.thread_count == 0 {
            rayon::current_num_threads()
        } else {
            config.thread_count
        };
        let max_parallel = threads.min(config.max_parallel_jobs).max(1);

        Self {
            pipeline: EnhancementPipeline::new(config),
            max_parallel,
        }
    }

    /// Set max parallel jobs
    pub fn with_max_parallel(mut self, max: usize) -> Self {
        self.max_parallel = max.max(1);
        self
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Render all jobs; results are in job order
    pub fn enhance_all(&self, jobs: &[EnhanceJob]) -> Vec<JobResult> {
        log::info!(
            "batch: {} job(s), up to {} in parallel",
            jobs.len(),
            self.max_parallel
        );

        let render = |job: &EnhanceJob| {
            let result = self.pipeline.enhance_with_report(&job.signal, &job.request);
            if let Err(e) = &result {
                log::warn!("batch job '{}' failed: {}", job.name, e);
            }
            JobResult {
                name: job.name.clone(),
                result,
            }
        };

        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_parallel)
            .build()
        {
            Ok(pool) => pool.install(|| jobs.par_iter().map(render).collect()),
            Err(e) => {
                log::warn!("batch: thread pool unavailable ({}), rendering serially", e);
                jobs.iter().map(render).collect()
            }
        }
    }
}

impl Default for BatchRenderer {
    fn default() -> Self {
        Self::new(OfflineConfig::default())
    }
}
