//! Batch orchestration.
//!
//! Generation and grading are synchronous and pure. The engine only fans
//! them out across many seeds or submissions, bounding concurrency with a
//! semaphore and running the CPU work on the blocking pool.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use crate::banks::ContentBanks;
use crate::grader::Grader;
use crate::model::TestPlan;
use crate::plan::{generate_plan_with, PlanOptions};
use crate::report::GradeReport;
use crate::results::Submission;

/// Configuration for the batch engine.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum concurrent jobs.
    pub parallelism: usize,
    /// Options applied to every generated plan.
    pub plan_options: PlanOptions,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            plan_options: PlanOptions::default(),
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_job_start(&self, label: &str);
    fn on_job_complete(&self, label: &str, elapsed: Duration);
    fn on_job_error(&self, label: &str, error: &str);
    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_job_start(&self, _: &str) {}
    fn on_job_complete(&self, _: &str, _: Duration) {}
    fn on_job_error(&self, _: &str, _: &str) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// Results of a batch, in input order, plus the jobs that failed.
#[derive(Debug)]
pub struct BatchOutcome<T> {
    pub results: Vec<T>,
    /// `(label, error)` for every failed job.
    pub failures: Vec<(String, String)>,
    pub elapsed: Duration,
}

/// A submission paired with the plan it answers.
#[derive(Debug, Clone)]
pub struct GradingJob {
    pub label: String,
    pub plan: Arc<TestPlan>,
    pub submission: Submission,
}

/// Fans plan generation and grading out over a bounded worker pool.
pub struct BatchEngine {
    banks: Arc<ContentBanks>,
    grader: Grader,
    config: BatchConfig,
}

impl BatchEngine {
    pub fn new(banks: Arc<ContentBanks>, grader: Grader, config: BatchConfig) -> Self {
        Self {
            banks,
            grader,
            config,
        }
    }

    /// Generate one plan per seed.
    pub async fn generate_plans(
        &self,
        seeds: &[String],
        now: DateTime<Utc>,
        progress: &dyn ProgressReporter,
    ) -> Result<BatchOutcome<TestPlan>> {
        let jobs = seeds.iter().map(|seed| {
            let banks = Arc::clone(&self.banks);
            let options = self.config.plan_options.clone();
            let grader = self.grader.clone();
            let seed = seed.clone();
            (seed.clone(), move || {
                generate_plan_with(&seed, &options, &banks, now, grader.digest())
                    .map_err(anyhow::Error::from)
            })
        });
        self.run(jobs.collect(), progress).await
    }

    /// Grade every job into a report stamped at `now`.
    pub async fn grade_submissions(
        &self,
        jobs: Vec<GradingJob>,
        now: DateTime<Utc>,
        progress: &dyn ProgressReporter,
    ) -> Result<BatchOutcome<GradeReport>> {
        let jobs = jobs.into_iter().map(|job| {
            let grader = self.grader.clone();
            (job.label, move || {
                let grade = grader.grade_plan(&job.plan, &job.submission);
                Ok(GradeReport::from_grade(grade, now))
            })
        });
        self.run(jobs.collect(), progress).await
    }

    async fn run<T, F>(
        &self,
        jobs: Vec<(String, F)>,
        progress: &dyn ProgressReporter,
    ) -> Result<BatchOutcome<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        anyhow::ensure!(self.config.parallelism >= 1, "parallelism must be at least 1");
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism));
        let total = jobs.len();

        let mut futures = FuturesUnordered::new();
        for (index, (label, job)) in jobs.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            futures.push(async move {
                let result = async {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| anyhow::anyhow!("semaphore closed"))?;
                    progress.on_job_start(&label);
                    let job_start = Instant::now();
                    let value = tokio::task::spawn_blocking(job)
                        .await
                        .map_err(|e| anyhow::anyhow!("worker panicked: {e}"))??;
                    Ok::<_, anyhow::Error>((value, job_start.elapsed()))
                }
                .await;
                (index, label, result)
            });
        }

        let mut slots: Vec<Option<T>> = (0..total).map(|_| None).collect();
        let mut failures = Vec::new();
        while let Some((index, label, result)) = futures.next().await {
            match result {
                Ok((value, elapsed)) => {
                    progress.on_job_complete(&label, elapsed);
                    slots[index] = Some(value);
                }
                Err(e) => {
                    tracing::error!("job {label} failed: {e:#}");
                    progress.on_job_error(&label, &format!("{e:#}"));
                    failures.push((label, format!("{e:#}")));
                }
            }
        }

        let results: Vec<T> = slots.into_iter().flatten().collect();
        let elapsed = start.elapsed();
        progress.on_batch_complete(total, results.len(), failures.len(), elapsed);
        Ok(BatchOutcome {
            results,
            failures,
            elapsed,
        })
    }
}
