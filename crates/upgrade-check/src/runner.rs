//! Multi-target runner: one isolated workflow run per resolved target

use std::path::PathBuf;
use std::time::Instant;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{error, info, info_span, Instrument};

use crate::config::RunnerConfig;
use crate::context::VerificationTarget;
use crate::error::VerifyResult;
use crate::preflight;
use crate::workflow::{RunReport, Workflow};

/// Provides a fresh browser for every target run
#[async_trait]
pub trait BrowserLauncher: Sync {
    type Browser: crate::browser::Browser;

    async fn launch(&self) -> VerifyResult<Self::Browser>;

    /// Tear the browser down once its run is over
    async fn release(&self, browser: Self::Browser) {
        drop(browser);
    }
}

/// Result of verifying every target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<RunReport>,
}

impl SuiteReport {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

pub struct VerificationRunner<L: BrowserLauncher> {
    launcher: L,
    config: RunnerConfig,
}

impl<L: BrowserLauncher> VerificationRunner<L> {
    pub fn new(launcher: L, config: RunnerConfig) -> Self {
        Self { launcher, config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Verify every target; a failing target never stops the others
    pub async fn run_all(&self, targets: Vec<VerificationTarget>) -> SuiteReport {
        let start = Instant::now();
        let total = targets.len();
        let jobs = self.config.jobs.max(1);

        info!("Verifying {} target(s), {} at a time...", total, jobs);

        let results: Vec<RunReport> = stream::iter(targets)
            .map(|target| self.run_target(target))
            .buffered(jobs)
            .collect()
            .await;

        let passed = results.iter().filter(|r| r.success()).count();
        let failed = total - passed;
        let duration_ms = start.elapsed().as_millis() as u64;

        info!("");
        info!(
            "Verification results: {} passed, {} failed ({} ms)",
            passed, failed, duration_ms
        );

        SuiteReport {
            total,
            passed,
            failed,
            duration_ms,
            results,
        }
    }

    /// Verify a single target with its own browser and context
    pub async fn run_target(&self, target: VerificationTarget) -> RunReport {
        let span = info_span!("target", url = %target.url);
        async move {
            let report = self.verify(target).await;
            match &report.failure {
                None => info!("✓ {} ({} ms)", report.target.url, report.duration_ms),
                Some(failure) => error!(
                    "✗ {} failed at {} - {}",
                    report.target.url, failure.stage, failure.reason
                ),
            }
            report
        }
        .instrument(span)
        .await
    }

    async fn verify(&self, target: VerificationTarget) -> RunReport {
        if let Some(preflight) = &self.config.preflight {
            if let Err(e) = preflight::probe(target.front_office_url(), preflight).await {
                return RunReport::not_started(target, &e);
            }
        }

        let browser = match self.launcher.launch().await {
            Ok(browser) => browser,
            Err(e) => return RunReport::not_started(target, &e),
        };

        let mut workflow = Workflow::new(browser, &target, self.config.workflow.clone());
        let report = workflow.run().await;
        self.launcher.release(workflow.into_browser()).await;
        report
    }

    /// Write the suite report as JSON into the output directory
    pub fn write_results(&self, report: &SuiteReport) -> VerifyResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("verification-results.json");
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}
