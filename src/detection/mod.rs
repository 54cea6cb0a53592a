//! Detection task adapter.
//!
//! Wraps a potentially slow detector behind a single async call that yields
//! an ordered [`ResultList`]. The detection heuristics themselves live in
//! the detector implementations; this module only fixes the contract:
//!
//! - `detect()` either returns the complete list or a [`DetectionError`]
//! - [`DetectorTask`] bounds the call with a timeout and a cancellation token
//!
//! # Detectors
//! - [`StaticDetector`]: canned results, used for the demo mode and tests
//! - [`CommandDetector`]: runs an external program and parses its JSON report

mod command;
mod diagnostic;
mod types;

pub use command::{CommandDetector, DetectionReport};
pub use diagnostic::{diagnostic_channel, DiagnosticMessage, DiagnosticReporter};
pub use types::{CheckResult, ResultList, RunId, Verdict};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors produced while obtaining check results.
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("Failed to spawn detector `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Detector exited with {status}: {stderr}")]
    Exited { status: String, stderr: String },

    #[error("Malformed detector report: {0}")]
    MalformedReport(#[from] serde_json::Error),

    #[error("Detector timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Detection cancelled")]
    Cancelled,

    #[error("Detector task failed: {0}")]
    Internal(String),
}

/// A source of check results.
///
/// # Invariants
/// - `detect()` never panics; failures are returned as `Err`
/// - The returned list is complete; results are never streamed
#[async_trait]
pub trait Detector: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Run every check and return the results in reveal order.
    async fn detect(&self) -> Result<ResultList, DetectionError>;
}

/// A detector bound to the timeout policy of the panel.
#[derive(Clone)]
pub struct DetectorTask {
    detector: Arc<dyn Detector>,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for DetectorTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorTask")
            .field("detector", &self.detector.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl DetectorTask {
    /// Wrap `detector`; `timeout == None` lets the call run indefinitely.
    pub fn new(detector: Arc<dyn Detector>, timeout: Option<Duration>) -> Self {
        Self { detector, timeout }
    }

    pub fn detector_name(&self) -> &str {
        self.detector.name()
    }

    /// Invoke the detector once.
    ///
    /// # Postconditions
    /// - Returns `Err(Cancelled)` as soon as `cancel` fires, dropping the
    ///   in-flight detector future
    /// - Returns `Err(TimedOut)` if the timeout elapses first
    pub async fn invoke(&self, cancel: &CancellationToken) -> Result<ResultList, DetectionError> {
        let name = self.detector.name();
        tracing::info!(detector = name, timeout = ?self.timeout, "Invoking detector");

        let bounded = async {
            match self.timeout {
                Some(limit) => tokio::time::timeout(limit, self.detector.detect())
                    .await
                    .unwrap_or(Err(DetectionError::TimedOut(limit))),
                None => self.detector.detect().await,
            }
        };

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DetectionError::Cancelled),
            result = bounded => result,
        };

        match &result {
            Ok(results) => {
                tracing::info!(detector = name, results = results.len(), "Detector finished")
            }
            Err(DetectionError::Cancelled) => {
                tracing::debug!(detector = name, "Detector call cancelled")
            }
            Err(e) => tracing::warn!(detector = name, error = %e, "Detector failed"),
        }
        result
    }
}

/// Detector returning a fixed list, optionally after a simulated delay.
#[derive(Debug, Clone)]
pub struct StaticDetector {
    results: ResultList,
    latency: Duration,
    diagnostic: Option<(DiagnosticReporter, String)>,
}

impl StaticDetector {
    pub fn new(results: impl Into<ResultList>) -> Self {
        Self {
            results: results.into(),
            latency: Duration::ZERO,
            diagnostic: None,
        }
    }

    /// Wait `latency` before returning the results.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Report `message` as the last diagnostic on every call.
    pub fn reporting(mut self, reporter: DiagnosticReporter, message: impl Into<String>) -> Self {
        self.diagnostic = Some((reporter, message.into()));
        self
    }

    /// Canned results shown when no external detector is configured.
    pub fn demo(reporter: DiagnosticReporter) -> Self {
        let results = vec![
            CheckResult::new("Root management apps", false),
            CheckResult::new("Potentially dangerous apps", false),
            CheckResult::new("Root cloaking apps", false),
            CheckResult::new("Test-keys build", false),
            CheckResult::new("BusyBox binary", true)
                .with_detail("busybox found at /system/xbin/busybox"),
            CheckResult::new("su binary", false),
            CheckResult::new("su on PATH", false),
            CheckResult::new("Writable system paths", false),
            CheckResult::new("Dangerous system properties", false),
            CheckResult::new("Native su check", false),
            CheckResult::new("Magisk binary", false),
        ];
        Self::new(results)
            .with_latency(Duration::from_millis(800))
            .reporting(reporter, "BusyBox binary: /system/xbin/busybox")
    }
}

#[async_trait]
impl Detector for StaticDetector {
    fn name(&self) -> &str {
        "static"
    }

    async fn detect(&self) -> Result<ResultList, DetectionError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if let Some((reporter, message)) = &self.diagnostic {
            reporter.report(message.clone());
        }
        Ok(self.results.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NeverDetector;

    #[async_trait]
    impl Detector for NeverDetector {
        fn name(&self) -> &str {
            "never"
        }

        async fn detect(&self) -> Result<ResultList, DetectionError> {
            std::future::pending().await
        }
    }

    fn sample() -> Vec<CheckResult> {
        vec![CheckResult::new("A", false), CheckResult::new("B", true)]
    }

    #[tokio::test(start_paused = true)]
    async fn static_detector_returns_results_in_order() {
        let task = DetectorTask::new(
            Arc::new(StaticDetector::new(sample()).with_latency(Duration::from_secs(2))),
            None,
        );
        let results = task.invoke(&CancellationToken::new()).await.unwrap();
        let labels: Vec<_> = results.iter().map(CheckResult::label).collect();
        assert_eq!(labels, vec!["A", "B"]);
    }

    #[tokio::test(start_paused = true)]
    async fn static_detector_reports_diagnostic() {
        let (reporter, message) = diagnostic_channel();
        let detector = StaticDetector::new(sample()).reporting(reporter, "su at /sbin/su");
        detector.detect().await.unwrap();
        assert_eq!(message.snapshot(), "su at /sbin/su");
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_turns_hung_detector_into_error() {
        let task = DetectorTask::new(Arc::new(NeverDetector), Some(Duration::from_secs(5)));
        let err = task.invoke(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, DetectionError::TimedOut(d) if d == Duration::from_secs(5)));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_unbounded_detector() {
        let task = DetectorTask::new(Arc::new(NeverDetector), None);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });
        let err = task.invoke(&cancel).await.unwrap_err();
        assert!(matches!(err, DetectionError::Cancelled));
    }

    #[tokio::test]
    async fn cancelled_token_wins_over_ready_result() {
        let task = DetectorTask::new(Arc::new(StaticDetector::new(sample())), None);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = task.invoke(&cancel).await;
        tokio_test::assert_err!(result);
    }

    #[test]
    fn demo_detector_has_one_positive_check() {
        let (reporter, _message) = diagnostic_channel();
        let demo = StaticDetector::demo(reporter);
        assert_eq!(demo.results.verdict(), Verdict::Rooted);
        assert_eq!(demo.results.iter().filter(|r| r.passed()).count(), 1);
    }
}
