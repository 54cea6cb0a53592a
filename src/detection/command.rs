//! Detector backed by an external program.
//!
//! The program is run once per invocation and must print a JSON report on
//! stdout:
//!
//! ```text
//! {
//!   "checks": [{ "label": "su binary", "passed": true, "detail": "/system/xbin/su" }],
//!   "last_detail": "su binary found at /system/xbin/su"
//! }
//! ```
//!
//! A non-empty `last_detail` becomes the last diagnostic message.

use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use super::{CheckResult, DetectionError, Detector, DiagnosticReporter, ResultList};

/// Report printed by an external detector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionReport {
    pub checks: Vec<CheckResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_detail: Option<String>,
}

/// Runs `program args...` and parses its stdout as a [`DetectionReport`].
#[derive(Debug, Clone)]
pub struct CommandDetector {
    program: String,
    args: Vec<String>,
    reporter: Option<DiagnosticReporter>,
}

impl CommandDetector {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            reporter: None,
        }
    }

    /// Forward the report's `last_detail` to `reporter`.
    pub fn with_reporter(mut self, reporter: DiagnosticReporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    fn parse_report(&self, stdout: &[u8]) -> Result<ResultList, DetectionError> {
        let report: DetectionReport = serde_json::from_slice(stdout)?;
        if let (Some(reporter), Some(detail)) = (&self.reporter, report.last_detail) {
            if !detail.trim().is_empty() {
                reporter.report(detail);
            }
        }
        Ok(ResultList::new(report.checks))
    }
}

#[async_trait]
impl Detector for CommandDetector {
    fn name(&self) -> &str {
        &self.program
    }

    async fn detect(&self) -> Result<ResultList, DetectionError> {
        // kill_on_drop reaps the child when a timeout or cancellation drops this future.
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| DetectionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let status = output
                .status
                .code()
                .map(|code| format!("exit code {}", code))
                .unwrap_or_else(|| "signal".to_string());
            return Err(DetectionError::Exited {
                status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        self.parse_report(&output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::diagnostic_channel;

    fn shell(script: &str) -> CommandDetector {
        CommandDetector::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[tokio::test]
    async fn parses_report_from_stdout() {
        let detector = shell(
            r#"echo '{"checks":[{"label":"A","passed":false},{"label":"B","passed":true,"detail":"x"}]}'"#,
        );
        let results = detector.detect().await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results.get(1).unwrap().detail(), Some("x"));
        assert!(results.verdict().is_rooted());
    }

    #[tokio::test]
    async fn forwards_last_detail_to_reporter() {
        let (reporter, message) = diagnostic_channel();
        let detector =
            shell(r#"echo '{"checks":[],"last_detail":"magisk found"}'"#).with_reporter(reporter);
        detector.detect().await.unwrap();
        assert_eq!(message.snapshot(), "magisk found");
    }

    #[tokio::test]
    async fn blank_last_detail_keeps_previous_message() {
        let (reporter, message) = diagnostic_channel();
        reporter.report("from an earlier run");
        let detector =
            shell(r#"echo '{"checks":[],"last_detail":"  "}'"#).with_reporter(reporter);
        detector.detect().await.unwrap();
        assert_eq!(message.snapshot(), "from an earlier run");
    }

    #[tokio::test]
    async fn non_zero_exit_carries_stderr() {
        let err = shell("echo 'no permission' >&2; exit 3")
            .detect()
            .await
            .unwrap_err();
        match err {
            DetectionError::Exited { status, stderr } => {
                assert_eq!(status, "exit code 3");
                assert_eq!(stderr, "no permission");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn garbage_output_is_malformed_report() {
        let err = shell("echo not-json").detect().await.unwrap_err();
        assert!(matches!(err, DetectionError::MalformedReport(_)));
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let err = CommandDetector::new("/nonexistent/rootcheck-detector", Vec::new())
            .detect()
            .await
            .unwrap_err();
        assert!(matches!(err, DetectionError::Spawn { .. }));
    }

    #[tokio::test]
    async fn runs_script_file_with_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("detector.sh");
        std::fs::write(
            &script,
            "printf '{\"checks\":[{\"label\":\"%s\",\"passed\":false}]}' \"$1\"\n",
        )
        .unwrap();
        let detector = CommandDetector::new(
            "sh",
            vec![script.to_string_lossy().to_string(), "Magisk binary".to_string()],
        );
        let results = detector.detect().await.unwrap();
        assert_eq!(results.get(0).unwrap().label(), "Magisk binary");
    }
}
