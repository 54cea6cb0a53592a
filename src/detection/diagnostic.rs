//! Last diagnostic message reported by a detector.
//!
//! Detectors write through a [`DiagnosticReporter`]; the disclosure side reads
//! through a [`DiagnosticMessage`]. The value is empty until the first report
//! and then keeps whatever the most recent run wrote.

use std::sync::Arc;

use tokio::sync::watch;

/// Create a connected reporter/reader pair holding an empty message.
pub fn diagnostic_channel() -> (DiagnosticReporter, DiagnosticMessage) {
    let (tx, rx) = watch::channel(String::new());
    (
        DiagnosticReporter { tx: Arc::new(tx) },
        DiagnosticMessage { rx },
    )
}

/// Write side, held by detectors.
#[derive(Debug, Clone)]
pub struct DiagnosticReporter {
    tx: Arc<watch::Sender<String>>,
}

impl DiagnosticReporter {
    /// Overwrite the last diagnostic message.
    pub fn report(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(message = %message, "Diagnostic message updated");
        self.tx.send_replace(message);
    }

    /// Obtain another reader for the same message.
    pub fn subscribe(&self) -> DiagnosticMessage {
        DiagnosticMessage {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read side, injected into the disclosure coordinator.
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    rx: watch::Receiver<String>,
}

impl DiagnosticMessage {
    /// Copy of the current message. Later reports do not affect the copy.
    pub fn snapshot(&self) -> String {
        self.rx.borrow().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_starts_empty() {
        let (_reporter, message) = diagnostic_channel();
        assert!(message.is_empty());
        assert_eq!(message.snapshot(), "");
    }

    #[test]
    fn latest_report_wins_and_persists() {
        let (reporter, message) = diagnostic_channel();
        reporter.report("first");
        reporter.report("second");
        assert_eq!(message.snapshot(), "second");
        assert_eq!(reporter.subscribe().snapshot(), "second");
    }

    #[test]
    fn snapshot_is_detached_from_later_reports() {
        let (reporter, message) = diagnostic_channel();
        reporter.report("su found in /system/xbin");
        let snapshot = message.snapshot();
        reporter.report("");
        assert_eq!(snapshot, "su found in /system/xbin");
        assert!(message.is_empty());
    }

    #[test]
    fn report_survives_dropped_readers() {
        let (reporter, message) = diagnostic_channel();
        drop(message);
        reporter.report("still stored");
        assert_eq!(reporter.subscribe().snapshot(), "still stored");
    }
}
