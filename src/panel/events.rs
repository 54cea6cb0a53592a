//! Presentation events published by the panel.
//!
//! All events of a panel travel over one channel, so a view observes them in
//! the exact order the panel produced them.

use serde::Serialize;

use crate::detection::{CheckResult, RunId, Verdict};
use crate::disclosure::{Dialog, DialogKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PanelEvent {
    /// Clear the result list and hide the verdict.
    Reset { run_id: RunId },
    /// Hide (`true`) or show (`false`) the trigger.
    Busy { busy: bool },
    /// Progress maximum of the run.
    ProgressRange { run_id: RunId, max: u64 },
    Progress {
        run_id: RunId,
        current: u64,
        max: u64,
    },
    /// Append one result to the visible list.
    Revealed {
        run_id: RunId,
        index: usize,
        result: CheckResult,
    },
    /// The run finished; sent exactly once per run.
    Completed { run_id: RunId, verdict: Verdict },
    DialogOpened { dialog: Dialog },
    DialogClosed { kind: DialogKind },
}

impl PanelEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            PanelEvent::Reset { .. } => "reset",
            PanelEvent::Busy { .. } => "busy",
            PanelEvent::ProgressRange { .. } => "progress_range",
            PanelEvent::Progress { .. } => "progress",
            PanelEvent::Revealed { .. } => "revealed",
            PanelEvent::Completed { .. } => "completed",
            PanelEvent::DialogOpened { .. } => "dialog_opened",
            PanelEvent::DialogClosed { .. } => "dialog_closed",
        }
    }

    /// Run this event belongs to, if it is part of a run.
    pub fn run_id(&self) -> Option<RunId> {
        match self {
            PanelEvent::Reset { run_id }
            | PanelEvent::ProgressRange { run_id, .. }
            | PanelEvent::Progress { run_id, .. }
            | PanelEvent::Revealed { run_id, .. }
            | PanelEvent::Completed { run_id, .. } => Some(*run_id),
            PanelEvent::Busy { .. }
            | PanelEvent::DialogOpened { .. }
            | PanelEvent::DialogClosed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_tag_matches_event_name() {
        let run_id = RunId::new();
        let events = [
            PanelEvent::Reset { run_id },
            PanelEvent::Busy { busy: true },
            PanelEvent::Progress {
                run_id,
                current: 1,
                max: 10,
            },
            PanelEvent::Completed {
                run_id,
                verdict: Verdict::NotRooted,
            },
            PanelEvent::DialogClosed {
                kind: DialogKind::Info,
            },
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.event_name());
        }
    }

    #[test]
    fn revealed_event_embeds_result_fields() {
        let event = PanelEvent::Revealed {
            run_id: RunId::new(),
            index: 0,
            result: CheckResult::new("su binary", true).with_detail("/sbin/su"),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["result"]["label"], "su binary");
        assert_eq!(json["result"]["detail"], "/sbin/su");
        assert!(event.run_id().is_some());
    }
}
