//! Panel controller.
//!
//! One actor task owns every piece of view-facing state: the busy gate, the
//! reveal schedule of the current run, and the disclosure coordinator.
//! Callers talk to it through a [`PanelHandle`]; the view consumes the
//! [`PanelEvent`] stream returned by [`spawn`].
//!
//! ## Run Flow
//! 1. `trigger` while idle: emit `Reset` + `Busy{true}`, spawn the detector
//! 2. Detector returns: start the reveal schedule (or fail the run)
//! 3. Each step deadline: publish progress / reveal effects
//! 4. Last step: `Completed` then `Busy{false}`
//!
//! Dialog requests are served between steps and never wait for a run.
//!
//! ## Teardown
//! [`Panel::shutdown`], dropping the [`Panel`], or dropping the event receiver
//! stops the actor. The `Panel` keeps a handle of its own, so dropping the
//! cloned handles alone does not. The in-flight detector is cancelled and no
//! event is published afterwards.
//!
//! Requests are answered before their events are published, so a view that
//! stops draining delays later requests but never the reply in hand.

mod actor;
pub mod events;

pub use events::PanelEvent;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::config::Config;
use crate::detection::{DetectorTask, Detector, DiagnosticMessage, RunId, Verdict};
use crate::disclosure::{
    DetailsDismissal, DialogKind, DisclosureCoordinator, InfoDismissal, Transition,
};
use crate::navigation::Navigator;
use crate::reveal::AnimationState;

use actor::PanelActor;

const COMMAND_BUFFER: usize = 32;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("Panel has shut down")]
    Closed,
}

/// Answer to a trigger request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Started(RunId),
    /// A run is in progress; the request was ignored.
    Busy,
}

/// Snapshot of the panel state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelStatus {
    pub busy: bool,
    pub run_id: Option<RunId>,
    /// Animation progress while results are being revealed.
    pub progress: Option<AnimationState>,
    pub last_verdict: Option<Verdict>,
    pub dialog: Option<DialogKind>,
}

/// Internal control commands (queued and processed by the actor).
#[derive(Debug)]
enum PanelCommand {
    Trigger {
        respond: oneshot::Sender<TriggerOutcome>,
    },
    ShowInfo {
        respond: oneshot::Sender<Transition>,
    },
    ShowDetails {
        respond: oneshot::Sender<Transition>,
    },
    DismissInfo {
        via: InfoDismissal,
        respond: oneshot::Sender<Transition>,
    },
    DismissDetails {
        via: DetailsDismissal,
        respond: oneshot::Sender<Transition>,
    },
    /// Menu action: open the project page without a dialog.
    OpenMoreInfo { respond: oneshot::Sender<()> },
    Status {
        respond: oneshot::Sender<PanelStatus>,
    },
}

/// Cloneable request side of a running panel.
#[derive(Debug, Clone)]
pub struct PanelHandle {
    tx: mpsc::Sender<PanelCommand>,
}

impl PanelHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> PanelCommand,
    ) -> Result<T, PanelError> {
        let (respond, rx) = oneshot::channel();
        self.tx
            .send(build(respond))
            .await
            .map_err(|_| PanelError::Closed)?;
        rx.await.map_err(|_| PanelError::Closed)
    }

    /// Start a run unless one is already in progress.
    pub async fn trigger(&self) -> Result<TriggerOutcome, PanelError> {
        self.request(|respond| PanelCommand::Trigger { respond })
            .await
    }

    pub async fn show_info(&self) -> Result<Transition, PanelError> {
        self.request(|respond| PanelCommand::ShowInfo { respond })
            .await
    }

    pub async fn show_details(&self) -> Result<Transition, PanelError> {
        self.request(|respond| PanelCommand::ShowDetails { respond })
            .await
    }

    pub async fn dismiss_info(&self, via: InfoDismissal) -> Result<Transition, PanelError> {
        self.request(|respond| PanelCommand::DismissInfo { via, respond })
            .await
    }

    pub async fn dismiss_details(&self, via: DetailsDismissal) -> Result<Transition, PanelError> {
        self.request(|respond| PanelCommand::DismissDetails { via, respond })
            .await
    }

    pub async fn open_more_info(&self) -> Result<(), PanelError> {
        self.request(|respond| PanelCommand::OpenMoreInfo { respond })
            .await
    }

    pub async fn status(&self) -> Result<PanelStatus, PanelError> {
        self.request(|respond| PanelCommand::Status { respond })
            .await
    }
}

/// Owner of a running panel actor. Dropping it tears the actor down.
#[derive(Debug)]
pub struct Panel {
    handle: PanelHandle,
    guard: DropGuard,
    task: JoinHandle<()>,
}

impl Panel {
    pub fn handle(&self) -> PanelHandle {
        self.handle.clone()
    }

    /// Stop the actor and wait for it to exit.
    pub async fn shutdown(self) {
        let Panel { guard, task, .. } = self;
        drop(guard);
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "Panel actor exited abnormally");
        }
    }
}

/// Spawn a panel actor on the current tokio runtime.
///
/// Returns the owner and the receiving end of the presentation events.
pub fn spawn(
    config: &Config,
    detector: Arc<dyn Detector>,
    diagnostics: DiagnosticMessage,
    navigator: Arc<dyn Navigator>,
) -> (Panel, mpsc::Receiver<PanelEvent>) {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
    let (events_tx, events_rx) = mpsc::channel(config.event_buffer.max(1));
    let shutdown = CancellationToken::new();

    let actor = PanelActor::new(
        DetectorTask::new(detector, config.detector_timeout),
        config.reveal_settings(),
        config.more_info_url.clone(),
        navigator,
        DisclosureCoordinator::new(diagnostics),
        events_tx,
        shutdown.clone(),
    );
    let task = tokio::spawn(actor.run(cmd_rx));

    let panel = Panel {
        handle: PanelHandle { tx: cmd_tx },
        guard: shutdown.drop_guard(),
        task,
    };
    (panel, events_rx)
}
