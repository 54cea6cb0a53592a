//! The panel actor loop.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::{PanelCommand, PanelEvent, PanelStatus, TriggerOutcome};
use crate::detection::{DetectionError, DetectorTask, ResultList, RunId, Verdict};
use crate::disclosure::{DisclosureCoordinator, Transition};
use crate::navigation::Navigator;
use crate::reveal::{RevealEffect, RevealScheduler, RevealSettings};

/// The view went away or teardown was requested; stop publishing.
#[derive(Debug)]
struct Detached;

type DetectionOutcome = Result<Result<ResultList, DetectionError>, JoinError>;

enum RunPhase {
    Detecting {
        handle: JoinHandle<Result<ResultList, DetectionError>>,
        cancel: CancellationToken,
    },
    Revealing(RevealScheduler),
}

struct ActiveRun {
    id: RunId,
    phase: RunPhase,
}

pub(super) struct PanelActor {
    detector: DetectorTask,
    settings: RevealSettings,
    more_info_url: Url,
    navigator: Arc<dyn Navigator>,
    disclosure: DisclosureCoordinator,
    events: mpsc::Sender<PanelEvent>,
    shutdown: CancellationToken,
    run: Option<ActiveRun>,
    last_verdict: Option<Verdict>,
}

impl PanelActor {
    pub(super) fn new(
        detector: DetectorTask,
        settings: RevealSettings,
        more_info_url: Url,
        navigator: Arc<dyn Navigator>,
        disclosure: DisclosureCoordinator,
        events: mpsc::Sender<PanelEvent>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            detector,
            settings,
            more_info_url,
            navigator,
            disclosure,
            events,
            shutdown,
            run: None,
            last_verdict: None,
        }
    }

    pub(super) async fn run(mut self, mut commands: mpsc::Receiver<PanelCommand>) {
        tracing::debug!(detector = self.detector.detector_name(), "Panel actor started");
        loop {
            let deadline = self.reveal_deadline();
            let detecting = self.is_detecting();

            let step = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = self.events.closed() => {
                    tracing::debug!("Event receiver dropped");
                    break;
                }
                joined = join_detection(&mut self.run), if detecting => {
                    self.on_detection_finished(joined).await
                }
                _ = sleep_until_opt(deadline), if deadline.is_some() => self.on_step().await,
                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => break,
                },
            };

            if step.is_err() {
                break;
            }
        }
        self.teardown();
    }

    fn reveal_deadline(&self) -> Option<Instant> {
        match &self.run {
            Some(ActiveRun {
                phase: RunPhase::Revealing(scheduler),
                ..
            }) => scheduler.next_deadline(),
            _ => None,
        }
    }

    fn is_detecting(&self) -> bool {
        matches!(
            self.run,
            Some(ActiveRun {
                phase: RunPhase::Detecting { .. },
                ..
            })
        )
    }

    async fn handle_command(&mut self, cmd: PanelCommand) -> Result<(), Detached> {
        // Reply first: a stalled view must not hold the caller.
        match cmd {
            PanelCommand::Trigger { respond } => {
                let outcome = self.start_run();
                let _ = respond.send(outcome);
                if let TriggerOutcome::Started(run_id) = outcome {
                    self.emit(PanelEvent::Reset { run_id }).await?;
                    self.emit(PanelEvent::Busy { busy: true }).await?;
                }
            }
            PanelCommand::ShowInfo { respond } => {
                let transition = self.disclosure.show_info();
                let _ = respond.send(transition.clone());
                self.publish_transition(&transition).await?;
            }
            PanelCommand::ShowDetails { respond } => {
                let transition = self.disclosure.show_details();
                let _ = respond.send(transition.clone());
                self.publish_transition(&transition).await?;
            }
            PanelCommand::DismissInfo { via, respond } => {
                let transition = self.disclosure.dismiss_info(via);
                if let Transition::Closed {
                    follow_link: true, ..
                } = transition
                {
                    self.navigate();
                }
                let _ = respond.send(transition.clone());
                self.publish_transition(&transition).await?;
            }
            PanelCommand::DismissDetails { via, respond } => {
                let transition = self.disclosure.dismiss_details(via);
                let _ = respond.send(transition.clone());
                self.publish_transition(&transition).await?;
            }
            PanelCommand::OpenMoreInfo { respond } => {
                self.navigate();
                let _ = respond.send(());
            }
            PanelCommand::Status { respond } => {
                let _ = respond.send(self.status());
            }
        }
        Ok(())
    }

    /// Open a run unless one is in progress. The caller publishes the reset.
    fn start_run(&mut self) -> TriggerOutcome {
        if let Some(run) = &self.run {
            tracing::debug!(run_id = %run.id, "Trigger ignored, run in progress");
            return TriggerOutcome::Busy;
        }

        let run_id = RunId::new();
        let cancel = self.shutdown.child_token();
        let task = self.detector.clone();
        let token = cancel.clone();
        let handle = tokio::spawn(async move { task.invoke(&token).await });
        self.run = Some(ActiveRun {
            id: run_id,
            phase: RunPhase::Detecting { handle, cancel },
        });
        tracing::info!(%run_id, detector = self.detector.detector_name(), "Run started");
        TriggerOutcome::Started(run_id)
    }

    async fn on_detection_finished(&mut self, joined: DetectionOutcome) -> Result<(), Detached> {
        let Some(run_id) = self.run.as_ref().map(|run| run.id) else {
            return Ok(());
        };
        let outcome = match joined {
            Ok(result) => result,
            Err(e) => Err(DetectionError::Internal(e.to_string())),
        };

        match outcome {
            Ok(results) => {
                tracing::debug!(%run_id, results = results.len(), "Starting reveal");
                let (scheduler, effects) =
                    RevealScheduler::start(results, self.settings, Instant::now());
                self.run = Some(ActiveRun {
                    id: run_id,
                    phase: RunPhase::Revealing(scheduler),
                });
                self.publish_effects(run_id, effects).await
            }
            Err(e) => {
                tracing::warn!(%run_id, error = %e, "Detection failed, completing run without results");
                self.emit(PanelEvent::ProgressRange { run_id, max: 0 })
                    .await?;
                self.finish(
                    run_id,
                    Verdict::Failed {
                        reason: e.to_string(),
                    },
                )
                .await
            }
        }
    }

    async fn on_step(&mut self) -> Result<(), Detached> {
        let now = Instant::now();
        let (run_id, effects) = match &mut self.run {
            Some(ActiveRun {
                id,
                phase: RunPhase::Revealing(scheduler),
            }) => (*id, scheduler.fire(now)),
            _ => return Ok(()),
        };
        self.publish_effects(run_id, effects).await
    }

    async fn publish_effects(
        &mut self,
        run_id: RunId,
        effects: Vec<RevealEffect>,
    ) -> Result<(), Detached> {
        for effect in effects {
            match effect {
                RevealEffect::Range { max } => {
                    self.emit(PanelEvent::ProgressRange { run_id, max }).await?
                }
                RevealEffect::Progress { current, max } => {
                    self.emit(PanelEvent::Progress {
                        run_id,
                        current,
                        max,
                    })
                    .await?
                }
                RevealEffect::Reveal { index, result } => {
                    self.emit(PanelEvent::Revealed {
                        run_id,
                        index,
                        result,
                    })
                    .await?
                }
                RevealEffect::Complete { verdict } => self.finish(run_id, verdict).await?,
            }
        }
        Ok(())
    }

    /// Publish the verdict, then reopen the busy gate.
    async fn finish(&mut self, run_id: RunId, verdict: Verdict) -> Result<(), Detached> {
        self.run = None;
        self.last_verdict = Some(verdict.clone());
        tracing::info!(%run_id, %verdict, "Run completed");
        self.emit(PanelEvent::Completed { run_id, verdict }).await?;
        self.emit(PanelEvent::Busy { busy: false }).await
    }

    async fn publish_transition(&self, transition: &Transition) -> Result<(), Detached> {
        match transition {
            Transition::Opened(dialog) => {
                self.emit(PanelEvent::DialogOpened {
                    dialog: dialog.clone(),
                })
                .await
            }
            Transition::Closed { kind, .. } => {
                self.emit(PanelEvent::DialogClosed { kind: *kind }).await
            }
            Transition::Rejected(_) => Ok(()),
        }
    }

    fn navigate(&self) {
        if let Err(e) = self.navigator.open(&self.more_info_url) {
            tracing::warn!(error = %e, "Could not open external page");
        }
    }

    fn status(&self) -> PanelStatus {
        let progress = match &self.run {
            Some(ActiveRun {
                phase: RunPhase::Revealing(scheduler),
                ..
            }) => Some(scheduler.state()),
            _ => None,
        };
        PanelStatus {
            busy: self.run.is_some(),
            run_id: self.run.as_ref().map(|run| run.id),
            progress,
            last_verdict: self.last_verdict.clone(),
            dialog: self.disclosure.visible(),
        }
    }

    async fn emit(&self, event: PanelEvent) -> Result<(), Detached> {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Err(Detached),
            sent = self.events.send(event) => sent.map_err(|_| Detached),
        }
    }

    fn teardown(&mut self) {
        if let Some(run) = self.run.take() {
            if let RunPhase::Detecting { handle, cancel } = run.phase {
                cancel.cancel();
                handle.abort();
            }
            tracing::info!(run_id = %run.id, "Panel torn down mid-run");
        } else {
            tracing::debug!("Panel torn down");
        }
    }
}

async fn join_detection(run: &mut Option<ActiveRun>) -> DetectionOutcome {
    match run {
        Some(ActiveRun {
            phase: RunPhase::Detecting { handle, .. },
            ..
        }) => handle.await,
        _ => std::future::pending().await,
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
