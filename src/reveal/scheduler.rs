//! Timed driver for a [`RevealTimeline`].
//!
//! The scheduler never sleeps on its own: the owner asks for the next
//! deadline, waits for it alongside its other work, and calls [`fire`] on
//! expiry. Dropping the scheduler cancels every pending step.
//!
//! Timing goes through `tokio::time`, so tests drive it with the paused
//! (virtual) clock.
//!
//! [`fire`]: RevealScheduler::fire

use std::time::Duration;

use tokio::time::Instant;

use super::{AnimationState, RevealEffect, RevealSettings, RevealTimeline};
use crate::detection::ResultList;

#[derive(Debug)]
pub struct RevealScheduler {
    timeline: RevealTimeline,
    step_delay: Duration,
    next_deadline: Option<Instant>,
}

impl RevealScheduler {
    /// Start a run at `now`; returns the scheduler and the start effects.
    ///
    /// # Postcondition
    /// `next_deadline() == None` iff the run already completed (empty list).
    pub fn start(
        results: ResultList,
        settings: RevealSettings,
        now: Instant,
    ) -> (Self, Vec<RevealEffect>) {
        let (timeline, effects) = RevealTimeline::start(results, settings.steps_per_result());
        let next_deadline = (!timeline.is_finished()).then(|| now + settings.step_delay());
        (
            Self {
                timeline,
                step_delay: settings.step_delay(),
                next_deadline,
            },
            effects,
        )
    }

    /// When the next step is due, or `None` once the run completed.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_deadline
    }

    /// Perform the due step. The following step is scheduled one delay after `now`.
    pub fn fire(&mut self, now: Instant) -> Vec<RevealEffect> {
        if self.next_deadline.is_none() {
            return Vec::new();
        }
        let effects = self.timeline.tick();
        self.next_deadline = if self.timeline.is_finished() {
            None
        } else {
            Some(now + self.step_delay)
        };
        effects
    }

    pub fn state(&self) -> AnimationState {
        self.timeline.state()
    }

    pub fn is_finished(&self) -> bool {
        self.timeline.is_finished()
    }
}
