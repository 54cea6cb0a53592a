//! Animated reveal of check results.
//!
//! A run of `N` results is stretched over `N * steps_per_result` progress
//! steps. Result `i` becomes visible on step `(i + 1) * steps_per_result`,
//! and the last step also completes the run.
//!
//! This module is the pure part: [`transition`] maps an [`AnimationState`]
//! and a [`RevealEvent`] to the next state plus the side effects to publish.
//! Timing lives in [`scheduler`].
//!
//! # Properties
//! - Progress values are `1..=max_units`, each published exactly once
//! - Exactly `N` reveal effects, in list order
//! - Exactly one `Complete` effect, after the last reveal
//! - `N == 0` completes on `Start` with no progress and no reveals

pub mod scheduler;

pub use scheduler::RevealScheduler;

use std::time::Duration;

use crate::detection::{CheckResult, ResultList, Verdict};

/// Step count and cadence of the reveal animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealSettings {
    steps_per_result: u32,
    step_delay: Duration,
}

impl RevealSettings {
    /// `steps_per_result` is clamped to at least 1.
    pub fn new(steps_per_result: u32, step_delay: Duration) -> Self {
        Self {
            steps_per_result: steps_per_result.max(1),
            step_delay,
        }
    }

    pub fn steps_per_result(&self) -> u32 {
        self.steps_per_result
    }

    pub fn step_delay(&self) -> Duration {
        self.step_delay
    }
}

impl Default for RevealSettings {
    fn default() -> Self {
        Self::new(10, Duration::from_millis(50))
    }
}

/// Progress bookkeeping for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnimationState {
    pub max_units: u64,
    pub current_units: u64,
    pub revealed_count: usize,
    pub completed: bool,
}

impl AnimationState {
    pub fn remaining_units(&self) -> u64 {
        self.max_units.saturating_sub(self.current_units)
    }
}

/// Inputs to the reveal state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealEvent {
    /// A new run begins with the current result list.
    Start,
    /// One step delay has elapsed.
    Tick,
}

/// Side effects to publish, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealEffect {
    /// Progress maximum for the run.
    Range { max: u64 },
    /// Progress advanced to `current`.
    Progress { current: u64, max: u64 },
    /// Result `index` became visible.
    Reveal { index: usize, result: CheckResult },
    /// The run finished.
    Complete { verdict: Verdict },
}

/// Advance the reveal state machine by one event.
///
/// `Tick` after completion is a no-op, so late timer firings cannot publish
/// anything.
pub fn transition(
    state: AnimationState,
    event: RevealEvent,
    results: &ResultList,
    steps_per_result: u32,
) -> (AnimationState, Vec<RevealEffect>) {
    let steps = u64::from(steps_per_result.max(1));
    match event {
        RevealEvent::Start => {
            let max_units = (results.len() as u64).saturating_mul(steps);
            let mut next = AnimationState {
                max_units,
                ..AnimationState::default()
            };
            let mut effects = vec![RevealEffect::Range { max: max_units }];
            if results.is_empty() {
                next.completed = true;
                effects.push(RevealEffect::Complete {
                    verdict: results.verdict(),
                });
            }
            (next, effects)
        }
        RevealEvent::Tick => {
            if state.completed || state.current_units >= state.max_units {
                return (state, Vec::new());
            }

            let mut next = state;
            next.current_units += 1;
            let mut effects = vec![RevealEffect::Progress {
                current: next.current_units,
                max: next.max_units,
            }];

            if next.current_units % steps == 0 {
                let index = (next.current_units / steps - 1) as usize;
                if let Some(result) = results.get(index) {
                    next.revealed_count += 1;
                    effects.push(RevealEffect::Reveal {
                        index,
                        result: result.clone(),
                    });
                }
            }

            if next.current_units == next.max_units {
                next.completed = true;
                effects.push(RevealEffect::Complete {
                    verdict: results.verdict(),
                });
            }
            (next, effects)
        }
    }
}

/// A result list paired with its animation state.
#[derive(Debug, Clone)]
pub struct RevealTimeline {
    results: ResultList,
    steps_per_result: u32,
    state: AnimationState,
}

impl RevealTimeline {
    /// Begin a run, returning the timeline and the effects of `Start`.
    pub fn start(results: ResultList, steps_per_result: u32) -> (Self, Vec<RevealEffect>) {
        let (state, effects) = transition(
            AnimationState::default(),
            RevealEvent::Start,
            &results,
            steps_per_result,
        );
        (
            Self {
                results,
                steps_per_result,
                state,
            },
            effects,
        )
    }

    pub fn tick(&mut self) -> Vec<RevealEffect> {
        let (state, effects) = transition(
            self.state,
            RevealEvent::Tick,
            &self.results,
            self.steps_per_result,
        );
        self.state = state;
        effects
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.completed
    }
}
