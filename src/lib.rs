//! # RootCheck Panel
//!
//! Presentation controller for a root-detection tool.
//!
//! This library provides:
//! - An adapter that runs a (possibly slow) detector and returns ordered check results
//! - A reveal scheduler that turns those results into a smooth, bounded progress animation
//! - A disclosure coordinator that keeps at most one informational dialog visible
//!
//! ## Architecture
//!
//! ```text
//!   PanelHandle ──commands──▶ ┌──────────────────────────┐ ──PanelEvent──▶ view
//!                             │        Panel actor       │
//!                             │  busy gate               │
//!                             │  RevealScheduler         │──▶ Navigator
//!                             │  DisclosureCoordinator   │
//!                             └────────────┬─────────────┘
//!                                          │ spawn / join
//!                                          ▼
//!                                   DetectorTask ──▶ Detector
//! ```
//!
//! ## Run Flow
//! 1. `trigger` clears the view and hides the trigger
//! 2. The detector returns a `ResultList`
//! 3. Progress advances step by step; each result appears after its steps
//! 4. The verdict is published once and the trigger is shown again
//!
//! ## Modules
//! - `detection`: check results, detector contract, diagnostic message
//! - `reveal`: pure reveal state machine and its timed scheduler
//! - `disclosure`: the Idle / ShowingInfo / ShowingDetails automaton
//! - `panel`: the actor that owns all view-facing state
//! - `terminal`: the binary's event renderer

pub mod config;
pub mod detection;
pub mod disclosure;
pub mod navigation;
pub mod panel;
pub mod reveal;
pub mod terminal;
pub mod util;

pub use config::Config;
pub use detection::{CheckResult, ResultList, Verdict};
pub use panel::{Panel, PanelEvent, PanelHandle};
