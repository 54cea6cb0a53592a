//! Modal disclosure coordinator.
//!
//! # State Machine
//! ```text
//!            show_info                        show_details [message non-empty]
//!   Idle ──────────────▶ ShowingInfo    Idle ─────────────────────────────▶ ShowingDetails
//!   Idle ◀────────────── ShowingInfo    Idle ◀───────────────────────────── ShowingDetails
//!        confirm | cancel | more info              confirm | cancel
//! ```
//!
//! Every other request is rejected without a state change, which keeps at
//! most one dialog visible for any interleaving of requests.

use serde::Serialize;

use crate::detection::DiagnosticMessage;

/// The two dialogs the panel can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogKind {
    Info,
    Details,
}

impl std::fmt::Display for DialogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Details => write!(f, "details"),
        }
    }
}

/// Fully rendered dialog content, fixed at the moment the dialog opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dialog {
    pub kind: DialogKind,
    pub title: String,
    pub body: String,
    pub confirm_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_label: Option<String>,
    pub cancelable: bool,
}

/// Static texts used to build the dialogs.
#[derive(Debug, Clone)]
pub struct DialogTexts {
    pub app_name: String,
    pub info_body: String,
    pub details_title: String,
}

impl Default for DialogTexts {
    fn default() -> Self {
        Self {
            app_name: "RootCheck".to_string(),
            info_body: "RootCheck runs a series of root-detection checks and shows \
                        the outcome of each one. A single positive check marks the \
                        device as rooted. No single check is conclusive on its own."
                .to_string(),
            details_title: "Details".to_string(),
        }
    }
}

impl DialogTexts {
    fn info_dialog(&self) -> Dialog {
        Dialog {
            kind: DialogKind::Info,
            title: self.app_name.clone(),
            body: self.info_body.clone(),
            confirm_label: "ok".to_string(),
            secondary_label: Some("More info".to_string()),
            cancelable: true,
        }
    }

    fn details_dialog(&self, message: &str) -> Dialog {
        Dialog {
            kind: DialogKind::Details,
            title: self.details_title.clone(),
            body: details_body(message),
            confirm_label: "ok".to_string(),
            secondary_label: None,
            cancelable: true,
        }
    }
}

/// Body of the details dialog for a given diagnostic message.
pub fn details_body(message: &str) -> String {
    format!("Last encountered error details: {}", message)
}

/// Which dialog is visible, with the content it was opened with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DisclosureState {
    #[default]
    Idle,
    ShowingInfo(Dialog),
    ShowingDetails(Dialog),
}

impl DisclosureState {
    pub fn visible(&self) -> Option<DialogKind> {
        match self {
            Self::Idle => None,
            Self::ShowingInfo(_) => Some(DialogKind::Info),
            Self::ShowingDetails(_) => Some(DialogKind::Details),
        }
    }

    pub fn dialog(&self) -> Option<&Dialog> {
        match self {
            Self::Idle => None,
            Self::ShowingInfo(dialog) | Self::ShowingDetails(dialog) => Some(dialog),
        }
    }
}

/// How the info dialog was dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoDismissal {
    Confirm,
    Cancel,
    /// The "More info" button: follow the project link, then close.
    MoreInfo,
}

/// How the details dialog was dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailsDismissal {
    Confirm,
    Cancel,
}

/// Why a request left the state unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Another dialog (or the same one) is already visible.
    AlreadyShowing(DialogKind),
    /// Details requested while the diagnostic message is empty.
    NoDiagnostic,
    /// Dismissal of a dialog that is not visible.
    NotShowing(DialogKind),
}

/// Result of a coordinator request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Opened(Dialog),
    Closed {
        kind: DialogKind,
        /// The dismissal asked to open the project link.
        follow_link: bool,
    },
    Rejected(RejectReason),
}

impl Transition {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Transition::Rejected(_))
    }
}

/// Guards the "at most one dialog" invariant.
#[derive(Debug)]
pub struct DisclosureCoordinator {
    state: DisclosureState,
    diagnostics: DiagnosticMessage,
    texts: DialogTexts,
}

impl DisclosureCoordinator {
    pub fn new(diagnostics: DiagnosticMessage) -> Self {
        Self::with_texts(diagnostics, DialogTexts::default())
    }

    pub fn with_texts(diagnostics: DiagnosticMessage, texts: DialogTexts) -> Self {
        Self {
            state: DisclosureState::Idle,
            diagnostics,
            texts,
        }
    }

    pub fn state(&self) -> &DisclosureState {
        &self.state
    }

    pub fn visible(&self) -> Option<DialogKind> {
        self.state.visible()
    }

    /// Idle → ShowingInfo.
    pub fn show_info(&mut self) -> Transition {
        if let Some(kind) = self.state.visible() {
            return self.reject(RejectReason::AlreadyShowing(kind));
        }
        let dialog = self.texts.info_dialog();
        self.state = DisclosureState::ShowingInfo(dialog.clone());
        Transition::Opened(dialog)
    }

    /// Idle → ShowingDetails, only with a non-empty diagnostic message.
    ///
    /// The message is read once here; the open dialog keeps that snapshot.
    pub fn show_details(&mut self) -> Transition {
        if let Some(kind) = self.state.visible() {
            return self.reject(RejectReason::AlreadyShowing(kind));
        }
        let message = self.diagnostics.snapshot();
        if message.is_empty() {
            return self.reject(RejectReason::NoDiagnostic);
        }
        let dialog = self.texts.details_dialog(&message);
        self.state = DisclosureState::ShowingDetails(dialog.clone());
        Transition::Opened(dialog)
    }

    /// ShowingInfo → Idle.
    pub fn dismiss_info(&mut self, via: InfoDismissal) -> Transition {
        if !matches!(self.state, DisclosureState::ShowingInfo(_)) {
            return self.reject(RejectReason::NotShowing(DialogKind::Info));
        }
        self.state = DisclosureState::Idle;
        Transition::Closed {
            kind: DialogKind::Info,
            follow_link: via == InfoDismissal::MoreInfo,
        }
    }

    /// ShowingDetails → Idle.
    pub fn dismiss_details(&mut self, _via: DetailsDismissal) -> Transition {
        if !matches!(self.state, DisclosureState::ShowingDetails(_)) {
            return self.reject(RejectReason::NotShowing(DialogKind::Details));
        }
        self.state = DisclosureState::Idle;
        Transition::Closed {
            kind: DialogKind::Details,
            follow_link: false,
        }
    }

    fn reject(&self, reason: RejectReason) -> Transition {
        tracing::debug!(?reason, state = ?self.state.visible(), "Disclosure request ignored");
        Transition::Rejected(reason)
    }
}
