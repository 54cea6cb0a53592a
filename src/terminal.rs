//! Terminal view for the panel binary.
//!
//! Draws the presentation events with an `indicatif` progress bar, or prints
//! them as JSON lines for scripting.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::detection::{CheckResult, Verdict};
use crate::disclosure::{Dialog, DialogKind};
use crate::panel::PanelEvent;

/// How events are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Human,
    JsonLines,
}

pub struct TerminalView {
    mode: RenderMode,
    bar: Option<ProgressBar>,
}

impl TerminalView {
    pub fn new(mode: RenderMode) -> Self {
        Self { mode, bar: None }
    }

    pub fn render(&mut self, event: &PanelEvent) -> serde_json::Result<()> {
        match self.mode {
            RenderMode::JsonLines => {
                println!("{}", serde_json::to_string(event)?);
            }
            RenderMode::Human => self.render_human(event),
        }
        Ok(())
    }

    fn render_human(&mut self, event: &PanelEvent) {
        match event {
            PanelEvent::Reset { .. } => {
                if let Some(bar) = self.bar.take() {
                    bar.finish_and_clear();
                }
                println!("{}", "Running root checks...".bold());
                self.bar = Some(progress_bar());
            }
            PanelEvent::Busy { busy } => {
                if !busy {
                    println!("{}", "Type `run` to check again.".dimmed());
                }
            }
            PanelEvent::ProgressRange { max, .. } => {
                if let Some(bar) = &self.bar {
                    bar.set_length(*max);
                    bar.set_position(0);
                }
            }
            PanelEvent::Progress { current, .. } => {
                if let Some(bar) = &self.bar {
                    bar.set_position(*current);
                }
            }
            PanelEvent::Revealed { result, .. } => self.println(&result_line(result)),
            PanelEvent::Completed { verdict, .. } => {
                if let Some(bar) = self.bar.take() {
                    bar.finish_and_clear();
                }
                println!("{}", verdict_line(verdict));
            }
            PanelEvent::DialogOpened { dialog } => self.println(&dialog_text(dialog)),
            PanelEvent::DialogClosed { kind } => {
                self.println(&format!("{}", format!("({} dialog closed)", kind).dimmed()))
            }
        }
    }

    /// Print above the progress bar when one is active.
    fn println(&self, line: &str) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => println!("{}", line),
        }
    }
}

fn progress_bar() -> ProgressBar {
    let style = ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░");
    let bar = ProgressBar::new(0);
    bar.set_style(style);
    bar
}

/// One line per revealed check. A passed check is evidence of root.
pub fn result_line(result: &CheckResult) -> String {
    let mark = if result.passed() {
        "✘".red().bold()
    } else {
        "✔".green()
    };
    match result.detail() {
        Some(detail) => format!("  {} {} {}", mark, result.label(), detail.dimmed()),
        None => format!("  {} {}", mark, result.label()),
    }
}

pub fn verdict_line(verdict: &Verdict) -> String {
    match verdict {
        Verdict::Rooted => format!("{}", verdict.to_string().red().bold()),
        Verdict::NotRooted => format!("{}", verdict.to_string().green().bold()),
        Verdict::Failed { .. } => format!("{}", verdict.to_string().yellow().bold()),
    }
}

pub fn dialog_text(dialog: &Dialog) -> String {
    let mut buttons = vec![format!("[{}]", dialog.confirm_label)];
    if let Some(secondary) = &dialog.secondary_label {
        buttons.push(format!("[{}]", secondary));
    }
    let hint = match dialog.kind {
        DialogKind::Info => "ok | more | cancel",
        DialogKind::Details => "ok | cancel",
    };
    format!(
        "\n== {} ==\n{}\n{}  ({})\n",
        dialog.title.bold(),
        dialog.body,
        buttons.join(" "),
        hint.dimmed()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn result_line_marks_positive_checks() {
        plain();
        assert_eq!(
            result_line(&CheckResult::new("su binary", true).with_detail("/sbin/su")),
            "  ✘ su binary /sbin/su"
        );
        assert_eq!(
            result_line(&CheckResult::new("Magisk binary", false)),
            "  ✔ Magisk binary"
        );
    }

    #[test]
    fn verdict_line_spells_out_verdict() {
        plain();
        assert_eq!(verdict_line(&Verdict::Rooted), "ROOTED");
        assert_eq!(verdict_line(&Verdict::NotRooted), "NOT ROOTED");
        assert_eq!(
            verdict_line(&Verdict::Failed {
                reason: "timeout".to_string()
            }),
            "CHECK FAILED: timeout"
        );
    }

    #[test]
    fn dialog_text_lists_buttons() {
        plain();
        let dialog = Dialog {
            kind: DialogKind::Info,
            title: "RootCheck".to_string(),
            body: "body".to_string(),
            confirm_label: "ok".to_string(),
            secondary_label: Some("More info".to_string()),
            cancelable: true,
        };
        let text = dialog_text(&dialog);
        assert!(text.contains("== RootCheck =="));
        assert!(text.contains("[ok] [More info]"));
    }
}
