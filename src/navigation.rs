//! Navigation boundary: fire-and-forget requests to open an external page.

use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use url::Url;

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("Failed to launch `{opener}` for {url}: {source}")]
    Launch {
        opener: String,
        url: String,
        source: std::io::Error,
    },
}

/// Opens URLs outside the panel.
///
/// `open` must return without waiting for the page to load.
pub trait Navigator: Send + Sync {
    fn open(&self, url: &Url) -> Result<(), NavigationError>;
}

/// Launches the platform URL opener.
#[derive(Debug, Clone, Default)]
pub struct SystemNavigator;

impl SystemNavigator {
    fn command(url: &Url) -> (&'static str, Command) {
        let opener = if cfg!(target_os = "macos") {
            "open"
        } else if cfg!(target_os = "windows") {
            "cmd"
        } else {
            "xdg-open"
        };
        let mut cmd = Command::new(opener);
        if cfg!(target_os = "windows") {
            cmd.args(["/C", "start", ""]);
        }
        cmd.arg(url.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        (opener, cmd)
    }
}

impl Navigator for SystemNavigator {
    fn open(&self, url: &Url) -> Result<(), NavigationError> {
        let (opener, mut cmd) = Self::command(url);
        let mut child = cmd.spawn().map_err(|source| NavigationError::Launch {
            opener: opener.to_string(),
            url: url.to_string(),
            source,
        })?;
        tracing::info!(%url, opener, "Opening external page");

        // Reap the opener in the background.
        tokio::spawn(async move {
            if let Err(e) = child.wait().await {
                tracing::warn!(error = %e, "URL opener did not exit cleanly");
            }
        });
        Ok(())
    }
}

/// Navigator that only logs the request, for headless sessions.
#[derive(Debug, Clone, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn open(&self, url: &Url) -> Result<(), NavigationError> {
        tracing::info!(%url, "Navigation requested");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_navigator_accepts_any_url() {
        let url = Url::parse("https://example.com/docs").unwrap();
        assert!(LogNavigator.open(&url).is_ok());
    }

    #[test]
    fn system_command_targets_the_url() {
        let url = Url::parse("https://example.com/docs").unwrap();
        let (opener, cmd) = SystemNavigator::command(&url);
        assert!(!opener.is_empty());
        let args: Vec<_> = cmd.as_std().get_args().collect();
        assert_eq!(args.last().and_then(|a| a.to_str()), Some("https://example.com/docs"));
    }
}
