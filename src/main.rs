//! rootcheck-panel - Terminal entry point
//!
//! Runs the panel against the configured detector and maps stdin lines to
//! panel actions.

use std::sync::Arc;

use rootcheck_panel::config::{Config, DetectorSource};
use rootcheck_panel::detection::{diagnostic_channel, CommandDetector, Detector, StaticDetector};
use rootcheck_panel::disclosure::{DetailsDismissal, DialogKind, InfoDismissal};
use rootcheck_panel::navigation::{LogNavigator, Navigator, SystemNavigator};
use rootcheck_panel::panel::{self, PanelHandle, TriggerOutcome};
use rootcheck_panel::terminal::{RenderMode, TerminalView};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "commands: run | info | details | ok | cancel | more | github | status | help | quit";

fn main() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    // Logs go to stderr so they never interleave with the rendered panel.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rootcheck_panel=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;
    info!(
        "Loaded configuration: steps_per_result={} step_delay={:?} timeout={:?}",
        config.steps_per_result, config.step_delay, config.detector_timeout
    );

    let (reporter, diagnostics) = diagnostic_channel();
    let detector: Arc<dyn Detector> = match &config.detector {
        DetectorSource::Demo => {
            info!("No ROOTCHECK_DETECTOR_COMMAND set, using demo detector");
            Arc::new(StaticDetector::demo(reporter))
        }
        DetectorSource::Command { program, args } => {
            Arc::new(CommandDetector::new(program.clone(), args.clone()).with_reporter(reporter))
        }
    };
    let (navigator, mode): (Arc<dyn Navigator>, RenderMode) = if config.json_events {
        (Arc::new(LogNavigator), RenderMode::JsonLines)
    } else {
        (Arc::new(SystemNavigator), RenderMode::Human)
    };

    let (panel, mut events) = panel::spawn(&config, detector, diagnostics, navigator);
    let handle = panel.handle();

    let renderer = tokio::spawn(async move {
        let mut view = TerminalView::new(mode);
        while let Some(event) = events.recv().await {
            if let Err(e) = view.render(&event) {
                warn!("Failed to render {} event: {}", event.event_name(), e);
            }
        }
    });

    if mode == RenderMode::Human {
        println!("{}", HELP);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };
        if !dispatch(&handle, line.trim()).await? {
            break;
        }
    }

    panel.shutdown().await;
    drop(handle);
    if let Err(e) = renderer.await {
        warn!("Renderer task failed: {}", e);
    }
    Ok(())
}

/// Apply one input line. Returns `false` when the session should end.
async fn dispatch(handle: &PanelHandle, command: &str) -> anyhow::Result<bool> {
    match command {
        "" => {}
        "run" => {
            if handle.trigger().await? == TriggerOutcome::Busy {
                println!("A check is already running.");
            }
        }
        "info" => {
            handle.show_info().await?;
        }
        "details" => {
            handle.show_details().await?;
        }
        "ok" | "cancel" => {
            let confirm = command == "ok";
            match handle.status().await?.dialog {
                Some(DialogKind::Info) => {
                    let via = if confirm {
                        InfoDismissal::Confirm
                    } else {
                        InfoDismissal::Cancel
                    };
                    handle.dismiss_info(via).await?;
                }
                Some(DialogKind::Details) => {
                    let via = if confirm {
                        DetailsDismissal::Confirm
                    } else {
                        DetailsDismissal::Cancel
                    };
                    handle.dismiss_details(via).await?;
                }
                None => {}
            }
        }
        "more" => {
            handle.dismiss_info(InfoDismissal::MoreInfo).await?;
        }
        "github" => handle.open_more_info().await?,
        "status" => {
            let status = handle.status().await?;
            println!(
                "busy={} verdict={} dialog={}",
                status.busy,
                status
                    .last_verdict
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                status
                    .dialog
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string())
            );
        }
        "help" => println!("{}", HELP),
        "quit" | "exit" => return Ok(false),
        other => println!("Unknown command `{}`. {}", other, HELP),
    }
    Ok(true)
}
