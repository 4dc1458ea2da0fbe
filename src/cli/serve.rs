//! Serve command implementation
//!
//! Pushes are written to stdout as JSON lines for the chat adapter that owns
//! the bot connection.

use async_trait::async_trait;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use crate::renderer::Reply;
use crate::schedule::{DailyPush, Dispatch, DispatchError};
use crate::subscription::SubscriberKind;

use super::{Services, EXIT_SUCCESS};

/// Writes each delivery as one JSON line on stdout.
struct StdoutDispatch;

#[async_trait]
impl Dispatch for StdoutDispatch {
    async fn deliver(&self, kind: SubscriberKind, id: i64, reply: &Reply) -> Result<(), DispatchError> {
        let line = serde_json::json!({ "target": kind, "id": id, "reply": reply });
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", line)?;
        stdout.flush()?;
        Ok(())
    }
}

/// Execute the serve command
pub async fn run_serve(services: Services) -> ExitCode {
    let Services { config, assets, refresher, renderer } = services;

    let drawn = assets.ensure_draw_assets().await;
    let missing = drawn.iter().filter(|path| path.is_none()).count();
    if missing > 0 {
        tracing::warn!(missing, "Some draw assets are unavailable, falling back to plain titles");
    }

    match refresher.refresh().await {
        Ok(outcome) => {
            for scope in outcome.invalidated() {
                renderer.redraw(scope).await;
            }
        }
        Err(e) => tracing::error!(error = %e, "Startup refresh failed"),
    }

    let Some(push) = DailyPush::new(&config, refresher, renderer, Arc::new(StdoutDispatch)) else {
        tracing::info!("Daily push disabled");
        return ExitCode::from(EXIT_SUCCESS);
    };

    tokio::select! {
        _ = push.run() => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutting down");
        }
    }
    ExitCode::from(EXIT_SUCCESS)
}
