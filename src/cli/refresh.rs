//! Refresh command implementation

use std::process::ExitCode;

use crate::reconcile::RefreshOutcome;

use super::{Services, EXIT_ERROR, EXIT_SUCCESS};

/// Execute the refresh command
pub async fn run_refresh(services: &Services) -> ExitCode {
    let outcome = match services.refresher.refresh().await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    match &outcome {
        RefreshOutcome::Updated { daily_changed, weekly_changed } => {
            println!("config.json updated (daily changed: {}, weekly changed: {})", daily_changed, weekly_changed);
            for scope in outcome.invalidated() {
                let drawn = services.renderer.redraw(scope).await;
                println!("Redrew {} {} image(s)", drawn, scope);
            }
        }
        RefreshOutcome::Skipped(reason) => {
            println!("Refresh skipped, previous config kept: {}", reason);
        }
    }
    ExitCode::from(EXIT_SUCCESS)
}
