//! Render and update command implementations

use chrono::Local;
use std::process::ExitCode;

use crate::cache::RenderKey;
use crate::models::DayBucket;
use crate::renderer::{request_for, RenderRequest, Reply, SUNDAY_REPLY};
use crate::selector::{parse_selector, Query, Selector};

use super::{Services, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Resolve a selector to a request, honoring an explicit `--day`.
fn resolve(selector: &str, day: Option<u8>) -> Result<Option<RenderRequest>, String> {
    let query = match parse_selector(selector) {
        Some(Selector::Query(query)) => query,
        Some(Selector::Subscribe) | Some(Selector::Unsubscribe) => {
            return Err("subscriptions are managed with `gsmaterial sub`".to_string())
        }
        None => return Err(format!("unrecognized selector '{}'", selector)),
    };

    match (day.and_then(DayBucket::from_number), &query) {
        (Some(day), Query::Daily(part)) => Ok(Some(RenderRequest::Cached(RenderKey::Daily { day, part: *part }))),
        (Some(day), Query::Update) => Ok(Some(RenderRequest::Update(day))),
        _ => Ok(request_for(&query, Local::now().naive_local())),
    }
}

/// Execute the render command
pub async fn run_render(services: &Services, selector: &str, day: Option<u8>, json: bool) -> ExitCode {
    match resolve(selector, day) {
        Ok(request) => respond(services, request, json).await,
        Err(message) => {
            eprintln!("Error: {}", message);
            ExitCode::from(EXIT_INVALID_ARGS)
        }
    }
}

/// Execute the update command
pub async fn run_update(services: &Services, json: bool) -> ExitCode {
    let request = request_for(&Query::Update, Local::now().naive_local());
    respond(services, request, json).await
}

async fn respond(services: &Services, request: Option<RenderRequest>, json: bool) -> ExitCode {
    let Some(request) = request else {
        return print_reply(&Reply::text(SUNDAY_REPLY), json);
    };

    if json {
        let reply = services.renderer.reply_to(&request).await;
        let code = print_reply(&reply, true);
        return match reply {
            Reply::Image { .. } => code,
            Reply::Text { .. } => ExitCode::from(EXIT_ERROR),
        };
    }

    match services.renderer.get_or_render(&request).await {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn print_reply(reply: &Reply, json: bool) -> ExitCode {
    if json {
        match serde_json::to_string(reply) {
            Ok(line) => println!("{}", line),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    } else {
        match reply {
            Reply::Image { path, .. } => println!("{}", path.display()),
            Reply::Text { text } => println!("{}", text),
        }
    }
    ExitCode::from(EXIT_SUCCESS)
}
