//! gsmaterial - Genshin material reference images for chat bots
//!
//! This library provides functionality to:
//! - Fetch game data and reconcile it into a daily and weekly material schedule
//! - Download and cache item icons
//! - Compose schedule images and cache them until the schedule changes
//! - Answer chat selectors and push the daily image to subscribers

pub mod assets;
pub mod cache;
pub mod cli;
pub mod composition;
pub mod config;
pub mod fetch;
pub mod models;
pub mod output;
pub mod panels;
pub mod reconcile;
pub mod renderer;
pub mod retry;
pub mod schedule;
pub mod selector;
pub mod store;
pub mod subscription;
