//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod refresh;
mod render;
mod serve;
mod sub;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use crate::assets::{AssetCache, FONT_FILE};
use crate::cache::RenderCache;
use crate::composition::Compositor;
use crate::config::{resolve_config, AppConfig, CliOverrides, ConfigError};
use crate::fetch::{http_client, AmbrClient, FetchError};
use crate::reconcile::Refresher;
use crate::renderer::Renderer;
use crate::store::ConfigStore;

pub use sub::SubAction;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// gsmaterial - Genshin daily and weekly material images for chat bots
#[derive(Parser)]
#[command(name = "gsmaterial")]
#[command(about = "Genshin daily and weekly material reference images for chat bots")]
#[command(version)]
pub struct Cli {
    /// Config file (default: gsmaterial.toml found from the working directory upwards)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory holding config.json, sub.json and asset folders
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Drop 3-star entries from daily images
    #[arg(long, global = true)]
    pub skip_three: Option<bool>,

    /// Prefix prepended to every asset URL
    #[arg(long, global = true)]
    pub mirror: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch upstream data and rebuild config.json
    Refresh,

    /// Render an image for a chat selector, e.g. `天赋`, `周本`, `若陀`
    Render {
        /// Selector words; empty means today's full daily image
        selector: Vec<String>,

        /// Day bucket 1-3 instead of today's
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=3))]
        day: Option<u8>,

        /// Print the chat reply as JSON, including the base64 payload
        #[arg(long)]
        json: bool,
    },

    /// Redraw today's daily image regardless of the cache
    Update {
        /// Print the chat reply as JSON, including the base64 payload
        #[arg(long)]
        json: bool,
    },

    /// Manage daily push subscribers
    Sub {
        #[command(subcommand)]
        action: SubAction,
    },

    /// Download draw assets, refresh, then run the daily push loop
    Serve,
}

/// Components shared by the commands, built from one configuration.
pub(crate) struct Services {
    pub config: Arc<AppConfig>,
    pub assets: Arc<AssetCache>,
    pub refresher: Refresher,
    pub renderer: Arc<Renderer>,
}

impl Services {
    pub fn build(config: AppConfig) -> Result<Self, FetchError> {
        let http = http_client(&config.network)?;
        let assets = Arc::new(AssetCache::new(&config, http.clone()));
        let source = Arc::new(AmbrClient::with_client(http, &config.network));
        let refresher = Refresher::new(
            source,
            ConfigStore::new(config.canonical_path()),
            RenderCache::new(config.cache_dir()),
        )
        .with_assets(Arc::clone(&assets));
        let compositor = Arc::new(Compositor::with_font_file(&config.draw_dir().join(FONT_FILE)));
        let renderer = Arc::new(Renderer::new(&config, compositor));

        Ok(Self { config: Arc::new(config), assets, refresher, renderer })
    }
}

fn load(cli: &Cli) -> Result<AppConfig, ConfigError> {
    let overrides = CliOverrides {
        data_dir: cli.data_dir.clone(),
        skip_three: cli.skip_three,
        mirror: cli.mirror.clone(),
    };
    resolve_config(cli.config.as_deref(), &overrides)
}

/// Parse arguments and run the selected command.
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e @ ConfigError::Validation(_)) | Err(e @ ConfigError::Env { .. }) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if let Commands::Sub { action } = &cli.command {
        return sub::run_sub(&config, action);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let services = match Services::build(config) {
        Ok(services) => services,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    runtime.block_on(async move {
        match cli.command {
            Commands::Refresh => refresh::run_refresh(&services).await,
            Commands::Render { selector, day, json } => {
                render::run_render(&services, &selector.join(" "), day, json).await
            }
            Commands::Update { json } => render::run_update(&services, json).await,
            Commands::Serve => serve::run_serve(services).await,
            Commands::Sub { .. } => ExitCode::from(EXIT_SUCCESS),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{DailyPart, RenderKey};
    use crate::composition::layout::{GROUP_HEADER, LABEL_BAND, LABEL_TOP, MARGIN, TILE, TITLE_BAND};
    use crate::composition::BACKGROUND;
    use crate::models::{
        CanonicalConfig, DailySchedule, DayBucket, MaterialEntry, MaterialGroup, MaterialKey, Rank, WeeklySchedule,
    };
    use crate::renderer::RenderRequest;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_render_with_globals() {
        let cli = Cli::try_parse_from([
            "gsmaterial", "render", "周本", "若陀", "--day", "2", "--data-dir", "/tmp/gs", "--skip-three", "false",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/gs")));
        assert_eq!(cli.skip_three, Some(false));
        match cli.command {
            Commands::Render { selector, day, json } => {
                assert_eq!(selector, vec!["周本", "若陀"]);
                assert_eq!(day, Some(2));
                assert!(!json);
            }
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn test_day_out_of_range_rejected() {
        assert!(Cli::try_parse_from(["gsmaterial", "render", "--day", "4"]).is_err());
    }

    fn system_font() -> Option<PathBuf> {
        [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
        ]
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
    }

    #[tokio::test]
    async fn test_font_arriving_after_build_is_used() {
        let Some(font) = system_font() else {
            eprintln!("no system TrueType font available, skipping");
            return;
        };
        let temp = TempDir::new().expect("should create temp dir");
        let config = AppConfig::with_data_dir(temp.path());
        let mut avatar = DailySchedule::new();
        avatar.day_mut(DayBucket::MonThu).insert(
            MaterialKey::new("Freedom", 104303),
            MaterialGroup::from_entries(vec![MaterialEntry::new(Rank::Five, "Jean", 10000003)]),
        );
        let canonical =
            CanonicalConfig { avatar, weapon: DailySchedule::new(), weekly: WeeklySchedule::new(), time: 1 };
        ConfigStore::new(config.canonical_path()).save(&canonical).unwrap();

        let services = Services::build(config.clone()).unwrap();
        std::fs::create_dir_all(config.draw_dir()).unwrap();
        std::fs::copy(&font, config.draw_dir().join(FONT_FILE)).unwrap();

        let request = RenderRequest::Cached(RenderKey::Daily { day: DayBucket::MonThu, part: DailyPart::Avatar });
        let path = services.renderer.get_or_render(&request).await.unwrap();
        let image = image::open(&path).unwrap().to_rgba8();

        let top = TITLE_BAND + GROUP_HEADER + LABEL_TOP;
        let ink = (MARGIN..MARGIN + TILE)
            .flat_map(|x| (top..top + LABEL_BAND).map(move |y| (x, y)))
            .filter(|&(x, y)| *image.get_pixel(x, y) != BACKGROUND)
            .count();
        assert!(ink > 0, "label band of the first tile is blank");
    }
}
