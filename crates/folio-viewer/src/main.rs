//! Folio Viewer - desktop preview of the avatar centerpiece
//!
//! Loads `folio.toml` (or defaults), picks a profile and opens a window with
//! the same scene the page mounts.

mod app;
mod config;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use folio_scene::AvatarConfig;

#[derive(Parser, Debug)]
#[command(name = "folio-viewer")]
#[command(about = "Preview the portfolio avatar on the desktop")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "folio.toml")]
    config: PathBuf,

    /// Built-in profile to use (pedestal, lounge)
    #[arg(short, long)]
    profile: Option<String>,

    /// Directory the avatar asset is read from
    #[arg(short, long)]
    asset_root: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Folio viewer v{}", env!("CARGO_PKG_VERSION"));

    let mut config = config::load_config(&args.config)?;
    if let Some(asset_root) = args.asset_root {
        config.avatar.asset_root = asset_root;
    }
    let profile = config.resolve_profile(args.profile.as_deref())?;

    info!(
        profile = %profile.name,
        asset = %profile.asset,
        asset_root = %config.avatar.asset_root,
        "Configuration loaded"
    );

    let avatar = AvatarConfig::new(profile, config.avatar.asset_root.clone());
    let exit = app::run(&config.viewer, avatar);
    info!(?exit, "Viewer closed");
    Ok(())
}
