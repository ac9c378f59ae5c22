//! ObjChop
//!
//! Fits audio objects to the activity detected in their tracks.
//!
//! # Usage
//!
//! ```bash
//! objchop analyse --samples mix.wav
//! objchop plan --document mix.json --samples mix.wav
//! objchop chop --document mix.json --samples mix.wav --output out.json --report report.json
//! objchop batch --dir reels/ --output-dir chopped/
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use objchop_cli::adapters::ConfigLoader;
use objchop_cli::app::DefaultAppContainer;
use objchop_cli::cli::{commands, Cli, Commands};
use objchop_cli::config_initialization::initialize_configuration_hierarchy;

/// Main entry point for the ObjChop CLI application
fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = initialize_configuration_hierarchy(
        &ConfigLoader::new(),
        cli.profile_args().config.as_deref(),
        &cli.overrides(),
    )
    .context("Failed to load configuration")?;

    config.logging.init().context("Failed to initialise logging")?;
    info!(profile = %config.profile, source = ?config.source, "Starting ObjChop");

    let container = DefaultAppContainer::new(&config);

    match cli.command {
        Commands::Analyse(args) => {
            info!("Executing analyse command");
            commands::analyse(&container, args)?;
        }
        Commands::Plan(args) => {
            info!("Executing plan command");
            commands::plan(&container, args)?;
        }
        Commands::Chop(args) => {
            info!("Executing chop command");
            commands::chop(&container, args)?;
        }
        Commands::Batch(args) => {
            info!("Executing batch command");
            commands::batch(&container, args)?;
        }
    }

    info!("ObjChop completed successfully");
    Ok(())
}
