//! CLI module for ObjChop
//!
//! This module handles command-line argument parsing and command execution.

use clap::{Parser, Subcommand};

use crate::config_initialization::ConfigOverrides;
use crate::utils::logging::LogFormat;

pub mod args;
pub mod commands;

/// ObjChop
///
/// Trims, splits and removes audio objects so that every object covers only
/// the time its tracks actually carry signal.
#[derive(Parser, Debug)]
#[command(name = "objchop")]
#[command(about = "ObjChop - Fit audio objects to their detected activity")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Log filter, e.g. `info` or `objchop_cli=debug`
    #[arg(long, global = true, env = "OBJCHOP_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print per-block channel activity of a sample file
    Analyse(args::AnalyseArgs),
    /// Show what would happen to each object without writing anything
    Plan(args::PlanArgs),
    /// Rewrite a document to match detected activity
    Chop(args::ChopArgs),
    /// Chop every document/sample pair in a directory
    Batch(args::BatchArgs),
}

impl Cli {
    /// Profile options of whichever command was given
    pub fn profile_args(&self) -> &args::ProfileArgs {
        match &self.command {
            Commands::Analyse(a) => &a.profile,
            Commands::Plan(a) => &a.profile,
            Commands::Chop(a) => &a.profile,
            Commands::Batch(a) => &a.profile,
        }
    }

    /// Every override from the command line and its environment fallbacks
    pub fn overrides(&self) -> ConfigOverrides {
        let block_size = match &self.command {
            Commands::Analyse(a) => a.samples.block_size,
            Commands::Plan(a) => a.samples.block_size,
            Commands::Chop(a) => a.samples.block_size,
            Commands::Batch(a) => a.block_size,
        };
        ConfigOverrides {
            block_size,
            log_level: self.log_level.clone(),
            log_format: self.log_format,
            ..self.profile_args().overrides()
        }
    }
}
