//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;
use clap_num::number_range;

use crate::config_initialization::ConfigOverrides;
use crate::utils::time::parse_duration_ns;

/// Largest accepted analysis block, in frames
pub const MAX_BLOCK_SIZE: usize = 1 << 20;

fn block_size_in_range(s: &str) -> Result<usize, String> {
    number_range(s, 1, MAX_BLOCK_SIZE)
}

fn duration_arg(s: &str) -> Result<i64, String> {
    parse_duration_ns(s).map_err(|e| e.to_string())
}

/// Sample file and analysis block size
#[derive(Args, Debug, Clone)]
pub struct SampleArgs {
    /// WAV or BW64 file carrying the object tracks
    #[arg(long)]
    pub samples: PathBuf,

    /// Frames per analysis block
    #[arg(long, value_parser = block_size_in_range)]
    pub block_size: Option<usize>,
}

/// Profile and threshold options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct ProfileArgs {
    /// Config file (TOML or YAML)
    #[arg(long, env = "OBJCHOP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Production profile name
    #[arg(long, env = "OBJCHOP_PROFILE")]
    pub profile: Option<String>,

    /// Padding before detected activity (e.g. 20ms)
    #[arg(long, env = "OBJCHOP_LEAD_IN", value_parser = duration_arg)]
    pub lead_in: Option<i64>,

    /// Padding after detected activity
    #[arg(long, env = "OBJCHOP_LEAD_OUT", value_parser = duration_arg)]
    pub lead_out: Option<i64>,

    /// Merge intervals separated by less than this
    #[arg(long, env = "OBJCHOP_MIN_GAP", value_parser = duration_arg)]
    pub min_gap: Option<i64>,

    /// Shortest interval kept
    #[arg(long, env = "OBJCHOP_MIN_DURATION", value_parser = duration_arg)]
    pub min_duration: Option<i64>,

    /// Longest internal silence tolerated inside an object
    #[arg(long, env = "OBJCHOP_MAX_GAP", value_parser = duration_arg)]
    pub max_gap: Option<i64>,

    /// Let intervals extend past the original object bounds
    #[arg(long)]
    pub no_crop: bool,

    /// RMS magnitude above which a channel counts as active
    #[arg(long, env = "OBJCHOP_THRESHOLD")]
    pub threshold: Option<f64>,
}

impl ProfileArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            profile: self.profile.clone(),
            lead_in_ns: self.lead_in,
            lead_out_ns: self.lead_out,
            min_gap_ns: self.min_gap,
            min_duration_ns: self.min_duration,
            max_gap_ns: self.max_gap,
            no_crop: self.no_crop,
            threshold: self.threshold,
            ..Default::default()
        }
    }
}

/// Arguments for the analyse command
#[derive(Args, Debug)]
pub struct AnalyseArgs {
    #[command(flatten)]
    pub samples: SampleArgs,

    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Input document (JSON)
    #[arg(long)]
    pub document: PathBuf,

    #[command(flatten)]
    pub samples: SampleArgs,

    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the chop command
#[derive(Args, Debug)]
pub struct ChopArgs {
    /// Input document (JSON)
    #[arg(long)]
    pub document: PathBuf,

    #[command(flatten)]
    pub samples: SampleArgs,

    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Output document path
    #[arg(short, long)]
    pub output: PathBuf,

    /// Write a JSON rewrite report here
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Arguments for the batch command
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Directory searched recursively for `<name>.json` + `<name>.wav` pairs
    #[arg(long)]
    pub dir: PathBuf,

    /// Frames per analysis block
    #[arg(long, value_parser = block_size_in_range)]
    pub block_size: Option<usize>,

    /// Directory receiving rewritten documents and reports
    #[arg(long)]
    pub output_dir: PathBuf,

    #[command(flatten)]
    pub profile: ProfileArgs,
}
