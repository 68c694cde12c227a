//! CLI argument definitions.

use clap::builder::FalseyValueParser;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::config::Overrides;
use crate::record::{Priority, SnagFilter, SnagPatch, Status};

/// Snag tracker - record construction defects and their photos.
///
/// Robot Mode: Use --robot or --format json for machine-parseable output.
#[derive(Parser, Debug)]
#[command(name = "snag", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (text for humans, json for agents/scripts)
    #[arg(
        long,
        short = 'f',
        default_value = "text",
        global = true,
        env = "SNAG_FORMAT"
    )]
    pub format: OutputFormat,

    /// Robot mode: equivalent to --format=json
    #[arg(long, global = true)]
    pub robot: bool,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Disable colored output (any non-empty NO_COLOR also disables it)
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Data directory holding snags.db and images/
    #[arg(long, global = true, env = "SNAG_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Default JPEG quality for new photos, 1-100 (beats the config file)
    #[arg(
        long,
        global = true,
        env = "SNAG_JPEG_QUALITY",
        value_name = "QUALITY",
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    pub jpeg_quality: Option<u8>,

    /// Config file (TOML or YAML)
    #[arg(long, global = true, env = "SNAG_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with optional color
    #[default]
    Text,
    /// JSON output for scripts and agents
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

impl Cli {
    /// Returns true if output should be JSON (robot mode or explicit --format=json).
    pub const fn use_json(&self) -> bool {
        self.robot || matches!(self.format, OutputFormat::Json | OutputFormat::JsonCompact)
    }

    /// Returns true if output should be compact JSON.
    pub const fn use_compact_json(&self) -> bool {
        matches!(self.format, OutputFormat::JsonCompact)
    }

    /// Settings overrides carried by global flags.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            config: self.config.clone(),
            data_dir: self.data_dir.clone(),
            jpeg_quality: self.jpeg_quality,
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    // === Snags ===
    /// Create a snag
    New(NewArgs),

    /// List snags, most recently updated first
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// Show a snag and its photos
    Show(IdArg),

    /// Change fields of a snag
    Edit(EditArgs),

    /// Delete a snag and all of its photos
    #[command(visible_alias = "rm")]
    Delete(DeleteArgs),

    // === Photos ===
    /// Add, inspect, remove or export photos
    #[command(subcommand)]
    Photo(PhotoCommands),

    // === Storage ===
    /// Show image store and record totals
    Storage,

    /// Remove image files no photo refers to
    Sweep(SweepArgs),

    /// Delete every stored image file (photo records stay)
    ClearImages(ConfirmArgs),

    /// Show effective settings
    Config,

    // === Utilities ===
    /// Show version and build info
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Photo subcommands.
#[derive(Subcommand, Debug)]
pub enum PhotoCommands {
    /// Compress an image and attach it to a snag
    Add(PhotoAddArgs),

    /// Show one photo
    Show(IdArg),

    /// Remove a photo and its image file
    #[command(visible_alias = "remove")]
    Rm(IdArg),

    /// Write a photo's stored JPEG to a file
    Export(PhotoExportArgs),
}

#[derive(Args, Debug)]
pub struct IdArg {
    /// Id or unique prefix (at least 4 characters)
    pub id: String,
}

#[derive(Args, Debug)]
pub struct NewArgs {
    /// Short description of the defect
    pub title: String,

    /// Where the defect is
    #[arg(long, short = 'l', default_value = "")]
    pub location: String,

    /// Free-form notes
    #[arg(long, short = 'n', default_value = "")]
    pub notes: String,

    #[arg(long, short = 'p', value_enum, default_value_t = Priority::Medium)]
    pub priority: Priority,

    #[arg(long, short = 's', value_enum, default_value_t = Status::Open)]
    pub status: Status,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Case-insensitive text to find in title, location or notes
    #[arg(long, short = 'S')]
    pub search: Option<String>,

    #[arg(long, short = 's', value_enum)]
    pub status: Option<Status>,

    #[arg(long, short = 'p', value_enum)]
    pub priority: Option<Priority>,
}

impl ListArgs {
    pub fn filter(&self) -> SnagFilter {
        SnagFilter {
            search: self.search.clone(),
            status: self.status,
            priority: self.priority,
        }
    }
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Id or unique prefix
    pub id: String,

    #[arg(long, short = 't')]
    pub title: Option<String>,

    #[arg(long, short = 'l')]
    pub location: Option<String>,

    #[arg(long, short = 'n')]
    pub notes: Option<String>,

    #[arg(long, short = 'p', value_enum)]
    pub priority: Option<Priority>,

    #[arg(long, short = 's', value_enum)]
    pub status: Option<Status>,
}

impl EditArgs {
    pub fn patch(&self) -> SnagPatch {
        SnagPatch {
            title: self.title.clone(),
            notes: self.notes.clone(),
            location: self.location.clone(),
            priority: self.priority,
            status: self.status,
        }
    }
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Id or unique prefix
    pub id: String,

    #[command(flatten)]
    pub confirm: ConfirmArgs,
}

#[derive(Args, Debug)]
pub struct ConfirmArgs {
    /// Confirm a destructive operation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct PhotoAddArgs {
    /// Snag id or unique prefix
    pub snag: String,

    /// Image file (any format the image crate decodes)
    pub image: PathBuf,

    /// JPEG quality 1-100 (default from config, else 80)
    #[arg(long, short = 'Q', value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,
}

#[derive(Args, Debug)]
pub struct PhotoExportArgs {
    /// Photo id or unique prefix
    pub id: String,

    /// Output file
    pub out: PathBuf,
}

#[derive(Args, Debug)]
pub struct SweepArgs {
    /// List orphans without deleting them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
