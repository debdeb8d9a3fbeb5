//! CLI subcommand definitions and handlers.
//!
//! Implements a git-like subcommand architecture:
//! - `netsweep scan <target>` - Sweep a target for live hosts and open ports
//! - `netsweep history list|show|delete|search|stats|map` - Browse past sessions
//! - `netsweep export <session-id>` - Export a session's results
//! - `netsweep bookmarks list|add|update|remove` - Manage saved targets
//! - `netsweep interfaces` - List local networks to scan

mod bookmarks;
mod export;
mod history;
mod interfaces;
mod scan;

pub use bookmarks::BookmarksCommand;
pub use export::ExportCommand;
pub use history::HistoryCommand;
pub use interfaces::InterfacesCommand;
pub use scan::ScanCommand;

use crate::config::{AppSettings, Paths};
use crate::error::CliResult;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// netsweep - a host discovery and TCP port sweeper.
///
/// netsweep pings every host of a target (a single address, a hostname,
/// a last-octet range or a CIDR block) and probes the live ones with TCP
/// connects. Sessions are saved for later review and export.
#[derive(Parser, Debug)]
#[command(name = "netsweep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Sweep a network for live hosts and open TCP ports", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to a settings file
    #[arg(long, global = true, value_name = "PATH", env = "NETSWEEP_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sweep a target for live hosts and open ports
    #[command(alias = "s")]
    Scan(ScanCommand),

    /// Browse past scan sessions
    #[command(alias = "h")]
    History(HistoryCommand),

    /// Export a session's results
    #[command(alias = "e")]
    Export(ExportCommand),

    /// Manage saved scan targets
    #[command(alias = "b")]
    Bookmarks(BookmarksCommand),

    /// List local IPv4 interfaces and their networks
    #[command(alias = "if")]
    Interfaces(InterfacesCommand),
}

/// State shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Context {
    pub paths: Paths,
    pub settings: AppSettings,
    pub verbose: bool,
    pub quiet: bool,
}

impl Context {
    /// Discover paths and load settings, from `--config` when given.
    pub fn load(cli: &Cli) -> CliResult<Self> {
        let paths = Paths::discover()?;
        let settings = match &cli.config {
            Some(path) => AppSettings::load_from(path)?,
            None => AppSettings::load(&paths)?,
        };

        Ok(Self {
            paths,
            settings,
            verbose: cli.verbose,
            quiet: cli.quiet,
        })
    }

    /// Output format from settings, falling back to plain.
    pub fn default_format(&self) -> OutputFormat {
        OutputFormat::from_str(&self.settings.default_output_format, true).unwrap_or_else(|_| {
            tracing::warn!(
                format = %self.settings.default_output_format,
                "unknown default output format, using plain"
            );
            OutputFormat::Plain
        })
    }
}

impl Cli {
    /// Run the selected subcommand.
    pub async fn execute(self) -> CliResult<()> {
        let ctx = Context::load(&self)?;

        match self.command {
            Commands::Scan(cmd) => cmd.execute(&ctx).await,
            Commands::History(cmd) => cmd.execute(&ctx),
            Commands::Export(cmd) => cmd.execute(&ctx),
            Commands::Bookmarks(cmd) => cmd.execute(&ctx),
            Commands::Interfaces(cmd) => cmd.execute(&ctx),
        }
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON structured output
    Json,
    /// CSV format for data analysis
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}
