//! Export subcommand implementation.
//!
//! Handles the `netsweep export <session-id>` command for exporting
//! session results.

use crate::cli::{Context, OutputFormat};
use crate::error::{CliError, CliResult};
use crate::output;
use crate::storage::JsonSessionStore;
use clap::Parser;
use std::fs;
use std::path::PathBuf;

/// Export session results.
#[derive(Parser, Debug)]
pub struct ExportCommand {
    /// Session ID or prefix to export
    ///
    /// Can be a full UUID or the first few characters (short ID).
    #[arg(value_name = "SESSION_ID")]
    pub session_id: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Output file path (prints to stdout if not specified)
    #[arg(short = 'o', long = "output")]
    pub output_file: Option<PathBuf>,

    /// Export only hosts that were up
    #[arg(long)]
    pub up_only: bool,
}

impl ExportCommand {
    /// Execute the export command.
    pub fn execute(&self, ctx: &Context) -> CliResult<()> {
        let store = JsonSessionStore::open_default(&ctx.paths)?;

        let mut record = store.find(&self.session_id)?;
        if self.up_only {
            record.results.retain(|r| r.is_up());
        }

        match &self.output_file {
            Some(path) => {
                // Files never carry terminal styling.
                let colors = console::colors_enabled();
                console::set_colors_enabled(false);
                let content = output::format_session(&record, self.format);
                console::set_colors_enabled(colors);
                let content = content?;

                fs::write(path, content).map_err(|e| {
                    CliError::Other(format!("failed to write {}: {}", path.display(), e))
                })?;

                if !ctx.quiet {
                    output::print_success(&format!(
                        "Exported session {} to {}",
                        record.id.short(),
                        path.display()
                    ));
                }
            }
            None => {
                output::write_session(&record, self.format, std::io::stdout().lock())?;
            }
        }

        Ok(())
    }
}
