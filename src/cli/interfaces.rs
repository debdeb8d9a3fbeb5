//! Interfaces subcommand implementation.

use crate::cli::{Context, OutputFormat};
use crate::error::CliResult;
use crate::interfaces::list_interfaces;
use crate::output;
use clap::Parser;
use std::io;

/// List local IPv4 interfaces and the networks they sit on.
#[derive(Parser, Debug)]
pub struct InterfacesCommand {
    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

impl InterfacesCommand {
    pub fn execute(&self, ctx: &Context) -> CliResult<()> {
        let interfaces = list_interfaces();
        let out = io::stdout().lock();

        match self.format.unwrap_or_else(|| ctx.default_format()) {
            OutputFormat::Plain => output::write_interfaces(&interfaces, out)?,
            OutputFormat::Json => output::write_json(&interfaces, out)?,
            OutputFormat::Csv => output::write_rows(&interfaces, out)?,
        }
        Ok(())
    }
}
