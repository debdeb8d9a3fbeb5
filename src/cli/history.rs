//! History subcommand implementation.
//!
//! Handles `netsweep history` for browsing saved sessions.

use crate::cli::{Context, OutputFormat};
use crate::error::CliResult;
use crate::output;
use crate::storage::JsonSessionStore;
use clap::{Parser, Subcommand};
use std::io;

/// Browse and manage saved scan sessions.
#[derive(Parser, Debug)]
pub struct HistoryCommand {
    #[command(subcommand)]
    pub action: HistoryAction,
}

#[derive(Subcommand, Debug)]
pub enum HistoryAction {
    /// List recent sessions, newest first
    #[command(alias = "ls")]
    List {
        /// Number of sessions to show
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,

        /// Skip this many sessions
        #[arg(long, default_value = "0")]
        offset: usize,
    },

    /// Show one session's results
    Show {
        /// Session ID or unique prefix
        #[arg(value_name = "SESSION_ID")]
        session_id: String,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Delete a session
    #[command(alias = "rm")]
    Delete {
        /// Session ID or unique prefix
        #[arg(value_name = "SESSION_ID")]
        session_id: String,
    },

    /// Find hosts by address substring across all sessions
    Search {
        /// Address fragment, e.g. "192.168.1."
        query: String,

        /// Maximum number of matches
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Show aggregate statistics
    Stats,

    /// Group a session's hosts by network (defaults to the latest completed)
    Map {
        /// Session ID or unique prefix
        #[arg(value_name = "SESSION_ID")]
        session_id: Option<String>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },
}

impl HistoryCommand {
    /// Execute the history command.
    pub fn execute(&self, ctx: &Context) -> CliResult<()> {
        let store = JsonSessionStore::open_default(&ctx.paths)?;
        let stdout = io::stdout();

        match &self.action {
            HistoryAction::List { limit, offset } => {
                let records = store.list(*limit, *offset)?;
                output::write_session_list(&records, stdout.lock())?;
            }
            HistoryAction::Show { session_id, format } => {
                let record = store.find(session_id)?;
                let format = format.unwrap_or_else(|| ctx.default_format());
                output::write_session(&record, format, stdout.lock())?;
            }
            HistoryAction::Delete { session_id } => {
                let record = store.find(session_id)?;
                store.delete(&record.id)?;
                if !ctx.quiet {
                    output::print_success(&format!("Deleted session {}", record.id.short()));
                }
            }
            HistoryAction::Search { query, limit } => {
                let matches = store.search_hosts(query, *limit)?;
                output::write_host_matches(&matches, stdout.lock())?;
            }
            HistoryAction::Stats => {
                let stats = store.statistics()?;
                output::write_statistics(&stats, stdout.lock())?;
            }
            HistoryAction::Map { session_id, format } => {
                let map = store.network_map(session_id.as_deref())?;
                match format.unwrap_or_else(|| ctx.default_format()) {
                    OutputFormat::Plain => output::write_network_map(map.as_ref(), stdout.lock())?,
                    OutputFormat::Json => output::write_json(&map, stdout.lock())?,
                    OutputFormat::Csv => {
                        let networks = map.map(|m| m.networks).unwrap_or_default();
                        output::write_rows(&networks, stdout.lock())?;
                    }
                }
            }
        }

        Ok(())
    }
}
