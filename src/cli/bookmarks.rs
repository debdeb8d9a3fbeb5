//! Bookmarks subcommand implementation.
//!
//! Handles `netsweep bookmarks list|add|update|remove`.

use crate::cli::Context;
use crate::config::ScanProfile;
use crate::error::CliResult;
use crate::output;
use crate::storage::{Bookmark, BookmarkStore, BookmarkUpdate};
use clap::{Parser, Subcommand};
use std::io;

/// Manage saved scan targets.
#[derive(Parser, Debug)]
pub struct BookmarksCommand {
    #[command(subcommand)]
    pub action: BookmarksAction,
}

#[derive(Subcommand, Debug)]
pub enum BookmarksAction {
    /// List bookmarks, newest first
    #[command(alias = "ls")]
    List,

    /// Save a new bookmark
    Add {
        /// Bookmark name (letters, digits, '-' and '_')
        name: String,

        /// Target expression
        target: String,

        /// Scan profile
        #[arg(short = 'P', long, value_enum, default_value = "quick")]
        profile: ScanProfile,

        /// Explicit ports overriding the profile
        #[arg(short, long)]
        ports: Option<String>,

        /// Free-form description
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Change a bookmark
    Update {
        name: String,

        /// New target expression
        #[arg(long)]
        target: Option<String>,

        #[arg(short = 'P', long, value_enum)]
        profile: Option<ScanProfile>,

        #[arg(short, long, conflicts_with = "clear_ports")]
        ports: Option<String>,

        /// Drop the explicit port list
        #[arg(long)]
        clear_ports: bool,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete a bookmark
    #[command(alias = "rm")]
    Remove { name: String },
}

impl BookmarksCommand {
    /// Execute the bookmarks command.
    pub fn execute(&self, ctx: &Context) -> CliResult<()> {
        let mut store = BookmarkStore::open_default(&ctx.paths)?;

        match &self.action {
            BookmarksAction::List => {
                output::write_bookmarks(&store.list(), io::stdout().lock())?;
            }
            BookmarksAction::Add {
                name,
                target,
                profile,
                ports,
                description,
            } => {
                let mut bookmark = Bookmark::new(name, target);
                bookmark.profile = *profile;
                bookmark.ports = ports.clone();
                bookmark.description = description.clone();
                store.create(bookmark)?;

                if !ctx.quiet {
                    output::print_success(&format!("Saved bookmark '{}'", name));
                }
            }
            BookmarksAction::Update {
                name,
                target,
                profile,
                ports,
                clear_ports,
                description,
            } => {
                let ports = if *clear_ports {
                    Some(None)
                } else {
                    ports.clone().map(Some)
                };

                store.update(
                    name,
                    BookmarkUpdate {
                        target: target.clone(),
                        description: description.clone(),
                        profile: *profile,
                        ports,
                    },
                )?;

                if !ctx.quiet {
                    output::print_success(&format!("Updated bookmark '{}'", name));
                }
            }
            BookmarksAction::Remove { name } => {
                store.delete(name)?;
                if !ctx.quiet {
                    output::print_success(&format!("Removed bookmark '{}'", name));
                }
            }
        }

        Ok(())
    }
}
