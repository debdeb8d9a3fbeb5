//! Output formatting module.
//!
//! Renders session records and live scan events as plain text, JSON,
//! or CSV.

mod csv_format;
mod json_format;
mod plain;

pub use csv_format::{write_csv, write_rows};
pub use json_format::{event_line, write_json};
pub use plain::{
    host_line, print_error, print_info, print_scan_header, print_success, print_warning,
    write_bookmarks, write_host_matches, write_interfaces, write_network_map, write_plain,
    write_session_list, write_statistics,
};

use crate::cli::OutputFormat;
use crate::error::CliResult;
use crate::storage::SessionRecord;
use std::io::Write;

/// Write a session record in the requested format.
pub fn write_session<W: Write>(record: &SessionRecord, format: OutputFormat, out: W) -> CliResult<()> {
    match format {
        OutputFormat::Plain => plain::write_plain(record, out)?,
        OutputFormat::Json => json_format::write_json(record, out)?,
        OutputFormat::Csv => csv_format::write_csv(record, out)?,
    }
    Ok(())
}

/// Render a session record to a string in the requested format.
pub fn format_session(record: &SessionRecord, format: OutputFormat) -> CliResult<String> {
    let mut buf = Vec::new();
    write_session(record, format, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
