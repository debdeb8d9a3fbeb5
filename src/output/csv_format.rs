//! CSV output formatting.
//!
//! One row per reported port; hosts without ports get a single row with
//! empty port columns.

use crate::storage::SessionRecord;
use serde::Serialize;
use std::io::Write;

const HEADER: [&str; 6] = ["host", "status", "port", "port_status", "service", "error"];

/// Write a session's host results as CSV.
pub fn write_csv<W: Write>(record: &SessionRecord, out: W) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(HEADER)?;

    for host in &record.results {
        let address = host.host.to_string();
        let status = host.status.to_string();

        if host.ports.is_empty() {
            wtr.write_record([
                address.as_str(),
                status.as_str(),
                "",
                "",
                "",
                host.error.as_deref().unwrap_or(""),
            ])?;
            continue;
        }

        for port in &host.ports {
            wtr.write_record([
                address.as_str(),
                status.as_str(),
                &port.port.to_string(),
                &port.status.to_string(),
                port.service.as_deref().unwrap_or(""),
                port.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Write flat records as CSV, with a header taken from the field names.
pub fn write_rows<T: Serialize, W: Write>(rows: &[T], out: W) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
