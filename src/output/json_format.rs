//! JSON output formatting.

use crate::events::ScanEvent;
use serde::Serialize;
use std::io::{self, Write};

/// Write `value` as pretty-printed JSON followed by a newline.
pub fn write_json<T: Serialize, W: Write>(value: &T, mut out: W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)
}

/// One event as a single JSON line.
pub fn event_line(event: &ScanEvent) -> serde_json::Result<String> {
    serde_json::to_string(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionId;

    #[test]
    fn test_event_line_is_single_line() {
        let line = event_line(&ScanEvent::ScanStarted {
            session_id: SessionId::new(),
            target: "10.0.0.5".to_string(),
            total_hosts: 1,
        })
        .unwrap();

        assert!(!line.contains('\n'));
        assert!(line.starts_with(r#"{"type":"scan_started""#));
    }
}
