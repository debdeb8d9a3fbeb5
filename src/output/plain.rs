//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use crate::config::ScanProfile;
use crate::interfaces::LocalInterface;
use crate::scanner::{HostResult, HostStatus, PortStatus};
use crate::storage::{Bookmark, HostMatch, NetworkMap, SessionRecord, StoreStatistics};
use console::{style, Style};
use std::io::{self, Write};

const RULE: &str = "═══════════════════════════════════════════════════════════════";
const THIN_RULE: &str = "───────────────────────────────────────────────────────────────";

/// Print a session record in human-readable plain text.
pub fn write_plain<W: Write>(record: &SessionRecord, mut out: W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(
        out,
        "                    {} Scan Results",
        style("netsweep").cyan().bold()
    )?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    writeln!(out, "  {} {}", style("Target:").bold(), record.target)?;
    writeln!(out, "  {} {}", style("Profile:").bold(), record.profile)?;
    if let Some(ports) = &record.ports {
        writeln!(out, "  {} {}", style("Ports:").bold(), ports)?;
    }
    writeln!(out, "  {} {}", style("Status:").bold(), record.status)?;
    writeln!(
        out,
        "  {} {}",
        style("Session:").bold(),
        style(record.id.short()).dim()
    )?;
    writeln!(
        out,
        "  {} {}",
        style("Started:").bold(),
        record.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(out)?;

    writeln!(
        out,
        "  {} {} of {} hosts scanned, {} up, {} open ports",
        style("Statistics:").bold(),
        record.hosts_scanned(),
        record.total_hosts,
        style(record.hosts_up).green().bold(),
        style(record.open_port_count()).green()
    )?;
    writeln!(out)?;

    let live: Vec<_> = record.results.iter().filter(|r| r.is_up()).collect();
    if live.is_empty() {
        writeln!(out, "  {}", style("No live hosts to display.").dim())?;
    }

    for host in live {
        writeln!(out, "  {}", style(host.host).white().bold())?;

        if host.ports.is_empty() {
            writeln!(out, "    {}", style("no open ports").dim())?;
            continue;
        }

        writeln!(out, "  {}", style(THIN_RULE).dim())?;
        writeln!(
            out,
            "  {:>6}  {:^8}  {:<15}  {}",
            style("PORT").bold(),
            style("STATE").bold(),
            style("SERVICE").bold(),
            style("DETAIL").bold()
        )?;
        writeln!(out, "  {}", style(THIN_RULE).dim())?;

        for port in &host.ports {
            let status_style = match port.status {
                PortStatus::Open => Style::new().green().bold(),
                PortStatus::Closed => Style::new().red(),
                PortStatus::Error => Style::new().yellow(),
            };

            let detail = port
                .error
                .as_ref()
                .map(|e| truncate_string(e, 35))
                .unwrap_or_default();

            writeln!(
                out,
                "  {:>6}  {:^8}  {:<15}  {}",
                port.port.as_u16(),
                status_style.apply_to(port.status.to_string()),
                port.service.as_deref().unwrap_or("-"),
                style(detail).dim()
            )?;
        }
        writeln!(out)?;
    }

    let failed = record
        .results
        .iter()
        .filter(|r| r.status == HostStatus::Error);
    for host in failed {
        writeln!(
            out,
            "  {} {} {}",
            style("!").yellow().bold(),
            host.host,
            style(host.error.as_deref().unwrap_or("scan failed")).dim()
        )?;
    }

    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    Ok(())
}

/// A one-line summary of a live host, printed as results arrive.
pub fn host_line(result: &HostResult) -> String {
    match result.status {
        HostStatus::Up => {
            let ports: Vec<_> = result
                .open_ports()
                .map(|p| format!("{}/{}", p.port, p.service.as_deref().unwrap_or("unknown")))
                .collect();
            if ports.is_empty() {
                format!("{} {} up", style("•").green(), result.host)
            } else {
                format!(
                    "{} {} up  {}",
                    style("•").green(),
                    style(result.host).bold(),
                    ports.join(", ")
                )
            }
        }
        HostStatus::Down => format!("{} {} down", style("•").dim(), result.host),
        HostStatus::Error => format!(
            "{} {} error: {}",
            style("!").yellow().bold(),
            result.host,
            result.error.as_deref().unwrap_or("unknown")
        ),
    }
}

/// Print a scan header before scanning begins.
pub fn print_scan_header(target: &str, profile: ScanProfile, hosts: usize, ports: usize) {
    eprintln!();
    eprintln!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("netsweep").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    eprintln!("{} Profile: {}", style("•").dim(), style(profile).yellow());
    eprintln!(
        "{} Target: {} ({} hosts)",
        style("•").dim(),
        style(target).white().bold(),
        hosts
    );
    eprintln!(
        "{} Probing {} ports per live host...",
        style("•").dim(),
        style(ports).white().bold()
    );
    eprintln!();
}

/// Tabulate stored sessions for `history list`.
pub fn write_session_list<W: Write>(records: &[SessionRecord], mut out: W) -> io::Result<()> {
    if records.is_empty() {
        writeln!(out, "{}", style("No sessions recorded.").dim())?;
        return Ok(());
    }

    writeln!(
        out,
        "{:<10}  {:<20}  {:<22}  {:<9}  {:>9}  {:>5}",
        style("SESSION").bold(),
        style("CREATED").bold(),
        style("TARGET").bold(),
        style("STATUS").bold(),
        style("UP/TOTAL").bold(),
        style("OPEN").bold()
    )?;

    for record in records {
        writeln!(
            out,
            "{:<10}  {:<20}  {:<22}  {:<9}  {:>9}  {:>5}",
            record.id.short(),
            record.created_at.format("%Y-%m-%d %H:%M").to_string(),
            truncate_string(&record.target, 22),
            record.status.to_string(),
            format!("{}/{}", record.hosts_up, record.total_hosts),
            record.open_port_count()
        )?;
    }

    Ok(())
}

/// Tabulate host search results.
pub fn write_host_matches<W: Write>(matches: &[HostMatch], mut out: W) -> io::Result<()> {
    if matches.is_empty() {
        writeln!(out, "{}", style("No matching hosts.").dim())?;
        return Ok(());
    }

    for m in matches {
        writeln!(
            out,
            "{:<16}  {:<5}  {}  {} ({})",
            m.host,
            m.status.to_string(),
            m.scanned_at.format("%Y-%m-%d %H:%M"),
            style(m.session_id.short()).dim(),
            m.target
        )?;
    }

    Ok(())
}

/// Print aggregate history statistics.
pub fn write_statistics<W: Write>(stats: &StoreStatistics, mut out: W) -> io::Result<()> {
    writeln!(out, "  {} {}", style("Sessions:").bold(), stats.total_sessions)?;
    writeln!(out, "  {} {}", style("Last 7 days:").bold(), stats.recent_sessions)?;
    writeln!(
        out,
        "  {} {} seen, {} up",
        style("Hosts:").bold(),
        stats.total_hosts,
        stats.hosts_up
    )?;

    if !stats.top_ports.is_empty() {
        writeln!(out, "  {}", style("Top open ports:").bold())?;
        for entry in &stats.top_ports {
            writeln!(
                out,
                "    {:>6}  {:<15}  {}",
                entry.port,
                crate::services::service_or_unknown(entry.port),
                entry.count
            )?;
        }
    }

    Ok(())
}

/// Print a session's hosts grouped by network.
pub fn write_network_map<W: Write>(map: Option<&NetworkMap>, mut out: W) -> io::Result<()> {
    let Some(map) = map else {
        writeln!(out, "{}", style("No completed sessions to map.").dim())?;
        return Ok(());
    };

    writeln!(
        out,
        "  {} {} ({}, {})",
        style("Session:").bold(),
        style(map.session_id.short()).dim(),
        map.target,
        map.created_at.format("%Y-%m-%d %H:%M")
    )?;
    writeln!(out)?;

    if map.networks.is_empty() {
        writeln!(out, "  {}", style("No hosts recorded.").dim())?;
        return Ok(());
    }

    writeln!(
        out,
        "  {:<24}  {:>6}  {:>6}",
        style("NETWORK").bold(),
        style("HOSTS").bold(),
        style("ACTIVE").bold()
    )?;
    for network in &map.networks {
        let active = if network.active_hosts > 0 {
            style(network.active_hosts).green().bold()
        } else {
            style(network.active_hosts).dim()
        };
        writeln!(
            out,
            "  {:<24}  {:>6}  {:>6}",
            network.network.to_string(),
            network.hosts,
            active
        )?;
    }

    Ok(())
}

/// Tabulate local interfaces.
pub fn write_interfaces<W: Write>(interfaces: &[LocalInterface], mut out: W) -> io::Result<()> {
    if interfaces.is_empty() {
        writeln!(out, "{}", style("No IPv4 interfaces found.").dim())?;
        return Ok(());
    }

    writeln!(
        out,
        "{:<12}  {:<16}  {:<16}  {}",
        style("INTERFACE").bold(),
        style("ADDRESS").bold(),
        style("NETMASK").bold(),
        style("NETWORK").bold()
    )?;
    for iface in interfaces {
        writeln!(
            out,
            "{:<12}  {:<16}  {:<16}  {}",
            truncate_string(&iface.name, 12),
            iface.address.to_string(),
            iface.netmask.to_string(),
            style(&iface.network).cyan()
        )?;
    }

    Ok(())
}

/// Tabulate saved bookmarks.
pub fn write_bookmarks<W: Write>(bookmarks: &[&Bookmark], mut out: W) -> io::Result<()> {
    if bookmarks.is_empty() {
        writeln!(out, "{}", style("No bookmarks saved.").dim())?;
        return Ok(());
    }

    for bookmark in bookmarks {
        write!(
            out,
            "{:<16}  {:<22}  {:<8}",
            style(&bookmark.name).cyan().bold(),
            bookmark.target,
            bookmark.profile.to_string()
        )?;
        if let Some(ports) = &bookmark.ports {
            write!(out, "  ports {}", ports)?;
        }
        if !bookmark.description.is_empty() {
            write!(out, "  {}", style(&bookmark.description).dim())?;
        }
        writeln!(out)?;
    }

    Ok(())
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Truncate a string to a maximum length, adding ellipsis if truncated.
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
