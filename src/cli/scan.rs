//! Scan subcommand implementation.
//!
//! Handles the `netsweep scan <target>` command: wires the engine to a
//! TCP prober, the system pinger and a session store, renders events as
//! they arrive, and cancels the run on Ctrl-C.

use crate::cli::{Context, OutputFormat};
use crate::config::{PortPolicy, ScanProfile};
use crate::error::{CliError, CliResult};
use crate::events::{EventBus, ScanEvent};
use crate::output;
use crate::scanner::{HostScanner, ScanEngine, ScanRequest, SystemPinger, TcpConnectProber};
use crate::storage::{
    BookmarkStore, JsonSessionStore, MemorySessionStore, RunStatus, SessionRecord, SessionStore,
};
use crate::types::SessionId;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;

/// Sweep a target for live hosts and open ports.
#[derive(Parser, Debug)]
pub struct ScanCommand {
    /// Target to scan
    ///
    /// Examples:
    ///   192.168.1.1          Single IP address
    ///   example.com          Hostname
    ///   192.168.1.10-20      Last-octet range
    ///   192.168.1.0/24       CIDR block
    #[arg(value_name = "TARGET", required_unless_present = "bookmark")]
    pub target: Option<String>,

    /// Scan profile selecting ports, timeout and concurrency
    #[arg(short = 'P', long, value_enum)]
    pub profile: Option<ScanProfile>,

    /// Explicit ports overriding the profile (e.g. "22,80,443" or "1-1024")
    #[arg(short, long)]
    pub ports: Option<String>,

    /// Output format for results
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Scan a saved bookmark
    #[arg(long, value_name = "NAME")]
    pub bookmark: Option<String>,

    /// Don't save the session to history
    #[arg(long)]
    pub no_save: bool,
}

/// Where the run's session lives.
enum History {
    Saved(Arc<JsonSessionStore>),
    Ephemeral(Arc<MemorySessionStore>),
}

impl History {
    fn store(&self) -> Arc<dyn SessionStore> {
        match self {
            Self::Saved(store) => store.clone(),
            Self::Ephemeral(store) => store.clone(),
        }
    }

    fn record(&self, id: &SessionId) -> CliResult<SessionRecord> {
        match self {
            Self::Saved(store) => Ok(store.load(id)?),
            Self::Ephemeral(store) => store
                .get(id)
                .ok_or_else(|| CliError::Other(format!("session {} vanished", id.short()))),
        }
    }
}

impl ScanCommand {
    /// Execute the scan command.
    pub async fn execute(&self, ctx: &Context) -> CliResult<()> {
        let request = self.request(ctx)?;
        let format = self.output.unwrap_or_else(|| ctx.default_format());

        let history = if self.no_save || !ctx.settings.auto_save_sessions {
            History::Ephemeral(Arc::new(MemorySessionStore::new()))
        } else {
            History::Saved(Arc::new(JsonSessionStore::open_default(&ctx.paths)?))
        };

        let scanner = HostScanner::new(
            Arc::new(TcpConnectProber),
            Arc::new(SystemPinger::new(ctx.settings.ping_timeout())),
        );
        let engine = ScanEngine::new(scanner, history.store(), EventBus::new());

        let policy = PortPolicy::select(request.profile, request.ports.as_deref());
        let renderer = tokio::spawn(render_events(
            engine.events().subscribe(),
            format,
            ctx.quiet,
            policy.port_count(),
            request.profile,
        ));

        let cancel = CancellationToken::new();
        let interrupt = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("interrupt received, stopping scan");
                    cancel.cancel();
                }
            }
        });

        let outcome = engine.run(&request, cancel).await;
        interrupt.abort();

        // Dropping the engine closes the event stream and ends the renderer.
        drop(engine);
        if let Err(e) = renderer.await {
            tracing::warn!(error = %e, "event renderer failed");
        }

        let summary = outcome?;

        if format != OutputFormat::Json {
            let record = history.record(&summary.session_id)?;
            output::write_session(&record, format, io::stdout().lock())?;
        }

        if !ctx.quiet && format == OutputFormat::Plain {
            if summary.status == RunStatus::Stopped {
                output::print_warning(&format!(
                    "Scan stopped after {} of {} hosts",
                    summary.hosts_scanned, summary.hosts_total
                ));
            }
            if let History::Saved(_) = history {
                output::print_info(&format!("Session saved as {}", summary.session_id.short()));
            }
        }

        Ok(())
    }

    /// Merge command-line arguments over the bookmark and settings.
    fn request(&self, ctx: &Context) -> CliResult<ScanRequest> {
        let bookmark = match &self.bookmark {
            Some(name) => {
                let store = BookmarkStore::open_default(&ctx.paths)?;
                let bookmark = store
                    .get(name)
                    .cloned()
                    .ok_or_else(|| crate::error::StorageError::BookmarkNotFound(name.clone()))?;
                Some(bookmark)
            }
            None => None,
        };

        let target = self
            .target
            .clone()
            .or_else(|| bookmark.as_ref().map(|b| b.target.clone()))
            .ok_or_else(|| CliError::Other("no target given".to_string()))?;

        let profile = self
            .profile
            .or_else(|| bookmark.as_ref().map(|b| b.profile))
            .unwrap_or(ctx.settings.default_profile);

        let ports = self
            .ports
            .clone()
            .or_else(|| bookmark.and_then(|b| b.ports));

        let request = ScanRequest::new(target, profile);
        Ok(match ports {
            Some(ports) => request.with_ports(ports),
            None => request,
        })
    }
}

/// Render engine events until the bus closes.
async fn render_events(
    mut rx: UnboundedReceiver<ScanEvent>,
    format: OutputFormat,
    quiet: bool,
    port_count: usize,
    profile: ScanProfile,
) {
    if format == OutputFormat::Json {
        while let Some(event) = rx.recv().await {
            match output::event_line(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::warn!(event = event.kind(), error = %e, "failed to encode event"),
            }
        }
        return;
    }

    let mut bar: Option<ProgressBar> = None;

    while let Some(event) = rx.recv().await {
        match event {
            ScanEvent::ScanStarted {
                target,
                total_hosts,
                ..
            } => {
                if quiet {
                    continue;
                }
                if format == OutputFormat::Plain {
                    output::print_scan_header(&target, profile, total_hosts, port_count);
                }
                bar = Some(progress_bar(total_hosts as u64));
            }
            ScanEvent::PortProgress {
                host,
                scanned,
                total,
                found,
            } => {
                if let Some(pb) = &bar {
                    pb.set_message(format!("{}: {}/{} ports, {} open", host, scanned, total, found));
                }
            }
            ScanEvent::HostResult { result, .. } => {
                if let Some(pb) = &bar {
                    if format == OutputFormat::Plain && result.is_up() {
                        pb.println(output::host_line(&result));
                    }
                    pb.set_message(String::new());
                    pb.inc(1);
                }
            }
            ScanEvent::ScanStopped { .. }
            | ScanEvent::ScanCompleted { .. }
            | ScanEvent::ScanError { .. } => {
                if let Some(pb) = bar.take() {
                    pb.finish_and_clear();
                }
            }
        }
    }
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} hosts ({percent}%) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-");
    pb.set_style(style);
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppSettings, Paths};
    use crate::storage::Bookmark;

    fn context(dir: &tempfile::TempDir) -> Context {
        Context {
            paths: Paths::rooted(dir.path().join("config"), dir.path().join("data")).unwrap(),
            settings: AppSettings::default(),
            verbose: false,
            quiet: true,
        }
    }

    fn command(args: &[&str]) -> ScanCommand {
        let mut argv = vec!["scan"];
        argv.extend_from_slice(args);
        ScanCommand::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_request_defaults_to_settings_profile() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir);
        ctx.settings.default_profile = ScanProfile::Range;

        let request = command(&["10.0.0.5"]).request(&ctx).unwrap();
        assert_eq!(request, ScanRequest::new("10.0.0.5", ScanProfile::Range));
    }

    #[test]
    fn test_request_from_bookmark_with_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);

        let mut store = BookmarkStore::open_default(&ctx.paths).unwrap();
        let mut bookmark = Bookmark::new("lab", "10.0.0.0/30");
        bookmark.profile = ScanProfile::Full;
        bookmark.ports = Some("22".to_string());
        store.create(bookmark).unwrap();

        let request = command(&["--bookmark", "lab"]).request(&ctx).unwrap();
        assert_eq!(
            request,
            ScanRequest::new("10.0.0.0/30", ScanProfile::Full).with_ports("22")
        );

        let request = command(&["--bookmark", "lab", "-P", "quick", "-p", "80"])
            .request(&ctx)
            .unwrap();
        assert_eq!(
            request,
            ScanRequest::new("10.0.0.0/30", ScanProfile::Quick).with_ports("80")
        );
    }

    #[test]
    fn test_unknown_bookmark() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        assert!(command(&["--bookmark", "nope"]).request(&ctx).is_err());
    }
}
