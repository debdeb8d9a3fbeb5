use anyhow::Result;
use clap::Parser;
use netsweep::cli::Cli;
use netsweep::output;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(e) = cli.execute().await {
        output::print_error(&e.to_string());
        std::process::exit(1);
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise `-v` shows debug and `-q` only errors.
fn init_logging(verbose: bool, quiet: bool) {
    let default = if verbose {
        "netsweep=debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
