use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};

use linecat::cli::Cli;
use linecat::config::Config;
use linecat::console::StdinConsole;
use linecat::logging::init_tracing;
use linecat::net::{establish, Connection};
use linecat::session::Session;
use linecat::signals::InterruptWatcher;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let Some(mode) = cli.mode() else {
        // Neither a target nor -l -p. Usage goes to stderr; stdout is the relay.
        Cli::command().write_help(&mut io::stderr())?;
        eprintln!();
        anyhow::bail!("missing connection arguments");
    };

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    init_tracing(&config.logging);

    let established = establish(&mode, &config.network)?;
    eprintln!("Local endpoint: {}", established.local_addr);
    eprintln!("connected to {}", established.peer_addr);

    let connection: Arc<dyn Connection> = Arc::new(established.stream);
    let session = Session::new(connection, StdinConsole, io::stdout(), config.relay.clone());

    let watcher = InterruptWatcher::start(session.coordinator())
        .context("Failed to install signal handlers")?;

    let report = session.run().context("Failed to start session");

    if let Some(watcher) = watcher {
        watcher.stop();
    }

    let report = report?;
    tracing::info!(
        cause = %report.completion.cause,
        direction = ?report.completion.direction,
        "Session finished"
    );
    Ok(())
}
