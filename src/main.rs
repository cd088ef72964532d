//! gab - Concurrent HTTP load generator

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use gab_core::{Dispatcher, DispatcherBuilder, PoolStrategy};

mod cli;

use cli::Cli;

/// Exit status after Ctrl+C
const INTERRUPTED: i32 = 130;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    // Logs go to stderr so stdout only carries the report
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli.validate() {
        eprintln!("error: {e:#}\n");
        eprintln!("{}", Cli::command().render_usage());
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(cli.cpus)
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;

    runtime.block_on(async move {
        tokio::spawn(exit_on_interrupt());

        println!("{}", cli.header());

        let mut dispatcher = DispatcherBuilder::new()
            .config(cli.dispatch_config(cli.pool))
            .build()?;
        dispatcher.run().await?;
        report(&dispatcher);

        if cli.baseline {
            let mut baseline = DispatcherBuilder::new()
                .config(cli.dispatch_config(PoolStrategy::Sequential))
                .build()?;
            baseline.run().await?;
            println!("sequential baseline:");
            report(&baseline);
        }

        Ok::<_, anyhow::Error>(())
    })
}

fn report(dispatcher: &Dispatcher) {
    if let Some(stats) = dispatcher.dial_stats() {
        tracing::debug!(
            lookups = stats.lookups(),
            mean_lookup_us = stats.mean_lookup_time().map(|d| d.as_micros() as u64),
            "New connections dialed"
        );
    }
    if let Some(pool) = dispatcher.gauge() {
        tracing::debug!(%pool, "Elastic pool");
    }

    match dispatcher.summary() {
        Some(summary) => println!("{summary}"),
        None => tracing::warn!("Dispatcher finished without a summary"),
    }
}

/// Terminate immediately on Ctrl+C; in-flight requests are abandoned
async fn exit_on_interrupt() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C, exiting");
            std::process::exit(INTERRUPTED);
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    }
}
