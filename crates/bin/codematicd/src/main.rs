//! # codematicd — codematic daemon
//!
//! Composition root that wires the adapters into an engine and feeds it
//! input codes.
//!
//! ## Responsibilities
//! - Parse CLI arguments and load the configuration file
//! - Initialize logging
//! - Register the built-in actions and the audit log
//! - Run the startup rules, seeded with `--var` parameters
//! - Install file watchers and cron jobs
//! - Read codes from stdin, one per line, until EOF, Ctrl+C or SIGTERM
//! - Run the shutdown rules and release every trigger
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod cli;
mod config;

use std::error::Error;
use std::io::{BufRead, Write};
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;

use codematic_adapter_fs::{FileAuditLog, NotifyFileWatcher};
use codematic_adapter_schedule::CronScheduler;
use codematic_app::engine::Engine;
use codematic_app::lifecycle::Lifecycle;
use codematic_app::ports::OutputSink;
use codematic_app::registry::ActionRegistry;

use crate::cli::Cli;
use crate::config::Config;

/// Lines buffered between the stdin reader thread and the engine.
const INPUT_CHANNEL_CAPACITY: usize = 64;

/// Writes `output` lines to the process's stdout.
struct StdoutOutput;

impl OutputSink for StdoutOutput {
    fn emit(&self, line: &str) {
        let mut stdout = std::io::stdout().lock();
        if writeln!(stdout, "{line}").and_then(|()| stdout.flush()).is_err() {
            tracing::warn!("stdout closed, output dropped");
        }
    }
}

/// Render an error with its chain of causes.
fn describe(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn build_engine(config: Config) -> Result<Engine, Box<dyn Error>> {
    let mut registry = ActionRegistry::new();
    codematic_adapter_actions::register_builtins(&mut registry, &config.engine.request)?;

    let mut builder = Engine::builder(registry).output(Arc::new(StdoutOutput));
    if let Some(path) = &config.engine.log.file {
        tracing::info!(path = %path.display(), "audit log enabled");
        builder = builder.audit_log(Arc::new(FileAuditLog::new(path)));
    }
    Ok(builder.options(config.engine).build()?)
}

/// Read stdin on a dedicated thread, one line per message.
///
/// A blocking read cannot be cancelled, so the thread is never joined; it
/// ends with the process.
fn spawn_stdin_reader() -> std::io::Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
    std::thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::error!(%err, "failed to read input");
                        break;
                    }
                }
            }
        })?;
    Ok(rx)
}

/// Resolve on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}

/// Feed stdin lines to the engine until EOF or a shutdown signal.
///
/// A signal arriving while a chain runs is handled once that chain ends.
async fn read_codes(engine: &Engine) -> std::io::Result<()> {
    let mut lines = spawn_stdin_reader()?;
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        let line = tokio::select! {
            line = lines.recv() => line,
            () = &mut shutdown => return Ok(()),
        };
        let Some(line) = line else {
            tracing::info!("input closed");
            return Ok(());
        };
        let code = line.trim();
        if code.is_empty() {
            continue;
        }
        if let Err(err) = engine.run(code).await {
            tracing::error!(error = %describe(&err), code, "input rule failed");
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.logging.filter))
        .with_writer(std::io::stderr)
        .init();

    let engine = build_engine(config)?;
    engine.startup(cli.vars).await?;

    if let Some(code) = cli.once.as_deref() {
        let result = engine.run(code).await;
        match &result {
            Ok(Some(_)) => {}
            Ok(None) => tracing::warn!(code, "no rule matches input"),
            Err(err) => tracing::error!(error = %describe(err), code, "input rule failed"),
        }
        engine.shutdown(Lifecycle::new()).await?;
        result?;
        return Ok(());
    }

    let lifecycle = engine.start_triggers(&NotifyFileWatcher, &CronScheduler)?;
    tracing::info!(triggers = ?lifecycle.labels(), "codematicd ready");

    if let Err(err) = read_codes(&engine).await {
        tracing::error!(%err, "failed to read input");
    }

    engine.shutdown(lifecycle).await?;
    tracing::info!("codematicd stopped");
    Ok(())
}
