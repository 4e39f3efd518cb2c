//! # bithose-console
//!
//! Opens several independent WebSocket sessions to a Bithose broker and lets
//! an operator compose, validate and send frames from the terminal while each
//! pane's events stream to stdout.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bithose_console::terminal::{Flow, LineEditor, Terminal, format_entry};
use bithose_console::{Console, ConsoleConfig, DeliveryMode, Result};
use bithose_console_core::logging::{self, targets};
use bithose_console_net::WebSocketConnector;
use clap::Parser;
use parking_lot::Mutex;

/// Multi-pane WebSocket test console for the Bithose broker.
#[derive(Parser, Debug)]
#[command(name = "bithose-console", version, about)]
struct Cli {
    /// Broker endpoint, `host:port` or a `ws://` URL.
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Number of independent panes.
    #[arg(short = 'n', long)]
    panes: Option<usize>,

    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter (e.g. `debug` or `bithose_console_net=trace`), used when
    /// `RUST_LOG` is unset.
    #[arg(long)]
    log_level: Option<String>,

    /// Handshake timeout in milliseconds.
    #[arg(long)]
    handshake_timeout_ms: Option<u64>,

    /// Deliver session events on transport threads instead of the main queue.
    #[arg(long)]
    direct: bool,
}

impl Cli {
    fn apply(self, config: &mut ConsoleConfig) {
        if let Some(endpoint) = self.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(panes) = self.panes {
            config.panes = panes;
        }
        if let Some(filter) = self.log_level {
            config.log_filter = filter;
        }
        if let Some(timeout) = self.handshake_timeout_ms {
            config.handshake_timeout_ms = timeout;
        }
        if self.direct {
            config.delivery = DeliveryMode::Direct;
        }
    }
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("bithose-console: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = ConsoleConfig::load_or_default(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;

    logging::init_tracing(&config.log_filter)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("bithose-transport")
        .enable_all()
        .build()?;
    let connector = WebSocketConnector::new(runtime.handle().clone());

    let console = Console::mount(&config, &connector)?;
    for pane in console.panes() {
        let index = pane.index();
        pane.log()
            .entry_appended
            .connect(move |entry| println!("{}", format_entry(index, entry)));
    }

    println!(
        "bithose-console: {} panes on {} (:help for commands)",
        console.len(),
        config.endpoint_url()?
    );

    let queue = console.queue().clone();
    let handle = console.handle();
    let terminal = Arc::new(Mutex::new(Terminal::new(console, io::stdout())));

    let input_terminal = terminal.clone();
    thread::Builder::new()
        .name("bithose-input".to_string())
        .spawn(move || {
            let mut editor = LineEditor::new();
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::warn!(target: targets::CONSOLE, error = %e, "stdin read failed");
                        break;
                    }
                };
                let command = match editor.feed(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(e) => {
                        println!("error: {e}");
                        continue;
                    }
                };

                let terminal = input_terminal.clone();
                let quit = handle.clone();
                let posted = handle.post(move || match terminal.lock().execute(command) {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Quit) => {
                        let _ = quit.quit();
                    }
                    Err(e) => {
                        tracing::warn!(target: targets::CONSOLE, error = %e, "failed to write output");
                    }
                });
                if posted.is_err() {
                    return;
                }
            }
            tracing::debug!(target: targets::CONSOLE, "stdin closed");
            let _ = handle.quit();
        })?;

    queue.run();

    let released = terminal.lock().console().close_all();
    queue.process_pending();
    tracing::info!(target: targets::CONSOLE, released, "shutting down");

    // Gives link tasks a moment to send their close frames.
    runtime.shutdown_timeout(Duration::from_millis(500));
    Ok(())
}
