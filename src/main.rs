use std::path::PathBuf;

use clap::Parser;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cursor25x::capture::ScriptCapture;
use cursor25x::config::Config;
use cursor25x::server::McpServer;
use cursor25x::task_loop::TaskLoop;

/// cursor25x: MCP server that manages an interactive task loop with user
/// feedback
#[derive(Parser, Debug)]
#[command(name = "cursor25x")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Working directory override (takes precedence over CURSOR_WORKSPACE)
    #[arg(short = 'w', long = "workspace")]
    workspace: Option<PathBuf>,

    /// Seconds to wait for user input before terminating the input script
    #[arg(short = 't', long = "timeout-secs")]
    timeout_secs: Option<u64>,

    /// Executable used to run the input script (default: "node")
    #[arg(long = "interpreter")]
    interpreter: Option<String>,

    /// Enable verbose logging
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("cursor25x=debug,info")
    } else {
        EnvFilter::new("cursor25x=info,warn")
    };

    // stdout carries the protocol; all logging goes to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Convert any otherwise-unrecovered fault into a logged message plus a
/// controlled exit, instead of relying on ambient runtime behavior.
fn install_fault_guard() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        default_hook(panic_info);
        eprintln!("cursor25x: unrecovered fault, terminating");
        std::process::exit(1);
    }));
}

#[tokio::main]
async fn main() {
    install_fault_guard();

    let cli = Cli::parse();
    setup_logging(cli.verbose);

    // Setup shutdown signal handling
    let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);

    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("received shutdown signal");
        let _ = shutdown_tx.send(());
    });

    let mut config = Config::default();
    config.merge_cli_args(cli.workspace, cli.timeout_secs, cli.interpreter);

    info!("working directory: {}", config.working_dir.display());
    info!(
        "capture timeout: {} seconds",
        config.capture_timeout.as_secs()
    );

    let task_loop = TaskLoop::new(config, ScriptCapture);
    let server = McpServer::new(task_loop);

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    tokio::select! {
        result = server.run(stdin, stdout) => {
            if let Err(e) = result {
                error!("server error: {e:#}");
                std::process::exit(1);
            }
            info!("stdin closed, exiting");
        }
        _ = shutdown_rx.recv() => {
            info!("shutting down");
        }
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        let mut term = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = term.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
