//! Rigel binary
//!
//! Interactive shell for launching and supervising long-running jobs
//! (typically media encodes). Reads line commands from stdin, renders the
//! job table when it changes, and guarantees every spawned process is
//! terminated before the application exits, on every exit path.

#![allow(unused_crate_dependencies)]

use clap::Parser;
use cli::display::{display_label, render_jobs};
use cli::shell::{parse_line, ShellCommand};
use rigel_core::config::load_config_from_toml_path;
use rigel_core::supervisor::spawn_reconciler;
use rigel_core::{
    JobId, JobState, ShutdownCoordinator, StopOutcome, Supervisor, SupervisorConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::error;

#[derive(Parser)]
#[command(name = "rigel")]
#[command(about = "Launch and supervise long-running shell jobs")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level filter (RUST_LOG takes precedence)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> rigel_core::Result<()> {
    let cli = Cli::parse();

    rigel_core::utils::init_tracing(&cli.log_level)?;

    let config = match &cli.config {
        Some(path) => load_config_from_toml_path(path)?,
        None => SupervisorConfig::default(),
    };

    let supervisor = Supervisor::unix(config);
    let _reconciler = spawn_reconciler(Arc::clone(&supervisor));
    let coordinator = ShutdownCoordinator::new(Arc::clone(&supervisor));
    let _ctrl_c = coordinator.install_ctrl_c_handler();

    spawn_change_renderer(Arc::clone(&supervisor));

    println!("rigel — type 'run <command>' to launch a job, 'help' for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line) {
            Ok(ShellCommand::Run(command)) => match supervisor.launch(&command).await {
                Ok(id) => println!("[{}] started: {}", id, display_label(&command)),
                Err(e) => error!("Failed to launch job: {}", e),
            },
            Ok(ShellCommand::Stop(id)) => report_stop(&supervisor, id).await,
            Ok(ShellCommand::List) => render_jobs(&supervisor.snapshot().await),
            Ok(ShellCommand::Help) => print_help(),
            Ok(ShellCommand::Quit) => break,
            Err(e) => println!("{}", e),
        }
    }

    // Reached on 'quit' or stdin EOF; Ctrl+C takes the coordinator's own
    // path. Either way stop_all runs exactly once before the process ends.
    coordinator.shutdown().await;
    Ok(())
}

async fn report_stop(supervisor: &Arc<Supervisor>, id: JobId) {
    match supervisor.stop(id).await {
        Ok(StopOutcome::Graceful) => println!("[{}] stopped", id),
        Ok(StopOutcome::Forced) => println!("[{}] killed (did not exit gracefully)", id),
        Ok(StopOutcome::AlreadyExited) => println!("[{}] had already exited", id),
        Err(e) => println!("{}", e),
    }
}

/// Reprint the job table whenever membership or a job state changes
///
/// The snapshot watch also publishes every reconciler tick to refresh
/// elapsed times; those are skipped here to keep the terminal quiet, and
/// `list` shows current elapsed values on demand.
fn spawn_change_renderer(supervisor: Arc<Supervisor>) -> tokio::task::JoinHandle<()> {
    let mut snapshots = supervisor.subscribe_snapshots();
    tokio::spawn(async move {
        let mut last: Vec<(JobId, JobState)> = Vec::new();
        while snapshots.changed().await.is_ok() {
            let jobs = snapshots.borrow_and_update().clone();
            let key: Vec<(JobId, JobState)> = jobs.iter().map(|j| (j.id, j.state)).collect();
            if key != last {
                last = key;
                render_jobs(&jobs);
            }
        }
    })
}

fn print_help() {
    println!("Commands:");
    println!("  run <command>   launch a shell command as a supervised job");
    println!("  stop <id>       terminate a job (SIGTERM, then SIGKILL after 5s)");
    println!("  list            show running jobs with elapsed time");
    println!("  quit            stop every job and exit");
}
