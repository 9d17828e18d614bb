//! Cabinet Lobby Simulator
//!
//! Usage:
//!   lobby-sim run <scenario.json>   - Replay a scenario, one view per line
//!   lobby-sim table                 - Print the phase transition table

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use lobby_banner::BannerEvent;
use lobby_core::LobbyConfig;
use lobby_presentation::PresentationView;
use lobby_sim::{Lobby, Scenario, ViewSink};
use lobby_state::transition_table;

#[derive(Parser)]
#[command(name = "lobby-sim", about = "Cabinet lobby scenario runner")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the per-user config location)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scenario and print every view change as JSON
    Run {
        /// Scenario file
        scenario: PathBuf,
    },
    /// Print the phase transition table
    Table,
}

/// Prints each view as one JSON line
struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> ViewSink for JsonLinesSink<W> {
    fn on_view(&mut self, view: &PresentationView) {
        let line = match serde_json::to_string(view) {
            Ok(line) => line,
            Err(e) => {
                log::error!("[Sim] Could not serialize view: {}", e);
                return;
            }
        };
        if let Err(e) = writeln!(self.out, "{}", line) {
            log::error!("[Sim] Could not write view: {}", e);
        }
    }

    fn on_banner(&mut self, event: &BannerEvent) {
        log::info!("[Sim] Banner: {:?}", event);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    match cli.command {
        Commands::Run { scenario } => run_scenario(cli.config, &scenario),
        Commands::Table => print_table(),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<LobbyConfig> {
    match path {
        Some(path) => LobbyConfig::try_load_from(&path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(LobbyConfig::load()),
    }
}

fn run_scenario(config: Option<PathBuf>, path: &Path) -> Result<()> {
    let config = load_config(config)?;
    let scenario = Scenario::load(path)
        .with_context(|| format!("loading scenario {}", path.display()))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("building runtime")?;

    let sink = JsonLinesSink {
        out: std::io::stdout().lock(),
    };
    let mut lobby = Lobby::new(&config, sink);
    runtime.block_on(scenario.run(&mut lobby));

    let tracker = lobby.tracker();
    log::info!(
        "[Sim] Finished in {:?}: {} rejected trigger(s), {} truncated chain(s)",
        tracker.base_state(),
        tracker.rejected_count(),
        tracker.overflow_count()
    );
    Ok(())
}

fn print_table() -> Result<()> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "{:<26} {:<28} {}", "TRIGGER", "FROM", "TO")?;
    for (trigger, from, to) in transition_table() {
        writeln!(
            out,
            "{:<26} {:<28} {}",
            format!("{:?}", trigger),
            format!("{:?}", from),
            format!("{:?}", to)
        )?;
    }
    Ok(())
}
