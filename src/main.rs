use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};

mod cli;

use cli::commands::Commands;
use cli::Cli;
use draftr::config::{Config, EventSpec};
use draftr::domain::SessionOutcome;
use draftr::membership::StaticMembership;
use draftr::notify::ConsoleNotifier;
use draftr::schedule::{allocate, slot_at, window_sequence};
use draftr::session::{DraftSession, SessionRegistry};
use draftr::store::JsonPickStore;

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("draftr")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("draftr.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn handle_run(
    event_path: &Path,
    store_override: Option<&PathBuf>,
    config: &Config,
) -> Result<()> {
    let event = EventSpec::load(event_path)
        .context(format!("Failed to load event file {}", event_path.display()))?;
    let setup = config.draft.session_setup(&event)?;

    let store_path = store_override
        .cloned()
        .unwrap_or_else(|| config.store.picks_path(&event.event_id));
    let store = Arc::new(JsonPickStore::open(&store_path)?);
    let notifier = Arc::new(ConsoleNotifier::new());
    let membership = Arc::new(StaticMembership::from_names(&event.participants));

    let (session, control) = DraftSession::create(
        setup,
        Utc::now(),
        membership,
        store,
        notifier.clone() as Arc<dyn draftr::notify::Notifier>,
    )
    .await?;

    let registry = SessionRegistry::new();
    registry.register(&event.event_id, control.clone())?;

    println!(
        "{} event {} (picks stored in {})",
        "Running draft for".cyan(),
        event.event_id.bold(),
        store_path.display()
    );
    println!(
        "{}",
        "input: `<name> <item-key>` picks, `<name> skip` skips yourself, `!skip` skips the current drafter, `!stop` ends the draft".dimmed()
    );

    // Input lines drive the console surfaces; bang commands drive the session
    let input_control = control.clone();
    let input_notifier = Arc::clone(&notifier);
    let input_task = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            match line.as_str() {
                "!stop" => {
                    input_control.stop();
                    break;
                }
                "!skip" => input_control.skip().await,
                "" => {}
                _ => {
                    if !input_notifier.feed_line(&line) {
                        println!("{}", "no open pick matches that input".yellow());
                    }
                }
            }
        }
    });

    // Ctrl-C is a stop request: the session retracts its surfaces before
    // the process exits
    let signal_control = control.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_control.stop();
        }
    });

    let outcome = session.run().await?;
    registry.remove(&event.event_id);
    input_task.abort();

    match outcome {
        SessionOutcome::Completed => println!("{}", "Draft completed".green()),
        SessionOutcome::Stopped => println!("{}", "Draft stopped".yellow()),
    }
    Ok(())
}

fn handle_schedule(event_path: &Path, config: &Config) -> Result<()> {
    let event = EventSpec::load(event_path)
        .context(format!("Failed to load event file {}", event_path.display()))?;
    let (active_start, active_end) = config.draft.active_hours()?;
    let now = Utc::now();

    let windows = window_sequence(now, event.draft_end, active_start, active_end)?;
    println!("{}", "Availability windows:".cyan());
    for window in &windows {
        println!(
            "  {} .. {}  ({})",
            window.start.format("%a. %b %d %I:%M%p"),
            window.end.format("%a. %b %d %I:%M%p"),
            if window.is_degenerate() {
                "empty".to_string()
            } else {
                format!("{} min", window.duration().num_minutes())
            }
        );
    }

    let total_picks = config.draft.num_picks * event.participants.len();
    let deadlines = allocate(&windows, 0, total_picks, config.draft.snap_interval_minutes)?;
    println!("{}", "Pick deadlines:".cyan());
    for (linear, deadline) in deadlines.iter().enumerate() {
        let (round, seat) = slot_at(linear, event.participants.len());
        println!(
            "  #{:<3} round {} {:<16} {}",
            linear + 1,
            round + 1,
            event.participants[seat],
            deadline.format("%a. %b %d %I:%M%p")
        );
    }
    Ok(())
}

fn handle_check(event_path: &Path, config: &Config) -> Result<()> {
    config.draft.active_hours()?;
    let event = EventSpec::load(event_path)
        .context(format!("Failed to load event file {}", event_path.display()))?;

    let total_picks = config.draft.num_picks * event.participants.len();
    if event.items.len() < total_picks {
        println!(
            "{} {} items cannot fill {} pick slots",
            "warning:".yellow(),
            event.items.len(),
            total_picks
        );
    }
    println!(
        "{} event {} with {} participants, {} items",
        "OK:".green(),
        event.event_id.bold(),
        event.participants.len(),
        event.items.len()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }
    info!("Starting with config from: {:?}", cli.config);

    match &cli.command {
        Commands::Run { event, store } => handle_run(event, store.as_ref(), &config)
            .await
            .context("Draft run failed")?,
        Commands::Schedule { event } => {
            handle_schedule(event, &config).context("Schedule preview failed")?
        }
        Commands::Check { event } => handle_check(event, &config).context("Check failed")?,
    }

    Ok(())
}
