//! PoCP Dashboard
//!
//! Console host for the mining round dashboard. Mirrors the backend's
//! roster, leaderboard and rewards, runs the round timer, and turns typed
//! commands into dashboard actions.

use anyhow::Result;
use clap::Parser;
use pocp_sync::{dispatch, Action, DashboardSession, HttpBackend};
use pocp_timer::RoundTimer;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod render;

use config::DashboardConfig;

type Session = DashboardSession<HttpBackend>;

/// PoCP mining round dashboard
#[derive(Parser, Debug)]
#[command(name = "pocp-dashboard")]
#[command(about = "Console dashboard for PoCP mining rounds", long_about = None)]
struct Args {
    /// JSON config file (flags override its values)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend base URL
    #[arg(long)]
    backend_url: Option<String>,

    /// Timer render interval in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Round length that fills the progress bar, in milliseconds
    #[arg(long)]
    round_ms: Option<u64>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Print the leaderboard and rewards after every action
    #[arg(short, long)]
    verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn resolve_config(&self) -> Result<DashboardConfig> {
        let mut config = match &self.config {
            Some(path) => DashboardConfig::load(path)?,
            None => DashboardConfig::default(),
        };
        if let Some(url) = &self.backend_url {
            config.backend_url = url.clone();
        }
        if let Some(tick_ms) = self.tick_ms {
            config.tick_ms = tick_ms;
        }
        if let Some(round_ms) = self.round_ms {
            config.round_ms = round_ms;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        Ok(config)
    }
}

const HELP: &str = "Commands:
  register <address>       register a miner
  start                    start the round timer
  submit <address> [secs]  submit a time (defaults to the timer's elapsed time)
  validator                select a validator
  reset                    reset the round
  refresh                  reload roster, leaderboard and rewards
  addresses                list addresses available for registration
  status                   show all views and the timer
  help                     show this help
  quit                     exit";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = args.resolve_config()?;

    tracing::info!("Starting PoCP dashboard");
    tracing::info!("  Backend: {}", config.backend_url);
    tracing::info!("  Timer: {}ms ticks, {}ms round", config.tick_ms, config.round_ms);

    let backend = HttpBackend::try_new(&config.backend_url, config.request_timeout())?;
    let session = Arc::new(DashboardSession::new(
        backend,
        RoundTimer::new(config.timer_config()),
    ));

    // Print notable session events as they happen
    let event_printer = tokio::spawn(render::forward_notices(session.subscribe(), |notice| {
        println!("{}", notice)
    }));

    session.initialize().await;
    print_status(&session);
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };
        let line = line.trim();

        match line {
            "" => continue,
            "quit" | "exit" => break,
            "help" => println!("{}", HELP),
            "status" => print_status(&session),
            _ => match line.parse::<Action>() {
                Ok(action) => spawn_action(session.clone(), action, args.verbose),
                Err(e) => println!("{} (try `help`)", e),
            },
        }
    }

    tracing::info!("Shutting down...");
    session.timer().stop();
    event_printer.abort();

    Ok(())
}

/// Run an action without blocking the console; responses may land out of order
fn spawn_action(session: Arc<Session>, action: Action, verbose: bool) {
    tokio::spawn(async move {
        match dispatch(&session, action).await {
            Ok(outcome) => {
                println!("{}", render::outcome(&outcome));
                if verbose {
                    println!("{}", render::leaderboard(&session.leaderboard()));
                    println!("{}", render::rewards(&session.rewards()));
                }
            }
            Err(e) if e.is_local() => println!("{}", e),
            Err(e) => {
                tracing::error!("Action failed: {}", e);
                println!("Action failed: {}", e);
            }
        }
    });
}

fn print_status(session: &Session) {
    println!("{}", render::roster(&session.roster()));
    println!("{}", render::leaderboard(&session.leaderboard()));
    println!("{}", render::rewards(&session.rewards()));
    if let Some(validator) = session.validator() {
        println!("Validator: {}", validator);
    }
    println!(
        "Round {}: {}/{} submitted",
        session.current_round(),
        session.submitted().len(),
        session.total_participants()
    );
    println!("{}", render::timer(&session.timer().current_frame()));
}
