use chrono::Utc;
use clap::Subcommand;

use alarmdeck_core::{Config, TickReport};

#[derive(Subcommand)]
pub enum SyncAction {
    /// Run one reconciliation tick now
    Run,
    /// Run reconciliation ticks at the configured interval
    Watch {
        /// Stop after this many ticks (default: run until interrupted)
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// Show sync configuration and collection state
    Status,
}

fn print_report(report: &TickReport) {
    println!(
        "saved: {}  pushed: {}  pulled: {}  resolved: {}",
        report.saved, report.pushed, report.pulled, report.resolved
    );
}

pub fn run(action: SyncAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SyncAction::Run => {
            let mut engine = super::open_engine()?;
            let report = engine.tick(Utc::now());
            engine.flush();
            print_report(&report);
        }
        SyncAction::Watch { ticks } => {
            let config = Config::load_or_default();
            let interval = std::time::Duration::from_secs(config.sync.tick_interval_secs.max(1));
            let mut engine = super::open_engine()?;
            let mut completed = 0u64;
            loop {
                let report = engine.tick(Utc::now());
                completed += 1;
                print_report(&report);
                if ticks.is_some_and(|limit| completed >= limit) {
                    break;
                }
                std::thread::sleep(interval);
            }
            engine.flush();
        }
        SyncAction::Status => {
            let config = Config::load_or_default();
            let engine = super::open_engine()?;
            println!("remote:  {}", config.sync.remote_url);
            println!("enabled: {}", config.sync.enabled);
            println!("tick:    every {}s", config.sync.tick_interval_secs);
            println!("alarms:  {}", engine.len());
        }
    }
    Ok(())
}
