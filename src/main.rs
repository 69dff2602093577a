//! Tubegraph maintenance tool
//!
//! Loads configuration, restores the store snapshot, runs one command and
//! persists the store again.

use clap::{Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use tracing::{info, warn};
use tubegraph::core::{create_app_state, Config};
use tubegraph::maintenance;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("tubegraph")
        .version(tubegraph::VERSION)
        .about("Maintenance tool for the tubegraph video platform core.")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .global(true)
                .help("Configuration file path")
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .value_name("DIR")
                .global(true)
                .help("Data directory path")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .global(true)
                .help("Log level (trace, debug, info, warn, error)")
        )
        .subcommand(Command::new("stats").about("Show entity and edge counts and pending reconciliation entries"))
        .subcommand(Command::new("reconcile").about("Replay pending reconciliation entries"))
        .subcommand(
            Command::new("check")
                .about("Scan for dangling references")
                .arg(
                    Arg::new("repair")
                        .long("repair")
                        .action(ArgAction::SetTrue)
                        .help("Delete what the scan finds")
                )
        )
        .subcommand(
            Command::new("seed")
                .about("Create a demo channel with subscribed users")
                .arg(
                    Arg::new("users")
                        .long("users")
                        .value_name("N")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("5")
                        .help("Number of demo users")
                )
        )
        .get_matches();

    // Load configuration
    let mut config = match matches.get_one::<String>("config") {
        Some(config_path) => {
            let mut config = Config::from_file(config_path)?;
            config.apply_env_overrides()?;
            config
        }
        None => Config::load()?,
    };

    // Apply CLI overrides
    apply_cli_overrides(&mut config, &matches);
    config.validate()?;

    tubegraph::init(&config.logging)?;

    let state = create_app_state(config).await?;
    match matches.subcommand() {
        Some(("stats", _)) => {
            print_json(&maintenance::stats(&state)?)?;
            if state.config.metrics.enable {
                println!("{}", tubegraph_core::system::metrics::collect_metrics());
            }
        }
        Some(("reconcile", _)) => {
            let report = state.platform.cascade().reconcile().await?;
            if report.pending > 0 {
                warn!("{} reconciliation entries still pending", report.pending);
            }
            print_json(&report)?;
        }
        Some(("check", args)) => {
            let report = state.platform.cascade().sweep(args.get_flag("repair"))?;
            print_json(&report)?;
        }
        Some(("seed", args)) => {
            let users = args.get_one::<usize>("users").copied().unwrap_or(5);
            print_json(&maintenance::seed(&state, users)?)?;
        }
        _ => unreachable!("clap enforces a subcommand"),
    }

    if state.persist()? {
        info!("Snapshot written to {:?}", state.config.snapshot_path());
    }
    Ok(())
}

/// Apply command line argument overrides to configuration
fn apply_cli_overrides(config: &mut Config, matches: &ArgMatches) {
    if let Some(data_dir) = matches.get_one::<String>("data-dir") {
        config.storage.data_dir = data_dir.into();
    }

    if let Some(level) = matches.get_one::<String>("log-level") {
        config.logging.level = level.clone();
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
