// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use seamline_config::ConfigManager;
use std::path::PathBuf;

mod commands;
mod headless;

fn file_arg() -> Arg {
    Arg::new("file")
        .required(true)
        .value_name("FILE")
        .help("JSON list of segments ({timestamp, durationMs, url}) sorted by timestamp")
}

fn build_cli() -> Command {
    Command::new("seamline")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Seamline Team")
        .about("Play discontinuous recordings as one seekable timeline")
        .arg(
            Arg::new("config-dir")
                .short('c')
                .long("config-dir")
                .value_name("DIR")
                .help("Directory holding config.toml (defaults to the platform config dir)")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .subcommand(
            Command::new("inspect")
                .about("Show the segments and gaps of a recording list")
                .arg(file_arg())
                .arg(
                    Arg::new("gap-deviation")
                        .short('g')
                        .long("gap-deviation")
                        .value_name("MS")
                        .help("Idle time above which a gap is recorded (overrides config)")
                        .value_parser(clap::value_parser!(u64)),
                ),
        )
        .subcommand(
            Command::new("locate")
                .about("Resolve a virtual second to a segment or gap")
                .arg(file_arg())
                .arg(
                    Arg::new("second")
                        .required(true)
                        .value_name("SECOND")
                        .help("Virtual second on the timeline")
                        .allow_negative_numbers(true)
                        .value_parser(clap::value_parser!(f64)),
                ),
        )
        .subcommand(
            Command::new("simulate")
                .about("Play the timeline headlessly and print every event")
                .arg(file_arg())
                .arg(
                    Arg::new("seek")
                        .short('s')
                        .long("seek")
                        .value_name("SECS")
                        .help("Seek to this virtual second once playback runs (repeatable)")
                        .allow_negative_numbers(true)
                        .value_parser(clap::value_parser!(f64))
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("mutex-peer")
                        .long("mutex-peer")
                        .help("Start a second player first and show it being paused")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print events as JSON lines")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("step")
                        .long("step")
                        .value_name("SECS")
                        .help("Simulated seconds per step")
                        .default_value("1.0")
                        .value_parser(clap::value_parser!(f64)),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Manage the player configuration file")
                .subcommand_required(true)
                .subcommand(Command::new("init").about("Write a default config file"))
                .subcommand(Command::new("show").about("Print the effective configuration"))
                .subcommand(Command::new("path").about("Print the config file location")),
        )
}

fn config_manager(dir: Option<&PathBuf>) -> Result<ConfigManager> {
    match dir {
        Some(dir) => ConfigManager::with_directory(dir.clone())
            .with_context(|| format!("Failed to open config directory {}", dir.display())),
        None => ConfigManager::new().context("Failed to locate config directory"),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let matches = build_cli().get_matches();
    let manager = config_manager(matches.get_one::<PathBuf>("config-dir"))?;

    match matches.subcommand() {
        Some(("inspect", sub_matches)) => commands::inspect(&manager, sub_matches),
        Some(("locate", sub_matches)) => commands::locate_second(&manager, sub_matches),
        Some(("simulate", sub_matches)) => commands::simulate(&manager, sub_matches),
        Some(("config", sub_matches)) => match sub_matches.subcommand() {
            Some(("init", _)) => commands::config_init(&manager),
            Some(("show", _)) => commands::config_show(&manager),
            Some(("path", _)) => commands::config_path(&manager),
            _ => anyhow::bail!("config requires a subcommand"),
        },
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}
