use crate::headless::{self, SimulationOptions};
use anyhow::{bail, Context, Result};
use chrono::DateTime;
use clap::ArgMatches;
use console::style;
use seamline_config::{Config, ConfigManager};
use seamline_core::{format_clock, SegmentDescriptor, Timestamp};
use seamline_engine::{locate, Location, PlayerEvent, Timeline};
use std::fs;
use std::path::Path;

/// Reads a JSON segment list from disk
pub fn load_segments(path: &Path) -> Result<Vec<SegmentDescriptor>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read segment list {}", path.display()))?;
    let segments = SegmentDescriptor::list_from_json(&json)
        .with_context(|| format!("Invalid segment list {}", path.display()))?;
    Ok(segments)
}

fn load_config(manager: &ConfigManager) -> Result<Config> {
    manager
        .load_with_env_overrides()
        .with_context(|| format!("Failed to load config from {}", manager.config_path().display()))
}

fn file_arg(matches: &ArgMatches) -> Result<&Path> {
    matches
        .get_one::<String>("file")
        .map(Path::new)
        .ok_or_else(|| anyhow::anyhow!("Segment list file is required"))
}

/// Print the segments, gaps and length of a timeline
pub fn inspect(manager: &ConfigManager, matches: &ArgMatches) -> Result<()> {
    let segments = load_segments(file_arg(matches)?)?;
    let mut config = load_config(manager)?;
    if let Some(deviation) = matches.get_one::<u64>("gap-deviation") {
        config.player.gap_deviation_ms = *deviation;
    }

    let timeline = Timeline::build(&segments, config.player.gap_deviation_ms)
        .context("Failed to build timeline")?;
    print!("{}", render_timeline(&timeline));
    Ok(())
}

/// Resolve one virtual second against a timeline
pub fn locate_second(manager: &ConfigManager, matches: &ArgMatches) -> Result<()> {
    let segments = load_segments(file_arg(matches)?)?;
    let config = load_config(manager)?;
    let second = *matches
        .get_one::<f64>("second")
        .ok_or_else(|| anyhow::anyhow!("Virtual second is required"))?;

    let timeline = Timeline::build(&segments, config.player.gap_deviation_ms)
        .context("Failed to build timeline")?;
    println!("{}", render_location(&locate(&timeline, second), second));
    Ok(())
}

/// Run a headless session and print every event
pub fn simulate(manager: &ConfigManager, matches: &ArgMatches) -> Result<()> {
    let segments = load_segments(file_arg(matches)?)?;
    let config = load_config(manager)?;
    let json = matches.get_flag("json");

    let options = SimulationOptions {
        seeks: matches
            .get_many::<f64>("seek")
            .map(|values| values.copied().collect())
            .unwrap_or_default(),
        mutex_peer: matches.get_flag("mutex-peer"),
        step_secs: matches.get_one::<f64>("step").copied().unwrap_or(1.0),
    };
    if !(options.step_secs > 0.0) {
        bail!("--step must be a positive number of seconds");
    }

    let timeline = Timeline::build(&segments, config.player.gap_deviation_ms)
        .context("Failed to build timeline")?;

    let report = headless::run(&segments, &config.player, &options, |event| {
        if json {
            match serde_json::to_string(event) {
                Ok(line) => println!("{}", line),
                Err(e) => log::warn!("Could not serialize {}: {}", event.name(), e),
            }
        } else {
            println!("{}", describe_event(event, &timeline));
        }
    })
    .context("Simulation failed")?;

    if !json {
        println!("{}", "=".repeat(60));
        println!(
            "{} after {} steps, {} events",
            if report.finished {
                style("Finished").green().bold()
            } else {
                style("Stopped").yellow().bold()
            },
            report.steps,
            report.events.len()
        );
        if let Some(paused) = report.peer_paused {
            println!("Peer player paused: {}", paused);
        }
    }
    Ok(())
}

pub fn config_init(manager: &ConfigManager) -> Result<()> {
    if manager.initialize().context("Failed to write default config")? {
        println!(
            "{} Default config written to {}",
            style("✓").green().bold(),
            manager.config_path().display()
        );
    } else {
        println!("Config already exists at {}", manager.config_path().display());
    }
    Ok(())
}

pub fn config_show(manager: &ConfigManager) -> Result<()> {
    let config = load_config(manager)?;
    let text = serde_json::to_string_pretty(&config).context("Failed to render config")?;
    println!("{}", text);

    let problems = config
        .validate()
        .err()
        .map(|errors| errors.iter().map(|e| e.to_string()).collect::<Vec<_>>())
        .unwrap_or_default();
    for problem in problems {
        println!("{} {}", style("warning:").yellow().bold(), problem);
    }
    Ok(())
}

pub fn config_path(manager: &ConfigManager) -> Result<()> {
    println!("{}", manager.config_path().display());
    Ok(())
}

fn wall_clock(at: Timestamp) -> String {
    DateTime::from_timestamp_millis(at.as_millis())
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string())
        .unwrap_or_else(|| at.to_string())
}

pub fn render_timeline(timeline: &Timeline) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\n{} segments, {} gaps, {} total\n",
        style(timeline.len()).bold().cyan(),
        style(timeline.gaps().len()).bold().cyan(),
        format_clock(timeline.duration_secs() as f64)
    ));
    out.push_str(&format!("{}\n", "=".repeat(80)));

    for segment in timeline.segments() {
        out.push_str(&format!(
            "#{:<4} {}  {:>9.3}s - {:>9.3}s  {}\n",
            segment.index,
            wall_clock(segment.timestamp),
            segment.second_start,
            segment.second_end,
            segment.url
        ));
    }

    if !timeline.gaps().is_empty() {
        out.push_str(&format!("\n{}\n", style("Gaps").bold()));
        for gap in timeline.gaps() {
            out.push_str(&format!(
                "      {} - {}  {:>9.3}s - {:>9.3}s  ({} ms)\n",
                wall_clock(gap.time_start),
                wall_clock(gap.time_end),
                gap.second_start,
                gap.second_end,
                gap.duration_ms()
            ));
        }
    }
    out
}

pub fn render_location(location: &Location<'_>, second: f64) -> String {
    match location {
        Location::InSegment {
            segment,
            local_offset_secs,
        } => format!(
            "{}s is in segment #{} ({}) at {:.3}s, recorded {}",
            second,
            segment.index,
            segment.url,
            local_offset_secs,
            wall_clock(segment.wall_clock_at(*local_offset_secs))
        ),
        Location::InGap { gap } => format!(
            "{}s is in a gap from {:.3}s to {:.3}s (no footage)",
            second, gap.second_start, gap.second_end
        ),
        Location::OutOfRange => format!("{}s is outside every segment", second),
    }
}

pub fn describe_event(event: &PlayerEvent, timeline: &Timeline) -> String {
    let total = format_clock(timeline.duration_secs() as f64);
    match event {
        PlayerEvent::TimeUpdate {
            position_secs,
            wall_clock: at,
            ..
        } => format!(
            "{:<16} {} / {}  {}",
            event.name(),
            format_clock(*position_secs),
            total,
            wall_clock(*at)
        ),
        PlayerEvent::Progress { loaded_fraction } => {
            format!("{:<16} {:.1}% loaded", event.name(), loaded_fraction * 100.0)
        }
        PlayerEvent::Error { has_media_error } => format!(
            "{:<16} {}",
            style(event.name()).red().bold(),
            if *has_media_error {
                "media failure"
            } else {
                "incidental"
            }
        ),
        PlayerEvent::NoticeShow { text } => format!("{:<16} {}", event.name(), text),
        PlayerEvent::SegmentChanged { index } => format!(
            "{:<16} #{} {}",
            event.name(),
            index,
            timeline.segment(*index).map_or("", |s| s.url.as_str())
        ),
        PlayerEvent::GapReached { gap } => format!(
            "{:<16} {:.3}s - {:.3}s",
            style(event.name()).yellow(),
            gap.second_start,
            gap.second_end
        ),
        PlayerEvent::Ended => style(event.name()).green().bold().to_string(),
        _ => event.name().to_string(),
    }
}
