use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use ovucycle::cycle::{Advisory, CycleSettings};
use ovucycle::strip::ControlLine;
use ovucycle::{Tracker, TrackerConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: ovucycle <config.json> <strip-image> <last-period-start YYYY-MM-DD> [cycle-length-days]";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 {
        bail!(USAGE);
    }

    let config = TrackerConfig::load(&PathBuf::from(&args[0]))?;
    let image_bytes = std::fs::read(&args[1])
        .with_context(|| format!("Failed to read strip image {}", args[1]))?;
    let lmp = NaiveDate::parse_from_str(&args[2], "%Y-%m-%d")
        .with_context(|| format!("Invalid last period start '{}'", args[2]))?;
    let cycle_length = match args.get(3) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("Invalid cycle length '{}'", raw))?,
        None => 28,
    };
    let settings = CycleSettings::new(lmp, cycle_length)?;

    let tracker = Tracker::from_config(&config)?;
    let now = Local::now().naive_local();

    let reading = tracker.analyze_and_log(&image_bytes, now, "Full Upload")?;
    println!("T/C ratio: {:.2} ({})", reading.ratio, reading.level);
    if reading.control == ControlLine::Unreadable {
        println!("Control line not visible; the ratio is not trustworthy.");
    }
    if tracker.suggests_retest(&reading) {
        println!("High LH detected. Re-test every 4 hours to catch the peak.");
    }

    let status = tracker.status(&settings, now)?;
    println!("Cycle day {}", status.estimate.cycle_day);
    match status.advisory {
        Advisory::PeakSignal => println!("LH surge in the last 48h: the next two days are the best timing."),
        Advisory::CalendarFertile => println!(
            "In the calendar fertile window (estimated ovulation {}). Keep testing.",
            status.estimate.estimated_ovulation.format("%m-%d")
        ),
        Advisory::LowFertility => println!("Low fertility phase. Keep logging."),
    }

    Ok(())
}
