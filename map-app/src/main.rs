// metarmap daemon -- polls the aviation weather data server on an interval
// and renders each tracked airport's flight category. The console display
// sink stands in for the LED strip; swap in a real DisplaySink to drive
// hardware.
//
// Usage:
//   metarmap-app --stations KJFK,KLAX,KBOS
//   metarmap-app --stations-file airports.txt --interval 300
//   metarmap-app --stations KJFK --once --idle-timeout 5
//
// Logging is controlled with RUST_LOG (e.g. RUST_LOG=metarmap_engine=debug).

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use metarmap::{
    AddsTransport, AirportRegistry, Color, CycleConfig, CycleOutcome, DisplaySink, FetchCycle,
    StationId, DEFAULT_BASE_URL,
};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// METAR flight-category map daemon.
#[derive(Parser)]
#[command(name = "metarmap-app", version, about)]
struct Cli {
    /// Comma-separated ICAO codes, in display-slot order (slot = position).
    #[arg(long)]
    stations: Option<String>,

    /// File with one ICAO code per line (# starts a comment). Used when
    /// --stations is not given.
    #[arg(long)]
    stations_file: Option<String>,

    /// Polling interval in seconds.
    #[arg(long, default_value_t = 300)]
    interval: u64,

    /// Per-read idle timeout in seconds (sane range 5-15).
    #[arg(long, default_value_t = 10)]
    idle_timeout: u64,

    /// Data-server endpoint override.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    url: String,

    /// Report lookback window in hours.
    #[arg(long, default_value_t = 3)]
    hours: u32,

    /// Run a single fetch cycle and exit.
    #[arg(long)]
    once: bool,
}

/// Collect the station list from --stations or --stations-file.
fn load_stations(cli: &Cli) -> Result<Vec<String>> {
    if let Some(list) = &cli.stations {
        return Ok(list
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect());
    }
    if let Some(path) = &cli.stations_file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read stations file {path}"))?;
        return Ok(text
            .lines()
            .map(|l| l.split('#').next().unwrap_or("").trim().to_string())
            .filter(|l| !l.is_empty())
            .collect());
    }
    bail!("no stations given: pass --stations or --stations-file");
}

// ---------------------------------------------------------------------------
// Console display sink
// ---------------------------------------------------------------------------

/// Stand-in for the LED strip: prints one line per committed frame with
/// each airport's code and the category its color encodes.
struct ConsoleDisplay {
    codes: Vec<StationId>,
    slots: Vec<Color>,
}

impl ConsoleDisplay {
    fn new(codes: Vec<StationId>) -> Self {
        let slots = vec![Color::OFF; codes.len()];
        ConsoleDisplay { codes, slots }
    }
}

/// Human label for a frame color.
fn color_label(color: Color) -> &'static str {
    if color == Color::VFR {
        "VFR"
    } else if color == Color::MVFR {
        "MVFR"
    } else if color == Color::IFR {
        "IFR"
    } else if color == Color::LIFR {
        "LIFR"
    } else {
        "----"
    }
}

impl DisplaySink for ConsoleDisplay {
    fn set(&mut self, slot: usize, color: Color) {
        if let Some(s) = self.slots.get_mut(slot) {
            *s = color;
        }
    }

    fn commit(&mut self) -> metarmap::Result<()> {
        let frame: Vec<String> = self
            .codes
            .iter()
            .zip(&self.slots)
            .map(|(code, &color)| format!("{code}:{}", color_label(color)))
            .collect();
        println!("{}", frame.join("  "));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let codes = load_stations(&cli)?;
    let mut registry =
        AirportRegistry::from_codes(&codes).context("invalid station configuration")?;
    info!(airports = registry.len(), "registry built");

    let station_ids: Vec<StationId> = registry.iter().map(|a| a.icao).collect();
    let mut display = ConsoleDisplay::new(station_ids);

    let mut transport = AddsTransport::with_base_url(&cli.url)
        .context("failed to build transport")?
        .hours_before_now(cli.hours);

    let mut cycle = FetchCycle::new(CycleConfig {
        idle_timeout: Duration::from_secs(cli.idle_timeout),
        ..CycleConfig::default()
    });

    let mut ticker = tokio::time::interval(Duration::from_secs(cli.interval.max(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let outcome = cycle.run(&mut transport, &mut registry, &mut display).await;
        match &outcome {
            CycleOutcome::Success { .. } => info!(%outcome, "cycle finished"),
            // Failed cycles are reported and the next one proceeds
            // unconditionally; the map shows off/unknown until then.
            CycleOutcome::Timeout | CycleOutcome::TransportFailed(_) => {
                warn!(%outcome, "cycle failed")
            }
        }

        if cli.once {
            break;
        }
    }

    Ok(())
}
