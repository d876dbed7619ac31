// esalib test application -- CLI tool for exercising the spectrum analyzer
// drivers against real hardware or a simulated instrument.
//
// Usage:
//   esalib-test-app list
//   esalib-test-app --driver FSUP50 --resource TCPIP0::192.168.1.20::5025::SOCKET info
//   esalib-test-app --driver N9030A --simulate freq set start 1e6
//   esalib-test-app --config bench.toml --resource ASRL/dev/ttyUSB0::INSTR marker peak
//   esalib-test-app --driver FSUP50 --simulate trace --csv-dir out --csv-file sweep.csv
//   esalib-test-app --driver N9030A --simulate stress --count 500

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use rand::Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use esalib::{Esa, EsaConfig, format_freq_hz, supported_drivers};
use esalib_test_harness::SimulatedAnalyzer;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// esalib test application -- exercises analyzer drivers from the command line.
#[derive(Parser)]
#[command(name = "esalib-test-app", version, about)]
struct Cli {
    /// Driver name: FSUP50 or N9030A. Overrides the value from --config.
    #[arg(long)]
    driver: Option<String>,

    /// TOML file with `devicedriver`, `label` and `timeout_ms`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Resource address, e.g. TCPIP0::192.168.1.20::5025::SOCKET or
    /// ASRL/dev/ttyUSB0::INSTR.
    #[arg(long)]
    resource: Option<String>,

    /// Talk to a simulated instrument instead of a real resource.
    #[arg(long)]
    simulate: bool,

    /// Per-reply timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print analyzer identity and readable properties.
    Info,

    /// List all supported drivers.
    List,

    /// Reset to manufacturer defaults.
    Reset,

    /// Apply the safe default state (start frequency 10 Hz).
    Init,

    /// Frequency operations.
    Freq {
        #[command(subcommand)]
        action: FreqAction,
    },

    /// Bandwidth operations.
    Bw {
        #[command(subcommand)]
        action: BwAction,
    },

    /// Marker operations.
    Marker {
        #[command(subcommand)]
        action: MarkerAction,
    },

    /// Sweep control.
    Sweep {
        #[command(subcommand)]
        action: SweepAction,
    },

    /// Read a trace; optionally export trace 1 as CSV.
    Trace {
        /// Trace number.
        #[arg(long, default_value_t = 1)]
        trace: u8,

        /// Write a CSV into this directory instead of printing.
        #[arg(long)]
        csv_dir: Option<PathBuf>,

        /// CSV file name.
        #[arg(long, default_value = "spectrum.csv")]
        csv_file: String,
    },

    /// Read or write any numeric property by name.
    Prop {
        #[command(subcommand)]
        action: PropAction,
    },

    /// Stress test: random start/stop frequency write and read-back cycles.
    Stress {
        /// Number of write/read cycles.
        #[arg(long, default_value_t = 100)]
        count: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FreqKind {
    Start,
    Stop,
    Center,
    Span,
}

#[derive(Subcommand)]
enum FreqAction {
    /// Read a frequency.
    Get {
        #[arg(value_enum)]
        kind: FreqKind,
    },
    /// Set a frequency (in Hz).
    Set {
        #[arg(value_enum)]
        kind: FreqKind,
        hz: f64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum BwKind {
    Video,
    Resolution,
}

#[derive(Subcommand)]
enum BwAction {
    /// Read a bandwidth.
    Get {
        #[arg(value_enum)]
        kind: BwKind,
    },
    /// Set a bandwidth (in Hz).
    Set {
        #[arg(value_enum)]
        kind: BwKind,
        hz: f64,
    },
    /// Couple the resolution bandwidth to the span again.
    Auto,
}

#[derive(Subcommand)]
enum MarkerAction {
    /// Read marker frequency and amplitude.
    Get {
        #[arg(long, default_value_t = 1)]
        marker: u8,
    },
    /// Move the marker to the highest peak and read it.
    Peak {
        #[arg(long, default_value_t = 1)]
        marker: u8,
    },
}

#[derive(Subcommand)]
enum SweepAction {
    /// Switch to single sweep.
    Single,
    /// Switch to continuous sweep.
    Continuous,
    /// Read the sweep time.
    Time,
    /// Read or set the sweep point count.
    Points { value: Option<u32> },
}

#[derive(Subcommand)]
enum PropAction {
    /// List property names.
    List,
    /// Read a property.
    Get { name: String },
    /// Write a property.
    Set { name: String, value: f64 },
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

fn load_config(cli: &Cli) -> Result<EsaConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            EsaConfig::from_toml(&text)?
        }
        None => {
            let Some(driver) = &cli.driver else {
                bail!("--driver or --config is required");
            };
            EsaConfig::new(driver.clone(), "ESA")
        }
    };
    if let Some(driver) = &cli.driver {
        config.devicedriver = driver.clone();
    }
    if let Some(ms) = cli.timeout_ms {
        config.timeout_ms = Some(ms);
    }
    Ok(config)
}

fn simulator_for(driver: &str) -> Result<SimulatedAnalyzer> {
    let definition = esalib::find_driver(driver)?;
    Ok(match definition.manufacturer {
        esalib::Manufacturer::RohdeSchwarz => SimulatedAnalyzer::fsup50(),
        esalib::Manufacturer::Keysight => SimulatedAnalyzer::n9030a(),
    })
}

async fn create_esa(cli: &Cli) -> Result<Esa> {
    let config = load_config(cli)?;

    if cli.simulate {
        let sim = simulator_for(&config.devicedriver)?;
        return Ok(Esa::with_transport(config, Box::new(sim)).await?);
    }

    let Some(resource) = &cli.resource else {
        bail!("--resource is required unless --simulate is used");
    };
    Esa::open(resource, config)
        .await
        .with_context(|| format!("opening {resource}"))
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_list() -> Result<()> {
    println!("{:<10} {:<18} {:<12} Max frequency", "Driver", "Manufacturer", "Model");
    for def in supported_drivers() {
        println!(
            "{:<10} {:<18} {:<12} {}",
            def.driver_name,
            def.manufacturer.to_string(),
            def.model_name,
            format_freq_hz(def.max_frequency_hz)
        );
    }
    Ok(())
}

async fn cmd_info(esa: &Esa) -> Result<()> {
    let info = esa.info();
    println!("Driver:       {}", info.driver_name);
    println!("Manufacturer: {}", info.manufacturer);
    println!("Identity:     {}", info.identity);
    println!();
    for name in esa.property_names() {
        match esa.get_property(name).await {
            Ok(value) => println!("  {name:<18} {value}"),
            Err(e) => println!("  {name:<18} <{e}>"),
        }
    }
    Ok(())
}

async fn cmd_freq(esa: &Esa, action: &FreqAction) -> Result<()> {
    match action {
        FreqAction::Get { kind } => {
            let hz = match kind {
                FreqKind::Start => esa.get_start_frequency().await?,
                FreqKind::Stop => esa.get_stop_frequency().await?,
                FreqKind::Center => esa.get_center_frequency().await?,
                FreqKind::Span => esa.get_property("span_frequency").await?,
            };
            println!("{}", format_freq_hz(hz));
        }
        FreqAction::Set { kind, hz } => {
            match kind {
                FreqKind::Start => esa.set_start_frequency(*hz).await?,
                FreqKind::Stop => esa.set_stop_frequency(*hz).await?,
                FreqKind::Center => esa.set_center_frequency(*hz).await?,
                FreqKind::Span => esa.set_span_frequency(*hz).await?,
            }
            println!("OK");
        }
    }
    Ok(())
}

async fn cmd_bw(esa: &Esa, action: &BwAction) -> Result<()> {
    match action {
        BwAction::Get { kind } => {
            let hz = match kind {
                BwKind::Video => esa.get_video_bw().await?,
                BwKind::Resolution => esa.get_resolution_bw().await?,
            };
            println!("{}", format_freq_hz(hz));
        }
        BwAction::Set { kind, hz } => {
            match kind {
                BwKind::Video => esa.set_video_bw(*hz).await?,
                BwKind::Resolution => esa.set_resolution_bw(*hz).await?,
            }
            println!("OK");
        }
        BwAction::Auto => {
            esa.set_resolution_bw_auto(true).await?;
            println!("OK");
        }
    }
    Ok(())
}

async fn cmd_marker(esa: &Esa, action: &MarkerAction) -> Result<()> {
    let marker = match action {
        MarkerAction::Get { marker } => *marker,
        MarkerAction::Peak { marker } => {
            esa.set_move_marker_peak(*marker).await?;
            *marker
        }
    };
    let freq = esa.get_marker_frequency(marker).await?;
    let amplitude = esa.get_marker_amplitude(marker).await?;
    println!("M{marker}: {} {amplitude:.2}", format_freq_hz(freq));
    Ok(())
}

async fn cmd_sweep(esa: &Esa, action: &SweepAction) -> Result<()> {
    match action {
        SweepAction::Single => esa.set_sweep_single(true).await?,
        SweepAction::Continuous => esa.set_sweep_single(false).await?,
        SweepAction::Time => println!("{:.6} s", esa.get_sweeptime().await?),
        SweepAction::Points { value: Some(points) } => {
            let sent = esa.set_sweep_points(*points).await?;
            if sent != *points {
                println!("clamped to {sent}");
            }
        }
        SweepAction::Points { value: None } => println!("{}", esa.get_sweep_points().await?),
    }
    Ok(())
}

async fn cmd_trace(esa: &Esa, trace: u8, csv_dir: Option<&PathBuf>, csv_file: &str) -> Result<()> {
    if let Some(dir) = csv_dir {
        let path = esa.get_rawdata_from_spectrum(dir, csv_file).await?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let values = esa.get_trace(trace).await?;
    let (peak_index, peak) = values
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, v)| if v > best.1 { (i, v) } else { best });
    println!("Trace {trace}: {} points, peak {peak:.2} at index {peak_index}", values.len());
    Ok(())
}

async fn cmd_prop(esa: &Esa, action: &PropAction) -> Result<()> {
    match action {
        PropAction::List => {
            for name in esa.property_names() {
                println!("{name}");
            }
        }
        PropAction::Get { name } => println!("{}", esa.get_property(name).await?),
        PropAction::Set { name, value } => {
            let sent = esa.set_property(name, *value).await?;
            println!("OK ({sent})");
        }
    }
    Ok(())
}

async fn cmd_stress(esa: &Esa, count: u32) -> Result<()> {
    let max_hz = max_frequency(esa);
    let base_start = esa.get_start_frequency().await?;
    let base_stop = esa.get_stop_frequency().await?;
    println!("Stress test: {count} cycles");

    let mut rng = rand::thread_rng();
    let mut success = 0u32;
    let mut failures = 0u32;
    let started = Instant::now();

    for i in 1..=count {
        let start_hz = rng.gen_range(0.0..max_hz / 2.0).round();
        let stop_hz = (start_hz + rng.gen_range(1e3..max_hz / 2.0)).round();

        let result = async {
            esa.set_start_frequency(start_hz).await?;
            esa.set_stop_frequency(stop_hz).await?;
            let readback = (
                esa.get_start_frequency().await?,
                esa.get_stop_frequency().await?,
            );
            esalib::Result::Ok(readback)
        }
        .await;

        match result {
            Ok((start, stop)) if start == start_hz && stop == stop_hz => success += 1,
            Ok((start, stop)) => {
                eprintln!(
                    "[{i}/{count}] mismatch: set {}..{} but read back {}..{}",
                    format_freq_hz(start_hz),
                    format_freq_hz(stop_hz),
                    format_freq_hz(start),
                    format_freq_hz(stop)
                );
                failures += 1;
            }
            Err(e) => {
                eprintln!("[{i}/{count}] failed: {e}");
                failures += 1;
            }
        }
    }

    let elapsed = started.elapsed();
    let rate = if elapsed > Duration::ZERO {
        f64::from(count) / elapsed.as_secs_f64()
    } else {
        0.0
    };

    println!();
    println!("Results:");
    println!("  Total cycles:   {count}");
    println!("  Successes:      {success}");
    println!("  Failures:       {failures}");
    println!("  Elapsed:        {:.3} s", elapsed.as_secs_f64());
    println!("  Rate:           {rate:.1} cycles/sec");

    if let Err(e) = restore_span(esa, base_start, base_stop).await {
        eprintln!("Warning: failed to restore span: {e}");
    }

    if failures > 0 {
        bail!("{failures} of {count} cycles failed");
    }
    Ok(())
}

async fn restore_span(esa: &Esa, start: f64, stop: f64) -> esalib::Result<()> {
    esa.set_start_frequency(start).await?;
    esa.set_stop_frequency(stop).await
}

/// Upper frequency limit of the connected model.
fn max_frequency(esa: &Esa) -> f64 {
    esalib::find_driver(&esa.info().driver_name)
        .map(|def| def.max_frequency_hz)
        .unwrap_or(50e9)
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // `list` does not need an instrument.
    if matches!(cli.command, Command::List) {
        return cmd_list();
    }

    let esa = create_esa(&cli).await?;
    info!(label = esa.label(), driver = %esa.info().driver_name, "connected");

    let result = match &cli.command {
        Command::Info => cmd_info(&esa).await,
        Command::Reset => {
            let code = esa.reset().await?;
            println!("Reset complete (code {code})");
            Ok(())
        }
        Command::Init => esa.init_device().await.map_err(Into::into),
        Command::Freq { action } => cmd_freq(&esa, action).await,
        Command::Bw { action } => cmd_bw(&esa, action).await,
        Command::Marker { action } => cmd_marker(&esa, action).await,
        Command::Sweep { action } => cmd_sweep(&esa, action).await,
        Command::Trace {
            trace,
            csv_dir,
            csv_file,
        } => cmd_trace(&esa, *trace, csv_dir.as_ref(), csv_file).await,
        Command::Prop { action } => cmd_prop(&esa, action).await,
        Command::Stress { count } => cmd_stress(&esa, *count).await,
        Command::List => unreachable!("list handled above"),
    };

    let status = esa.get_status();
    if !status.is_empty() {
        tracing::debug!(?status, "last measurements");
    }
    esa.close().await.ok();
    result
}
