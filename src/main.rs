//! gridsense-sim entry point: CLI wiring and config-driven engine construction.

use std::path::Path;
use std::process;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gridsense_sim::config::EngineConfig;
use gridsense_sim::devices::Telemetry;
use gridsense_sim::io::export::export_csv;
use gridsense_sim::sim::engine::SimulationEngine;

/// Headless run length when neither `--duration` nor `--serve` is given.
const DEFAULT_DURATION_SECS: u64 = 10;

/// Parsed CLI arguments.
struct CliArgs {
    config_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    duration_secs: Option<u64>,
    telemetry_out: Option<String>,
    power_on: bool,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: Option<u16>,
}

fn print_help() {
    eprintln!("gridsense-sim: synthetic industrial telemetry simulator");
    eprintln!();
    eprintln!("Usage: gridsense-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>          Load configuration from a TOML file");
    eprintln!("  --preset <name>          Use a built-in preset (default, demo)");
    eprintln!("  --seed <u64>             Override random seed");
    eprintln!("  --duration <secs>        Run headless for this many seconds (default: 10)");
    eprintln!("  --telemetry-out <path>   Write once-per-second samples to CSV");
    eprintln!("  --power-on               Turn every device on before running");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Serve the REST API until interrupted");
        eprintln!("  --port <u16>             API server port (default: from config, 8000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --config or --preset is given, the default preset is used.");
}

/// Reads the value following a flag or exits with a usage error.
fn flag_value(args: &[String], i: &mut usize, flag: &str, what: &str) -> String {
    *i += 1;
    if *i >= args.len() {
        eprintln!("error: {flag} requires {what}");
        process::exit(1);
    }
    args[*i].clone()
}

fn parse_number<T: std::str::FromStr>(value: &str, flag: &str, ty: &str) -> T {
    value.parse::<T>().unwrap_or_else(|_| {
        eprintln!("error: {flag} value \"{value}\" is not a valid {ty}");
        process::exit(1);
    })
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        preset: None,
        seed_override: None,
        duration_secs: None,
        telemetry_out: None,
        power_on: false,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--config" => {
                cli.config_path = Some(flag_value(&args, &mut i, "--config", "a path argument"));
            }
            "--preset" => {
                cli.preset = Some(flag_value(&args, &mut i, "--preset", "a name argument"));
            }
            "--seed" => {
                let v = flag_value(&args, &mut i, "--seed", "a u64 argument");
                cli.seed_override = Some(parse_number(&v, "--seed", "u64"));
            }
            "--duration" => {
                let v = flag_value(&args, &mut i, "--duration", "a seconds argument");
                cli.duration_secs = Some(parse_number(&v, "--duration", "u64"));
            }
            "--telemetry-out" => {
                cli.telemetry_out =
                    Some(flag_value(&args, &mut i, "--telemetry-out", "a path argument"));
            }
            "--power-on" => {
                cli.power_on = true;
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                let v = flag_value(&args, &mut i, "--port", "a u16 argument");
                cli.port = Some(parse_number(&v, "--port", "u16"));
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Resolves the configuration: `--config` takes priority, then `--preset`,
/// then the default preset. Exits on any load or validation error.
fn load_config(cli: &CliArgs) -> EngineConfig {
    let loaded = if let Some(ref path) = cli.config_path {
        EngineConfig::from_toml_file(Path::new(path))
    } else if let Some(ref name) = cli.preset {
        EngineConfig::from_preset(name)
    } else {
        Ok(EngineConfig::default())
    };
    let mut config = loaded.unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    if let Some(seed) = cli.seed_override {
        config.simulation.seed = Some(seed);
    }
    #[cfg(feature = "api")]
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    config
}

fn power_on_all(engine: &SimulationEngine) {
    for summary in engine.list_devices() {
        if let Some(device) = engine.get_device(&summary.device_id) {
            if let Err(e) = device.turn_on() {
                warn!(device_id = %summary.device_id, error = %e, "turn_on rejected");
            }
        }
    }
}

/// Runs the loops for `duration`, sampling every device once per second.
async fn run_headless(engine: &SimulationEngine, duration: Duration) -> Vec<Telemetry> {
    engine.start();

    let mut samples = Vec::new();
    let mut sampler = tokio::time::interval(Duration::from_secs(1));
    sampler.tick().await;
    for _ in 0..duration.as_secs() {
        sampler.tick().await;
        for t in engine.get_all_telemetry().into_values() {
            println!(
                "{:>14} {:<10} {:<8} {:>8.2} V {:>8.2} A {:>10.2} W  t={:.1}",
                t.device_id, t.device_type, t.status, t.voltage, t.current, t.power, t.timestamp
            );
            samples.push(t);
        }
    }

    engine.stop().await;
    samples
}

#[cfg(feature = "api")]
async fn run_server(engine: std::sync::Arc<SimulationEngine>, port: u16) {
    use std::net::SocketAddr;

    engine.start();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
        }
    };
    let result = gridsense_sim::api::serve(std::sync::Arc::clone(&engine), addr, shutdown).await;
    engine.stop().await;
    if let Err(e) = result {
        eprintln!("error: server failed on {addr}: {e}");
        process::exit(1);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = parse_args();
    let config = load_config(&cli);

    let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("error: failed to create tokio runtime: {e}");
        process::exit(1);
    });

    let engine = SimulationEngine::new(&config).unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });
    if cli.power_on {
        power_on_all(&engine);
    }

    #[cfg(feature = "api")]
    if cli.serve {
        let engine = std::sync::Arc::new(engine);
        rt.block_on(run_server(engine, config.server.port));
        return;
    }

    let duration = Duration::from_secs(cli.duration_secs.unwrap_or(DEFAULT_DURATION_SECS));
    info!(secs = duration.as_secs(), "running headless");
    let samples = rt.block_on(run_headless(&engine, duration));

    if let Some(ref path) = cli.telemetry_out {
        if let Err(e) = export_csv(&samples, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        info!(path = %path, rows = samples.len(), "telemetry written");
    }
}
