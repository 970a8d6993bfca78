use chrono::Local;
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{LevelFilter, error, info};
use rusty_lecroy::{AppConfig, LecroyScope, ScalarValue, load_config_or_default};
use std::{fs, path::PathBuf, time::Duration};

/// LeCroy oscilloscope remote control
#[derive(Parser, Debug)]
#[command(name = "scope-ctl")]
#[command(about = "Send VBS commands to a LeCroy oscilloscope over VICP", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Override instrument host
    #[arg(long)]
    host: Option<String>,

    /// Override VICP port
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read a VBS value
    Read { path: String },
    /// Assign a VBS value (integer, real, true/false, otherwise text)
    Set {
        path: String,
        #[arg(allow_negative_numbers = true)]
        value: String,
    },
    /// Execute a VBS statement
    Action { statement: String },
    /// Call a VBS method and print its result
    Call {
        path: String,
        #[arg(allow_negative_numbers = true)]
        args: Vec<String>,
        /// Extra seconds added to the read timeout for this call
        #[arg(long, value_name = "SECS")]
        extra_timeout: Option<f64>,
    },
    /// Wait for pending operations to complete (*OPC?)
    Opc,
    /// List available channels and parameters
    Resources,
    /// Print sweep statistics of a measurement parameter as JSON
    Stats { parameter: String },
    /// Save a PNG screenshot
    Screenshot { file: Option<PathBuf> },
    /// Save the raw waveform block of a channel
    Waveform { source: String, file: Option<PathBuf> },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let mut config = load_config_or_default(args.config.as_deref());

    let log_level = args
        .log_level
        .clone()
        .unwrap_or(config.logging.log_level.clone());
    initialize_logging(&log_level)?;

    if let Some(host) = args.host {
        config.scope.host = host;
    }
    if let Some(port) = args.port {
        config.scope.port = port;
    }

    info!("Instrument: {}:{}", config.scope.host, config.scope.port);
    let mut scope = LecroyScope::builder()
        .address(&config.scope.host)
        .port(config.scope.port)
        .config(config.scope.connection_config()?)
        .build()?;

    if let Err(e) = run(&mut scope, args.command, &config) {
        error!("Command failed: {e}");
        return Err(e);
    }
    Ok(())
}

fn run(
    scope: &mut LecroyScope,
    command: Command,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Read { path } => println!("{}", scope.session_mut().read(&path)?),
        Command::Set { path, value } => scope.session_mut().set(&path, parse_value(&value))?,
        Command::Action { statement } => scope.session_mut().action(&statement)?,
        Command::Call {
            path,
            args,
            extra_timeout,
        } => {
            let args: Vec<ScalarValue> = args.iter().map(|a| parse_value(a)).collect();
            let extension = extra_timeout
                .map(Duration::try_from_secs_f64)
                .transpose()?;
            println!("{}", scope.session_mut().method(&path, &args, extension)?);
        }
        Command::Opc => {
            scope.operation_complete()?;
            println!("complete");
        }
        Command::Resources => {
            println!("channels:   {}", scope.available_channels().join(", "));
            println!("parameters: {}", scope.available_parameters().join(", "));
        }
        Command::Stats { parameter } => {
            let stats = scope.statistics(&parameter)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Screenshot { file } => {
            let path = match file {
                Some(path) => path,
                None => capture_path(config, "screenshot", "png")?,
            };
            scope.save_screenshot(&path)?;
            println!("{}", path.display());
        }
        Command::Waveform { source, file } => {
            let path = match file {
                Some(path) => path,
                None => capture_path(config, &source.to_uppercase(), "trc")?,
            };
            scope.save_waveform(&source, &path)?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

/// Interpret a command-line value: integer, then real, then boolean, else text.
fn parse_value(raw: &str) -> ScalarValue {
    if let Ok(n) = raw.parse::<i64>() {
        return ScalarValue::Integer(n);
    }
    if let Ok(x) = raw.parse::<f64>() {
        if x.is_finite() {
            return ScalarValue::Real(x);
        }
    }
    match raw.to_lowercase().as_str() {
        "true" => ScalarValue::Boolean(true),
        "false" => ScalarValue::Boolean(false),
        _ => ScalarValue::Text(raw.to_string()),
    }
}

fn capture_path(
    config: &AppConfig,
    prefix: &str,
    extension: &str,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let directory = PathBuf::from(&config.output.directory);
    fs::create_dir_all(&directory)?;

    let filename = format!(
        "{prefix}_{}.{extension}",
        Local::now().format("%Y%m%d_%H%M%S")
    );
    Ok(directory.join(filename))
}

fn initialize_logging(log_level: &str) -> Result<(), Box<dyn std::error::Error>> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => {
            eprintln!("Warning: Invalid log level '{}', using 'info'", log_level);
            LevelFilter::Info
        }
    };

    env_logger::Builder::from_env(Env::default())
        .filter_level(level)
        .format_timestamp_millis()
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_precedence() {
        assert_eq!(parse_value("42"), ScalarValue::Integer(42));
        assert_eq!(parse_value("-0.002"), ScalarValue::Real(-0.002));
        assert_eq!(parse_value("1e-3"), ScalarValue::Real(0.001));
        assert_eq!(parse_value("False"), ScalarValue::Boolean(false));
        assert_eq!(parse_value("Single"), ScalarValue::Text("Single".into()));
        assert_eq!(parse_value("inf"), ScalarValue::Text("inf".into()));
    }
}
