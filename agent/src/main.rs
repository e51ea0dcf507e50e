//! Wattrix Agent - Entry Point
//!
//! Bridges a Wattrix heating controller: polls its status, exposes the values
//! on a local API and forwards mode changes to the device.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use wattrix::app::config_flow::validate_connection;
use wattrix::app::options::AppOptions;
use wattrix::app::run::run;
use wattrix::logs::{init_logging, LogOptions};
use wattrix::storage::settings::{Settings, DEFAULT_SETTINGS_PATH};
use wattrix::utils::version_info;

use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version) {
            Ok(json) => println!("{}", json),
            Err(_) => println!("{}", version.version),
        }
        return;
    }

    // Retrieve the settings file; a --host alone is enough to run
    let settings_path = cli_args
        .get("config")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH));
    let mut settings = match Settings::load(&settings_path).await {
        Ok(settings) => settings,
        Err(_) if cli_args.contains_key("host") && !cli_args.contains_key("config") => {
            Settings::default()
        }
        Err(e) => {
            eprintln!("Unable to read settings file {}: {}", settings_path.display(), e);
            std::process::exit(2);
        }
    };
    if let Some(host) = cli_args.get("host") {
        settings.device.base_url = host.clone();
    }
    if let Err(e) = settings.validate() {
        eprintln!("Invalid settings: {}", e);
        std::process::exit(2);
    }

    // Initialize logging; the guard flushes file output on exit
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        log_dir: settings.log_dir.clone(),
        json_format: settings.log_json,
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            println!("Failed to initialize logging: {e}");
            None
        }
    };

    // Check the device answers and exit
    if cli_args.contains_key("check") {
        let timeout = Duration::from_secs(settings.device.request_timeout_secs);
        match validate_connection(&settings.device.base_url, timeout).await {
            Ok(device_version) => {
                println!("Connected to {}: {:?}", settings.device.base_url, device_version);
                return;
            }
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
    }

    // Run the agent
    let options = AppOptions::from_settings(&settings);
    info!("Running Wattrix Agent {} with options: {:?}", version.version, options);
    if let Err(e) = run(options, await_shutdown_signal()).await {
        error!("Failed to run the agent: {e}");
        std::process::exit(1);
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) = match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
            _ => {
                error!("Failed to install signal handlers, falling back to Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Ctrl+C received, shutting down...");
    }
}
