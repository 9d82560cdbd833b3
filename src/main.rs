//! # tunnelwatch
//!
//! Status monitor and control for VPN services registered with the system's
//! network-configuration subsystem, with stay-disconnected enforcement
//! against on-demand auto-reconnect policies.
//!
//! ## Modules
//! - [`cli`]: Command-line argument parsing and command handlers.
//! - [`config`]: Configuration management.
//! - [`core`]: Monitor engine, status parser, timers, public-IP fetch.
//! - [`platform`]: Host interface enumeration.
//! - [`state`]: Connection and published-status types.
//! - [`vpn`]: External VPN command surface.

mod cli;
mod config;
mod constants;
mod core;
mod logger;
mod platform;
mod state;
mod utils;
mod vpn;

use clap::Parser;
use cli::args::{Args, Commands};
use color_eyre::eyre::eyre;
use color_eyre::Result;

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Resolve config directory (CLI flag / env > platform default)
    let config_dir = config::resolve_config_dir(args.config_dir.as_ref())
        .map_err(|e| eyre!("Failed to resolve config directory: {e}"))?;

    // Load config.toml (or use defaults)
    let mut app_config = match config::load_config(&config_dir) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!();
            eprintln!("Fix the file or remove it to use defaults:");
            eprintln!("  rm {}/config.toml", config_dir.display());
            std::process::exit(1);
        }
    };

    // Echo log lines to stderr only for the long-running watch session;
    // one-shot commands keep their output clean.
    let watching = matches!(args.command.as_ref(), None | Some(Commands::Watch));
    logger::configure(&app_config.log_level, app_config.max_log_entries, watching);

    match args.command {
        Some(Commands::Status { json }) => {
            let service = active_service(args.service, &app_config)?;
            cli::commands::status(&service, &app_config, json)
        }
        Some(Commands::Watch) | None => {
            let service = active_service(args.service, &app_config)?;
            cli::commands::watch(service, &app_config)
        }
        Some(Commands::Connect) => {
            let service = active_service(args.service, &app_config)?;
            cli::commands::connect(&service, &app_config)
        }
        Some(Commands::Disconnect) => {
            let service = active_service(args.service, &app_config)?;
            cli::commands::disconnect(&service, &app_config)
        }
        Some(Commands::Services) => {
            let configured = active_service(args.service, &app_config).ok();
            cli::commands::services(&app_config, configured.as_deref())
        }
        Some(Commands::Use { name }) => {
            cli::commands::use_service(&config_dir, &mut app_config, &name)
        }
    }
}

/// The service to act on: `--service` wins over the persisted selection.
fn active_service(flag: Option<String>, config: &config::AppConfig) -> Result<String> {
    if let Some(name) = flag {
        if !name.trim().is_empty() {
            return Ok(name);
        }
    }
    if !config.service_name.is_empty() {
        return Ok(config.service_name.clone());
    }
    Err(eyre!(
        "no service configured; run `{app} services` then `{app} use <name>`, or pass --service",
        app = constants::APP_NAME
    ))
}
