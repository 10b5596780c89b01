// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Courier - dispatch worker for scheduled bulk text distributions.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use courier_config::{ConfigError, CourierConfig};

/// Courier - dispatch worker for scheduled bulk text distributions.
#[derive(Parser, Debug)]
#[command(name = "courier", version, about, long_about = None)]
struct Cli {
    /// Use this config file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the dispatch loop until SIGINT or SIGTERM.
    Serve,
    /// Show per-distribution delivery statistics.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Load and validate configuration, then print a summary.
    CheckConfig,
}

fn load(path: Option<&PathBuf>) -> Result<CourierConfig, Vec<ConfigError>> {
    match path {
        Some(path) => courier_config::load_and_validate_from_path(path),
        None => courier_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("courier: use --help for available commands");
        return;
    };

    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            courier_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Status { json, plain } => status::run_status(&config, json, plain).await,
        Commands::CheckConfig => {
            print_config_summary(&config);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn print_config_summary(config: &CourierConfig) {
    println!("courier: configuration is valid");
    println!("  worker.name                  = {}", config.worker.name);
    println!("  worker.log_level             = {}", config.worker.log_level);
    println!("  storage.database_path        = {}", config.storage.database_path);
    println!("  dispatch.interval_secs       = {}", config.dispatch.interval_secs);
    println!(
        "  dispatch.max_concurrent_sends = {}",
        config.dispatch.max_concurrent_sends
    );
    println!(
        "  dispatch.respect_start_date  = {}",
        config.dispatch.respect_start_date
    );
    println!("  sender.base_url              = {}", config.sender.base_url);
    println!(
        "  sender.auth_token            = {}",
        if config.sender.auth_token.is_some() { "<set>" } else { "<unset>" }
    );
    println!("  sender.timeout_secs          = {}", config.sender.timeout_secs);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn parses_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["courier", "status", "--json", "--config", "c.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Status { json: true, plain: false })
        ));
    }

    #[test]
    fn parses_check_config() {
        let cli = Cli::try_parse_from(["courier", "check-config"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
        assert!(cli.config.is_none());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let errors = load(Some(&PathBuf::from("/nonexistent/courier.toml"))).unwrap_err();
        assert_eq!(errors.len(), 1);
    }
}
