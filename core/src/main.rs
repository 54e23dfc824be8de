// Coding conventions
#![allow(clippy::redundant_clone)]
#![allow(clippy::ptr_arg)]
#![forbid(unsafe_code)]
#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]
#![deny(clippy::wildcard_enum_match_arm)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

mod box_selector;
mod chain_commands;
mod chain_config;
mod chain_planner;
mod chain_report;
mod chain_types;
mod cli_commands;
mod explorer_api;
mod logging;
mod network_state;
mod node_interface;
mod output_builder;
mod sequencer;
mod serde;
mod transfer;
mod tx_plan;
mod wallet;

use std::env;
use std::path::Path;
use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use log::error;
use log::LevelFilter;

use crate::chain_config::ChainConfig;
use crate::chain_config::DEFAULT_CHAIN_CONFIG_FILE_NAME;

const APP_VERSION: &str = concat!(
    "v",
    env!("CARGO_PKG_VERSION"),
    "+",
    env!("GIT_COMMIT_HASH"),
    " ",
    env!("GIT_COMMIT_DATE")
);

#[derive(Debug, Parser)]
#[clap(author, version = APP_VERSION, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Command,
    /// Increase the logging verbosity
    #[clap(short, long)]
    verbose: bool,
    /// Set path of the chain configuration file to use. Default is ./chain_config.yaml
    #[clap(long)]
    config_file: Option<String>,
    /// Set folder path for the log files. Default is the current folder.
    #[clap(short, long)]
    data_dir: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate chain_config.yaml with default settings.
    GenerateConfig,
    /// Print the configuration with wallet secrets redacted
    PrintConfig,
    /// Build, sign and submit the genesis transaction and every hop of the chain
    Run {
        /// Build and sign the chain without submitting anything
        #[clap(long)]
        dry_run: bool,
    },
}

fn main() {
    let args = Args::parse();

    let config_path = PathBuf::from(
        args.config_file
            .unwrap_or_else(|| DEFAULT_CHAIN_CONFIG_FILE_NAME.to_string()),
    );

    if let Command::GenerateConfig = args.command {
        generate_config(&config_path);
        return;
    }

    if !config_path.exists() {
        generate_config(&config_path);
        return;
    }

    let config = match ChainConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {}", config_path.display(), e);
            std::process::exit(exitcode::CONFIG);
        }
    };

    let cmdline_log_level = if args.verbose {
        Some(LevelFilter::Debug)
    } else {
        None
    };
    let data_dir_path = match args.data_dir {
        Some(ref data_dir) => Path::new(data_dir).to_path_buf(),
        None => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    if let Err(e) = logging::setup_log(cmdline_log_level, config.log_level, &data_dir_path) {
        eprintln!("Failed to set up logging: {:?}", e);
        std::process::exit(exitcode::CANTCREAT);
    }
    log_on_launch(&config);

    match args.command {
        Command::PrintConfig => {
            if let Err(e) = cli_commands::print_conf::print_safe_config(&config) {
                error!("Fatal print-config error: {:?}", e);
                std::process::exit(exitcode::SOFTWARE);
            }
        }
        Command::Run { dry_run } => {
            if let Err(e) = cli_commands::run_chain::run_chain(&config, dry_run) {
                error!("Fatal chain error: {:#}", e);
                std::process::exit(exitcode::SOFTWARE);
            }
        }
        Command::GenerateConfig => (),
    }
}

fn generate_config(config_path: &Path) {
    if config_path.exists() {
        println!(
            "{} already exists. Please, remove it and run again",
            config_path.display()
        );
        return;
    }
    if let Err(e) = ChainConfig::write_default_config_file(config_path) {
        eprintln!("Failed to write {}: {}", config_path.display(), e);
        std::process::exit(exitcode::CANTCREAT);
    }
    println!(
        "{} generated with default settings.",
        config_path.display()
    );
    println!("Please, set the required parameters (node_url, wallet mnemonic, recipient_address, token_id) and run again");
}

fn log_on_launch(config: &ChainConfig) {
    log::info!("{}", APP_VERSION);
    log::info!("Network: {:?}, node: {}", config.network, config.node_url);
    log::info!(
        "Chain of {} hops to {}",
        config.hop_count.0,
        config.recipient_address.to_base58()
    );
}
