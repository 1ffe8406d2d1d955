//! logprobe command line.
//!
//! Discovers the registered test cases, runs them against the configured
//! daemon and exits with the number of failed test functions.
//!
//! # Usage
//!
//! ```bash
//! # Run every case with the default configuration
//! logprobe
//!
//! # Run one case against a custom daemon build, with debug logging
//! logprobe --config logprobe.toml --case TestFeed --verbose
//!
//! # Show what would run
//! logprobe --list
//!
//! # Keep a machine readable report
//! logprobe --json report.json
//! ```

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use logprobe::core::HarnessConfig;
use logprobe::harness::{Runner, TestCaseRegistration, discover, select, test_function_names};
use tracing_subscriber::EnvFilter;

/// Functional test harness for log-processing daemons.
#[derive(Parser, Debug)]
#[command(name = "logprobe")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Harness configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Show daemon output and debug logging.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// List discovered test cases and their test functions, then exit.
    #[arg(long, default_value_t = false)]
    list: bool,

    /// Run only the named test case; may be repeated.
    #[arg(long = "case", value_name = "NAME")]
    cases: Vec<String>,

    /// Write the suite report as JSON to this file.
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<HarnessConfig> {
    let mut config = match &args.config {
        Some(path) => HarnessConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            let config = HarnessConfig::default();
            config.validate().context("default configuration")?;
            config
        }
    };
    config.verbose |= args.verbose;
    Ok(config)
}

fn list(cases: &[&TestCaseRegistration], verbose: bool) {
    for registration in cases {
        let case = registration.instantiate(verbose);
        println!("{} ({})", registration.name, registration.module);
        for name in test_function_names(case.as_ref()) {
            println!("  {name}");
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_tracing(config.verbose);

    let cases = select(discover()?, &args.cases)?;
    if args.list {
        list(&cases, config.verbose);
        return Ok(ExitCode::SUCCESS);
    }

    tracing::info!(
        cases = cases.len(),
        daemon = %config.daemon.binary.display(),
        "running suite"
    );
    let report = Runner::new(config).run(&cases).await;

    if let Some(path) = &args.json {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    }
    if let Some(reason) = &report.aborted {
        tracing::error!(reason = %reason, "suite aborted");
    }
    Ok(ExitCode::from(report.exit_code()))
}
