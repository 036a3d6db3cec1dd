// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use std::io::Read;
use std::path::{Path, PathBuf};

use ifc_energy_calc::{
    process_upload, BenchmarkEstimator, ConsumptionEstimator, RemoteEstimator,
    RemoteEstimatorConfig,
};

/// Estimate the annual electricity consumption of an IFC building model
#[derive(Parser, Debug)]
#[command(name = "ifc-energy", version, author, long_about = None)]
struct Args {
    /// IFC file to analyze, or `-` to read from stdin
    input: PathBuf,

    /// File name to check when reading from stdin
    #[arg(long)]
    name: Option<String>,

    /// Ask the remote estimator, falling back to benchmarks on failure
    #[arg(long, default_value_t = false)]
    remote: bool,

    /// TOML file with remote estimator settings (defaults to environment)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print cost, recommendations and assumptions only
    #[arg(long, default_value_t = false)]
    summary: bool,

    /// Pretty-print the JSON output
    #[arg(long, default_value_t = false)]
    pretty: bool,

    /// Enable verbose logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    let (file_name, content) = read_input(&args)?;
    let estimator = build_estimator(&args);

    let response = process_upload(&file_name, &content, estimator.as_ref())
        .with_context(|| format!("failed to analyze {}", file_name))?;

    let output = if args.summary {
        to_json(&response.summary(), args.pretty)?
    } else {
        to_json(&response, args.pretty)?
    };
    println!("{}", output);

    Ok(())
}

/// File name used for the type check, and the file content
fn read_input(args: &Args) -> Result<(String, Vec<u8>)> {
    if args.input == Path::new("-") {
        let Some(name) = args.name.clone() else {
            bail!("--name is required when reading from stdin");
        };
        let mut content = Vec::new();
        std::io::stdin()
            .read_to_end(&mut content)
            .context("failed to read stdin")?;
        return Ok((name, content));
    }

    let name = match &args.name {
        Some(name) => name.clone(),
        None => args
            .input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    info!("Reading IFC file: {}", args.input.display());
    let content = std::fs::read(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    Ok((name, content))
}

/// Remote estimator when requested and configured, benchmarks otherwise
fn build_estimator(args: &Args) -> Box<dyn ConsumptionEstimator> {
    if !args.remote {
        return Box::new(BenchmarkEstimator);
    }

    let config = match &args.config {
        Some(path) => RemoteEstimatorConfig::from_config_file(path),
        None => RemoteEstimatorConfig::from_env(),
    };
    let estimator = config
        .map_err(|err| err.to_string())
        .and_then(|config| RemoteEstimator::from_config(config).map_err(|err| err.to_string()));

    match estimator {
        Ok(estimator) => {
            info!("Using remote estimator ({})", estimator.config().model);
            Box::new(estimator)
        }
        Err(err) => {
            warn!("Remote estimator unavailable ({}); using benchmarks", err);
            Box::new(BenchmarkEstimator)
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}
