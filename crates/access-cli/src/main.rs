//! Helios Access Query
//!
//! Searches an access point from the command line and prints matching
//! records as JSON lines.

mod config;

use std::io::{self, Write};

use clap::Parser;
use helios_access::{AccessPoint, AccessResult, Record};
use tracing::{debug, error, info};

use crate::config::CliConfig;

/// Initializes logging to stderr, leaving stdout to the records.
fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("helios_access={level},access_query={level}")));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Prints records as JSON lines, stopping right after the `limit`-th one.
///
/// Returns the number of printed records and of skipped failures.
fn print_records<'ap, I, W>(
    results: I,
    limit: usize,
    out: &mut W,
) -> anyhow::Result<(usize, usize)>
where
    I: Iterator<Item = AccessResult<Record<'ap>>>,
    W: Write,
{
    let mut printed = 0;
    let mut failures = 0;
    if limit == 0 {
        return Ok((printed, failures));
    }

    for result in results {
        match result.and_then(|record| record.properties()) {
            Ok(properties) => {
                writeln!(out, "{}", serde_json::to_string(&properties)?)?;
                printed += 1;
                // Pulling another item would build and filter one more record.
                if printed == limit {
                    break;
                }
            }
            Err(e) => {
                error!(error = %e, "Skipping record");
                failures += 1;
            }
        }
    }
    Ok((printed, failures))
}

fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(2);
    }

    let ap_config = config.access_point_config()?;
    let conditions = config.parsed_conditions()?;
    let ap = AccessPoint::from_url(ap_config)
        .map_err(|e| anyhow::anyhow!("Cannot open access point: {}", e))?;
    info!(url = %ap.url(), backend = ap.backend().name(), "Opened access point");

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if config.explain {
        let plan = ap.partition_conditions(conditions)?;
        for condition in &plan.storage {
            writeln!(out, "storage\t{}", condition)?;
        }
        for condition in &plan.parser {
            writeln!(out, "parser\t{}", condition)?;
        }
        return Ok(());
    }

    let limit = config.limit.unwrap_or(usize::MAX);
    let (printed, failures) = print_records(ap.search(conditions)?, limit, &mut out)?;
    debug!(printed, failures, "Search finished");
    out.flush()?;

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}
