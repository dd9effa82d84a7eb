//! Command-line interface parsing for the APOD proxy
//!
//! This module handles parsing of CLI arguments using clap, including date
//! validation and the API key sourced from the `NASA_API_KEY` environment
//! variable.

use chrono::NaiveDate;
use clap::Parser;
use thiserror::Error;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified date is not a valid YYYY-MM-DD string
    #[error("Invalid date: '{0}'. Dates must be in YYYY-MM-DD form, e.g. 2019-01-10")]
    InvalidDate(String),
}

/// APOD proxy - fetch Astronomy Picture of the Day records resiliently
#[derive(Parser, Debug)]
#[command(name = "apodproxy")]
#[command(about = "Fetch NASA APOD records through a cached, circuit-broken client")]
#[command(version)]
pub struct Cli {
    /// Dates to fetch, in YYYY-MM-DD form
    ///
    /// Examples:
    ///   apodproxy 2019-01-10
    ///   apodproxy 2019-01-10 2018-07-01 2017-01-01
    #[arg(value_name = "DATE", required = true)]
    pub dates: Vec<String>,

    /// NASA API key; DEMO_KEY works for a small number of requests
    #[arg(long, env = "NASA_API_KEY", default_value = "DEMO_KEY")]
    pub api_key: String,

    /// Maximum number of records kept in the in-memory cache
    #[arg(long, default_value_t = 10)]
    pub capacity: usize,
}

/// Validated fetch parameters derived from CLI arguments
#[derive(Debug, Clone)]
pub struct FetchPlan {
    /// Dates to fetch, validated
    pub dates: Vec<String>,
    /// API key forwarded to the upstream
    pub api_key: String,
    /// Cache capacity
    pub capacity: usize,
}

/// Parses a date argument, requiring YYYY-MM-DD form.
///
/// # Arguments
/// * `s` - The date string from CLI
///
/// # Returns
/// * `Ok(String)` with the normalized date if valid
/// * `Err(CliError::InvalidDate)` otherwise
pub fn parse_date_arg(s: &str) -> Result<String, CliError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|date| date.format("%Y-%m-%d").to_string())
        .map_err(|_| CliError::InvalidDate(s.to_string()))
}

impl FetchPlan {
    /// Creates a FetchPlan from parsed CLI arguments.
    ///
    /// # Arguments
    /// * `cli` - The parsed CLI struct
    ///
    /// # Returns
    /// * `Ok(FetchPlan)` with validated dates
    /// * `Err(CliError)` if any date is invalid
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let dates = cli
            .dates
            .iter()
            .map(|date| parse_date_arg(date))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            dates,
            api_key: cli.api_key.clone(),
            capacity: cli.capacity,
        })
    }
}
