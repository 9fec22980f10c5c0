//! Command line and environment configuration.
//!
//! Every option can also be given through an `OPTIONS_FEED_*` environment
//! variable, which in turn may come from a `.env` file in the working directory.

use crate::error::FeedError;
use crate::extractor::ExtractorConfig;
use crate::scheduler::ScheduleConfig;
use crate::spreadsheet::range::Range;
use clap::Parser;
use regex::Regex;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "options-feed",
    version,
    about = "Republishes a spreadsheet region as a CSV file on a fixed interval"
)]
pub struct Args {
    /// Workbook to read (.xlsx, .xlsm, .xlam or .ods)
    #[arg(long, env = "OPTIONS_FEED_WORKBOOK", value_name = "PATH")]
    pub workbook: PathBuf,

    /// CSV file to publish
    #[arg(long, env = "OPTIONS_FEED_OUTPUT", value_name = "PATH")]
    pub output: PathBuf,

    /// Sheet name or glob pattern; defaults to the first sheet
    #[arg(long, env = "OPTIONS_FEED_SHEET", value_name = "PATTERN", value_parser = parse_sheet)]
    pub sheet: Option<String>,

    /// Region such as A1:F18 or 1:18; its first row holds the headers
    #[arg(long, env = "OPTIONS_FEED_RANGE", value_name = "RANGE", value_parser = parse_range)]
    pub range: Option<String>,

    /// Time between runs: 8, 8s, 500ms, 2m or 1h
    #[arg(
        long,
        env = "OPTIONS_FEED_INTERVAL",
        value_name = "DURATION",
        value_parser = parse_interval,
        required_unless_present = "once"
    )]
    pub interval: Option<Duration>,

    /// Run immediately instead of one interval after start
    #[arg(long, env = "OPTIONS_FEED_RUN_ON_START")]
    pub run_on_start: bool,

    /// Extract once and exit
    #[arg(long)]
    pub once: bool,

    /// Read the workbook through the open file instead of an in-memory copy
    #[arg(long, env = "OPTIONS_FEED_NO_SNAPSHOT")]
    pub no_snapshot: bool,
}

impl Args {
    pub fn extractor(&self) -> ExtractorConfig {
        ExtractorConfig {
            workbook: self.workbook.to_owned(),
            output: self.output.to_owned(),
            sheet: self.sheet.to_owned(),
            range: self.range.to_owned(),
            snapshot: !self.no_snapshot,
        }
    }

    pub fn schedule(&self) -> Result<ScheduleConfig, FeedError> {
        let interval = self
            .interval
            .ok_or_else(|| FeedError::Config("an interval is required".to_owned()))?;
        Ok(ScheduleConfig {
            interval,
            run_on_start: self.run_on_start,
        })
    }
}

/// Parses `8` (seconds), `8s`, `500ms`, `2m` or `1h`. Zero is rejected.
pub fn parse_interval(value: &str) -> Result<Duration, String> {
    let pattern = Regex::new(r"^(\d+)\s*(ms|s|m|h)?$").expect("Hardcode regex pattern");
    let value = value.trim();
    let captures = pattern
        .captures(value)
        .ok_or_else(|| format!("invalid interval '{value}', expected e.g. 8, 8s, 500ms, 2m or 1h"))?;
    let amount = captures[1]
        .parse::<u64>()
        .map_err(|error| format!("invalid interval '{value}': {error}"))?;
    let interval = match captures.get(2).map(|unit| unit.as_str()) {
        Some("ms") => Duration::from_millis(amount),
        None | Some("s") => Duration::from_secs(amount),
        Some("m") => Duration::from_secs(amount.saturating_mul(60)),
        Some(_) => Duration::from_secs(amount.saturating_mul(3_600)),
    };
    if interval.is_zero() {
        return Err("interval must be greater than zero".to_owned());
    }
    Ok(interval)
}

fn parse_range(value: &str) -> Result<String, String> {
    Range::try_from(value)
        .map(|_| value.trim().to_owned())
        .map_err(|error| error.to_string())
}

fn parse_sheet(value: &str) -> Result<String, String> {
    glob::Pattern::new(value)
        .map(|_| value.to_owned())
        .map_err(|error| error.to_string())
}
