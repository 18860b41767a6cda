//! CLI argument definitions for `clinical-calc`.

use std::path::PathBuf;

use calc_model::{Difficulty, Locale};
use calc_registry::StatusFilter;
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "clinical-calc",
    version,
    about = "Clinical calculators: BMI, eGFR, CHA2DS2-VASc, lipid risk, pediatric dosing",
    long_about = "Browse the calculator catalog and run calculations.\n\n\
                  Inputs are passed as FIELD=VALUE pairs and validated against each\n\
                  calculator's field schema before anything is computed."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Registry settings file (TOML).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Display locale (en, zh-TW, ja); defaults to the settings file.
    #[arg(long = "locale", value_parser = parse_locale, global = true)]
    pub locale: Option<Locale>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow patient input values in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// List calculators (published only unless --all).
    List {
        /// Include draft and deprecated calculators.
        #[arg(long = "all")]
        all: bool,
    },

    /// Search the catalog.
    Search(SearchArgs),

    /// Show a calculator's metadata and input fields.
    Show {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Run a calculator.
    Calc(CalcArgs),

    /// Published calculators per category and tag.
    Stats,
}

#[derive(Parser)]
pub struct SearchArgs {
    /// Case-insensitive text matched against name, description and tags.
    #[arg(long = "text")]
    pub text: Option<String>,

    #[arg(long = "category")]
    pub category: Option<String>,

    /// Match calculators carrying any of these tags.
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    #[arg(long = "difficulty", value_parser = parse_difficulty)]
    pub difficulty: Option<Difficulty>,

    /// Match calculators listing any of these specialties.
    #[arg(long = "specialty")]
    pub specialties: Vec<String>,

    /// published, draft, deprecated or any.
    #[arg(long = "status", value_parser = parse_status, default_value = "published")]
    pub status: StatusFilter,
}

#[derive(Parser)]
pub struct CalcArgs {
    #[arg(value_name = "ID")]
    pub id: String,

    /// Input values, e.g. weight=70 height=170.
    #[arg(value_name = "FIELD=VALUE")]
    pub inputs: Vec<String>,

    /// Print the result as JSON.
    #[arg(long = "json")]
    pub json: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

fn parse_locale(s: &str) -> Result<Locale, String> {
    s.parse()
}

fn parse_difficulty(s: &str) -> Result<Difficulty, String> {
    Difficulty::parse(s).ok_or_else(|| format!("unknown difficulty: {s}"))
}

fn parse_status(s: &str) -> Result<StatusFilter, String> {
    StatusFilter::parse(s).ok_or_else(|| format!("unknown status: {s}"))
}
