// src/config.rs
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

pub const ENV_PREFIX: &str = "BONUS_";

// --- Environment Configuration ---

/// Defaults read from `BONUS_*` environment variables (and `.env`).
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EnvConfig {
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    #[serde(default = "default_template")]
    pub template: PathBuf,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default = "default_exclusions")]
    pub exclusions: PathBuf,
    #[serde(default)]
    pub bonus_month: Option<String>,
    #[serde(default)]
    pub summary_json: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_input_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_template() -> PathBuf {
    PathBuf::from("输出数据.csv")
}

fn default_output() -> PathBuf {
    PathBuf::from("筛选结果.csv")
}

fn default_exclusions() -> PathBuf {
    PathBuf::from("排除原因.csv")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            template: default_template(),
            output: default_output(),
            exclusions: default_exclusions(),
            bonus_month: None,
            summary_json: None,
            log_level: default_log_level(),
        }
    }
}

impl EnvConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        // Load .env file if it exists
        dotenv::dotenv().ok();
        envy::prefixed(ENV_PREFIX).from_env::<EnvConfig>()
    }

    pub fn from_iter<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(ENV_PREFIX).from_iter(vars)
    }
}

// --- Command Line ---

/// Monthly bonus eligibility from payroll hours, certifications and store data
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "bonus-eligibility")]
#[command(about = "Filter employees eligible for the monthly bonus")]
pub struct Cli {
    /// Directory holding one `<sheet>.csv` per input sheet
    #[arg(long, short = 'i')]
    pub input_dir: Option<PathBuf>,

    /// CSV whose header row defines the output columns
    #[arg(long, short = 't')]
    pub template: Option<PathBuf>,

    /// Where to write the eligible employees
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Where to write the exclusion report
    #[arg(long, short = 'x')]
    pub exclusions: Option<PathBuf>,

    /// Bonus month, e.g. 2025-11 (overrides the criteria sheet)
    #[arg(long, short = 'm')]
    pub bonus_month: Option<String>,

    /// Also write a JSON run summary to this path
    #[arg(long)]
    pub summary_json: Option<PathBuf>,

    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long)]
    pub log_level: Option<String>,
}

// --- Effective Configuration ---

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub input_dir: PathBuf,
    pub template: PathBuf,
    pub output: PathBuf,
    pub exclusions: PathBuf,
    pub bonus_month: Option<String>,
    pub summary_json: Option<PathBuf>,
    pub log_level: String,
}

impl AppConfig {
    /// Command-line values win over environment values.
    pub fn merge(cli: Cli, env: EnvConfig) -> Self {
        Self {
            input_dir: cli.input_dir.unwrap_or(env.input_dir),
            template: cli.template.unwrap_or(env.template),
            output: cli.output.unwrap_or(env.output),
            exclusions: cli.exclusions.unwrap_or(env.exclusions),
            bonus_month: cli.bonus_month.or(env.bonus_month),
            summary_json: cli.summary_json.or(env.summary_json),
            log_level: cli.log_level.unwrap_or(env.log_level),
        }
    }
}
