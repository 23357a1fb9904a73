// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;

use bonus_eligibility::config::{AppConfig, Cli, EnvConfig};
use bonus_eligibility::csv_io::{load_output_schema, load_workbook, write_outputs};
use bonus_eligibility::schema::output;
use bonus_eligibility::{run, BonusInputs, Diagnostics, RunOutcome, RunSettings};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let env = EnvConfig::from_env().context("Failed to read BONUS_* environment configuration")?;
    let config = AppConfig::merge(cli, env);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting bonus eligibility run");

    if let Err(e) = execute(&config) {
        error!("Run failed: {:#}", e);
        return Err(e);
    }
    Ok(())
}

fn execute(config: &AppConfig) -> Result<()> {
    let workbook = load_workbook(&config.input_dir)
        .with_context(|| format!("Failed to load sheets from {}", config.input_dir.display()))?;

    let schema = if config.template.is_file() {
        load_output_schema(&config.template).with_context(|| {
            format!("Failed to read output template {}", config.template.display())
        })?
    } else {
        warn!(
            "Output template {} not found; using the built-in column layout",
            config.template.display()
        );
        output::default_schema()
    };

    let mut diag = Diagnostics::new();
    let inputs = BonusInputs::from_workbook(workbook, schema, &mut diag)?;
    let settings = RunSettings {
        bonus_month: config.bonus_month.clone(),
    };
    let outcome = run(&inputs, &settings, diag)?;

    write_outputs(&outcome, &config.output, &config.exclusions)?;
    match &outcome {
        RunOutcome::NothingToProcess { .. } => warn!("Nothing to process; no output written"),
        RunOutcome::Completed(report) => {
            info!("Done. {} eligible employees", report.eligible_count())
        }
    }

    if let Some(path) = &config.summary_json {
        let json = serde_json::to_string_pretty(&outcome.summary())?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
        info!("Run summary written to {}", path.display());
    }
    Ok(())
}
