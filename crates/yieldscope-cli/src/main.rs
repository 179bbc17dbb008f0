// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of YieldScope.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

mod args;
mod formatters;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;
use yieldscope_core::{
    Dataset, ReportConfig, annual_production, daily_combined, detail_table, filter_options,
    monthly_combined, monthly_wind_comparison, open_source, weekly_wind,
};

use crate::args::{Cli, Commands, OutputFormat};
use crate::formatters::TableFormatter;

fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("yieldscope=info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let source = open_source(&config.source).context("No telemetry source to read")?;
    let dataset = Dataset::load(source.as_ref(), &config)
        .with_context(|| format!("Failed to load telemetry from {}", source.describe()))?;
    info!(
        "Loaded {} records ({} rows rejected)",
        dataset.len(),
        dataset.load_report().rejected_rows()
    );

    let output = run(&cli.command, &dataset, cli.format)?;
    print!("{output}");
    Ok(())
}

/// Config file (or defaults) with command line overrides applied
fn load_config(cli: &Cli) -> Result<ReportConfig> {
    let mut config = match &cli.config {
        Some(path) => ReportConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ReportConfig::default(),
    };

    if let Some(source) = &cli.source {
        config.source.path = Some(source.clone());
    }
    if let Some(sheet) = &cli.sheet {
        config.source.sheet.clone_from(sheet);
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn run(command: &Commands, dataset: &Dataset, format: OutputFormat) -> Result<String> {
    match command {
        Commands::Options => {
            let options = filter_options(dataset);
            emit(format, &options, |o| {
                TableFormatter::format_options(o, dataset.load_report())
            })
        }
        Commands::MonthlyWind(args) => {
            let comparison = monthly_wind_comparison(dataset, &args.plant)?;
            emit(format, &comparison, TableFormatter::format_comparison)
        }
        Commands::WeeklyWind(args) => {
            let series = weekly_wind(dataset, &args.plant)?;
            emit(format, &series, TableFormatter::format_series)
        }
        Commands::Annual(args) => {
            let series = annual_production(dataset, &args.plant)?;
            emit(format, &series, TableFormatter::format_series)
        }
        Commands::MonthlyCombined(args) => {
            let series = monthly_combined(dataset, &args.plant.plant, args.year)?;
            emit(format, &series, TableFormatter::format_series)
        }
        Commands::DailyCombined(args) => {
            let series = daily_combined(dataset, &args.plant.plant, args.year, args.month)?;
            emit(format, &series, TableFormatter::format_series)
        }
        Commands::Detail(args) => {
            let detail = detail_table(dataset, &args.plant.plant, args.year, args.month)?;
            emit(format, &detail, TableFormatter::format_detail)
        }
    }
}

fn emit<T: Serialize>(
    format: OutputFormat,
    value: &T,
    table: impl FnOnce(&T) -> String,
) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let mut json =
                serde_json::to_string_pretty(value).context("Failed to serialize report")?;
            json.push('\n');
            Ok(json)
        }
        OutputFormat::Table => Ok(table(value)),
    }
}
