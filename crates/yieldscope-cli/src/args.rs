// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of YieldScope.

//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "yieldscope")]
#[command(author, version, about = "Production and wind reports from plant telemetry exports")]
#[command(
    long_about = "Load a plant telemetry export (xlsx workbook or CSV) and print one report.\n\
    \nReports are aligned to complete calendar grids, so months, weeks and days\n\
    without data still appear (as 0 or as a gap, depending on the report).\n\
    \nExamples:\n  \
    yieldscope --source stats.xlsx options\n  \
    yieldscope --source stats.xlsx monthly-combined --plant \"North Ridge\" --year 2024\n  \
    yieldscope --config yieldscope.toml annual --plant \"North Ridge\"\n  \
    yieldscope --format json detail --plant \"North Ridge\" --year 2024 --month 3"
)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Telemetry export, overrides `source.path` from the config file
    #[arg(long, global = true, value_name = "FILE")]
    pub source: Option<PathBuf>,

    /// Worksheet name for xlsx sources
    #[arg(long, global = true, value_name = "NAME")]
    pub sheet: Option<String>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List plants, years and months available for selection
    Options,

    /// Average wind speed per month, one series per year
    MonthlyWind(PlantArgs),

    /// Average wind speed per week over the whole export span
    WeeklyWind(PlantArgs),

    /// Exported energy per year
    Annual(PlantArgs),

    /// Exported energy and average wind speed per month of one year
    MonthlyCombined(YearArgs),

    /// Exported energy and average wind speed per day of one month
    DailyCombined(MonthArgs),

    /// All metrics per device and day of one month
    Detail(MonthArgs),
}

#[derive(Debug, Args)]
pub struct PlantArgs {
    /// Power plant name as it appears in the export
    #[arg(long)]
    pub plant: String,
}

#[derive(Debug, Args)]
pub struct YearArgs {
    #[command(flatten)]
    pub plant: PlantArgs,

    #[arg(long)]
    pub year: i32,
}

#[derive(Debug, Args)]
pub struct MonthArgs {
    #[command(flatten)]
    pub plant: PlantArgs,

    #[arg(long)]
    pub year: i32,

    /// 1-12
    #[arg(long)]
    pub month: u32,
}
