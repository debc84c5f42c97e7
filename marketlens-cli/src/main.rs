//! MarketLens CLI — inspect schemas, run series queries, export reports.
//!
//! Commands:
//! - `schema` — classify a dataset's columns and print the taxonomy
//! - `series` — run the resolve/reduce/aggregate pipeline and print or
//!   export the daily series
//! - `domains` — run one cascade pass over a partial selection and print
//!   each dimension's remaining domain
//! - `report` — build a multi-block report from a TOML config and export
//!   it as side-by-side CSV

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use marketlens_core::cascade::{resolve_cascade, DimensionSelection, SelectionState};
use marketlens_core::query::{daily_series, DateSpan, SeriesQuery};
use marketlens_core::reduce::ReduceOp;
use marketlens_core::schema::{ColumnRole, TechnicalFields};
use marketlens_core::store::{DatasetStore, Predicate};
use marketlens_core::version::VersionWeights;
use marketlens_report::{build_report, open_store, write_report_csv, write_series_csv, ReportConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "marketlens",
    about = "MarketLens CLI — versioned market-table resolution and reporting"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a dataset's columns and print the taxonomy.
    Schema {
        /// Dataset file (.csv or .parquet).
        #[arg(long)]
        data: PathBuf,

        /// Dataset display name. Defaults to the file stem.
        #[arg(long)]
        name: Option<String>,
    },
    /// Run a series query and print or export the daily series.
    Series {
        /// Dataset file (.csv or .parquet).
        #[arg(long)]
        data: PathBuf,

        /// Reduction operator: mean, sum, max, min.
        #[arg(long, default_value = "mean")]
        op: String,

        /// Dimension filters, repeatable: --filter region=North
        #[arg(long = "filter")]
        filters: Vec<String>,

        /// Start date (YYYY-MM-DD), inclusive.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD), inclusive.
        #[arg(long)]
        end: Option<String>,

        /// Value column (required for single-value datasets).
        #[arg(long)]
        value_column: Option<String>,

        /// Version-weight override table (TOML with an [exact] map).
        #[arg(long)]
        weights: Option<PathBuf>,

        /// Write the series as CSV instead of printing it.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print the series as JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Run one cascade pass over a partial selection and print the domains.
    Domains {
        /// Dataset file (.csv or .parquet).
        #[arg(long)]
        data: PathBuf,

        /// Selections, repeatable: --select region=North
        #[arg(long = "select")]
        selections: Vec<String>,
    },
    /// Build a report from a TOML config and export it as CSV.
    Report {
        /// Report config (TOML).
        #[arg(long)]
        config: PathBuf,

        /// Output CSV path. Defaults to report.csv.
        #[arg(long, default_value = "report.csv")]
        out: PathBuf,

        /// Version-weight override table (TOML with an [exact] map).
        #[arg(long)]
        weights: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Schema { data, name } => cmd_schema(&data, name.as_deref()),
        Commands::Series {
            data,
            op,
            filters,
            start,
            end,
            value_column,
            weights,
            out,
            json,
        } => cmd_series(
            &data,
            &op,
            &filters,
            start,
            end,
            value_column,
            weights,
            out,
            json,
        ),
        Commands::Domains { data, selections } => cmd_domains(&data, &selections),
        Commands::Report {
            config,
            out,
            weights,
        } => cmd_report(&config, &out, weights),
    }
}

fn cmd_schema(data: &PathBuf, name: Option<&str>) -> Result<()> {
    let store = open_store(data, name, &TechnicalFields::default())?;
    let schema = store.schema();

    println!("dataset: {}", schema.name);
    println!("kind:    {:?}", schema.kind);
    for column in schema.columns() {
        let role = match schema.role(column) {
            Some(ColumnRole::Technical) => "technical".to_string(),
            Some(ColumnRole::Dimension) => "dimension".to_string(),
            Some(ColumnRole::Hourly(h)) => format!("hourly ({h})"),
            Some(ColumnRole::Value) => "value".to_string(),
            None => "?".to_string(),
        };
        println!("  {column:<20} {role}");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_series(
    data: &PathBuf,
    op: &str,
    raw_filters: &[String],
    start: Option<String>,
    end: Option<String>,
    value_column: Option<String>,
    weights_path: Option<PathBuf>,
    out: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let store = open_store(data, None, &TechnicalFields::default())?;
    let op: ReduceOp = op.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let mut filters = Vec::with_capacity(raw_filters.len());
    for raw in raw_filters {
        match raw.split_once('=') {
            Some((column, value)) => filters.push(Predicate::new(column.trim(), value.trim())),
            None => bail!("filter '{raw}' is not of the form COLUMN=VALUE"),
        }
    }

    let query = SeriesQuery {
        filters,
        span: DateSpan {
            start: parse_date(start.as_deref())?,
            end: parse_date(end.as_deref())?,
        },
        op,
        value_column,
    };
    let series = daily_series(&store, &load_weights(weights_path)?, &query)?;

    match out {
        Some(path) => {
            write_series_csv(&path, &series.points)?;
            println!("wrote {} points to {}", series.points.len(), path.display());
        }
        None if json => println!("{}", serde_json::to_string_pretty(&series.points)?),
        None => {
            for p in &series.points {
                println!("{}  {}", p.date, p.value);
            }
        }
    }
    let d = &series.diagnostics;
    println!(
        "groups: {}, ambiguous: {}, dropped dates: {}, skipped cells: {}",
        d.total_groups, d.ambiguous_groups, d.dropped_dates, d.skipped_cells
    );
    Ok(())
}

fn cmd_domains(data: &PathBuf, selections: &[String]) -> Result<()> {
    let store = open_store(data, None, &TechnicalFields::default())?;
    let mut selection = DimensionSelection::for_schema(store.schema());

    let mut last_changed = None;
    for raw in selections {
        match raw.split_once('=') {
            Some((column, value)) => {
                selection.set_user(column.trim(), value.trim());
                last_changed = Some(column.trim().to_string());
            }
            None => bail!("selection '{raw}' is not of the form COLUMN=VALUE"),
        }
    }

    let result = resolve_cascade(&store, &mut selection, last_changed.as_deref())?;
    for (column, domain) in &result.domains {
        let state = match selection.get(column) {
            Some(SelectionState::User(v)) => format!("= {v}"),
            Some(SelectionState::Auto(v)) => format!("= {v} (auto)"),
            _ => "ALL".to_string(),
        };
        println!("{column:<20} {state:<24} {}", domain.values.join(" | "));
    }
    if !result.changed.is_empty() {
        println!("adjusted by cascade: {}", result.changed.join(", "));
    }
    Ok(())
}

fn cmd_report(config_path: &PathBuf, out: &PathBuf, weights_path: Option<PathBuf>) -> Result<()> {
    let config = ReportConfig::from_toml_path(config_path)
        .with_context(|| format!("load report config {}", config_path.display()))?;
    let store = open_store(
        &config.dataset,
        Some(&config.display_name()),
        &config.technical,
    )?;

    let blocks = build_report(&store, &load_weights(weights_path)?, &config)?;
    write_report_csv(out, &blocks)?;

    for block in &blocks {
        let status = if block.empty {
            "no data".to_string()
        } else {
            format!("{} points", block.points.len())
        };
        println!("  {:<24} [{}] {}", block.label, block.filter_note, status);
    }
    println!("wrote {} blocks to {}", blocks.len(), out.display());
    Ok(())
}

fn parse_date(s: Option<&str>) -> Result<Option<NaiveDate>> {
    match s {
        None => Ok(None),
        Some(s) => Ok(Some(
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("invalid date '{s}' (expected YYYY-MM-DD)"))?,
        )),
    }
}

fn load_weights(path: Option<PathBuf>) -> Result<VersionWeights> {
    match path {
        None => Ok(VersionWeights::default()),
        Some(p) => {
            let text = std::fs::read_to_string(&p)
                .with_context(|| format!("read weights file {}", p.display()))?;
            VersionWeights::from_toml(&text)
                .with_context(|| format!("parse weights file {}", p.display()))
        }
    }
}
