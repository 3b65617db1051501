/// Result formatting for text surfaces (REPL, logs, pipes)
/// Renders a QueryOutcome either as a readable text block or as one JSON document
use crate::error::{VizError, VizResult};
use crate::execution::chart::Chart;
use crate::execution::dispatcher::QueryOutput;
use crate::execution::summary::{ColumnStats, SummaryTable};
use crate::session::QueryOutcome;
use arrow::array::{Array, ArrayRef};
use arrow::util::display::array_value_to_string;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::Write;

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultFormat {
    /// Human-readable text; chart rows capped at the given count
    Text(usize),
    /// Single JSON document with chart data or summary table
    Json,
}

impl Default for ResultFormat {
    fn default() -> Self {
        ResultFormat::Text(20)
    }
}

pub fn format_outcome(outcome: &QueryOutcome, format: ResultFormat) -> VizResult<String> {
    match format {
        ResultFormat::Text(max_rows) => {
            let mut out = String::new();
            write_text(&mut out, outcome, max_rows)
                .map_err(|e| VizError::execution("text output", e.to_string()))?;
            Ok(out)
        }
        ResultFormat::Json => format_json(outcome),
    }
}

fn write_text<W: Write>(out: &mut W, outcome: &QueryOutcome, max_rows: usize) -> std::fmt::Result {
    writeln!(out, "{}", outcome.description)?;
    if !outcome.filters_applied.is_empty() {
        let filters: Vec<String> = outcome.filters_applied.iter().map(|f| f.to_string()).collect();
        writeln!(out, "Filters: {}", filters.join(", "))?;
    }
    writeln!(out, "Rows: {}", outcome.rows)?;
    writeln!(out)?;
    match &outcome.output {
        QueryOutput::Summary(table) => write_summary(out, table),
        QueryOutput::Chart(chart) => write_chart(out, chart, max_rows),
    }
}

fn write_summary<W: Write>(out: &mut W, table: &SummaryTable) -> std::fmt::Result {
    if table.is_empty() {
        return writeln!(out, "No matching columns to summarize.");
    }
    for row in &table.rows {
        writeln!(out, "{} ({})", row.column, row.column_type)?;
        writeln!(out, "  Count: {}", row.count)?;
        writeln!(out, "  Missing: {}", row.missing)?;
        match &row.stats {
            ColumnStats::Numeric {
                mean,
                median,
                min,
                max,
                std_dev,
            } => {
                for (label, value) in [
                    ("Mean", mean),
                    ("Median", median),
                    ("Min", min),
                    ("Max", max),
                    ("Std Dev", std_dev),
                ] {
                    writeln!(out, "  {}: {}", label, format_stat(*value))?;
                }
            }
            ColumnStats::Categorical {
                unique,
                most_frequent,
            } => {
                writeln!(out, "  Unique Values: {}", unique)?;
                if let Some(mode) = most_frequent {
                    writeln!(out, "  Most Frequent: {}", mode.value)?;
                    writeln!(out, "  Frequency: {}", mode.frequency)?;
                    writeln!(out, "  Percentage: {:.2}%", mode.percentage)?;
                }
            }
        }
    }
    Ok(())
}

fn format_stat(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.4}", v),
        None => "NULL".to_string(),
    }
}

fn write_chart<W: Write>(out: &mut W, chart: &Chart, max_rows: usize) -> std::fmt::Result {
    let spec = &chart.spec;
    writeln!(out, "{}", spec.title)?;
    writeln!(out, "x: {}  y: {}", spec.x.label, spec.y.label)?;

    if let Some(bins) = &spec.bins {
        for (i, count) in bins.counts.iter().enumerate() {
            writeln!(out, "  [{:.3}, {:.3}) {}", bins.edges[i], bins.edges[i + 1], count)?;
        }
        return Ok(());
    }

    let names = chart.data.column_names();
    writeln!(out, "  {}", names.join(" | "))?;
    let shown = chart.data.num_rows().min(max_rows);
    for row in 0..shown {
        let cells: Vec<String> = chart
            .data
            .batch()
            .columns()
            .iter()
            .map(|array| format_value(array, row))
            .collect();
        writeln!(out, "  {}", cells.join(" | "))?;
    }
    if chart.data.num_rows() > shown {
        writeln!(out, "  ... {} more rows", chart.data.num_rows() - shown)?;
    }
    Ok(())
}

/// Format a single value from an array
fn format_value(array: &ArrayRef, idx: usize) -> String {
    if array.is_null(idx) {
        return "NULL".to_string();
    }
    array_value_to_string(array.as_ref(), idx).unwrap_or_else(|_| "?".to_string())
}

fn format_json(outcome: &QueryOutcome) -> VizResult<String> {
    let mut doc = json!({
        "description": outcome.description,
        "filters": outcome.filters_applied,
        "rows": outcome.rows,
    });
    match &outcome.output {
        QueryOutput::Summary(table) => {
            doc["summary"] = serde_json::to_value(table)
                .map_err(|e| VizError::execution("summary statistics", e.to_string()))?;
        }
        QueryOutput::Chart(chart) => {
            doc["chart"] = chart.to_json()?;
        }
    }
    serde_json::to_string_pretty(&doc).map_err(|e| VizError::execution("visualization", e.to_string()))
}
