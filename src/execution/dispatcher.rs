//! Execution Dispatcher - routes a prepared, filtered dataset to the summary
//! or chart producer for the request's action

use crate::action::model::{Action, ActionRequest};
use crate::data::dataset::Dataset;
use crate::error::{VizError, VizResult};
use crate::execution::chart::{self, Chart};
use crate::execution::summary::{self, SummaryTable};

/// Output of one executed action
#[derive(Debug, Clone)]
pub enum QueryOutput {
    Summary(SummaryTable),
    Chart(Chart),
}

impl QueryOutput {
    pub fn as_chart(&self) -> Option<&Chart> {
        match self {
            QueryOutput::Chart(chart) => Some(chart),
            QueryOutput::Summary(_) => None,
        }
    }

    pub fn as_summary(&self) -> Option<&SummaryTable> {
        match self {
            QueryOutput::Summary(table) => Some(table),
            QueryOutput::Chart(_) => None,
        }
    }
}

pub fn execute(dataset: &Dataset, request: &ActionRequest) -> VizResult<QueryOutput> {
    match &request.action {
        Action::Summarize { columns } => summary::summarize(dataset, columns.as_deref())
            .map(QueryOutput::Summary)
            .map_err(|e| as_execution_error("summary statistics", e)),
        Action::Histogram { column } => chart_output(chart::histogram(dataset, column)),
        Action::Bar { x, y } => chart_output(chart::bar(dataset, x, y.as_deref())),
        Action::Scatter { x, y } => chart_output(chart::scatter(dataset, x, y)),
        Action::Line { x, y } => chart_output(chart::line(dataset, x, y)),
    }
}

fn chart_output(result: VizResult<Chart>) -> VizResult<QueryOutput> {
    let chart = result.map_err(|e| as_execution_error("visualization", e))?;
    tracing::info!(title = %chart.spec.title, points = chart.data.num_rows(), "Generated chart");
    Ok(QueryOutput::Chart(chart))
}

/// Producers fail with `Execution` already; anything else gets wrapped
fn as_execution_error(stage: &str, err: VizError) -> VizError {
    match err {
        VizError::Execution { .. } => err,
        other => VizError::execution(stage, other.to_string()),
    }
}
