//! Manual Action Builder - builds an ActionRequest from explicit choices
//!
//! Used when the model output could not be parsed, or when the user prefers
//! picking the chart by hand. Choices left empty default to the first option a
//! form would offer. When the dataset cannot support the chosen type the
//! result is `Unavailable`, which callers treat as a quiet no-op.

use crate::action::model::{Action, ActionKind, ActionRequest};
use crate::data::dataset::Dataset;
use crate::data::schema::detect_time_columns;
use serde::{Deserialize, Serialize};

/// User choices for one manual action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualSelection {
    pub kind: ActionKind,
    /// Histogram column
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub x: Option<String>,
    #[serde(default)]
    pub y: Option<String>,
    /// Bar charts aggregate `y` only when this is set
    #[serde(default)]
    pub use_y: bool,
    /// Summary columns; empty means all
    #[serde(default)]
    pub columns: Vec<String>,
}

impl ManualSelection {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            column: None,
            x: None,
            y: None,
            use_y: false,
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn x(mut self, x: impl Into<String>) -> Self {
        self.x = Some(x.into());
        self
    }

    pub fn y(mut self, y: impl Into<String>) -> Self {
        self.y = Some(y.into());
        self.use_y = true;
        self
    }

    pub fn columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }
}

/// Result of a manual build
#[derive(Debug, Clone, PartialEq)]
pub enum ManualOutcome {
    Ready(ActionRequest),
    /// Not enough suitable columns; carries the reason for display
    Unavailable(String),
}

impl ManualOutcome {
    pub fn request(self) -> Option<ActionRequest> {
        match self {
            ManualOutcome::Ready(request) => Some(request),
            ManualOutcome::Unavailable(_) => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ManualOutcome::Ready(_))
    }
}

pub fn build_manual_action(dataset: &Dataset, selection: &ManualSelection) -> ManualOutcome {
    let all_columns = dataset.column_names();
    let numeric = dataset.numeric_column_names();

    let outcome = match selection.kind {
        ActionKind::Histogram => {
            match selection
                .column
                .clone()
                .or_else(|| numeric.first().cloned())
                .or_else(|| all_columns.first().cloned())
            {
                Some(column) => ready(
                    Action::Histogram {
                        column: column.clone(),
                    },
                    format!("Distribution of {}", column),
                ),
                None => unavailable("The dataset has no columns to plot."),
            }
        }
        ActionKind::Bar => match selection.x.clone().or_else(|| all_columns.first().cloned()) {
            None => unavailable("The dataset has no columns to plot."),
            Some(x) if !selection.use_y => {
                let description = format!("Bar chart showing count of {}", x);
                ready(Action::Bar { x, y: None }, description)
            }
            Some(x) => match selection.y.clone().or_else(|| numeric.first().cloned()) {
                Some(y) => {
                    let description = format!("Bar chart showing {} by {}", y, x);
                    ready(Action::Bar { x, y: Some(y) }, description)
                }
                None => unavailable("Bar chart values need at least one numeric column."),
            },
        },
        ActionKind::Scatter => {
            if numeric.len() < 2 {
                unavailable("Scatter plots need at least two numeric columns.")
            } else {
                let x = selection.x.clone().unwrap_or_else(|| numeric[0].clone());
                let y = selection
                    .y
                    .clone()
                    .or_else(|| numeric.iter().find(|c| **c != x).cloned());
                match y {
                    Some(y) => {
                        let description =
                            format!("Scatter plot showing relationship between {} and {}", x, y);
                        ready(Action::Scatter { x, y }, description)
                    }
                    None => unavailable("Scatter plots need at least two numeric columns."),
                }
            }
        }
        ActionKind::Line => {
            let time_columns = detect_time_columns(dataset);
            let x_options = if time_columns.is_empty() {
                &all_columns
            } else {
                &time_columns
            };
            match (
                selection.x.clone().or_else(|| x_options.first().cloned()),
                selection.y.clone().or_else(|| numeric.first().cloned()),
            ) {
                (Some(x), Some(y)) => {
                    let description = format!("Line chart showing {} over {}", y, x);
                    ready(Action::Line { x, y }, description)
                }
                (None, _) => unavailable("The dataset has no columns to plot."),
                (_, None) => unavailable("Line charts need at least one numeric column."),
            }
        }
        ActionKind::Summarize => {
            if selection.columns.is_empty() {
                ready(
                    Action::Summarize { columns: None },
                    "Summary statistics for all columns".to_string(),
                )
            } else {
                let description =
                    format!("Summary statistics for columns: {}", selection.columns.join(", "));
                ready(
                    Action::Summarize {
                        columns: Some(selection.columns.clone()),
                    },
                    description,
                )
            }
        }
    };

    if let ManualOutcome::Unavailable(reason) = &outcome {
        tracing::warn!(kind = %selection.kind, "Manual action unavailable: {}", reason);
    }
    outcome
}

fn ready(action: Action, description: String) -> ManualOutcome {
    ManualOutcome::Ready(ActionRequest::new(action, description))
}

fn unavailable(reason: &str) -> ManualOutcome {
    ManualOutcome::Unavailable(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
    use std::sync::Arc;

    fn dataset(with_second_numeric: bool) -> Dataset {
        let mut columns = vec![
            ("city".to_string(), Arc::new(StringArray::from(vec!["Oslo", "Rome"])) as ArrayRef),
            ("day".to_string(), Arc::new(StringArray::from(vec!["2024-03-01", "2024-03-02"])) as ArrayRef),
            ("temp".to_string(), Arc::new(Float64Array::from(vec![3.5, 14.0])) as ArrayRef),
        ];
        if with_second_numeric {
            columns.push(("rain".to_string(), Arc::new(Int64Array::from(vec![4, 0])) as ArrayRef));
        }
        Dataset::from_columns(columns).unwrap()
    }

    #[test]
    fn test_histogram_defaults_to_first_numeric() {
        let outcome = build_manual_action(&dataset(false), &ManualSelection::new(ActionKind::Histogram));
        let request = outcome.request().unwrap();
        assert_eq!(request.action, Action::Histogram { column: "temp".into() });
        assert_eq!(request.description, "Distribution of temp");
    }

    #[test]
    fn test_bar_descriptions() {
        let ds = dataset(false);
        let counts = build_manual_action(&ds, &ManualSelection::new(ActionKind::Bar)).request().unwrap();
        assert_eq!(counts.action, Action::Bar { x: "city".into(), y: None });
        assert_eq!(counts.description, "Bar chart showing count of city");

        let sums = build_manual_action(&ds, &ManualSelection::new(ActionKind::Bar).y("temp"))
            .request()
            .unwrap();
        assert_eq!(sums.description, "Bar chart showing temp by city");
    }

    #[test]
    fn test_scatter_needs_two_numeric_columns() {
        let outcome = build_manual_action(&dataset(false), &ManualSelection::new(ActionKind::Scatter));
        assert!(matches!(outcome, ManualOutcome::Unavailable(_)));

        let outcome = build_manual_action(&dataset(true), &ManualSelection::new(ActionKind::Scatter));
        let request = outcome.request().unwrap();
        assert_eq!(request.action, Action::Scatter { x: "temp".into(), y: "rain".into() });
        assert_eq!(
            request.description,
            "Scatter plot showing relationship between temp and rain"
        );
    }

    #[test]
    fn test_line_prefers_time_columns() {
        let request = build_manual_action(&dataset(false), &ManualSelection::new(ActionKind::Line))
            .request()
            .unwrap();
        assert_eq!(request.action, Action::Line { x: "day".into(), y: "temp".into() });
        assert_eq!(request.description, "Line chart showing temp over day");
    }

    #[test]
    fn test_summarize_descriptions() {
        let ds = dataset(false);
        let all = build_manual_action(&ds, &ManualSelection::new(ActionKind::Summarize))
            .request()
            .unwrap();
        assert_eq!(all.description, "Summary statistics for all columns");

        let some = build_manual_action(
            &ds,
            &ManualSelection::new(ActionKind::Summarize).columns(vec!["temp".into(), "city".into()]),
        )
        .request()
        .unwrap();
        assert_eq!(some.description, "Summary statistics for columns: temp, city");
        assert_eq!(
            some.action,
            Action::Summarize {
                columns: Some(vec!["temp".into(), "city".into()])
            }
        );
    }
}
