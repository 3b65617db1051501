//! Action: structured description of a requested chart or summary
//!
//! This is what the response parser and the manual builder both produce.
//! Each variant carries exactly its required parameters, so an `Action` value
//! is always well-formed; whether its columns exist in the live dataset is
//! checked later by the preparer.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Action {
    /// Distribution of a single numeric column
    Histogram { column: String },

    /// Category comparison; counts when `y` is absent
    Bar {
        x: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        y: Option<String>,
    },

    /// Relationship between two numeric columns
    Scatter { x: String, y: String },

    /// Value column against a time-like column
    Line { x: String, y: String },

    /// Statistics table; `None` means every column
    Summarize {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        columns: Option<Vec<String>>,
    },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Histogram { .. } => ActionKind::Histogram,
            Action::Bar { .. } => ActionKind::Bar,
            Action::Scatter { .. } => ActionKind::Scatter,
            Action::Line { .. } => ActionKind::Line,
            Action::Summarize { .. } => ActionKind::Summarize,
        }
    }

    /// Columns the action names, in parameter order
    pub fn referenced_columns(&self) -> Vec<&str> {
        match self {
            Action::Histogram { column } => vec![column.as_str()],
            Action::Bar { x, y } => {
                let mut cols = vec![x.as_str()];
                if let Some(y) = y {
                    cols.push(y.as_str());
                }
                cols
            }
            Action::Scatter { x, y } | Action::Line { x, y } => vec![x.as_str(), y.as_str()],
            Action::Summarize { columns } => columns
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|c| c.as_str())
                .collect(),
        }
    }
}

/// Action type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Histogram,
    Bar,
    Scatter,
    Line,
    Summarize,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Histogram,
        ActionKind::Bar,
        ActionKind::Scatter,
        ActionKind::Line,
        ActionKind::Summarize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Histogram => "histogram",
            ActionKind::Bar => "bar",
            ActionKind::Scatter => "scatter",
            ActionKind::Line => "line",
            ActionKind::Summarize => "summarize",
        }
    }

    pub fn is_chart(&self) -> bool {
        !matches!(self, ActionKind::Summarize)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    /// Case-insensitive; the error carries the unrecognized name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        ActionKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == lowered)
            .ok_or(lowered)
    }
}

/// Comparison operator allowed in filter conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FilterOp {
    #[default]
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
}

impl FilterOp {
    pub const ALL: [FilterOp; 5] = [FilterOp::Eq, FilterOp::Gte, FilterOp::Lte, FilterOp::Gt, FilterOp::Lt];

    pub fn symbol(&self) -> &'static str {
        match self {
            FilterOp::Eq => "==",
            FilterOp::Gte => ">=",
            FilterOp::Lte => "<=",
            FilterOp::Gt => ">",
            FilterOp::Lt => "<",
        }
    }

    pub fn parse(symbol: &str) -> Option<Self> {
        FilterOp::ALL.iter().copied().find(|op| op.symbol() == symbol)
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Single column/operator/value predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub column: String,
    #[serde(default)]
    pub operator: FilterOp,
    pub value: serde_json::Value,
}

impl FilterCondition {
    pub fn new(column: impl Into<String>, operator: FilterOp, value: impl Into<serde_json::Value>) -> Self {
        Self {
            column: column.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn equals(column: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self::new(column, FilterOp::Eq, value)
    }
}

impl fmt::Display for FilterCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            serde_json::Value::String(s) => write!(f, "{} {} {}", self.column, self.operator, s),
            other => write!(f, "{} {} {}", self.column, self.operator, other),
        }
    }
}

pub const DEFAULT_DESCRIPTION: &str = "No description provided.";

/// An action plus its presentation text and optional filters; consumed once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: Action,
    pub description: String,
    #[serde(default)]
    pub filters: Vec<FilterCondition>,
}

impl ActionRequest {
    pub fn new(action: Action, description: impl Into<String>) -> Self {
        Self {
            action,
            description: description.into(),
            filters: Vec::new(),
        }
    }

    pub fn with_filters(mut self, filters: Vec<FilterCondition>) -> Self {
        self.filters = filters;
        self
    }
}
