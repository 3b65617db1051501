//! Unified error type for the visualization pipeline
//! Every variant is a leaf-level, user-facing message; the Display text is what
//! a front end shows verbatim.
use thiserror::Error;

/// Coarse error categories, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// File unreadable, model unreachable
    Transport,
    /// Model output not extractable as JSON
    Parse,
    /// Missing required action fields, unknown action/operator
    Structural,
    /// Column absent, coercion failure, filter mismatch
    Validation,
    /// Failure inside the summary or chart producer
    Execution,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VizError {
    /// CSV could not be read or parsed
    #[error("Error loading data: {message}")]
    DataLoad {
        message: String,
        path: Option<String>,
    },

    /// Loaded data failed minimal validity checks
    #[error("{message}")]
    InvalidData { message: String },

    /// Model backend failure (missing key, transport, non-200 status)
    #[error("{provider} error: {message}")]
    Backend {
        provider: String,
        message: String,
        status: Option<u16>,
    },

    #[error("No response received from the LLM.")]
    EmptyResponse,

    #[error("Could not parse LLM response as JSON.")]
    Unparseable,

    /// Action JSON is structurally wrong (missing fields, unknown type/operator)
    #[error("{message}")]
    InvalidAction { message: String },

    #[error("Column '{column}' not found in the dataset.")]
    ColumnNotFound { column: String },

    #[error("{}", coercion_message(.axis.as_deref(), .column, .expected))]
    Coercion {
        column: String,
        expected: String,
        axis: Option<String>,
    },

    #[error("Filter column '{column}' not found in dataset.")]
    FilterColumnNotFound { column: String },

    #[error("Error applying filter: {message}")]
    FilterApplication { message: String },

    #[error("Error generating {stage}: {message}")]
    Execution { stage: String, message: String },
}

fn coercion_message(axis: Option<&str>, column: &str, expected: &str) -> String {
    match axis {
        Some(axis) => format!(
            "{}-axis column '{}' is not {} and could not be converted.",
            axis, column, expected
        ),
        None => format!("Column '{}' is not {} and could not be converted.", column, expected),
    }
}

impl VizError {
    pub fn data_load(message: impl Into<String>) -> Self {
        Self::DataLoad {
            message: message.into(),
            path: None,
        }
    }

    pub fn data_load_with_path(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::DataLoad {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    pub fn backend(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            provider: provider.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn backend_status(provider: impl Into<String>, status: u16) -> Self {
        Self::Backend {
            provider: provider.into(),
            message: format!("API error: Status {}", status),
            status: Some(status),
        }
    }

    pub fn invalid_action(message: impl Into<String>) -> Self {
        Self::InvalidAction {
            message: message.into(),
        }
    }

    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }

    pub fn filter_application(message: impl Into<String>) -> Self {
        Self::FilterApplication {
            message: message.into(),
        }
    }

    pub fn execution(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Taxonomy bucket for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DataLoad { .. } | Self::InvalidData { .. } | Self::Backend { .. } => {
                ErrorCategory::Transport
            }
            Self::EmptyResponse | Self::Unparseable => ErrorCategory::Parse,
            Self::InvalidAction { .. } => ErrorCategory::Structural,
            Self::ColumnNotFound { .. }
            | Self::Coercion { .. }
            | Self::FilterColumnNotFound { .. }
            | Self::FilterApplication { .. } => ErrorCategory::Validation,
            Self::Execution { .. } => ErrorCategory::Execution,
        }
    }

    /// Parse failures are recoverable by picking the action by hand
    pub fn offers_manual_fallback(&self) -> bool {
        self.category() == ErrorCategory::Parse
    }

    /// Column named by a validation error, if any
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::ColumnNotFound { column }
            | Self::Coercion { column, .. }
            | Self::FilterColumnNotFound { column } => Some(column),
            _ => None,
        }
    }
}

impl From<csv::Error> for VizError {
    fn from(err: csv::Error) -> Self {
        Self::data_load(err.to_string())
    }
}

impl From<std::io::Error> for VizError {
    fn from(err: std::io::Error) -> Self {
        Self::data_load(err.to_string())
    }
}

/// Result type alias for pipeline operations
pub type VizResult<T> = Result<T, VizError>;
