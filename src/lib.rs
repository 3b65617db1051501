//! # NL Viz Engine
//!
//! Turns natural-language questions about a CSV dataset into charts and
//! summary tables. A language model picks the action; everything after that
//! (validation, coercion, filtering, execution) is deterministic.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nlviz_engine::{backend_for, SessionConfig, VizSession};
//!
//! # async fn run() -> nlviz_engine::VizResult<()> {
//! let config = SessionConfig::default();
//! let session = VizSession::load_csv("people.csv", config.clone())?;
//! let backend = backend_for(&config);
//!
//! let outcome = session.ask(backend.as_ref(), "histogram of age for adult males").await?;
//! println!("{} ({} rows)", outcome.description, outcome.rows);
//! # Ok(())
//! # }
//! ```
//!
//! ## Pipeline
//!
//! - **Schema extraction**: column types plus date-looking text columns
//! - **Prompting**: schema + query rendered into one instruction
//! - **Response parsing**: JSON pulled out of free-form model text
//! - **Preparation**: column checks and numeric/datetime coercion
//! - **Filtering**: conjunctive column conditions
//! - **Execution**: summary statistics or a renderer-neutral chart
//!
//! A manual builder produces the same requests without a model.

// Internal modules
pub mod error;
pub mod config;
pub mod data;
pub mod llm;
pub mod action;
pub mod filter;
pub mod execution;
pub mod session;
pub mod result_format;

// Public API - Main types users need
pub use error::{ErrorCategory, VizError, VizResult};
pub use config::{Provider, SessionConfig};
pub use data::{ColumnType, Dataset, DatasetSchema};
pub use action::{
    build_manual_action, Action, ActionKind, ActionPreparer, ActionRequest, FilterCondition,
    FilterOp, ManualOutcome, ManualSelection,
};
pub use filter::apply_filters;
pub use execution::{execute, Chart, ChartSpec, QueryOutput, SummaryTable};
pub use llm::{backend_for, build_prompt, parse_llm_response, CompletionBackend};
pub use session::{QueryOutcome, VizSession};
pub use result_format::{format_outcome, ResultFormat};
