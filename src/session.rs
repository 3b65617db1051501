//! Session - one loaded dataset plus its configuration, driving the
//! query → action → result pipeline
//!
//! A query runs strictly in sequence: prompt, model call, parse, prepare,
//! filter, execute. The first failing stage ends the query with its error.
//! The session's dataset is never modified; every stage works on copies.

use crate::action::manual::{build_manual_action, ManualOutcome, ManualSelection};
use crate::action::model::{ActionRequest, FilterCondition};
use crate::action::validators::ActionPreparer;
use crate::config::SessionConfig;
use crate::data::csv_loader::{load_csv_path, validate_dataset};
use crate::data::dataset::Dataset;
use crate::data::schema::{extract_schema, DatasetSchema};
use crate::error::VizResult;
use crate::execution::dispatcher::{execute, QueryOutput};
use crate::filter::apply_filters;
use crate::llm::backend::CompletionBackend;
use crate::llm::prompt::build_prompt;
use crate::llm::response_parser::parse_llm_response;
use std::path::Path;
use tracing::{debug, info};

/// Result of one successful query
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub description: String,
    pub output: QueryOutput,
    pub filters_applied: Vec<FilterCondition>,
    /// Rows left after filtering
    pub rows: usize,
}

pub struct VizSession {
    config: SessionConfig,
    dataset: Dataset,
    schema: DatasetSchema,
    preparer: ActionPreparer,
}

impl VizSession {
    /// Wrap an already-loaded dataset; fails on empty data
    pub fn from_dataset(dataset: Dataset, config: SessionConfig) -> VizResult<Self> {
        validate_dataset(&dataset)?;
        let schema = extract_schema(&dataset);
        info!(
            rows = dataset.num_rows(),
            columns = dataset.num_columns(),
            time_columns = ?schema.time_columns,
            "Session dataset ready"
        );
        Ok(Self {
            config,
            dataset,
            schema,
            preparer: ActionPreparer::new(),
        })
    }

    pub fn load_csv(path: impl AsRef<Path>, config: SessionConfig) -> VizResult<Self> {
        let dataset = load_csv_path(path)?;
        Self::from_dataset(dataset, config)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn schema(&self) -> &DatasetSchema {
        &self.schema
    }

    /// The instruction that would be sent for `query`
    pub fn prompt(&self, query: &str) -> String {
        build_prompt(&self.schema, query)
    }

    /// Ask the model to interpret `query`, then run the resulting action
    pub async fn ask(&self, backend: &dyn CompletionBackend, query: &str) -> VizResult<QueryOutcome> {
        let request = self.interpret(backend, query).await?;
        self.run_action(&request)
    }

    /// Model round-trip only: prompt → completion → parsed request
    pub async fn interpret(&self, backend: &dyn CompletionBackend, query: &str) -> VizResult<ActionRequest> {
        let prompt = self.prompt(query);
        debug!(backend = backend.name(), prompt_chars = prompt.len(), "Sending prompt");
        let response = backend.complete(&prompt).await?;
        debug!(response_chars = response.len(), "Received model response");
        let request = parse_llm_response(Some(&response))?;
        info!(action = %request.action.kind(), filters = request.filters.len(), "Interpreted query");
        Ok(request)
    }

    /// Prepare → filter → execute
    pub fn run_action(&self, request: &ActionRequest) -> VizResult<QueryOutcome> {
        let prepared = self.preparer.prepare(&self.dataset, &request.action)?;
        let filtered = apply_filters(&prepared, &request.filters)?;
        let output = execute(&filtered, request)?;
        Ok(QueryOutcome {
            description: request.description.clone(),
            output,
            filters_applied: request.filters.clone(),
            rows: filtered.num_rows(),
        })
    }

    /// Build an action from explicit choices and run it; `Ok(None)` when the
    /// dataset cannot support the selection
    pub fn manual(&self, selection: &ManualSelection) -> VizResult<Option<QueryOutcome>> {
        match build_manual_action(&self.dataset, selection) {
            ManualOutcome::Ready(request) => self.run_action(&request).map(Some),
            ManualOutcome::Unavailable(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::model::{Action, ActionKind};
    use crate::data::csv_loader::load_csv_str;
    use crate::error::VizError;
    use async_trait::async_trait;

    struct CannedBackend(&'static str);

    #[async_trait]
    impl CompletionBackend for CannedBackend {
        fn name(&self) -> &str {
            "canned"
        }

        async fn complete(&self, _prompt: &str) -> VizResult<String> {
            Ok(self.0.to_string())
        }
    }

    fn session() -> VizSession {
        let dataset = load_csv_str("name,score\nann,3\nbob,\ncy,5\n").unwrap();
        VizSession::from_dataset(dataset, SessionConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_ask_runs_pipeline() {
        let backend = CannedBackend(r#"{"action": {"type": "summarize", "columns": ["score"]}, "description": "Scores"}"#);
        let outcome = session().ask(&backend, "summarize scores").await.unwrap();
        assert_eq!(outcome.description, "Scores");
        assert_eq!(outcome.rows, 3);
        let table = outcome.output.as_summary().unwrap();
        assert_eq!(table.rows[0].count, 2);
        assert_eq!(table.rows[0].missing, 1);
    }

    #[tokio::test]
    async fn test_unparseable_reply_offers_manual_fallback() {
        let backend = CannedBackend("I am not sure what you mean.");
        let err = session().ask(&backend, "??").await.unwrap_err();
        assert_eq!(err, VizError::Unparseable);
        assert!(err.offers_manual_fallback());
    }

    #[test]
    fn test_manual_unavailable_is_not_an_error() {
        let outcome = session().manual(&ManualSelection::new(ActionKind::Scatter)).unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn test_session_dataset_is_untouched() {
        let session = session();
        let request = ActionRequest::new(Action::Histogram { column: "name".into() }, "");
        assert!(session.run_action(&request).is_err());
        assert_eq!(session.dataset().num_rows(), 3);
        assert_eq!(session.schema().columns.len(), 2);
    }
}
