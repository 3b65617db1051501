//! End-to-end tests for the query → action → result pipeline
//!
//! Run with: `cargo test --test pipeline_test`

use async_trait::async_trait;
use nlviz_engine::data::load_csv_str;
use nlviz_engine::execution::ColumnStats;
use nlviz_engine::{
    apply_filters, parse_llm_response, Action, ActionKind, ActionPreparer, CompletionBackend,
    ErrorCategory, FilterCondition, FilterOp, ManualSelection, SessionConfig, VizError, VizResult,
    VizSession,
};
use std::sync::Mutex;

/// Returns a fixed reply and records the prompt it was given
struct MockBackend {
    reply: VizResult<String>,
    prompts: Mutex<Vec<String>>,
}

impl MockBackend {
    fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn failing(err: VizError) -> Self {
        Self {
            reply: Err(err),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, prompt: &str) -> VizResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone()
    }
}

const PEOPLE: &str = "\
name,sex,age,income,joined
Ann,female,34,52000,2021-03-01
Bob,male,41,61000,2020-07-15
Cy,male,15,,2023-01-09
Dee,female,,38000,2022-11-30
Eli,male,19,27000,2019-05-21
Fay,female,72,45000,2018-02-02
";

fn session() -> VizSession {
    let dataset = load_csv_str(PEOPLE).unwrap();
    VizSession::from_dataset(dataset, SessionConfig::default()).unwrap()
}

fn chart_column_i64(outcome: &nlviz_engine::QueryOutcome, column: &str) -> Vec<Option<i64>> {
    use arrow::array::{Array, Int64Array};
    outcome
        .output
        .as_chart()
        .unwrap()
        .data
        .column(column)
        .unwrap()
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap()
        .iter()
        .collect()
}

#[tokio::test]
async fn test_adult_males_histogram() {
    let backend = MockBackend::replying(
        r#"Sure! Here is the action:
```json
{
  "action": {
    "type": "histogram",
    "column": "age",
    "filter": [
      {"column": "sex", "value": "male"},
      {"column": "age", "operator": ">=", "value": 18}
    ]
  },
  "description": "Age distribution of adult males."
}
```"#,
    );
    let session = session();
    let outcome = session.ask(&backend, "histogram of adult males").await.unwrap();

    assert_eq!(outcome.description, "Age distribution of adult males.");
    assert_eq!(outcome.rows, 2);
    assert_eq!(outcome.filters_applied.len(), 2);
    let chart = outcome.output.as_chart().unwrap();
    assert_eq!(chart.spec.title, "Histogram of age");
    assert_eq!(chart_column_i64(&outcome, "age"), vec![Some(41), Some(19)]);

    let prompt = backend.last_prompt().unwrap();
    assert!(prompt.contains("\"histogram of adult males\""));
    assert!(prompt.contains("- age: integer"));
    assert!(prompt.contains("**Time-based columns:** joined"));

    // the session's own data is untouched
    assert_eq!(session.dataset().num_rows(), 6);
}

#[tokio::test]
async fn test_backend_failure_stops_pipeline() {
    let backend = MockBackend::failing(VizError::backend_status("Ollama", 500));
    let err = session().ask(&backend, "anything").await.unwrap_err();
    assert_eq!(err.to_string(), "Ollama error: API error: Status 500");
    assert_eq!(err.category(), ErrorCategory::Transport);
}

#[tokio::test]
async fn test_unknown_action_is_named() {
    let backend = MockBackend::replying(r#"{"action": {"type": "pie", "x": "sex"}}"#);
    let err = session().ask(&backend, "pie of sex").await.unwrap_err();
    assert_eq!(err.to_string(), "Unknown action type: pie");
    assert_eq!(err.category(), ErrorCategory::Structural);
}

#[tokio::test]
async fn test_invented_column_is_named() {
    let backend = MockBackend::replying(r#"{"action": {"type": "scatter", "x": "age", "y": "salary"}}"#);
    let err = session().ask(&backend, "age vs salary").await.unwrap_err();
    assert_eq!(err, VizError::column_not_found("salary"));
}

#[tokio::test]
async fn test_line_over_time() {
    let backend = MockBackend::replying(
        r#"{"action": {"type": "line", "x": "joined", "y": "income"}, "description": "Income by join date"}"#,
    );
    let outcome = session().ask(&backend, "income over time").await.unwrap();
    let chart = outcome.output.as_chart().unwrap();
    assert_eq!(chart.spec.title, "Line Chart of income over joined");
    assert_eq!(chart_column_i64(&outcome, "income").first(), Some(&Some(45000)));
}

#[test]
fn test_not_equal_operator_rejected_before_filtering() {
    let err = parse_llm_response(Some(
        r#"{"action": {"type": "bar", "x": "sex", "filter": [{"column": "sex", "operator": "!=", "value": "male"}]}}"#,
    ))
    .unwrap_err();
    assert_eq!(err.to_string(), "Invalid filter operator: !=");
}

#[test]
fn test_filter_composition_is_intersection() {
    let dataset = load_csv_str(PEOPLE).unwrap();
    let males = FilterCondition::equals("sex", "male");
    let adults = FilterCondition::new("age", FilterOp::Gte, 18);
    let both = apply_filters(&dataset, &[males.clone(), adults.clone()]).unwrap();
    let reversed = apply_filters(&dataset, &[adults, males]).unwrap();
    assert_eq!(both.num_rows(), 2);
    assert_eq!(reversed.num_rows(), 2);
}

#[test]
fn test_summarize_with_missing_value() {
    let dataset = load_csv_str("x,y\n1,a\n2,b\n3,c\n4,d\n,e\n").unwrap();
    let session = VizSession::from_dataset(dataset, SessionConfig::default()).unwrap();
    let request = nlviz_engine::ActionRequest::new(
        Action::Summarize {
            columns: Some(vec!["x".into()]),
        },
        "x stats",
    );
    let outcome = session.run_action(&request).unwrap();
    let row = &outcome.output.as_summary().unwrap().rows[0];
    assert_eq!(row.count, 4);
    assert_eq!(row.missing, 1);
    match &row.stats {
        ColumnStats::Numeric { mean, .. } => assert_eq!(*mean, Some(2.5)),
        other => panic!("expected numeric stats, got {:?}", other),
    }
}

#[test]
fn test_summarize_treats_na_marker_as_missing() {
    let dataset = load_csv_str("x\n1\n2\n3\n4\nNA\n").unwrap();
    let session = VizSession::from_dataset(dataset, SessionConfig::default()).unwrap();
    let request = nlviz_engine::ActionRequest::new(Action::Summarize { columns: None }, "x stats");
    let outcome = session.run_action(&request).unwrap();
    let row = &outcome.output.as_summary().unwrap().rows[0];
    assert_eq!(row.column_type, nlviz_engine::ColumnType::Integer);
    assert_eq!(row.count, 4);
    assert_eq!(row.missing, 1);
    match &row.stats {
        ColumnStats::Numeric { mean, .. } => assert_eq!(*mean, Some(2.5)),
        other => panic!("expected numeric stats, got {:?}", other),
    }
}

#[test]
fn test_duplicate_headers_are_both_summarized() {
    let dataset = load_csv_str("a,a\n1,x\n2,y\n").unwrap();
    let session = VizSession::from_dataset(dataset, SessionConfig::default()).unwrap();
    let request = nlviz_engine::ActionRequest::new(Action::Summarize { columns: None }, "all");
    let outcome = session.run_action(&request).unwrap();
    let table = outcome.output.as_summary().unwrap();
    let columns: Vec<&str> = table.rows.iter().map(|r| r.column.as_str()).collect();
    assert_eq!(columns, vec!["a", "a.1"]);
    assert!(matches!(table.rows[0].stats, ColumnStats::Numeric { .. }));
    assert!(matches!(table.rows[1].stats, ColumnStats::Categorical { .. }));
}

#[test]
fn test_manual_scatter_needs_numeric_columns() {
    let dataset = load_csv_str("city,temp\nOslo,3\nRome,14\n").unwrap();
    let session = VizSession::from_dataset(dataset, SessionConfig::default()).unwrap();
    let outcome = session.manual(&ManualSelection::new(ActionKind::Scatter)).unwrap();
    assert!(outcome.is_none());
}

#[test]
fn test_preparer_accepts_every_kind_on_real_columns() {
    let dataset = load_csv_str(PEOPLE).unwrap();
    let preparer = ActionPreparer::new();
    for action in [
        Action::Histogram { column: "income".into() },
        Action::Bar { x: "sex".into(), y: Some("income".into()) },
        Action::Scatter { x: "age".into(), y: "income".into() },
        Action::Line { x: "joined".into(), y: "age".into() },
        Action::Summarize { columns: None },
    ] {
        assert!(preparer.prepare(&dataset, &action).is_ok(), "rejected {:?}", action);
    }
}
