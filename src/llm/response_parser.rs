//! Response Parser - Extracts an ActionRequest from free-form model output
//!
//! Models wrap JSON in prose and code fences, so extraction tries several
//! strategies in a fixed order and the first one yielding a JSON object wins.
//! Nothing found is a typed `Unparseable` error, never partial data.

use crate::action::model::{
    Action, ActionKind, ActionRequest, FilterCondition, FilterOp, DEFAULT_DESCRIPTION,
};
use crate::error::{VizError, VizResult};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Which extraction strategy produced the JSON object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// ```json ... ``` block
    FencedBlock,
    /// First brace-balanced span (nesting-bounded regex)
    BalancedSpan,
    /// Everything from the first '{' to the last '}'
    OuterBraces,
}

const FENCED_JSON_PATTERN: &str = r"```(?i:json)\s*([\s\S]*?)\s*```";

// Matches objects nested at most four levels deep
const BALANCED_SPAN_PATTERN: &str =
    r"\{(?:[^{}]|\{(?:[^{}]|\{(?:[^{}]|\{[^{}]*\})*\})*\})*\}";

fn fenced_json_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(FENCED_JSON_PATTERN).ok()).as_ref()
}

fn balanced_span_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(BALANCED_SPAN_PATTERN).ok()).as_ref()
}

fn parse_object(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn candidate(text: &str, strategy: ExtractionStrategy) -> Option<&str> {
    match strategy {
        ExtractionStrategy::FencedBlock => fenced_json_re()?
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str()),
        ExtractionStrategy::BalancedSpan => balanced_span_re()?.find(text).map(|m| m.as_str()),
        ExtractionStrategy::OuterBraces => {
            let start = text.find('{')?;
            let end = text.rfind('}')?;
            (end > start).then(|| &text[start..=end])
        }
    }
}

/// Find the first JSON object in `text`.
///
/// Strategies run in order. An object carrying an `action` key wins
/// immediately; otherwise the earliest object found is returned so the caller
/// can report what was wrong with it. The balanced-span regex can latch onto
/// an inner object when the outer one is deeply nested or has braces inside
/// strings, which is why a later strategy may still be consulted.
pub fn extract_json_object(text: &str) -> Option<(Map<String, Value>, ExtractionStrategy)> {
    let mut first_object = None;
    for strategy in [
        ExtractionStrategy::FencedBlock,
        ExtractionStrategy::BalancedSpan,
        ExtractionStrategy::OuterBraces,
    ] {
        let Some(map) = candidate(text, strategy).and_then(parse_object) else {
            continue;
        };
        if map.contains_key("action") {
            return Some((map, strategy));
        }
        if first_object.is_none() {
            first_object = Some((map, strategy));
        }
    }
    first_object
}

/// Parse a model response into an action request.
///
/// `None`/blank input is reported as `EmptyResponse`; text without an
/// extractable JSON object is `Unparseable`; everything else wrong with the
/// action is an `InvalidAction` naming the offending field or value.
pub fn parse_llm_response(response: Option<&str>) -> VizResult<ActionRequest> {
    let text = match response {
        Some(text) if !text.trim().is_empty() => text,
        _ => return Err(VizError::EmptyResponse),
    };

    let (parsed, strategy) = extract_json_object(text).ok_or_else(|| {
        tracing::warn!(length = text.len(), "No JSON object found in LLM response");
        VizError::Unparseable
    })?;
    tracing::debug!(?strategy, "Extracted JSON from LLM response");

    let description = match parsed.get("description") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => DEFAULT_DESCRIPTION.to_string(),
        Some(other) => other.to_string(),
    };

    let action_obj = match parsed.get("action") {
        Some(Value::Object(obj)) if obj.contains_key("type") => obj,
        _ => {
            return Err(VizError::invalid_action(
                "Invalid action structure in LLM response.",
            ))
        }
    };
    let params = merged_parameters(action_obj);

    let type_name = action_obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| VizError::invalid_action("Invalid action structure in LLM response."))?;
    let kind: ActionKind = type_name
        .parse()
        .map_err(|name: String| VizError::invalid_action(format!("Unknown action type: {}", name)))?;

    let filters = parse_filters(params.get("filter").or_else(|| params.get("filters")))?;
    let action = build_action(kind, &params)?;

    Ok(ActionRequest {
        action,
        description,
        filters,
    })
}

/// Action keys, with anything nested under `parameters` as a fallback
fn merged_parameters(action: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = match action.get("parameters") {
        Some(Value::Object(nested)) => nested.clone(),
        _ => Map::new(),
    };
    for (key, value) in action {
        if key != "parameters" {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

fn string_param(params: &Map<String, Value>, key: &str) -> VizResult<Option<String>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(VizError::invalid_action(format!(
            "Action parameter '{}' must be a column name.",
            key
        ))),
    }
}

fn build_action(kind: ActionKind, params: &Map<String, Value>) -> VizResult<Action> {
    match kind {
        ActionKind::Histogram => {
            let column = string_param(params, "column")?.ok_or_else(|| {
                VizError::invalid_action("Histogram action missing 'column' parameter.")
            })?;
            Ok(Action::Histogram { column })
        }
        ActionKind::Bar => {
            let x = string_param(params, "x")?
                .ok_or_else(|| VizError::invalid_action("Bar chart action missing 'x' parameter."))?;
            let y = string_param(params, "y")?;
            Ok(Action::Bar { x, y })
        }
        ActionKind::Scatter => match (string_param(params, "x")?, string_param(params, "y")?) {
            (Some(x), Some(y)) => Ok(Action::Scatter { x, y }),
            _ => Err(VizError::invalid_action(
                "Scatter plot action missing 'x' or 'y' parameter.",
            )),
        },
        ActionKind::Line => match (string_param(params, "x")?, string_param(params, "y")?) {
            (Some(x), Some(y)) => Ok(Action::Line { x, y }),
            _ => Err(VizError::invalid_action(
                "Line chart action missing 'x' or 'y' parameter.",
            )),
        },
        ActionKind::Summarize => {
            let columns = match params.get("columns") {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(vec![s.clone()]),
                Some(Value::Array(items)) => {
                    let mut names = Vec::with_capacity(items.len());
                    for item in items {
                        let name = item.as_str().ok_or_else(|| {
                            VizError::invalid_action(
                                "Summarize action 'columns' must be a list of column names.",
                            )
                        })?;
                        names.push(name.to_string());
                    }
                    Some(names).filter(|n: &Vec<String>| !n.is_empty())
                }
                Some(_) => {
                    return Err(VizError::invalid_action(
                        "Summarize action 'columns' must be a list of column names.",
                    ))
                }
            };
            Ok(Action::Summarize { columns })
        }
    }
}

fn parse_filters(raw: Option<&Value>) -> VizResult<Vec<FilterCondition>> {
    let entries = match raw {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            return Err(VizError::invalid_action(
                "Filter must be a list of condition dictionaries.",
            ))
        }
    };

    let mut filters = Vec::with_capacity(entries.len());
    for entry in entries {
        let condition = entry.as_object().ok_or_else(|| {
            VizError::invalid_action("Each filter condition must be a dictionary.")
        })?;

        let (column, value) = match (condition.get("column"), condition.get("value")) {
            (Some(column), Some(value)) => (column, value),
            _ => {
                return Err(VizError::invalid_action(
                    "Filter condition missing 'column' or 'value' parameter.",
                ))
            }
        };
        let column = column.as_str().ok_or_else(|| {
            VizError::invalid_action("Filter condition 'column' must be a column name.")
        })?;

        let operator = match condition.get("operator") {
            None | Some(Value::Null) => FilterOp::Eq,
            Some(Value::String(symbol)) => FilterOp::parse(symbol.trim()).ok_or_else(|| {
                VizError::invalid_action(format!("Invalid filter operator: {}", symbol))
            })?,
            Some(other) => {
                return Err(VizError::invalid_action(format!(
                    "Invalid filter operator: {}",
                    other
                )))
            }
        };

        filters.push(FilterCondition {
            column: column.to_string(),
            operator,
            value: value.clone(),
        });
    }
    Ok(filters)
}
