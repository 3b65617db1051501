//! Prompt Builder - renders schema + time hints + user query into one instruction
//!
//! Pure and deterministic: the same schema and query always give the same text.

use crate::data::schema::DatasetSchema;

pub const NO_TIME_COLUMNS: &str = "None detected";

/// Build the instruction sent to the model
pub fn build_prompt(schema: &DatasetSchema, user_query: &str) -> String {
    let schema_text = schema
        .columns
        .iter()
        .map(|c| format!("- {}: {}", c.name, c.column_type))
        .collect::<Vec<_>>()
        .join("\n");

    let time_text = if schema.time_columns.is_empty() {
        NO_TIME_COLUMNS.to_string()
    } else {
        schema.time_columns.join(", ")
    };

    format!(r#"You are a data visualization and analysis assistant. Translate the user's request about a dataset into one structured action.

**Dataset Schema:**
{schema_text}

**Time-based columns:** {time_text}

**User Query:** "{user_query}"

Pick the single most appropriate visualization or analysis and answer with JSON in exactly this shape:

```json
{{
  "action": {{
    "type": "histogram|bar|scatter|line|summarize",
    "<parameter>": "<column name>"
  }},
  "description": "<one or two sentences explaining what the result shows>"
}}
```

**Action types and their parameters (put parameters directly inside "action"):**
- "histogram": distribution of one numeric column. MUST include "column".
- "bar": comparison across categories. MUST include "x" (category column); "y" (numeric value column) is optional, counts are used when it is absent.
- "scatter": relationship between two numeric columns. MUST include "x" and "y".
- "line": values over time. MUST include "x" (time column) and "y" (value column).
- "summarize": statistical summary. Optional "columns" (list of column names); omit it to summarize every column.

**Filtering (optional):**
If the request only concerns part of the data, add a "filter" list inside "action". Each condition is an object with "column", "value" and an optional "operator" (one of "==", ">=", "<=", ">", "<"; default "=="):
  "filter": [
    {{"column": "sex", "value": "male"}},
    {{"column": "age", "operator": ">=", "value": 18}}
  ]
Conditions are combined with AND. Use numbers for numeric comparisons.

**Rules:**
- Always include every required parameter for the chosen action type.
- If the request does not name a column directly (for example "histogram of adult males"), infer the most relevant column from the schema (here: "age", filtered to sex == "male" and age >= 18) and say so in the description.
- Only use column names that appear in the schema above, spelled exactly. Never invent columns.
- Prefer the time-based columns listed above for the "x" of a line chart.
- Return only the JSON object, with no text before or after it.
"#)
}
