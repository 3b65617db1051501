use anyhow::{anyhow, bail, Context, Result};
use nlviz_engine::llm::OllamaClient;
use nlviz_engine::{
    backend_for, format_outcome, ActionKind, ManualSelection, Provider, ResultFormat, SessionConfig,
    VizSession,
};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
Type a question about the data, or a command:
  :schema                      show columns, types and time columns
  :health                      check that the Ollama server is reachable
  :manual <type> [key=value]   build an action by hand
                               e.g. :manual bar x=sex y=age
                                    :manual summarize columns=age,income
  :format text|json            switch result output
  :prompt <question>           show the prompt that would be sent
  :help                        this text
  :quit                        exit";

fn load_config(path: Option<&String>) -> Result<SessionConfig> {
    let config = match path {
        Some(path) => SessionConfig::from_file(path)?,
        None => SessionConfig::default(),
    };
    Ok(config.with_env_api_key())
}

/// `:manual histogram column=age`, `:manual bar x=sex y=age`, ...
fn parse_manual(args: &str) -> Result<ManualSelection> {
    let mut parts = args.split_whitespace();
    let kind: ActionKind = parts
        .next()
        .ok_or_else(|| anyhow!("usage: :manual <histogram|bar|scatter|line|summarize> [key=value ...]"))?
        .parse()
        .map_err(|name| anyhow!("Unknown action type: {}", name))?;

    let mut selection = ManualSelection::new(kind);
    for part in parts {
        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| anyhow!("expected key=value, got '{}'", part))?;
        selection = match key {
            "column" => selection.column(value),
            "x" => selection.x(value),
            "y" => selection.y(value),
            "columns" => selection.columns(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            other => bail!("unknown parameter '{}'", other),
        };
    }
    Ok(selection)
}

fn print_schema(session: &VizSession) {
    let schema = session.schema();
    println!("\n Columns ({} rows):", session.dataset().num_rows());
    for column in &schema.columns {
        println!("   {}: {}", column.name, column.column_type);
    }
    if schema.time_columns.is_empty() {
        println!(" Time-based columns: None detected");
    } else {
        println!(" Time-based columns: {}", schema.time_columns.join(", "));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let csv_path = args
        .get(1)
        .ok_or_else(|| anyhow!("usage: {} <file.csv> [config.json]", args[0]))?;
    let config = load_config(args.get(2)).context("Failed to load configuration")?;

    let session = VizSession::load_csv(csv_path, config.clone())
        .with_context(|| format!("Failed to open {}", csv_path))?;
    let backend = backend_for(&config);
    let mut format = ResultFormat::default();

    println!("NL Viz - {} via {}", csv_path, backend.name());
    println!("{}", "=".repeat(80));
    print_schema(&session);
    println!("\n{}\n", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("viz> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let result = match command {
            ":quit" | ":exit" | ":q" => break,
            ":help" => {
                println!("{}", HELP);
                continue;
            }
            ":schema" => {
                print_schema(&session);
                continue;
            }
            ":health" => {
                if config.provider == Provider::Ollama {
                    let client = OllamaClient::from_config(&config.ollama);
                    if client.health_check().await {
                        println!(" Ollama is reachable at {}", client.base_url());
                    } else {
                        println!(" Cannot reach Ollama at {}", client.base_url());
                    }
                } else {
                    println!(" Health check is only available for Ollama");
                }
                continue;
            }
            ":format" => {
                format = match rest.trim() {
                    "json" => ResultFormat::Json,
                    _ => ResultFormat::default(),
                };
                continue;
            }
            ":prompt" => {
                println!("{}", session.prompt(rest.trim()));
                continue;
            }
            ":manual" => match parse_manual(rest) {
                Ok(selection) => match session.manual(&selection) {
                    Ok(Some(outcome)) => Ok(outcome),
                    Ok(None) => {
                        println!(" Not enough suitable columns for a {} action.", selection.kind);
                        continue;
                    }
                    Err(e) => Err(e),
                },
                Err(e) => {
                    println!(" {}", e);
                    continue;
                }
            },
            _ => session.ask(backend.as_ref(), line).await,
        };

        match result {
            Ok(outcome) => match format_outcome(&outcome, format) {
                Ok(text) => println!("\n{}", text),
                Err(e) => println!(" {}", e),
            },
            Err(e) => {
                println!(" {}", e);
                if e.offers_manual_fallback() {
                    println!(" Try choosing the chart yourself with :manual <type>");
                }
            }
        }
    }

    Ok(())
}
