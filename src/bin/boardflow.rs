//! Command-line front end: run one command against a board snapshot and
//! print the resulting operation requests as JSON.
//!
//! Usage: boardflow [--board state.json] [--model NAME] "<command>"
//! Requires OPENAI_API_KEY.

use std::fs;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;

use boardflow::llm::OpenAiCompletion;
use boardflow::{BoardState, Dispatcher};

const DEFAULT_MODEL: &str = "gpt-4o-mini";

struct Args {
    command: String,
    board_path: Option<String>,
    model: String,
}

fn parse_args() -> Result<Args> {
    let mut command = None;
    let mut board_path = None;
    let mut model = DEFAULT_MODEL.to_string();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--board" => {
                board_path = Some(args.next().context("--board needs a file path")?);
            }
            "--model" => {
                model = args.next().context("--model needs a model name")?;
            }
            "--help" | "-h" => {
                bail!("usage: boardflow [--board state.json] [--model NAME] \"<command>\"");
            }
            other if command.is_none() => command = Some(other.to_string()),
            other => bail!("unexpected argument: {other}"),
        }
    }
    Ok(Args {
        command: command.context("missing command argument")?,
        board_path,
        model,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = parse_args()?;

    let board = match &args.board_path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading board state from {path}"))?;
            serde_json::from_str::<BoardState>(&raw)
                .with_context(|| format!("parsing board state from {path}"))?
        }
        None => BoardState::empty(),
    };
    info!(
        "dispatching against a board with {} object(s)",
        board.objects.len()
    );

    let client = Arc::new(OpenAiCompletion::new(args.model));
    let dispatcher =
        Dispatcher::new(client).with_progress(|update| eprintln!("progress: {update}"));
    let outcome = dispatcher.dispatch(&args.command, &board).await?;

    let rendered = serde_json::json!({
        "toolCalls": outcome.tool_calls,
        "summary": outcome.summary,
        "needsFollowUp": outcome.needs_follow_up,
        "remainingTasks": outcome.remaining_tasks,
    });
    println!("{}", serde_json::to_string_pretty(&rendered)?);
    if outcome.needs_follow_up {
        eprintln!(
            "paused: apply the operations above, then resume with the new object ids \
             ({} task(s) remain)",
            outcome.remaining_tasks.len()
        );
    }
    Ok(())
}
