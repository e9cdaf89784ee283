//! Interactive line-oriented chat front end.

use std::future::Future;
use std::sync::Arc;

use proto::{CatalogError, Model, Role, SessionEvent, Turn};
use session::{ChatSession, SendOutcome};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

const PROMPT: &str = "nexus> ";

const HELP: &str = "\
Commands:
  /models        list available models
  /model <id>    switch the active model
  /reload        fetch the model directory again
  /clear         start a new conversation (keeps the model)
  /history       print the transcript
  /help          show this help
  /quit, /exit   leave
Anything else is sent to the active model.";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Quit,
    Help,
    Models,
    Select(String),
    Reload,
    Clear,
    History,
    Prompt(String),
    Unknown(String),
}

/// Parses an input line. Blank lines yield `None`.
pub fn parse_line(raw: &str) -> Option<ReplCommand> {
    let line = raw.trim();
    if line.is_empty() {
        return None;
    }
    if !line.starts_with('/') {
        return Some(ReplCommand::Prompt(line.to_string()));
    }

    let (name, arg) = match line.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (line, ""),
    };
    let command = match name {
        "/quit" | "/exit" => ReplCommand::Quit,
        "/help" => ReplCommand::Help,
        "/models" => ReplCommand::Models,
        "/model" if arg.is_empty() => ReplCommand::Models,
        "/model" => ReplCommand::Select(arg.to_string()),
        "/reload" => ReplCommand::Reload,
        "/clear" => ReplCommand::Clear,
        "/history" => ReplCommand::History,
        other => ReplCommand::Unknown(other.to_string()),
    };
    Some(command)
}

/// Renders a session notification for the terminal.
///
/// User turns are not echoed; the operator just typed them.
pub fn render_event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::CatalogLoaded { models } if models.is_empty() => {
            Some("No models available.".to_string())
        }
        SessionEvent::CatalogLoaded { models } => Some(format!(
            "{} models available. Type /models to list them.",
            models.len()
        )),
        SessionEvent::ModelChanged { model } => Some(format!("Active model: {}", model_label(model))),
        SessionEvent::TurnAppended { turn } => match turn.role {
            Role::User => None,
            Role::Assistant | Role::SystemError => Some(format!("\n{}\n", turn.content)),
        },
        SessionEvent::PendingChanged { pending: true } => Some("… thinking".to_string()),
        SessionEvent::PendingChanged { pending: false } => None,
        SessionEvent::HistoryCleared => Some("Conversation cleared.".to_string()),
        SessionEvent::RequestFailed => None,
    }
}

fn model_label(model: &Model) -> String {
    if model.icon.is_empty() {
        format!("{} ({})", model.name, model.id)
    } else {
        format!("{} {} ({})", model.icon, model.name, model.id)
    }
}

/// Lists models, marking the active one.
pub fn format_model_list(models: &[Model], current: Option<&Model>) -> String {
    if models.is_empty() {
        return "No models available.".to_string();
    }
    models
        .iter()
        .map(|model| {
            let marker = if current.is_some_and(|c| c.id == model.id) {
                "*"
            } else {
                " "
            };
            match &model.provider {
                Some(provider) => format!("{marker} {}  [{provider}]", model_label(model)),
                None => format!("{marker} {}", model_label(model)),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prints the transcript with role prefixes.
pub fn format_history(turns: &[Turn]) -> String {
    if turns.is_empty() {
        return "(empty conversation)".to_string();
    }
    turns
        .iter()
        .map(|turn| format!("[{}] {}", turn.role, turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Inline fallback notice for a failed directory fetch.
pub fn catalog_error_notice(err: &CatalogError) -> String {
    format!("Error loading models: {err}")
}

/// Operator-facing notice for a send that did not reach the provider.
///
/// Precondition skips stay silent; only a rejected concurrent send is shown.
fn send_notice(outcome: &SendOutcome) -> Option<&'static str> {
    match outcome {
        SendOutcome::Skipped(reason) => {
            debug!(?reason, "Prompt skipped");
            None
        }
        SendOutcome::Busy => Some("A request is still pending."),
        SendOutcome::Replied(_) | SendOutcome::Failed(_) => None,
    }
}

async fn write_line(out: &mut Stdout, text: &str) -> std::io::Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}

async fn write_prompt(out: &mut Stdout) -> std::io::Result<()> {
    out.write_all(PROMPT.as_bytes()).await?;
    out.flush().await
}

/// Awaits `fut` while rendering session events as they arrive, then
/// flushes whatever is left once it resolves.
async fn drive<F: Future>(
    fut: F,
    events: &mut UnboundedReceiver<SessionEvent>,
    out: &mut Stdout,
) -> std::io::Result<F::Output> {
    tokio::pin!(fut);
    let output = loop {
        tokio::select! {
            output = &mut fut => break output,
            Some(event) = events.recv() => {
                if let Some(text) = render_event(&event) {
                    write_line(out, &text).await?;
                }
            }
        }
    };
    while let Ok(event) = events.try_recv() {
        if let Some(text) = render_event(&event) {
            write_line(out, &text).await?;
        }
    }
    Ok(output)
}

/// Runs the REPL until `/quit` or end of input.
#[cfg_attr(test, allow(dead_code))]
pub async fn run(
    session: Arc<ChatSession>,
    mut events: UnboundedReceiver<SessionEvent>,
) -> anyhow::Result<()> {
    let mut out = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    info!(session = %session.id(), "REPL started");
    write_line(&mut out, "Nexus chat. Type /help for commands.").await?;

    if let Err(err) = drive(session.load_catalog(), &mut events, &mut out).await? {
        write_line(&mut out, &catalog_error_notice(&err)).await?;
    }
    write_prompt(&mut out).await?;

    while let Some(line) = lines.next_line().await? {
        let Some(command) = parse_line(&line) else {
            write_prompt(&mut out).await?;
            continue;
        };
        debug!(?command, "REPL input");

        match command {
            ReplCommand::Quit => break,
            ReplCommand::Help => write_line(&mut out, HELP).await?,
            ReplCommand::Models => {
                let listing =
                    format_model_list(&session.models(), session.current_model().as_ref());
                write_line(&mut out, &listing).await?;
            }
            ReplCommand::Select(id) => {
                let selected = drive(async { session.select_model_by_id(&id) }, &mut events, &mut out)
                    .await?;
                if selected.is_none() {
                    write_line(&mut out, &format!("Unknown model: {id}")).await?;
                }
            }
            ReplCommand::Reload => {
                if let Err(err) = drive(session.load_catalog(), &mut events, &mut out).await? {
                    write_line(&mut out, &catalog_error_notice(&err)).await?;
                }
            }
            ReplCommand::Clear => {
                drive(async { session.clear() }, &mut events, &mut out).await?;
            }
            ReplCommand::History => {
                write_line(&mut out, &format_history(&session.history())).await?;
            }
            ReplCommand::Prompt(text) => {
                let outcome = drive(session.send(&text), &mut events, &mut out).await?;
                if let Some(notice) = send_notice(&outcome) {
                    write_line(&mut out, notice).await?;
                }
            }
            ReplCommand::Unknown(name) => {
                write_line(&mut out, &format!("Unknown command {name}. Type /help.")).await?;
            }
        }
        write_prompt(&mut out).await?;
    }

    info!(session = %session.id(), turns = session.history().len(), "REPL stopped");
    Ok(())
}
