//! Interactive read-eval-print loop against a relay server.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::io::Write as _;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use taskrelay_proto::{ClientCommand, RelayEvent};

use crate::connection::Connection;
use crate::session::{ClientSession, DecisionAction, InputAction, Phase};

const STDIN_RETRY_BACKOFF: Duration = Duration::from_millis(500);

pub async fn run(url: &str) -> anyhow::Result<()> {
    let (conn, mut events) = Connection::connect(url).await?;
    let mut session = ClientSession::new();

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    print_prompt("> ");
    loop {
        tokio::select! {
            line = lines.next_line(), if session.reads_input() => {
                match line {
                    Ok(Some(line)) => {
                        if !handle_line(&conn, &mut session, &line).await? {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(error) => {
                        warn!(%error, "Failed to read stdin");
                        tokio::time::sleep(STDIN_RETRY_BACKOFF).await;
                    }
                }
            }
            event = events.recv() => {
                let Some(event) = event else {
                    println!();
                    eprintln!("Connection closed by server");
                    break;
                };
                handle_event(&mut session, event);
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    Ok(())
}

/// Process one stdin line. Returns `false` to leave the loop.
async fn handle_line(
    conn: &Connection,
    session: &mut ClientSession,
    line: &str,
) -> anyhow::Result<bool> {
    if session.phase() == Phase::AwaitingDecision {
        match session.on_decision_input(line) {
            DecisionAction::Primary => conn.send(ClientCommand::PressPrimaryButton).await?,
            DecisionAction::Secondary => conn.send(ClientCommand::PressSecondaryButton).await?,
            DecisionAction::Reprompt => print_prompt("[y/n] "),
        }
        return Ok(true);
    }

    match session.on_user_input(line) {
        InputAction::StartTask(task) => {
            conn.send(ClientCommand::StartTask { task, images: None })
                .await?;
        }
        InputAction::SendMessage(message) => {
            conn.send(ClientCommand::SendMessage {
                message,
                images: None,
            })
            .await?;
        }
        InputAction::Exit => return Ok(false),
        InputAction::Ignore => print_prompt("> "),
    }
    Ok(true)
}

fn handle_event(session: &mut ClientSession, event: RelayEvent) {
    match event {
        RelayEvent::Status { status } => {
            eprintln!("[{status}]");
        }
        RelayEvent::Response { response } => {
            if let Some(text) = session.on_chunk(&response) {
                print!("{text}");
                let _ = std::io::stdout().flush();
            }
        }
        RelayEvent::ResponseEnd => {
            session.on_response_end();
            println!();
            print_prompt("> ");
        }
        RelayEvent::PromptForDecision => {
            session.on_prompt_for_decision();
            println!();
            print_prompt("Proceed? [y/n] ");
        }
        RelayEvent::Action { action } => {
            eprintln!("[action] {action}");
        }
        RelayEvent::Invoke { invoke, text } => {
            eprintln!("[{invoke}] {}", text.unwrap_or_default());
        }
        RelayEvent::Error { error } => {
            session.on_error();
            eprintln!("Error: {error}");
            print_prompt("> ");
        }
        RelayEvent::Pong { timestamp } => {
            debug!(timestamp, "Pong received");
        }
    }
}

fn print_prompt(prompt: &str) {
    print!("{prompt}");
    let _ = std::io::stdout().flush();
}
