//! Wayfarer demo shell - composition root.
//!
//! Ties the conversational core together into a terminal front-end:
//! 1. Load configuration from TOML
//! 2. Initialize tracing
//! 3. Enter as a guest (or log in with --email/--password)
//! 4. Drive the orchestrator from stdin
//!
//! The backend is the in-memory mock; swapping in a real transport means
//! providing another `BackendClient` implementation here.

mod cli;

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use wayfarer_chat::ChatOrchestrator;
use wayfarer_client::{BackendClient, MockBackend};
use wayfarer_core::{Turn, TurnContent, WayfarerConfig, WayfarerError};
use wayfarer_speech::NullRecognizer;

use cli::CliArgs;

const HELP: &str = "\
commands:
  /sessions         list sessions (* marks the selected one)
  /new              start a new chat
  /select <n>       switch to session n from /sessions
  /delete <n>       delete session n from /sessions
  /help             show this help
  /quit             exit
anything else is sent to the assistant.";

fn print_turns(turns: &[Turn]) {
    for turn in turns {
        match &turn.content {
            TurnContent::Text(text) => println!("{:>9}> {}", turn.role.to_string(), text.text),
            TurnContent::Place(place) => {
                let rating = place
                    .rating
                    .map(|r| format!(" ({:.1})", r))
                    .unwrap_or_default();
                println!(
                    "{:>9}> [place] {} — {}{}",
                    turn.role.to_string(),
                    place.name,
                    place.address,
                    rating
                );
            }
        }
    }
}

/// Resolve a 1-based index from `/sessions` output into a session id.
fn session_at(orchestrator: &ChatOrchestrator, arg: &str) -> Option<String> {
    let index: usize = arg.trim().parse().ok()?;
    orchestrator
        .session_list()
        .get(index.checked_sub(1)?)
        .map(|s| s.session_id.clone())
}

fn print_sessions(orchestrator: &ChatOrchestrator) {
    let selected = orchestrator.selected_session();
    let sessions = orchestrator.session_list();
    if sessions.is_empty() {
        println!("no sessions");
        return;
    }
    for (i, session) in sessions.iter().enumerate() {
        let marker = if selected.as_deref() == Some(session.session_id.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{} {:>2}. {}", marker, i + 1, session.session_name);
    }
}

#[tokio::main]
async fn main() -> wayfarer_core::Result<()> {
    let args = CliArgs::parse();
    let config = WayfarerConfig::load_or_default(&args.resolve_config_path());

    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!("Wayfarer shell starting");

    let backend = Arc::new(MockBackend::new());
    backend.add_user("demo@wayfarer.dev", "demo", "Demo", "Traveller");

    let orchestrator = ChatOrchestrator::new(
        Arc::clone(&backend) as Arc<dyn BackendClient>,
        Box::new(NullRecognizer),
        &config,
    );

    match (&args.email, &args.password) {
        (Some(email), Some(password)) => {
            orchestrator
                .login(email, password)
                .await
                .map_err(WayfarerError::from)?;
        }
        _ => {
            orchestrator
                .guest_entry()
                .await
                .map_err(WayfarerError::from)?;
        }
    }

    println!("{}", HELP);
    print_turns(&orchestrator.visible_turns());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/help" => println!("{}", HELP),
            "/sessions" => print_sessions(&orchestrator),
            "/new" => match orchestrator.new_session().await {
                Ok(_) => print_turns(&orchestrator.visible_turns()),
                Err(e) => eprintln!("error: {}", e),
            },
            _ if line.starts_with("/select ") => {
                match session_at(&orchestrator, &line["/select ".len()..]) {
                    Some(session_id) => {
                        orchestrator.select_session(Some(session_id)).await;
                        print_turns(&orchestrator.visible_turns());
                    }
                    None => eprintln!("no such session; try /sessions"),
                }
            }
            _ if line.starts_with("/delete ") => {
                match session_at(&orchestrator, &line["/delete ".len()..]) {
                    Some(session_id) => match orchestrator.delete_session(&session_id).await {
                        Ok(confirmation) => println!("{}", confirmation),
                        Err(e) => eprintln!("error: {}", e),
                    },
                    None => eprintln!("no such session; try /sessions"),
                }
            }
            _ if line.starts_with('/') => eprintln!("unknown command; try /help"),
            message => {
                let before = orchestrator.visible_turns().len();
                match orchestrator.send(message).await {
                    Ok(()) => {
                        let turns = orchestrator.visible_turns();
                        print_turns(&turns[before.min(turns.len())..]);
                    }
                    Err(e) => eprintln!("error: {}", e),
                }
            }
        }
    }

    Ok(())
}
