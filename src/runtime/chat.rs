use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::{
    app::AppState,
    cli::print_message,
    session::{ConversationSession, SessionEvent},
    utils::log_error,
};

/// Line-oriented chat with one avatar.
///
/// Every stdin line is enqueued as a message; replies are printed as the
/// drain loop delivers them. `/hide` and `/show` toggle visibility, `/quit`
/// leaves at once (cancelling a pending send), EOF leaves after pending
/// replies arrive.
pub struct ChatRunner {
    state: Arc<AppState>,
    avatar_id: String,
}

impl ChatRunner {
    pub fn new(state: Arc<AppState>, avatar_id: String) -> Self {
        Self { state, avatar_id }
    }

    pub async fn run(self, hidden: bool) -> Result<()> {
        let client_id = self.state.client_id()?;
        let session = self
            .state
            .sessions
            .open_session(&client_id, &self.avatar_id)
            .await
            .context("Could not open a session with this avatar")?;

        let avatar_name = self
            .state
            .inbox
            .read()
            .await
            .get(&self.avatar_id)
            .map(|a| a.name.clone())
            .unwrap_or_else(|| self.avatar_id.clone());

        for message in session.transcript() {
            print_message(&message, &avatar_name);
        }

        if hidden {
            self.toggle_visibility(&session, false).await;
        }

        let printer = tokio::spawn(print_events(
            session.subscribe(),
            Arc::clone(&self.state),
            self.avatar_id.clone(),
            avatar_name.clone(),
        ));

        println!(
            "{}",
            "Type a message and press Enter. /hide, /show, /quit".dimmed()
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut quit = false;
        while let Some(line) = lines.next_line().await? {
            match line.trim() {
                "/quit" => {
                    quit = true;
                    break;
                }
                "/hide" => self.toggle_visibility(&session, false).await,
                "/show" => self.toggle_visibility(&session, true).await,
                _ => {
                    if !session.enqueue_message(&line) {
                        debug!("ignored blank input");
                    }
                }
            }
        }

        if !quit {
            session.wait_idle().await;
        }
        if let Err(e) = session.end().await {
            log_error("session", format!("ending session failed: {}", e));
        }
        drop(session);
        let _ = printer.await;
        Ok(())
    }

    /// Flip visibility, reporting the value actually in effect afterwards
    async fn toggle_visibility(&self, session: &ConversationSession, visible: bool) {
        match session.set_visibility(visible).await {
            Ok(()) if visible => println!("{}", "Transcript visible to your professional.".dimmed()),
            Ok(()) => println!("{}", "Transcript hidden from your professional.".dimmed()),
            Err(e) => {
                let current = if session.visible() { "visible" } else { "hidden" };
                println!("{} {} (still {})", "!".red(), e, current);
            }
        }
    }
}

async fn print_events(
    mut events: tokio::sync::broadcast::Receiver<SessionEvent>,
    state: Arc<AppState>,
    avatar_id: String,
    avatar_name: String,
) {
    loop {
        match events.recv().await {
            Ok(SessionEvent::ReplyReceived { fragments, .. }) => {
                for fragment in fragments {
                    println!("{} {}", format!("{}:", avatar_name).magenta(), fragment);
                }
            }
            Ok(SessionEvent::SendFailed(e)) => {
                println!("{} {}", "!".red(), e);
            }
            Ok(SessionEvent::CycleFinished { transcript }) => {
                state.record_drain(&avatar_id, &transcript).await;
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "chat output fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
