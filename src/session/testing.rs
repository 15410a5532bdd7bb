//! Scripted in-memory gateway for session tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use super::transcript::Message;
use crate::app::Language;
use crate::gateway::{ChatReply, Gateway, HistoryRecord, Role, SessionHandle};
use crate::utils::GatewayError;

pub fn fragments(parts: &[&str]) -> ChatReply {
    ChatReply::new(
        parts.join("\n\n"),
        parts.iter().map(|p| p.to_string()).collect(),
    )
}

pub fn texts(messages: &[Message]) -> Vec<String> {
    messages.iter().map(|m| m.text.clone()).collect()
}

/// Replies come from a script (default `re: <text>`); when gated, each send
/// waits for a permit handed out with `release`
pub struct ScriptedGateway {
    gate: Option<Semaphore>,
    replies: Mutex<VecDeque<Result<ChatReply, GatewayError>>>,
    sent: Mutex<Vec<String>>,
    started: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    history: Mutex<Vec<HistoryRecord>>,
    history_fails: AtomicBool,
    visibility_fails: AtomicBool,
    ended: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    fn build(gate: Option<Semaphore>) -> Arc<Self> {
        Arc::new(Self {
            gate,
            replies: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            started: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            history: Mutex::new(Vec::new()),
            history_fails: AtomicBool::new(false),
            visibility_fails: AtomicBool::new(false),
            ended: Mutex::new(Vec::new()),
        })
    }

    /// Sends block until released
    pub fn gated() -> Arc<Self> {
        Self::build(Some(Semaphore::new(0)))
    }

    /// Sends complete immediately
    pub fn open_gate() -> Arc<Self> {
        Self::build(None)
    }

    pub fn push_reply(&self, reply: Result<ChatReply, GatewayError>) {
        self.replies.lock().push_back(reply);
    }

    pub fn release(&self, sends: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(sends);
        }
    }

    pub fn set_history(&self, records: Vec<HistoryRecord>) {
        *self.history.lock() = records;
    }

    pub fn history_record(id: &str, role: Role, content: &str) -> HistoryRecord {
        HistoryRecord {
            id: Some(id.to_string()),
            role,
            content: content.to_string(),
            fragments: Vec::new(),
            timestamp: Some("2026-02-14T18:30:00Z".to_string()),
        }
    }

    pub fn fail_history(&self) {
        self.history_fails.store(true, Ordering::SeqCst);
    }

    pub fn fail_visibility(&self) {
        self.visibility_fails.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    pub fn ended(&self) -> Vec<String> {
        self.ended.lock().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Wait until `count` sends have started
    pub async fn wait_for_started(&self, count: usize) {
        for _ in 0..1000 {
            if self.started.load(Ordering::SeqCst) >= count {
                return;
            }
            tokio::task::yield_now().await;
            if self.started.load(Ordering::SeqCst) < count {
                tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            }
        }
        panic!("send #{} never started", count);
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn resolve_mind(&self, _client_id: &str, avatar_id: &str) -> Result<String, GatewayError> {
        Ok(format!("mind-{}", avatar_id))
    }

    async fn start_session(&self, _mind_id: &str, _avatar_id: &str) -> Result<SessionHandle, GatewayError> {
        Ok(SessionHandle {
            session_id: "s1".to_string(),
            initial_position: None,
        })
    }

    async fn send_message(
        &self,
        _session_id: &str,
        text: &str,
        _language: Language,
        cancel: &CancellationToken,
    ) -> Result<ChatReply, GatewayError> {
        self.sent.lock().push(text.to_string());
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let result = async {
            if let Some(gate) = &self.gate {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
                    permit = gate.acquire() => {
                        if let Ok(permit) = permit {
                            permit.forget();
                        }
                    }
                }
            }
            let scripted = self.replies.lock().pop_front();
            scripted.unwrap_or_else(|| Ok(ChatReply::new(format!("re: {}", text), vec![])))
        }
        .await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn get_history(&self, _session_id: &str) -> Result<Vec<HistoryRecord>, GatewayError> {
        if self.history_fails.load(Ordering::SeqCst) {
            return Err(GatewayError::Status {
                status: 500,
                message: "history unavailable".to_string(),
            });
        }
        Ok(self.history.lock().clone())
    }

    async fn end_session(&self, session_id: &str) -> Result<(), GatewayError> {
        self.ended.lock().push(session_id.to_string());
        Ok(())
    }

    async fn set_visibility(&self, _session_id: &str, _visible: bool) -> Result<(), GatewayError> {
        if self.visibility_fails.load(Ordering::SeqCst) {
            return Err(GatewayError::Network("offline".to_string()));
        }
        Ok(())
    }
}
