use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::history;
use super::transcript::{Message, Transcript};
use crate::app::Language;
use crate::gateway::Gateway;
use crate::utils::{GatewayError, SessionError};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Identity of an open conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub session_id: String,
    pub mind_id: String,
    pub avatar_id: String,
}

/// Whether a drain loop currently owns the outgoing queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainState {
    Idle,
    Draining,
}

/// Progress notifications emitted by the drain loop
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Avatar fragments were appended for `text`
    ReplyReceived { text: String, fragments: Vec<String> },
    /// Sending `text` failed; the drain moved on to the next message
    SendFailed(SessionError),
    /// A drain cycle finished; carries the transcript at that point
    CycleFinished { transcript: Vec<Message> },
}

struct SessionInner {
    queue: VecDeque<String>,
    transcript: Transcript,
    state: DrainState,
    /// A drain was started but has not taken its first snapshot; messages
    /// queued now belong to that snapshot and are already shown
    snapshot_pending: bool,
    visible: bool,
    active: bool,
}

struct SessionShared {
    info: SessionInfo,
    language: Language,
    gateway: Arc<dyn Gateway>,
    inner: Mutex<SessionInner>,
    state_tx: watch::Sender<DrainState>,
    events: broadcast::Sender<SessionEvent>,
    cancel: CancellationToken,
}

impl SessionShared {
    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn set_state(&self, inner: &mut SessionInner, state: DrainState) {
        inner.state = state;
        self.state_tx.send_replace(state);
    }
}

/// A chat session between the signed-in client and one avatar.
///
/// Outgoing messages go through a queue drained by at most one background
/// task at a time, so replies arrive in submission order. Dropping the
/// session cancels any in-flight send.
pub struct ConversationSession {
    shared: Arc<SessionShared>,
}

impl ConversationSession {
    pub fn new(
        info: SessionInfo,
        gateway: Arc<dyn Gateway>,
        language: Language,
        visible: bool,
    ) -> Self {
        let (state_tx, _) = watch::channel(DrainState::Idle);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            shared: Arc::new(SessionShared {
                info,
                language,
                gateway,
                inner: Mutex::new(SessionInner {
                    queue: VecDeque::new(),
                    transcript: Transcript::new(),
                    state: DrainState::Idle,
                    snapshot_pending: false,
                    visible,
                    active: true,
                }),
                state_tx,
                events,
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn info(&self) -> &SessionInfo {
        &self.shared.info
    }

    pub fn session_id(&self) -> &str {
        &self.shared.info.session_id
    }

    /// Snapshot of the transcript for display
    pub fn transcript(&self) -> Vec<Message> {
        self.shared.inner.lock().transcript.messages().to_vec()
    }

    /// Messages waiting for a drain cycle to pick them up
    pub fn queue_len(&self) -> usize {
        self.shared.inner.lock().queue.len()
    }

    pub fn drain_state(&self) -> DrainState {
        self.shared.inner.lock().state
    }

    /// Last visibility value acknowledged by the backend
    pub fn visible(&self) -> bool {
        self.shared.inner.lock().visible
    }

    pub fn is_active(&self) -> bool {
        self.shared.inner.lock().active
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    /// Queue a message for delivery.
    ///
    /// When no drain is sending, the message joins the next snapshot and shows
    /// up in the transcript at once, followed by the pending-reply
    /// placeholder. A message queued while a cycle is sending stays out of the
    /// transcript until the following cycle takes it, so replies still follow
    /// the messages they answer. Returns `false` for blank text or a closed
    /// session. Must be called from within a Tokio runtime.
    pub fn enqueue_message(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }

        let start_drain = {
            let mut inner = self.shared.inner.lock();
            if !inner.active {
                return false;
            }
            inner.queue.push_back(text.to_string());

            let start = inner.state == DrainState::Idle;
            if start {
                self.shared.set_state(&mut inner, DrainState::Draining);
                inner.snapshot_pending = true;
            }
            if inner.snapshot_pending {
                inner.transcript.push_client(text);
                inner.transcript.show_loading();
            }
            start
        };

        if start_drain {
            tokio::spawn(drain(Arc::clone(&self.shared)));
        }
        true
    }

    /// Resolve once no drain loop is running
    pub async fn wait_idle(&self) {
        let mut rx = self.shared.state_tx.subscribe();
        // The sender lives as long as `self`, so this cannot fail
        let _ = rx.wait_for(|state| *state == DrainState::Idle).await;
    }

    /// Fetch persisted messages and rebuild the transcript from them.
    ///
    /// The transcript is only replaced while no drain is running; the
    /// rebuilt messages are returned either way.
    pub async fn load_history(&self) -> Result<Vec<Message>, SessionError> {
        let records = self
            .shared
            .gateway
            .get_history(self.session_id())
            .await
            .map_err(SessionError::HistoryLoad)?;
        let messages = history::reconstruct(&records);

        let mut inner = self.shared.inner.lock();
        if inner.state == DrainState::Idle && inner.active {
            inner.transcript.replace(messages.clone());
        } else {
            debug!(session_id = %self.session_id(), "history loaded during drain; transcript kept");
        }
        Ok(messages)
    }

    /// Ask the backend to change visibility; on failure the previous value
    /// stays in effect and the caller should revert its optimistic state
    pub async fn set_visibility(&self, visible: bool) -> Result<(), SessionError> {
        if !self.is_active() {
            return Err(SessionError::Inactive);
        }
        match self
            .shared
            .gateway
            .set_visibility(self.session_id(), visible)
            .await
        {
            Ok(()) => {
                self.shared.inner.lock().visible = visible;
                info!(session_id = %self.session_id(), visible, "visibility changed");
                Ok(())
            }
            Err(e) => {
                warn!(session_id = %self.session_id(), error = %e, "visibility change failed");
                Err(SessionError::Visibility(e))
            }
        }
    }

    /// Stop the session locally: cancel any in-flight send, drop queued
    /// messages and the pending placeholder, refuse further input
    pub fn close(&self) {
        {
            let mut inner = self.shared.inner.lock();
            inner.active = false;
            inner.queue.clear();
            inner.snapshot_pending = false;
            inner.transcript.clear_loading();
        }
        self.shared.cancel.cancel();
    }

    /// Close locally, then tell the backend. Backend failures are reported
    /// but safe to ignore.
    pub async fn end(&self) -> Result<(), GatewayError> {
        self.close();
        self.shared.gateway.end_session(self.session_id()).await
    }
}

impl Drop for ConversationSession {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
    }
}

/// Drain the outgoing queue one message at a time.
///
/// Each cycle takes everything queued at its start and shows it in the
/// transcript under one placeholder. Messages queued while a cycle is sending
/// are left for the next cycle, which starts straight after.
async fn drain(shared: Arc<SessionShared>) {
    let session_id = shared.info.session_id.clone();

    loop {
        let batch: Vec<String> = {
            let mut inner = shared.inner.lock();
            if shared.cancel.is_cancelled() || !inner.active || inner.queue.is_empty() {
                inner.queue.clear();
                inner.snapshot_pending = false;
                inner.transcript.clear_loading();
                shared.set_state(&mut inner, DrainState::Idle);
                break;
            }
            let batch: Vec<String> = inner.queue.drain(..).collect();
            // The first snapshot after Idle was shown by enqueue_message
            if !std::mem::take(&mut inner.snapshot_pending) {
                for text in &batch {
                    inner.transcript.push_client(text.as_str());
                }
            }
            inner.transcript.show_loading();
            batch
        };

        debug!(%session_id, batch = batch.len(), "drain cycle started");
        let total = batch.len();

        for (index, text) in batch.into_iter().enumerate() {
            let result = shared
                .gateway
                .send_message(&session_id, &text, shared.language, &shared.cancel)
                .await;

            let event = {
                let mut inner = shared.inner.lock();
                // close() may land between the send and this lock
                if shared.cancel.is_cancelled() || !inner.active {
                    debug!(%session_id, "session closed mid-send; reply discarded");
                    inner.transcript.clear_loading();
                    shared.set_state(&mut inner, DrainState::Idle);
                    return;
                }
                inner.transcript.clear_loading();

                let event = match result {
                    Ok(reply) => {
                        inner.transcript.push_avatar_fragments(&reply.fragments);
                        SessionEvent::ReplyReceived {
                            text,
                            fragments: reply.fragments,
                        }
                    }
                    Err(source) => {
                        warn!(%session_id, error = %source, "message send failed");
                        SessionEvent::SendFailed(SessionError::Send { text, source })
                    }
                };

                if index + 1 < total {
                    inner.transcript.show_loading();
                }
                event
            };
            shared.emit(event);
        }

        let transcript = shared.inner.lock().transcript.messages().to_vec();
        debug!(%session_id, "drain cycle finished");
        shared.emit(SessionEvent::CycleFinished { transcript });
    }

    debug!(%session_id, "drain idle");
}
