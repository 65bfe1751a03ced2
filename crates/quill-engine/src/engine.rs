//! Session orchestration: one turn from user text to committed transcript
//!
//! State machine per turn: Idle -> AwaitingResponse -> Committing | RollingBack
//! -> Idle. Deltas are only emitted while awaiting the response, and
//! persisted state is never touched until commit, so a crash mid-turn
//! leaves the prior transcript exactly as it was.

use crate::cost;
use crate::error::{Error, Result};
use crate::session::{Session, SessionSummary};
use crate::store::TranscriptStore;
use crate::transport::Transport;
use async_stream::stream;
use futures::StreamExt;
use quill_ai::{Message, Role, StreamDecoder, StreamOutcome, Usage, pricing};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;

/// Events produced by [`SessionEngine::submit_turn`]. Deltas arrive
/// live; exactly one terminal variant follows.
#[derive(Debug)]
pub enum TurnEvent {
    /// Incremental assistant text, forwarded as it arrives
    Delta(String),
    /// The turn committed: the returned session carries the new
    /// user/assistant pair and the accumulated cost. When `persist_error`
    /// is set the transcript could not be written, but the in-memory
    /// session is still valid and usable.
    Completed {
        session: Session,
        usage: Usage,
        cost: f64,
        persist_error: Option<Error>,
    },
    /// The turn failed and was rolled back; the caller's session and the
    /// persisted transcript are unchanged. Retry by submitting again.
    Failed(Error),
}

impl TurnEvent {
    /// Check if this is a terminal event (Completed or Failed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnEvent::Completed { .. } | TurnEvent::Failed(_))
    }
}

/// A stream of turn events
pub type TurnStream = Pin<Box<dyn Stream<Item = TurnEvent> + Send>>;

/// Orchestrates one conversation: transcript, streaming exchange, cost,
/// persistence.
///
/// One turn per session may be in flight at a time; submitting again on
/// the same session before the previous stream reached its terminal
/// event is a caller error and the result is unspecified. Distinct
/// sessions are independent.
pub struct SessionEngine {
    transport: Arc<dyn Transport>,
    store: TranscriptStore,
}

impl SessionEngine {
    pub fn new(transport: Arc<dyn Transport>, store: TranscriptStore) -> Self {
        Self { transport, store }
    }

    /// Allocate a fresh session for a model in the pricing table.
    /// Nothing is persisted until the first committed turn.
    pub fn create(&self, model: &str) -> Result<Session> {
        pricing::rate_for(model)?;
        Ok(Session::new(model))
    }

    /// Load a persisted session. No other side effects.
    pub fn resume(&self, id: &str) -> Result<Session> {
        self.store.load(id)
    }

    /// Summaries of stored sessions, newest first
    pub fn list(&self) -> Result<Vec<SessionSummary>> {
        self.store.list()
    }

    /// Submit one user turn and stream the response.
    ///
    /// Preconditions are checked before any network interaction: the
    /// trimmed text must be non-empty, the session's last message must
    /// not be a user message, and the model must be priced. The caller's
    /// session is never mutated; the committed state comes back in the
    /// terminal [`TurnEvent::Completed`].
    ///
    /// Cancelling the token (or dropping the stream) closes the
    /// underlying exchange; a cancelled turn terminates with
    /// `Failed(Cancelled)` and persists nothing.
    pub fn submit_turn(
        &self,
        session: &Session,
        user_text: &str,
        cancel: CancellationToken,
    ) -> Result<TurnStream> {
        let trimmed = user_text.trim();
        if trimmed.is_empty() {
            return Err(Error::EmptyTurn);
        }
        if session.last_role() == Some(Role::User) {
            return Err(Error::OutOfOrderTurn);
        }
        let rate = pricing::rate_for(&session.model)?;

        // Provisional user message lives only on this working copy until
        // commit.
        let mut working = session.clone();
        working.messages.push(Message::user(trimmed));

        let transport = Arc::clone(&self.transport);
        let store = self.store.clone();

        let turn_stream = stream! {
            let mut events = transport.open_stream(&working.model, &working.messages).await;
            let mut decoder = StreamDecoder::new();

            loop {
                let event = tokio::select! {
                    _ = cancel.cancelled() => {
                        // Dropping `events` closes the exchange.
                        yield TurnEvent::Failed(Error::Cancelled);
                        return;
                    }
                    event = events.next() => event,
                };
                let Some(event) = event else { break };
                if let Some(delta) = decoder.feed(event) {
                    yield TurnEvent::Delta(delta);
                }
                if decoder.is_terminal() {
                    break;
                }
            }
            drop(events);

            match decoder.finish() {
                StreamOutcome::Completed { text, usage } => {
                    working.messages.push(Message::assistant(text));
                    let increment = cost::incremental_cost(rate, &usage);
                    cost::accumulate(&mut working, increment);

                    let persist_error = store.save(&working).err();
                    if let Some(ref e) = persist_error {
                        tracing::warn!(id = %working.id, error = %e, "auto-save failed");
                    }
                    tracing::debug!(
                        id = %working.id,
                        input = usage.input_tokens,
                        output = usage.output_tokens,
                        increment,
                        total = working.total_cost,
                        "turn committed"
                    );
                    yield TurnEvent::Completed {
                        session: working,
                        usage,
                        cost: increment,
                        persist_error,
                    };
                }
                StreamOutcome::Failed(failure) => {
                    tracing::debug!(id = %working.id, failure = %failure, "turn rolled back");
                    yield TurnEvent::Failed(failure.into());
                }
            }
        };

        Ok(Box::pin(turn_stream))
    }
}
