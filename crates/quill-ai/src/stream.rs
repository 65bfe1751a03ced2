//! Streaming event types and the decoder that reduces them
//!
//! The provider's dynamic event soup is decoded once at the transport
//! boundary into the closed [`StreamEvent`] variant; everything
//! downstream works off that and never re-inspects raw protocol data.

use crate::types::Usage;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio_stream::Stream;

/// One unit of the inbound streaming protocol. Ephemeral, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental assistant text
    Fragment { text: String },
    /// Token counts for the exchange; later reports supersede earlier ones
    UsageReport { usage: Usage },
    /// Terminal marker: the message completed
    Success,
    /// Terminal marker: the exchange failed
    Error { message: String },
}

impl StreamEvent {
    /// Check if this is a terminal event (Success or Error)
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Success | StreamEvent::Error { .. })
    }
}

/// A stream of protocol events
pub type StreamEventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Why a streamed exchange did not complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFailure {
    /// The provider reported an error event
    Provider(String),
    /// The stream ended with neither success nor error marker
    Interrupted,
    /// The caller abandoned the exchange
    Cancelled,
}

impl std::fmt::Display for StreamFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamFailure::Provider(msg) => write!(f, "provider error: {}", msg),
            StreamFailure::Interrupted => write!(f, "connection interrupted mid-stream"),
            StreamFailure::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Terminal outcome of a streamed exchange
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutcome {
    /// The full assembled text and the final reported usage
    Completed { text: String, usage: Usage },
    Failed(StreamFailure),
}

#[derive(Debug)]
enum Terminal {
    Success,
    Error(String),
}

/// Reduces an ordered sequence of [`StreamEvent`] into live deltas plus
/// a single terminal [`StreamOutcome`].
///
/// Fragments are buffered and simultaneously handed back from [`feed`]
/// for immediate display, in order, at most once each. Usage reports
/// overwrite the captured counts without touching the text buffer. After
/// a terminal marker further events are ignored.
///
/// [`feed`]: StreamDecoder::feed
#[derive(Debug, Default)]
pub struct StreamDecoder {
    buffer: String,
    usage: Usage,
    terminal: Option<Terminal>,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one event. Returns the fragment text to forward to the
    /// live-delta output, if any.
    pub fn feed(&mut self, event: StreamEvent) -> Option<String> {
        if self.terminal.is_some() {
            return None;
        }
        match event {
            StreamEvent::Fragment { text } => {
                self.buffer.push_str(&text);
                Some(text)
            }
            StreamEvent::UsageReport { usage } => {
                self.usage = usage;
                None
            }
            StreamEvent::Success => {
                self.terminal = Some(Terminal::Success);
                None
            }
            StreamEvent::Error { message } => {
                self.terminal = Some(Terminal::Error(message));
                None
            }
        }
    }

    /// Whether a terminal marker has been seen
    pub fn is_terminal(&self) -> bool {
        self.terminal.is_some()
    }

    /// Finalize. A stream that ended without a terminal marker
    /// (connection drop) is `Failed(Interrupted)`; partial buffer
    /// contents are discarded rather than promoted to a message.
    pub fn finish(self) -> StreamOutcome {
        match self.terminal {
            Some(Terminal::Success) => StreamOutcome::Completed {
                text: self.buffer,
                usage: self.usage,
            },
            Some(Terminal::Error(message)) => {
                StreamOutcome::Failed(StreamFailure::Provider(message))
            }
            None => StreamOutcome::Failed(StreamFailure::Interrupted),
        }
    }
}
