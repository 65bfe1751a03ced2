//! quill-engine: the streaming session engine
//!
//! Owns the resumable conversation transcript, drives a token-streamed
//! exchange through an injected [`Transport`], accumulates spend from
//! reported usage, and persists the transcript after every committed
//! turn.

pub mod cost;
pub mod engine;
pub mod error;
pub mod session;
pub mod store;
pub mod transport;

pub use engine::{SessionEngine, TurnEvent, TurnStream};
pub use error::{Error, Result};
pub use session::{Session, SessionSummary};
pub use store::TranscriptStore;
pub use transport::{ProviderTransport, Transport};
