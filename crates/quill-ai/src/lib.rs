//! quill-ai: protocol layer for streaming chat completions
//!
//! This crate covers everything between the wire and the session engine:
//! the message/usage types, the per-model pricing table, the
//! [`StreamEvent`] tagged variant with its [`StreamDecoder`], and the
//! Anthropic SSE client that produces those events.

pub mod error;
pub mod pricing;
pub mod providers;
pub mod stream;
pub mod types;

pub use error::{Error, Result};
pub use stream::{StreamDecoder, StreamEvent, StreamEventStream, StreamFailure, StreamOutcome};
pub use types::{Message, Role, Usage};
