//! Transport abstraction over the streaming completion service
//!
//! The signature is infallible on purpose: connection-setup errors are
//! delivered as an immediate `StreamEvent::Error` so the decoder's
//! failure path is the single handling point for every kind of failure.

use async_trait::async_trait;
use quill_ai::providers::AnthropicClient;
use quill_ai::{Message, StreamEvent, StreamEventStream};

/// Capability to open a token-streamed exchange with the remote model.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a streamed exchange for the full message history.
    /// The stream ends after a terminal `Success`/`Error` event, or
    /// earlier if the connection drops.
    async fn open_stream(&self, model: &str, history: &[Message]) -> StreamEventStream;
}

/// Transport backed by the Anthropic Messages API.
pub struct ProviderTransport {
    client: AnthropicClient,
}

impl ProviderTransport {
    pub fn new(client: AnthropicClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ProviderTransport {
    async fn open_stream(&self, model: &str, history: &[Message]) -> StreamEventStream {
        match self.client.open_stream(model, history).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::debug!(error = %e, "stream setup failed");
                Box::pin(tokio_stream::once(StreamEvent::Error {
                    message: e.to_string(),
                }))
            }
        }
    }
}
