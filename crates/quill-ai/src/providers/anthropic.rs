//! Anthropic Messages API client
//!
//! Translates the SSE wire protocol into the four-variant
//! [`StreamEvent`] stream the decoder consumes. Only text content is
//! requested; the session engine has no tool or thinking surface.

use crate::{
    error::{Error, Result},
    stream::{StreamEvent, StreamEventStream},
    types::{Message, Role, Usage},
};
use async_stream::stream;
use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Output cap per exchange, matching the interactive client's limit.
const MAX_TOKENS: u32 = 8000;

/// Anthropic API client
pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AnthropicClient {
    /// Create a new client with an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from the ANTHROPIC_API_KEY environment variable
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| Error::MissingApiKey)?;
        Ok(Self::new(api_key))
    }

    /// Override the API base URL (tests, proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Open a streamed exchange for the given model and message history.
    ///
    /// The returned stream yields `Fragment` events for each text delta,
    /// `UsageReport` as token counts arrive, and ends with `Success` or
    /// `Error`. Dropping the stream closes the connection.
    pub async fn open_stream(
        &self,
        model: &str,
        history: &[Message],
    ) -> Result<StreamEventStream> {
        let request = MessagesRequest {
            model: model.to_string(),
            max_tokens: MAX_TOKENS,
            stream: true,
            messages: history.iter().map(WireMessage::from).collect(),
        };

        let url = format!("{}/v1/messages", self.base_url);
        tracing::debug!(%url, model, messages = history.len(), "opening stream");

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "x-api-key",
            self.api_key
                .parse()
                .map_err(|_| Error::Sse("invalid API key header value".to_string()))?,
        );
        headers.insert("anthropic-version", "2023-06-01".parse().unwrap());
        headers.insert("accept", "application/json".parse().unwrap());
        headers.insert("content-type", "application/json".parse().unwrap());

        let request_builder = self.client.post(&url).headers(headers).json(&request);

        let event_source = EventSource::new(request_builder)
            .map_err(|e| Error::Sse(format!("failed to create event source: {}", e)))?;

        Ok(Box::pin(create_stream(event_source)))
    }
}

/// Reduce SSE events into the protocol stream
fn create_stream(mut event_source: EventSource) -> impl futures::Stream<Item = StreamEvent> {
    stream! {
        let mut usage = Usage::default();

        while let Some(event_result) = event_source.next().await {
            match event_result {
                Ok(Event::Open) => {}
                Ok(Event::Message(message)) => match message.event.as_str() {
                    "message_start" => {
                        if let Ok(data) =
                            serde_json::from_str::<MessageStartEvent>(&message.data)
                        {
                            usage.input_tokens = data.message.usage.input_tokens;
                            usage.output_tokens = data.message.usage.output_tokens.unwrap_or(0);
                            yield StreamEvent::UsageReport { usage };
                        }
                    }
                    "content_block_delta" => {
                        if let Ok(data) =
                            serde_json::from_str::<ContentBlockDeltaEvent>(&message.data)
                        {
                            if data.delta.delta_type == "text_delta" {
                                yield StreamEvent::Fragment {
                                    text: data.delta.text.unwrap_or_default(),
                                };
                            }
                        }
                    }
                    "message_delta" => {
                        if let Ok(data) =
                            serde_json::from_str::<MessageDeltaEvent>(&message.data)
                        {
                            if let Some(input) = data.usage.input_tokens {
                                usage.input_tokens = input;
                            }
                            if let Some(output) = data.usage.output_tokens {
                                usage.output_tokens = output;
                            }
                            yield StreamEvent::UsageReport { usage };
                        }
                    }
                    "message_stop" => {
                        event_source.close();
                        yield StreamEvent::Success;
                        return;
                    }
                    "error" => {
                        event_source.close();
                        let message = serde_json::from_str::<ErrorEvent>(&message.data)
                            .map(|e| e.error.message)
                            .unwrap_or_else(|_| "unknown provider error".to_string());
                        yield StreamEvent::Error { message };
                        return;
                    }
                    _ => {}
                },
                Err(reqwest_eventsource::Error::StreamEnded) => {
                    // Server closed without message_stop; the decoder
                    // treats the missing terminal as an interruption.
                    return;
                }
                Err(e) => {
                    event_source.close();
                    yield StreamEvent::Error {
                        message: e.to_string(),
                    };
                    return;
                }
            }
        }
    }
}

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    stream: bool,
    messages: Vec<WireMessage>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: match message.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: message.content.clone(),
        }
    }
}

// ============================================================================
// Response event types
// ============================================================================

#[derive(Debug, Deserialize)]
struct MessageStartEvent {
    message: MessageInfo,
}

#[derive(Debug, Deserialize)]
struct MessageInfo {
    usage: UsageInfo,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    input_tokens: u64,
    output_tokens: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ContentBlockDeltaEvent {
    delta: DeltaInfo,
}

#[derive(Debug, Deserialize)]
struct DeltaInfo {
    #[serde(rename = "type")]
    delta_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageDeltaEvent {
    usage: DeltaUsageInfo,
}

#[derive(Debug, Deserialize)]
struct DeltaUsageInfo {
    input_tokens: Option<u64>,
    output_tokens: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorEvent {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    #[allow(dead_code)]
    error_type: String,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_message_roles() {
        let user = WireMessage::from(&Message::user("hi"));
        assert_eq!(user.role, "user");
        let assistant = WireMessage::from(&Message::assistant("hello"));
        assert_eq!(assistant.role, "assistant");
    }

    #[test]
    fn test_request_serializes_expected_shape() {
        let request = MessagesRequest {
            model: "claude-sonnet-4-5-20250929".to_string(),
            max_tokens: MAX_TOKENS,
            stream: true,
            messages: vec![WireMessage::from(&Message::user("hi"))],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "claude-sonnet-4-5-20250929");
        assert_eq!(value["stream"], true);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hi");
    }

    #[test]
    fn test_parse_message_delta_usage() {
        let data = r#"{"delta":{"stop_reason":"end_turn"},"usage":{"output_tokens":42}}"#;
        let event: MessageDeltaEvent = serde_json::from_str(data).unwrap();
        assert_eq!(event.usage.output_tokens, Some(42));
        assert_eq!(event.usage.input_tokens, None);
    }

    #[test]
    fn test_parse_message_start_usage() {
        let data = r#"{"message":{"id":"msg_1","usage":{"input_tokens":150,"output_tokens":1}}}"#;
        let event: MessageStartEvent = serde_json::from_str(data).unwrap();
        assert_eq!(event.message.usage.input_tokens, 150);
        assert_eq!(event.message.usage.output_tokens, Some(1));
    }

    #[test]
    fn test_parse_error_event() {
        let data = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        let event: ErrorEvent = serde_json::from_str(data).unwrap();
        assert_eq!(event.error.message, "Overloaded");
    }
}
