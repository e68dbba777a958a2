//! Chat-completions client.
//!
//! One client covers every provider: requests go to each provider's
//! OpenAI-compatible endpoint, streamed responses come back as SSE
//! (`data: {...}\n\n` blocks ending with `[DONE]`).

use std::collections::VecDeque;
use std::pin::Pin;

use futures_util::{Stream, StreamExt};
use reqwest::header;
use tracing::{debug, warn};

use parley_core::config::ProvidersConfig;
use parley_core::error::ParleyError;

use crate::registry::{resolve_model, Provider};
use crate::wire::{
    ChatRequest, ChatResponse, StreamChatChunk, ToolDefinition, ToolInvocation, WireMessage,
    WireToolCall,
};

/// An event decoded from a streamed chat completion.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A fragment of assistant text.
    Content(String),
    /// The model finished its turn by requesting tool calls.
    ToolCalls(Vec<ToolInvocation>),
    /// End of the response.
    Finished { finish_reason: Option<String> },
}

/// Client for hosted chat-completions APIs.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    providers: ProvidersConfig,
}

impl ChatClient {
    pub fn new(providers: ProvidersConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            providers,
        }
    }

    /// Run a non-streaming completion and return the assistant text.
    ///
    /// Used for short internal generations such as chat titles and
    /// artifact content.
    pub async fn complete(
        &self,
        model_id: &str,
        messages: Vec<WireMessage>,
    ) -> Result<String, ParleyError> {
        let spec = resolve_model(model_id)?;
        let request = ChatRequest {
            model: spec.wire_name.to_string(),
            messages,
            stream: false,
            tools: None,
            temperature: None,
            max_tokens: None,
        };

        debug!(model = model_id, provider = spec.provider.name(), "Chat completion request");

        let response = self.post(spec.provider, &request).await?;
        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ParleyError::Provider(format!("Failed to parse response: {}", e)))?;

        let content = parsed
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .ok_or_else(|| ParleyError::Provider("No content in response".to_string()))?;
        Ok(content.trim().to_string())
    }

    /// Start a streaming completion.
    pub async fn stream(
        &self,
        model_id: &str,
        messages: Vec<WireMessage>,
        tools: Option<Vec<ToolDefinition>>,
    ) -> Result<ChatStream, ParleyError> {
        let spec = resolve_model(model_id)?;
        let request = ChatRequest {
            model: spec.wire_name.to_string(),
            messages,
            stream: true,
            tools,
            temperature: None,
            max_tokens: None,
        };

        debug!(model = model_id, provider = spec.provider.name(), "Streaming chat request");

        let response = self.post(spec.provider, &request).await?;
        let inner = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| ParleyError::Provider(format!("Stream error: {}", e)))
        });
        Ok(ChatStream::new(Box::pin(inner)))
    }

    async fn post(
        &self,
        provider: Provider,
        request: &ChatRequest,
    ) -> Result<reqwest::Response, ParleyError> {
        let api_key = self.api_key(provider)?;
        let url = format!("{}/chat/completions", self.base_url(provider));

        let response = self
            .http
            .post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", api_key))
            .json(request)
            .send()
            .await
            .map_err(|e| ParleyError::Provider(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ParleyError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ParleyError::Provider(format!(
                "{} returned {}: {}",
                provider.name(),
                status,
                body
            )));
        }
        Ok(response)
    }

    fn base_url(&self, provider: Provider) -> String {
        let configured = match provider {
            Provider::Anthropic => self.providers.anthropic_base_url.as_deref(),
            Provider::Google => self.providers.google_base_url.as_deref(),
            Provider::Cohere => self.providers.cohere_base_url.as_deref(),
            Provider::Together => self.providers.together_base_url.as_deref(),
        };
        configured
            .unwrap_or_else(|| provider.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }

    fn api_key(&self, provider: Provider) -> Result<String, ParleyError> {
        let var = provider.api_key_env();
        std::env::var(var).map_err(|_| ParleyError::MissingCredential(var.to_string()))
    }
}

type ByteChunks = Pin<Box<dyn Stream<Item = Result<Vec<u8>, ParleyError>> + Send>>;

/// Decoder over a streamed chat-completions response.
///
/// Buffers SSE blocks, yields text deltas as they arrive, and
/// accumulates tool-call fragments until the stream ends. Network
/// chunks can split anywhere, including inside a multi-byte UTF-8
/// character, so raw bytes are held until a complete sequence arrives.
pub struct ChatStream {
    inner: Option<ByteChunks>,
    raw: Vec<u8>,
    buffer: String,
    pending: VecDeque<StreamEvent>,
    tool_calls: Vec<ToolCallBuilder>,
    finish_reason: Option<String>,
}

#[derive(Default)]
struct ToolCallBuilder {
    id: String,
    name: String,
    arguments: String,
}

impl ChatStream {
    fn new(inner: ByteChunks) -> Self {
        Self {
            inner: Some(inner),
            raw: Vec::new(),
            buffer: String::new(),
            pending: VecDeque::new(),
            tool_calls: Vec::new(),
            finish_reason: None,
        }
    }

    /// Build a stream from pre-chunked SSE text, for decoding tests.
    #[cfg(test)]
    pub fn from_chunks(chunks: Vec<String>) -> Self {
        Self::from_byte_chunks(chunks.into_iter().map(String::into_bytes).collect())
    }

    /// Build a stream from raw byte chunks, for decoding tests that
    /// split inside UTF-8 sequences.
    #[cfg(test)]
    pub fn from_byte_chunks(chunks: Vec<Vec<u8>>) -> Self {
        let inner = futures_util::stream::iter(chunks.into_iter().map(Ok));
        Self::new(Box::pin(inner))
    }

    /// Next decoded event, or `None` once the response is fully consumed.
    pub async fn next_event(&mut self) -> Result<Option<StreamEvent>, ParleyError> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }
            let Some(inner) = self.inner.as_mut() else {
                return Ok(None);
            };
            match inner.next().await {
                Some(Ok(chunk)) => {
                    self.absorb_bytes(&chunk);
                    self.drain_buffer();
                }
                Some(Err(e)) => {
                    self.inner = None;
                    return Err(e);
                }
                None => self.finish(),
            }
        }
    }

    /// Append raw bytes and move the complete UTF-8 prefix into the
    /// text buffer. An incomplete trailing sequence stays in `raw`
    /// until the next chunk completes it.
    fn absorb_bytes(&mut self, chunk: &[u8]) {
        self.raw.extend_from_slice(chunk);
        let split = match std::str::from_utf8(&self.raw) {
            Ok(_) => self.raw.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => {
                warn!(error = %e, "Invalid UTF-8 in response stream");
                self.buffer
                    .push_str(&String::from_utf8_lossy(&self.raw));
                self.raw.clear();
                return;
            }
        };
        self.buffer
            .push_str(&String::from_utf8_lossy(&self.raw[..split]));
        self.raw.drain(..split);
    }

    /// Process complete SSE blocks sitting in the buffer.
    fn drain_buffer(&mut self) {
        while let Some(block_end) = self.buffer.find("\n\n") {
            let block = self.buffer[..block_end].to_string();
            self.buffer.drain(..block_end + 2);

            for line in block.lines() {
                let Some(data) = line.strip_prefix("data: ") else {
                    continue;
                };
                if data.trim() == "[DONE]" {
                    self.finish();
                    return;
                }
                match serde_json::from_str::<StreamChatChunk>(data) {
                    Ok(chunk) => self.handle_chunk(chunk),
                    Err(e) => {
                        warn!(error = %e, data = data, "Skipping unparseable stream chunk");
                    }
                }
            }
        }
    }

    fn handle_chunk(&mut self, chunk: StreamChatChunk) {
        let Some(choice) = chunk.choices.into_iter().next() else {
            return;
        };

        if let Some(content) = choice.delta.content {
            if !content.is_empty() {
                self.pending.push_back(StreamEvent::Content(content));
            }
        }

        if let Some(deltas) = choice.delta.tool_calls {
            for delta in deltas {
                if self.tool_calls.len() <= delta.index {
                    self.tool_calls
                        .resize_with(delta.index + 1, ToolCallBuilder::default);
                }
                let builder = &mut self.tool_calls[delta.index];
                if let Some(id) = delta.id {
                    builder.id = id;
                }
                if let Some(function) = delta.function {
                    if let Some(name) = function.name {
                        builder.name = name;
                    }
                    if let Some(arguments) = function.arguments {
                        builder.arguments.push_str(&arguments);
                    }
                }
            }
        }

        if let Some(reason) = choice.finish_reason {
            self.finish_reason = Some(reason);
        }
    }

    /// Flush accumulated tool calls and mark the stream done. Safe to
    /// call more than once.
    fn finish(&mut self) {
        if self.inner.take().is_none() {
            return;
        }
        if !self.tool_calls.is_empty() {
            let calls = self
                .tool_calls
                .drain(..)
                .filter(|b| !b.name.is_empty())
                .map(|b| ToolInvocation {
                    id: b.id,
                    name: b.name,
                    arguments: b.arguments,
                })
                .collect::<Vec<_>>();
            if !calls.is_empty() {
                self.pending.push_back(StreamEvent::ToolCalls(calls));
            }
        }
        self.pending.push_back(StreamEvent::Finished {
            finish_reason: self.finish_reason.take(),
        });
    }
}

/// Convert completed tool invocations back into the wire shape used
/// when replaying the assistant turn to the model.
pub fn invocations_to_wire(calls: &[ToolInvocation]) -> Vec<WireToolCall> {
    calls
        .iter()
        .map(|call| WireToolCall {
            id: call.id.clone(),
            call_type: "function".to_string(),
            function: crate::wire::WireFunctionCall {
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            },
        })
        .collect()
}
