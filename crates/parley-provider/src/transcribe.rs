//! Voice transcription via the Gemini generateContent API.
//!
//! The audio clip is sent inline (base64) together with a fixed
//! instruction. The model replies in free text, so the transcript is
//! recovered with a heuristic pattern; transcription is best-effort by
//! contract.

use std::sync::LazyLock;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use parley_core::error::ParleyError;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const TRANSCRIBE_INSTRUCTION: &str = "I'm speaking to you through audio. Please transcribe \
     what I said and respond as a helpful AI assistant.";

const FALLBACK_TRANSCRIPT: &str = "Audio processed successfully";

/// What a voice clip resolved to.
#[derive(Debug, Clone)]
pub struct VoiceResult {
    /// Best-effort transcript of the clip.
    pub transcript: String,
    /// The model's full free-text reply.
    pub response_text: String,
}

/// Service turning an audio clip into a transcript and reply.
#[async_trait]
pub trait SpeechService: Send + Sync {
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<VoiceResult, ParleyError>;
}

/// Gemini-backed speech service.
pub struct GeminiTranscriber {
    http: reqwest::Client,
    model: String,
    api_key_env: String,
    base_url: String,
}

impl GeminiTranscriber {
    pub fn new(model: impl Into<String>, api_key_env: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            model: model.into(),
            api_key_env: api_key_env.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SpeechService for GeminiTranscriber {
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<VoiceResult, ParleyError> {
        if audio.is_empty() {
            return Err(ParleyError::Transcription(
                "Cannot transcribe empty audio data".to_string(),
            ));
        }

        let api_key = std::env::var(&self.api_key_env)
            .map_err(|_| ParleyError::MissingCredential(self.api_key_env.clone()))?;

        let body = serde_json::json!({
            "contents": [{
                "parts": [
                    { "text": TRANSCRIBE_INSTRUCTION },
                    {
                        "inline_data": {
                            "mime_type": mime_type,
                            "data": BASE64.encode(audio),
                        }
                    }
                ]
            }]
        });

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            api_key
        );

        debug!(model = %self.model, bytes = audio.len(), "Transcription request");

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ParleyError::Transcription(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Transcription API error");
            return Err(ParleyError::Transcription(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ParleyError::Transcription(format!("Failed to parse response: {}", e)))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(VoiceResult {
            transcript: extract_transcript(&text),
            response_text: text,
        })
    }
}

/// Pull the spoken words out of a free-text model reply.
///
/// Models tend to open with "You said ..." or "Transcript: ..." before
/// answering; capture that span if present, otherwise return a fixed
/// placeholder.
pub fn extract_transcript(response_text: &str) -> String {
    static PATTERN: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?i)(?:you said|i heard|transcript):\s*["']?(.*?)["']?(?:\.|$)"#)
            .expect("Invalid transcript regex")
    });

    PATTERN
        .captures(response_text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_TRANSCRIPT.to_string())
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// Mock speech service returning a fixed transcript.
///
/// Used in handler tests so no network or API key is needed.
#[derive(Debug, Clone, Default)]
pub struct MockSpeechService;

#[async_trait]
impl SpeechService for MockSpeechService {
    async fn transcribe(&self, audio: &[u8], _mime_type: &str) -> Result<VoiceResult, ParleyError> {
        if audio.is_empty() {
            return Err(ParleyError::Transcription(
                "Cannot transcribe empty audio data".to_string(),
            ));
        }
        Ok(VoiceResult {
            transcript: "[mock transcript]".to_string(),
            response_text: "You said: \"[mock transcript]\". How can I help?".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_you_said() {
        let text = "You said: \"what's the weather in Turku\". Let me check that for you.";
        assert_eq!(extract_transcript(text), "what's the weather in Turku");
    }

    #[test]
    fn test_extract_transcript_label() {
        let text = "Transcript: please draft an email to my landlord.\nSure, here it is.";
        assert_eq!(
            extract_transcript(text),
            "please draft an email to my landlord"
        );
    }

    #[test]
    fn test_extract_case_insensitive() {
        let text = "I HEARD: turn off the lights.";
        assert_eq!(extract_transcript(text), "turn off the lights");
    }

    #[test]
    fn test_extract_fallback_on_no_match() {
        let text = "Here is a summary of the audio you sent.";
        assert_eq!(extract_transcript(text), "Audio processed successfully");
    }

    #[test]
    fn test_extract_fallback_on_empty() {
        assert_eq!(extract_transcript(""), "Audio processed successfully");
    }

    #[tokio::test]
    async fn test_mock_speech_service() {
        let service = MockSpeechService;
        let result = service.transcribe(&[0u8; 16], "audio/wav").await.unwrap();
        assert_eq!(result.transcript, "[mock transcript]");
        assert!(!result.response_text.is_empty());
    }

    #[tokio::test]
    async fn test_mock_rejects_empty_audio() {
        let service = MockSpeechService;
        assert!(service.transcribe(&[], "audio/wav").await.is_err());
    }
}
