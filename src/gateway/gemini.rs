//! Gemini REST backend
//!
//! Uses a long-lived reqwest::Client for connection pooling. Streaming goes
//! through `streamGenerateContent?alt=sse` and is decoded line by line.

use super::history::{ChatMessage, MessageRole};
use super::{GenerateRequest, GenerateResponse, GenerativeBackend, GroundingSource};
use crate::config::GatewayConfig;
use crate::error::TrackerError;
use crate::Result;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Reusable Gemini client (connection-pooled)
pub struct GeminiClient {
    client: Client,
    base_url: String,
    request_timeout: Duration,
}

impl GeminiClient {
    /// Streams are bounded by the idle read timeout only; one-shot calls also
    /// get `request_timeout` as an overall deadline.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .connect_timeout(Duration::from_secs(10))
            .read_timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout,
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    /// The key travels in a header so that it never appears in a URL, and
    /// therefore never in an error message or log line.
    async fn post(
        &self,
        url: &str,
        api_key: &str,
        request: &GenerateRequest,
        deadline: Option<Duration>,
    ) -> Result<Response> {
        let body = GeminiRequest::from(request);

        let mut builder = self
            .client
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .json(&body);
        if let Some(deadline) = deadline {
            builder = builder.timeout(deadline);
        }

        let response = builder.send().await.map_err(|e| {
            let e = e.without_url();
            error!("Gemini API request failed: {}", e);
            TrackerError::GatewayFailure(format!("Gemini API request failed: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Gemini API error response: {}", error_text);
            return Err(TrackerError::GatewayFailure(format!(
                "Gemini API returned {}: {}",
                status, error_text
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate(&self, api_key: &str, request: &GenerateRequest) -> Result<GenerateResponse> {
        let url = self.endpoint(&request.model, "generateContent");

        info!(
            model = %request.model,
            turns = request.turns.len(),
            web_search = request.web_search,
            "Calling Gemini API"
        );

        let response = self
            .post(&url, api_key, request, Some(self.request_timeout))
            .await?;

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            let e = e.without_url();
            error!("Failed to parse Gemini response: {}", e);
            TrackerError::GatewayFailure(format!("Gemini parse error: {}", e))
        })?;

        let candidate = gemini_response.candidates.into_iter().next().ok_or_else(|| {
            TrackerError::GatewayFailure("No response from Gemini API".to_string())
        })?;

        let text = candidate.text();
        if text.is_empty() {
            warn!(finish_reason = ?candidate.finish_reason, "Gemini returned an empty candidate");
            return Err(TrackerError::GatewayFailure(
                "Empty response from Gemini".to_string(),
            ));
        }

        let sources = candidate.sources();
        info!(chars = text.len(), sources = sources.len(), "Gemini response received");

        Ok(GenerateResponse { text, sources })
    }

    async fn stream(
        &self,
        api_key: &str,
        request: &GenerateRequest,
        chunks: mpsc::Sender<String>,
    ) -> Result<()> {
        let url = self.endpoint(&request.model, "streamGenerateContent?alt=sse");

        info!(model = %request.model, turns = request.turns.len(), "Streaming from Gemini API");

        let mut response = self.post(&url, api_key, request, None).await?;
        let mut forwarder = SseForwarder::default();

        while let Some(bytes) = response.chunk().await.map_err(|e| {
            let e = e.without_url();
            error!("Gemini stream interrupted: {}", e);
            TrackerError::GatewayFailure(format!("Gemini stream interrupted: {}", e))
        })? {
            if !forwarder.forward(&bytes, &chunks).await {
                debug!("Stream receiver dropped, stopping early");
                return Ok(());
            }
        }

        debug!(chunks = forwarder.delivered, "Gemini stream finished");
        Ok(())
    }
}

/// Turns raw SSE body bytes into reply fragments on a channel.
#[derive(Default)]
pub(crate) struct SseForwarder {
    decoder: SseDecoder,
    delivered: usize,
}

impl SseForwarder {
    /// Decode `bytes` and send every non-empty text fragment. Returns `false`
    /// once the receiver is gone.
    pub(crate) async fn forward(&mut self, bytes: &[u8], chunks: &mpsc::Sender<String>) -> bool {
        for payload in self.decoder.push(bytes) {
            let event: GeminiResponse = match serde_json::from_str(&payload) {
                Ok(event) => event,
                Err(e) => {
                    warn!("Skipping undecodable stream event: {}", e);
                    continue;
                }
            };

            let text: String = event.candidates.iter().map(Candidate::text).collect();
            if text.is_empty() {
                continue;
            }

            if chunks.send(text).await.is_err() {
                return false;
            }
            self.delivered += 1;
        }
        true
    }
}

/// Splits a server-sent-events body into `data:` payloads. Bytes are buffered
/// until a full line arrives so multi-byte characters are never split.
#[derive(Default)]
pub(crate) struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut payloads = Vec::new();

        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\r', '\n']);

            if let Some(data) = line.strip_prefix("data:") {
                let data = data.trim_start();
                if !data.is_empty() && data != "[DONE]" {
                    payloads.push(data.to_string());
                }
            }
        }

        payloads
    }
}

//
// ================= Wire format =================
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

impl From<&GenerateRequest> for GeminiRequest {
    fn from(request: &GenerateRequest) -> Self {
        let tools = if request.web_search {
            vec![Tool {
                google_search: GoogleSearch {},
            }]
        } else {
            Vec::new()
        };

        Self {
            contents: request.turns.iter().map(Content::from).collect(),
            tools,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl From<&ChatMessage> for Content {
    fn from(message: &ChatMessage) -> Self {
        let role = match message.role {
            MessageRole::User => "user",
            MessageRole::Model => "model",
        };
        Self {
            role: Some(role.to_string()),
            parts: vec![Part {
                text: Some(message.text.clone()),
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Content,
    finish_reason: Option<String>,
    grounding_metadata: Option<GroundingMetadata>,
}

impl Candidate {
    fn text(&self) -> String {
        self.content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect()
    }

    fn sources(&self) -> Vec<GroundingSource> {
        self.grounding_metadata
            .as_ref()
            .map(|m| {
                m.grounding_chunks
                    .iter()
                    .map(|chunk| GroundingSource {
                        uri: chunk.web.as_ref().and_then(|w| w.uri.clone()),
                        title: chunk.web.as_ref().and_then(|w| w.title.clone()),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    uri: Option<String>,
    title: Option<String>,
}
