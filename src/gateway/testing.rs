//! In-process backend for gateway tests

use super::{GenerateRequest, GenerateResponse, GenerativeBackend, GroundingSource};
use crate::error::TrackerError;
use crate::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

struct ScriptedStream {
    chunks: Vec<String>,
    failure: Option<String>,
}

/// Replays queued responses in call order and records every request.
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    responses: Mutex<VecDeque<Result<GenerateResponse>>>,
    streams: Mutex<VecDeque<ScriptedStream>>,
    requests: Mutex<Vec<GenerateRequest>>,
    keys: Mutex<Vec<String>>,
    chunk_delay: Option<Duration>,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    pub(crate) fn push_text(&self, text: &str) {
        self.push_response(Ok(GenerateResponse {
            text: text.to_string(),
            sources: Vec::new(),
        }));
    }

    pub(crate) fn push_grounded(&self, text: &str, sources: Vec<GroundingSource>) {
        self.push_response(Ok(GenerateResponse {
            text: text.to_string(),
            sources,
        }));
    }

    pub(crate) fn push_response(&self, response: Result<GenerateResponse>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub(crate) fn push_stream(&self, chunks: Vec<&str>, failure: Option<&str>) {
        self.streams.lock().unwrap().push_back(ScriptedStream {
            chunks: chunks.into_iter().map(String::from).collect(),
            failure: failure.map(String::from),
        });
    }

    pub(crate) fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn record(&self, api_key: &str, request: &GenerateRequest) {
        self.requests.lock().unwrap().push(request.clone());
        self.keys.lock().unwrap().push(api_key.to_string());
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    async fn generate(&self, api_key: &str, request: &GenerateRequest) -> Result<GenerateResponse> {
        self.record(api_key, request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TrackerError::GatewayFailure("no scripted response".into())))
    }

    async fn stream(
        &self,
        api_key: &str,
        request: &GenerateRequest,
        chunks: mpsc::Sender<String>,
    ) -> Result<()> {
        self.record(api_key, request);
        let script = self.streams.lock().unwrap().pop_front().ok_or_else(|| {
            TrackerError::GatewayFailure("no scripted stream".into())
        })?;

        for chunk in script.chunks {
            if let Some(delay) = self.chunk_delay {
                tokio::time::sleep(delay).await;
            }
            if chunks.send(chunk).await.is_err() {
                return Ok(());
            }
        }

        match script.failure {
            Some(reason) => Err(TrackerError::GatewayFailure(reason)),
            None => Ok(()),
        }
    }
}
