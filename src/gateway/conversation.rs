//! Multi-turn chat handle
//!
//! One `send` at a time reaches the model: each reply task holds the turn lock
//! until its stream ends, so a second message waits for the first reply to
//! complete and transcripts never interleave. `close` invalidates every reply
//! still in flight; their late fragments are dropped.

use super::history::{ChatMessage, ConversationHistory};
use super::{GenerateRequest, GenerativeBackend};
use crate::error::TrackerError;
use crate::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Mutex as TurnLock};
use tracing::{debug, info, warn};

const CHANNEL_CAPACITY: usize = 32;

/// One item of a streamed reply. Exactly one of `Done` or `Failed` ends the stream.
#[derive(Debug)]
pub enum StreamEvent {
    Chunk(String),
    Done,
    Failed(TrackerError),
}

/// Lazy, finite, non-restartable sequence of reply fragments.
pub struct ReplyStream {
    events: mpsc::Receiver<StreamEvent>,
    finished: bool,
}

impl ReplyStream {
    /// Next event, or `None` once the terminal event has been returned.
    pub async fn next(&mut self) -> Option<StreamEvent> {
        if self.finished {
            return None;
        }

        match self.events.recv().await {
            Some(event) => {
                if matches!(event, StreamEvent::Done | StreamEvent::Failed(_)) {
                    self.finished = true;
                }
                Some(event)
            }
            None => {
                // Producer vanished without a terminal event (conversation closed).
                self.finished = true;
                None
            }
        }
    }

    /// Drain the stream, returning the concatenated text and the failure, if any.
    /// Text received before a failure is kept.
    pub async fn collect_text(mut self) -> (String, Option<TrackerError>) {
        let mut text = String::new();
        while let Some(event) = self.next().await {
            match event {
                StreamEvent::Chunk(fragment) => text.push_str(&fragment),
                StreamEvent::Done => return (text, None),
                StreamEvent::Failed(e) => return (text, Some(e)),
            }
        }
        (text, None)
    }
}

struct ConversationInner {
    backend: Arc<dyn GenerativeBackend>,
    api_key: String,
    model: String,
    history: Mutex<ConversationHistory>,
    turn_lock: Arc<TurnLock<()>>,
    generation: AtomicU64,
}

impl ConversationInner {
    fn is_live(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn with_history<R>(&self, f: impl FnOnce(&mut ConversationHistory) -> R) -> Result<R> {
        let mut history = self
            .history
            .lock()
            .map_err(|_| TrackerError::GatewayFailure("conversation state poisoned".to_string()))?;
        Ok(f(&mut history))
    }
}

/// Handle to one chat session. Cheap to clone; clones share the transcript.
#[derive(Clone)]
pub struct Conversation {
    inner: Arc<ConversationInner>,
}

impl Conversation {
    pub(crate) fn new(
        backend: Arc<dyn GenerativeBackend>,
        api_key: String,
        model: String,
        history: ConversationHistory,
    ) -> Self {
        Self {
            inner: Arc::new(ConversationInner {
                backend,
                api_key,
                model,
                history: Mutex::new(history),
                turn_lock: Arc::new(TurnLock::new(())),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Send a user message and stream the reply. Must be called within a tokio runtime.
    pub fn send(&self, text: &str) -> Result<ReplyStream> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TrackerError::InvalidInput(
                "Please enter a message.".to_string(),
            ));
        }

        let (events_tx, events_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let inner = Arc::clone(&self.inner);
        let generation = inner.generation.load(Ordering::SeqCst);
        let message = text.to_string();

        tokio::spawn(async move {
            let _turn = Arc::clone(&inner.turn_lock).lock_owned().await;
            if !inner.is_live(generation) {
                debug!("Conversation closed before send started");
                return;
            }
            run_turn(inner, generation, message, events_tx).await;
        });

        Ok(ReplyStream {
            events: events_rx,
            finished: false,
        })
    }

    /// Turns shown to the user: the greeting and everything after it.
    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.inner
            .with_history(|h| h.visible().to_vec())
            .unwrap_or_default()
    }

    /// Every turn sent to the model, including the hidden instruction.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.inner
            .with_history(|h| h.messages().to_vec())
            .unwrap_or_default()
    }

    /// Stop accepting output from replies already in flight.
    pub fn close(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        info!("Conversation closed");
    }
}

async fn run_turn(
    inner: Arc<ConversationInner>,
    generation: u64,
    message: String,
    events: mpsc::Sender<StreamEvent>,
) {
    let turns = match inner.with_history(|h| {
        h.add_message(ChatMessage::user(message));
        h.messages().to_vec()
    }) {
        Ok(turns) => turns,
        Err(e) => {
            let _ = events.send(StreamEvent::Failed(e)).await;
            return;
        }
    };

    let request = GenerateRequest {
        model: inner.model.clone(),
        turns,
        web_search: false,
    };

    let (chunk_tx, mut chunk_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
    let backend = Arc::clone(&inner.backend);
    let api_key = inner.api_key.clone();
    let producer = tokio::spawn(async move { backend.stream(&api_key, &request, chunk_tx).await });

    let mut received = false;
    while let Some(fragment) = chunk_rx.recv().await {
        if !inner.is_live(generation) {
            continue;
        }
        received = true;
        let _ = inner.with_history(|h| h.append_model_text(&fragment));
        // The listener may have gone away; the transcript still grows.
        let _ = events.send(StreamEvent::Chunk(fragment)).await;
    }

    let outcome = match producer.await {
        Ok(result) => result,
        Err(join_error) => Err(TrackerError::GatewayFailure(format!(
            "reply task failed: {}",
            join_error
        ))),
    };

    if !inner.is_live(generation) {
        debug!("Dropping late reply from closed conversation");
        return;
    }

    // A reply with no text would leave two user turns back to back.
    let outcome = match outcome {
        Ok(()) if !received => Err(TrackerError::GatewayFailure(
            "Empty reply from the model".to_string(),
        )),
        other => other,
    };

    match outcome {
        Ok(()) => {
            debug!("Reply stream complete");
            let _ = events.send(StreamEvent::Done).await;
        }
        Err(e) => {
            warn!(partial = received, "Chat reply failed: {}", e);
            if !received {
                let _ = inner.with_history(|h| h.drop_unanswered_user_turn());
            }
            let _ = events.send(StreamEvent::Failed(e)).await;
        }
    }
}
