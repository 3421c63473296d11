//! AI gateway
//!
//! Turns record snapshots or free text into bounded prompts for the remote
//! model and hands back text, grounded news, or a streaming conversation.
//! The only state kept here is the credential; conversations own their turns.

pub mod conversation;
pub mod gemini;
pub mod history;
pub mod prompts;

#[cfg(test)]
pub(crate) mod testing;

pub use conversation::{Conversation, ReplyStream, StreamEvent};
pub use gemini::GeminiClient;
pub use history::{ChatMessage, ConversationHistory, MessageRole};

use crate::config::{is_usable_key, GatewayConfig};
use crate::error::TrackerError;
use crate::models::Transaction;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Backend-neutral request: the model id, ordered turns, and whether the
/// model may ground its answer in web search.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub turns: Vec<ChatMessage>,
    pub web_search: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateResponse {
    pub text: String,
    pub sources: Vec<GroundingSource>,
}

/// Citation attached to a grounded answer. Either part may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub uri: Option<String>,
    pub title: Option<String>,
}

impl GroundingSource {
    /// Link text: the title when present, otherwise the uri.
    pub fn display_title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or(self.uri.as_deref())
    }

    fn has_web_uri(&self) -> bool {
        self.uri.as_deref().map_or(false, |u| {
            let u = u.trim();
            u.starts_with("https://") || u.starts_with("http://")
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsDigest {
    pub summary: String,
    pub sources: Vec<GroundingSource>,
}

impl NewsDigest {
    /// Sources that can be rendered as links.
    pub fn linkable_sources(&self) -> Vec<&GroundingSource> {
        self.sources.iter().filter(|s| s.has_web_uri()).collect()
    }
}

/// What a new conversation is told about before the user speaks.
#[derive(Debug, Clone)]
pub enum ConversationSeed {
    Transactions(Vec<Transaction>),
    News(String),
}

/// Trait for remote text generation
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate(&self, api_key: &str, request: &GenerateRequest) -> Result<GenerateResponse>;

    /// Push reply fragments into `chunks` in order. Returning `Err` after some
    /// fragments were sent means the reply was cut short.
    async fn stream(
        &self,
        api_key: &str,
        request: &GenerateRequest,
        chunks: mpsc::Sender<String>,
    ) -> Result<()>;
}

pub struct AiGateway {
    backend: Arc<dyn GenerativeBackend>,
    config: GatewayConfig,
    /// Key typed in by the user. Lives only as long as this gateway.
    session_key: RwLock<Option<String>>,
}

impl AiGateway {
    pub fn new(config: GatewayConfig, backend: Arc<dyn GenerativeBackend>) -> Self {
        Self {
            backend,
            config,
            session_key: RwLock::new(None),
        }
    }

    /// Gateway talking to the Gemini REST API.
    pub fn gemini(config: GatewayConfig) -> Result<Self> {
        let client = GeminiClient::new(&config)?;
        Ok(Self::new(config, Arc::new(client)))
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Use `key` for subsequent requests. It takes precedence over the
    /// environment key and is never written to storage.
    pub fn set_session_key(&self, key: &str) -> Result<()> {
        let key = key.trim();
        if !is_usable_key(key) {
            return Err(TrackerError::InvalidInput("API key must not be empty".to_string()));
        }

        let mut slot = self
            .session_key
            .write()
            .map_err(|_| TrackerError::GatewayFailure("credential state poisoned".to_string()))?;
        *slot = Some(key.to_string());
        info!("Session API key set");
        Ok(())
    }

    pub fn clear_session_key(&self) {
        if let Ok(mut slot) = self.session_key.write() {
            *slot = None;
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credential().is_ok()
    }

    fn credential(&self) -> Result<String> {
        let session = self.session_key.read().ok().and_then(|k| k.clone());

        session
            .or_else(|| self.config.api_key.clone())
            .filter(|k| is_usable_key(k))
            .ok_or_else(|| {
                TrackerError::GatewayUnconfigured(
                    "no Gemini API key; set GEMINI_API_KEY or enter a key".to_string(),
                )
            })
    }

    fn single_turn(&self, prompt: String, web_search: bool) -> GenerateRequest {
        GenerateRequest {
            model: self.config.model.clone(),
            turns: vec![ChatMessage::user(prompt)],
            web_search,
        }
    }

    /// Markdown summary of the most recent records.
    pub async fn summarize(&self, records: &[Transaction]) -> Result<String> {
        let api_key = self.credential()?;
        let records_json = prompts::recent_records_json(records, self.config.prompt_record_cap)?;
        let request = self.single_turn(prompts::summary_prompt(&records_json), false);

        info!(
            records = records.len().min(self.config.prompt_record_cap),
            "Requesting financial summary"
        );

        self.backend
            .generate(&api_key, &request)
            .await
            .map(|r| r.text)
            .map_err(|e| {
                warn!("Financial summary failed: {}", e);
                e
            })
    }

    /// Analysis of arbitrary pasted text. Blank input never reaches the network.
    pub async fn analyze_content(&self, content: &str) -> Result<String> {
        if content.trim().is_empty() {
            return Err(TrackerError::InvalidInput(
                "Please enter some content to analyze.".to_string(),
            ));
        }

        let api_key = self.credential()?;
        let request = self.single_turn(prompts::content_analysis_prompt(content), false);

        info!(chars = content.len(), "Requesting content analysis");
        Ok(self.backend.generate(&api_key, &request).await?.text)
    }

    /// Web-grounded summary of today's financial news.
    pub async fn fetch_news(&self) -> Result<NewsDigest> {
        let api_key = self.credential()?;
        let request = self.single_turn(prompts::NEWS_PROMPT.to_string(), true);

        info!("Requesting financial news");
        let response = self.backend.generate(&api_key, &request).await?;

        let digest = NewsDigest {
            summary: response.text,
            sources: response.sources,
        };
        info!(
            sources = digest.sources.len(),
            linkable = digest.linkable_sources().len(),
            "News digest received"
        );
        Ok(digest)
    }

    /// Start a chat seeded with a data snapshot and a canned greeting.
    pub fn open_conversation(&self, seed: ConversationSeed) -> Result<Conversation> {
        let api_key = self.credential()?;

        let (instruction, greeting) = match seed {
            ConversationSeed::Transactions(records) => {
                let json = prompts::recent_records_json(&records, self.config.prompt_record_cap)?;
                (prompts::transactions_chat_instruction(&json), prompts::CHAT_GREETING)
            }
            ConversationSeed::News(summary) => {
                (prompts::news_chat_instruction(&summary), prompts::NEWS_CHAT_GREETING)
            }
        };

        info!("Conversation opened");
        Ok(Conversation::new(
            Arc::clone(&self.backend),
            api_key,
            self.config.model.clone(),
            ConversationHistory::seeded(instruction, greeting.to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, TransactionId, TransactionType};
    use chrono::NaiveDate;
    use testing::ScriptedBackend;
    use tokio_test::{assert_err, assert_ok};

    fn configured(backend: Arc<ScriptedBackend>) -> AiGateway {
        let config = GatewayConfig {
            api_key: Some("env-key".to_string()),
            ..GatewayConfig::default()
        };
        AiGateway::new(config, backend)
    }

    fn unconfigured(backend: Arc<ScriptedBackend>) -> AiGateway {
        AiGateway::new(GatewayConfig::default(), backend)
    }

    fn records(count: usize) -> Vec<Transaction> {
        (0..count)
            .map(|i| Transaction {
                id: TransactionId::new(),
                description: format!("Purchase {}", i),
                amount: 10.0,
                transaction_type: TransactionType::Expense,
                category: Category::Shopping,
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_summarize_caps_records() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_text("You spend most on shopping.");
        let gateway = configured(backend.clone());

        let summary = assert_ok!(gateway.summarize(&records(70)).await);
        assert_eq!(summary, "You spend most on shopping.");

        let prompt = &backend.requests()[0].turns[0].text;
        assert!(prompt.contains("Purchase 69"));
        assert!(prompt.contains("Purchase 20"));
        assert!(!prompt.contains("Purchase 19\""));
        assert_eq!(backend.keys(), vec!["env-key"]);
    }

    #[tokio::test]
    async fn test_unconfigured_is_distinct_and_offline() {
        let backend = Arc::new(ScriptedBackend::new());
        let gateway = unconfigured(backend.clone());

        assert!(!gateway.is_configured());
        assert!(matches!(
            gateway.summarize(&records(3)).await,
            Err(TrackerError::GatewayUnconfigured(_))
        ));
        assert!(matches!(
            gateway.open_conversation(ConversationSeed::News("x".into())),
            Err(TrackerError::GatewayUnconfigured(_))
        ));
        assert!(matches!(gateway.fetch_news().await, Err(TrackerError::GatewayUnconfigured(_))));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_session_key_enables_and_overrides() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_text("ok");
        backend.push_text("ok");
        let gateway = unconfigured(backend.clone());

        assert_err!(gateway.set_session_key("  "));
        assert_ok!(gateway.set_session_key(" typed-key "));
        assert!(gateway.is_configured());
        assert_ok!(gateway.analyze_content("some text").await);

        gateway.clear_session_key();
        assert!(!gateway.is_configured());

        let gateway = configured(backend.clone());
        assert_ok!(gateway.set_session_key("override"));
        assert_ok!(gateway.analyze_content("more text").await);
        assert_eq!(backend.keys(), vec!["typed-key", "override"]);
    }

    #[tokio::test]
    async fn test_empty_content_rejected_without_remote_call() {
        let backend = Arc::new(ScriptedBackend::new());
        let gateway = configured(backend.clone());

        assert!(matches!(
            gateway.analyze_content("").await,
            Err(TrackerError::InvalidInput(_))
        ));
        assert!(matches!(
            gateway.analyze_content(" \n\t ").await,
            Err(TrackerError::InvalidInput(_))
        ));
        // Blank input is reported even without a credential.
        assert!(matches!(
            unconfigured(backend.clone()).analyze_content("").await,
            Err(TrackerError::InvalidInput(_))
        ));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_remote_failure_is_surfaced() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_response(Err(TrackerError::GatewayFailure("503".into())));
        let gateway = configured(backend);

        let err = gateway.analyze_content("text").await.unwrap_err();
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_news_requests_grounding_and_filters_sources() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_grounded(
            "Stocks climbed.",
            vec![
                GroundingSource { uri: Some("https://news.example/a".into()), title: Some("A".into()) },
                GroundingSource { uri: None, title: Some("Orphan".into()) },
                GroundingSource { uri: Some("".into()), title: None },
                GroundingSource { uri: Some("https://news.example/b".into()), title: None },
            ],
        );
        let gateway = configured(backend.clone());

        let digest = gateway.fetch_news().await.unwrap();
        assert!(backend.requests()[0].web_search);
        assert_eq!(digest.sources.len(), 4);

        let links: Vec<_> = digest
            .linkable_sources()
            .into_iter()
            .filter_map(|s| s.display_title())
            .collect();
        assert_eq!(links, vec!["A", "https://news.example/b"]);
    }

    #[tokio::test]
    async fn test_conversation_seeded_with_transactions() {
        let backend = Arc::new(ScriptedBackend::new());
        let gateway = configured(backend);

        let chat = gateway
            .open_conversation(ConversationSeed::Transactions(records(2)))
            .unwrap();
        let history = chat.history();
        assert_eq!(history.len(), 2);
        assert!(history[0].text.contains("Purchase 1"));
        assert_eq!(chat.transcript(), vec![ChatMessage::model(prompts::CHAT_GREETING)]);
    }
}
