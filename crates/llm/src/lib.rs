use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use wayfinder_core::Intent;

/// Intents the fallback stage is allowed to return. `Repeat` is a pure rule
/// cue and never comes from the model.
pub const ALLOWED_FALLBACK_INTENTS: &[Intent] = &[
    Intent::Geocode,
    Intent::ReverseGeocode,
    Intent::Route,
    Intent::PoiSearch,
    Intent::Matrix,
    Intent::Unknown,
];

const DEFAULT_CHAT_URL: &str = "http://localhost:11434/api/chat";
const DEFAULT_MODEL: &str = "llama3:8b";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const SYSTEM_PROMPT: &str = "You classify map requests. Reply with ONLY a JSON object \
of the form {\"intent\": \"<tag>\"} where <tag> is one of: geocode, reverse_geocode, \
route, poi_search, matrix, unknown. Use unknown when the request is not a map request.";

static JSON_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[\s\S]*?\}").unwrap());

/// Second-stage classifier, invoked only when the rule stage is inconclusive.
/// Implementations must always terminate with some intent; `Unknown` stands
/// in for any delegate failure.
#[async_trait]
pub trait FallbackClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Intent;
}

/// Fallback classifier backed by a local Ollama-style chat endpoint.
#[derive(Debug, Clone)]
pub struct OllamaClassifier {
    client: reqwest::Client,
    url: String,
    model: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl OllamaClassifier {
    pub fn new(url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn ask(&self, text: &str) -> Result<String, reqwest::Error> {
        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": text },
            ],
            "stream": false,
        });

        let response: ChatResponse = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.message.content)
    }
}

impl Default for OllamaClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_CHAT_URL, DEFAULT_MODEL)
    }
}

#[async_trait]
impl FallbackClassifier for OllamaClassifier {
    async fn classify(&self, text: &str) -> Intent {
        let reply = match tokio::time::timeout(self.timeout, self.ask(text)).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(err)) => {
                warn!(error = %err, "fallback classifier call failed");
                return Intent::Unknown;
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "fallback classifier timed out");
                return Intent::Unknown;
            }
        };

        parse_intent_reply(&reply)
    }
}

/// Pulls an intent tag out of a model reply. The reply may be a bare JSON
/// object, prose with an embedded JSON block, or a lone tag word; anything
/// else classifies as `Unknown`.
pub fn parse_intent_reply(reply: &str) -> Intent {
    let candidate = serde_json::from_str::<serde_json::Value>(reply.trim())
        .ok()
        .or_else(|| {
            JSON_BLOCK
                .find_iter(reply)
                .find_map(|block| serde_json::from_str(block.as_str()).ok())
        });

    let tag = match candidate {
        Some(value) => value
            .get("intent")
            .and_then(|intent| intent.as_str())
            .map(str::to_string),
        None => Some(reply.trim().to_string()),
    };

    tag.and_then(|tag| Intent::from_tag(&tag))
        .filter(|intent| ALLOWED_FALLBACK_INTENTS.contains(intent))
        .unwrap_or(Intent::Unknown)
}
