//! Infers a spending category from an expense description.
//!
//! The live implementation asks a chat-completion style HTTP service to pick one label. Test mode
//! swaps in a keyword matcher so the whole program can run without network access.

use crate::model::CategoryLabel;
use crate::{Config, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace, warn};
use url::Url;

/// Environment variable that, when set to anything non-empty, selects `Mode::Test`.
pub const TEST_MODE_ENV: &str = "EXPENSES_IN_TEST_MODE";

/// The replies are a single word, so a handful of tokens is plenty.
const MAX_TOKENS: u32 = 5;

/// Chooses a category for free text.
#[async_trait::async_trait]
pub trait Classifier {
    /// Returns the category for `text`, or an error if the service could not give one.
    async fn classify(&self, text: &str) -> Result<CategoryLabel>;
}

/// Which classifier backs the program.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Use the remote classification service.
    #[default]
    Live,
    /// Use the offline `KeywordClassifier`.
    Test,
}

impl Mode {
    /// `Mode::Test` if `EXPENSES_IN_TEST_MODE` is set and non-empty, otherwise `Mode::Live`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(v) if !v.is_empty() => Mode::Test,
            _ => Mode::Live,
        }
    }
}

/// Creates the classifier for `mode`.
pub async fn classifier(config: &Config, mode: Mode) -> Result<Box<dyn Classifier + Send + Sync>> {
    match mode {
        Mode::Test => {
            debug!("Using the offline keyword classifier");
            Ok(Box::new(KeywordClassifier))
        }
        Mode::Live => {
            let settings = config.classifier();
            let api_key = config.api_key().await;
            let classifier = HttpClassifier::new(
                settings.endpoint()?,
                settings.model(),
                api_key,
                Duration::from_secs(settings.timeout_secs()),
            )?;
            Ok(Box::new(classifier))
        }
    }
}

/// Classifies `text`, falling back to `CategoryLabel::Other` on any failure. Entering an expense
/// never fails because the classifier is unavailable.
pub async fn categorize(classifier: &(dyn Classifier + Send + Sync), text: &str) -> CategoryLabel {
    match classifier.classify(text).await {
        Ok(label) => {
            debug!("Classified '{text}' as {label}");
            label
        }
        Err(e) => {
            warn!(
                "Unable to classify '{text}', using {}: {e:#}",
                CategoryLabel::Other
            );
            CategoryLabel::Other
        }
    }
}

/// The fixed instruction sent with every description.
pub fn instruction() -> String {
    let labels: Vec<&str> = CategoryLabel::ALL.iter().map(|c| c.as_str()).collect();
    format!(
        "Classify the expense described by the user into exactly one of these categories: {}. \
        Reply with the category name only.",
        labels.join(", ")
    )
}

/// Talks to an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    client: reqwest::Client,
    endpoint: Url,
    model: String,
    api_key: Option<String>,
}

impl HttpClassifier {
    pub fn new(
        endpoint: Url,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Unable to create the HTTP client")?;
        Ok(Self {
            client,
            endpoint,
            model: model.into(),
            api_key,
        })
    }

    fn request<'a>(&'a self, text: &'a str, instruction: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: instruction,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: 0.0,
        }
    }
}

#[async_trait::async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, text: &str) -> Result<CategoryLabel> {
        let Some(api_key) = self.api_key.as_deref() else {
            bail!("No classifier credential is configured")
        };
        let instruction = instruction();
        let request = self.request(text, &instruction);
        trace!("POST {}", self.endpoint);
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .context("The classification request failed")?
            .error_for_status()
            .context("The classification service returned an error")?;
        let body: ChatResponse = response
            .json()
            .await
            .context("The classification response was not in the expected shape")?;
        parse_reply(body)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Pulls the label out of the first choice of a chat completion.
fn parse_reply(body: ChatResponse) -> Result<CategoryLabel> {
    let content = body
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .context("The classification response had no content")?;
    match CategoryLabel::from_reply(&content) {
        Some(label) => Ok(label),
        None => bail!("The classifier replied with an unknown category '{}'", content.trim()),
    }
}

/// An offline classifier that looks for well-known words in the description.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

const KEYWORDS: &[(CategoryLabel, &[&str])] = &[
    (
        CategoryLabel::Food,
        &[
            "coffee", "lunch", "dinner", "breakfast", "grocery", "groceries", "restaurant",
            "pizza", "cafe", "snack", "bakery", "tea",
        ],
    ),
    (
        CategoryLabel::Transport,
        &[
            "bus", "taxi", "uber", "train", "metro", "fuel", "gas", "parking", "flight", "subway",
        ],
    ),
    (
        CategoryLabel::Entertainment,
        &[
            "movie", "cinema", "concert", "netflix", "spotify", "game", "theater", "theatre",
        ],
    ),
    (
        CategoryLabel::Shopping,
        &["shirt", "shoes", "clothes", "amazon", "mall", "gift", "book"],
    ),
    (
        CategoryLabel::Health,
        &[
            "pharmacy", "doctor", "dentist", "medicine", "gym", "hospital", "vitamin",
        ],
    ),
    (
        CategoryLabel::Bills,
        &[
            "rent", "electric", "electricity", "water", "internet", "phone", "insurance",
            "utility", "utilities", "bill",
        ],
    ),
];

/// True if `word` is `keyword` or its plural.
fn is_keyword(word: &str, keyword: &str) -> bool {
    match word.strip_prefix(keyword) {
        Some(rest) => matches!(rest, "" | "s" | "es"),
        None => false,
    }
}

#[async_trait::async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Result<CategoryLabel> {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let label = KEYWORDS
            .iter()
            .find(|(_, keys)| {
                words
                    .iter()
                    .any(|w| keys.iter().any(|k| is_keyword(w, k)))
            })
            .map(|(label, _)| *label)
            .unwrap_or_default();
        Ok(label)
    }
}
