//! AI Chef request/response types for OpenRouter-compatible chat completions.
//!
//! The HTTP client lives in the CLI; this module builds the request body and
//! turns provider responses into a [`ChefAnswer`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-001";
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const APP_TITLE: &str = "RecipeBox AI Chef";
pub const SYSTEM_PROMPT: &str = "You are a helpful culinary assistant. Provide detailed, well-formatted responses about cooking, recipes, and food-related questions.";
pub const FALLBACK_ANSWER: &str = "I couldn't find an answer to that right now.";

#[derive(Debug, Error)]
pub enum ChefError {
    #[error("AI Chef is not configured: set OPENROUTER_API_KEY")]
    MissingApiKey,
    #[error("Question must not be empty")]
    EmptyQuery,
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("Failed to reach the AI provider: {0}")]
    Transport(String),
    #[error("Malformed response from the AI provider: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Option<Vec<Choice>>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Deserialize)]
pub struct Annotation {
    pub url_citation: Option<UrlCitation>,
}

#[derive(Debug, Deserialize)]
pub struct UrlCitation {
    pub url: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChefAnswer {
    pub text: String,
    pub sources: Vec<Source>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: Option<String>,
}

#[must_use]
pub fn build_user_prompt(query: &str) -> String {
    format!(
        "Provide a detailed recipe for \"{query}\". Include:\n\
         1. Brief Overview\n\
         2. Key Ingredients\n\
         3. Step-by-Step Instructions (numbered)\n\
         4. Pro Tips\n\n\
         Keep each step concise and format the response in Markdown."
    )
}

pub fn build_request(model: &str, query: &str) -> Result<ChatRequest, ChefError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ChefError::EmptyQuery);
    }
    Ok(ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: build_user_prompt(query),
            },
        ],
    })
}

/// Keep the first occurrence of each URL.
#[must_use]
pub fn dedup_sources(sources: Vec<Source>) -> Vec<Source> {
    let mut seen = HashSet::new();
    sources
        .into_iter()
        .filter(|s| seen.insert(s.url.clone()))
        .collect()
}

#[must_use]
pub fn answer_from_response(response: ChatResponse) -> ChefAnswer {
    let message = response
        .choices
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|choice| choice.message);
    let Some(message) = message else {
        return ChefAnswer {
            text: FALLBACK_ANSWER.to_string(),
            sources: Vec::new(),
        };
    };
    let text = message
        .content
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_ANSWER.to_string());
    let sources = message
        .annotations
        .into_iter()
        .filter_map(|a| a.url_citation)
        .map(|c| Source {
            url: c.url,
            title: c.title,
        })
        .collect();
    ChefAnswer {
        text,
        sources: dedup_sources(sources),
    }
}

/// Build the error for a non-2xx provider response.
#[must_use]
pub fn error_from_status(status: u16, body: &str) -> ChefError {
    let message = serde_json::from_str::<ProviderErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("API request failed with status {status}"));
    ChefError::Api { status, message }
}
