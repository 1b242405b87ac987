//! Word sources: where a round's secret word, hint and decoy come from.

mod http;
mod llm;

use crate::llm::LlmError;
use crate::types::{GeneratedContent, FALLBACK_HINT, FALLBACK_WORD};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use http::HttpWordSource;
pub use llm::LlmWordSource;

/// Category used when none (or garbage) is supplied
pub const DEFAULT_CATEGORY: &str = "general";
/// Longest category passed on to a model, in characters
pub const MAX_CATEGORY_CHARS: usize = 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WordRequest {
    pub category: String,
    pub allow_multiple_impostors: bool,
    pub give_impostor_fake_word: bool,
}

impl Default for WordRequest {
    fn default() -> Self {
        Self {
            category: DEFAULT_CATEGORY.to_string(),
            allow_multiple_impostors: false,
            give_impostor_fake_word: true,
        }
    }
}

impl WordRequest {
    /// Build a request from an untrusted JSON body. Fields of the wrong type
    /// fall back to their defaults instead of rejecting the request.
    pub fn from_json(body: &Value) -> Self {
        let defaults = Self::default();
        let category = match body.get("category") {
            Some(Value::String(s)) => sanitize_category(s),
            _ => defaults.category,
        };
        let flag = |key: &str, default: bool| body.get(key).and_then(Value::as_bool).unwrap_or(default);

        Self {
            category,
            allow_multiple_impostors: flag(
                "allowMultipleImpostors",
                defaults.allow_multiple_impostors,
            ),
            give_impostor_fake_word: flag("giveImpostorFakeWord", defaults.give_impostor_fake_word),
        }
    }
}

/// Trim, strip control characters and cap a category's length
pub fn sanitize_category(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_CATEGORY_CHARS)
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        cleaned.to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WordSourceError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Request to word service failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Word service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Word source unavailable: {0}")]
    Unavailable(String),
}

/// Anything able to produce a round's word, hint and optional decoy
#[async_trait]
pub trait WordSource: Send + Sync {
    async fn generate(&self, request: &WordRequest) -> Result<GeneratedContent, WordSourceError>;

    fn name(&self) -> &str;
}

/// Best-effort text for a JSON field; numbers and booleans are stringified
fn field_text(value: &Value, key: &str) -> Option<String> {
    let text = match value.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Cut the outermost `{...}` out of model output that may carry code fences
/// or chatter around the JSON
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Turn raw model output into usable content, repairing whatever is missing
pub fn content_from_model_output(text: &str, request: &WordRequest) -> GeneratedContent {
    let value = extract_json_object(text)
        .and_then(|json| serde_json::from_str::<Value>(json).ok())
        .unwrap_or(Value::Null);

    if value.is_null() {
        tracing::warn!("Model output was not a JSON object, repairing with defaults");
    }

    let word = field_text(&value, "word").unwrap_or_else(|| FALLBACK_WORD.to_string());
    let hint = field_text(&value, "hint").unwrap_or_else(|| {
        format!("{} ({} letters)", FALLBACK_HINT, word.chars().count())
    });
    let fake_word = if request.give_impostor_fake_word {
        field_text(&value, "fakeWord").filter(|fake| fake.to_lowercase() != word.to_lowercase())
    } else {
        None
    };

    GeneratedContent {
        word,
        hint,
        fake_word,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_category() {
        assert_eq!(sanitize_category("  animals "), "animals");
        assert_eq!(sanitize_category(""), DEFAULT_CATEGORY);
        assert_eq!(sanitize_category("\n\t"), DEFAULT_CATEGORY);
        assert_eq!(sanitize_category("fo\u{0}od"), "food");
        assert_eq!(
            sanitize_category(&"a".repeat(500)).chars().count(),
            MAX_CATEGORY_CHARS
        );
    }

    #[test]
    fn test_request_from_json_coerces_bad_fields() {
        let request = WordRequest::from_json(&json!({
            "category": 42,
            "allowMultipleImpostors": "yes",
            "giveImpostorFakeWord": false
        }));
        assert_eq!(request.category, DEFAULT_CATEGORY);
        assert!(!request.allow_multiple_impostors);
        assert!(!request.give_impostor_fake_word);

        let request = WordRequest::from_json(&Value::Null);
        assert_eq!(request, WordRequest::default());

        let request = WordRequest::from_json(&json!({
            "category": " sports ",
            "allowMultipleImpostors": true
        }));
        assert_eq!(request.category, "sports");
        assert!(request.allow_multiple_impostors);
        assert!(request.give_impostor_fake_word);
    }

    #[test]
    fn test_content_from_clean_json() {
        let request = WordRequest::default();
        let content = content_from_model_output(
            r#"{"word": " pancakes ", "hint": "breakfast food", "fakeWord": "waffles"}"#,
            &request,
        );
        assert_eq!(content.word, "pancakes");
        assert_eq!(content.hint, "breakfast food");
        assert_eq!(content.fake_word.as_deref(), Some("waffles"));
    }

    #[test]
    fn test_content_from_fenced_json() {
        let request = WordRequest::default();
        let text = "Sure!\n```json\n{\"word\": \"comet\", \"hint\": \"sky\", \"fakeWord\": null}\n```";
        let content = content_from_model_output(text, &request);
        assert_eq!(content.word, "comet");
        assert_eq!(content.fake_word, None);
    }

    #[test]
    fn test_fake_word_suppressed_when_not_requested() {
        let request = WordRequest {
            give_impostor_fake_word: false,
            ..WordRequest::default()
        };
        let content = content_from_model_output(
            r#"{"word": "pancakes", "hint": "breakfast", "fakeWord": "waffles"}"#,
            &request,
        );
        assert_eq!(content.fake_word, None);
    }

    #[test]
    fn test_decoy_equal_to_word_is_dropped() {
        let content = content_from_model_output(
            r#"{"word": "Pancakes", "hint": "breakfast", "fakeWord": "pancakes"}"#,
            &WordRequest::default(),
        );
        assert_eq!(content.fake_word, None);
    }

    #[test]
    fn test_garbage_output_is_repaired() {
        let content = content_from_model_output("I cannot help with that.", &WordRequest::default());
        assert_eq!(content.word, FALLBACK_WORD);
        assert_eq!(content.hint, "Common but not the first guess (6 letters)");
        assert_eq!(content.fake_word, None);
    }

    #[test]
    fn test_missing_hint_mentions_length() {
        let content = content_from_model_output(r#"{"word": "tiger"}"#, &WordRequest::default());
        assert_eq!(content.word, "tiger");
        assert_eq!(content.hint, "Common but not the first guess (5 letters)");
    }
}
