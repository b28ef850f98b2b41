pub mod types;

use std::env;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use crate::lang;
use types::{ApiError, Content, GenerateContentRequest, GenerateContentResponse, Part};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum FallbackError {
    #[error("GEMINI_API_KEY not set. Get one at https://aistudio.google.com/apikey")]
    ApiKeyNotSet,

    #[error("API rate limit exceeded. Please retry later.")]
    RateLimited,

    #[error("API quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("model returned no usable concept list")]
    EmptyResponse,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Abstraction over the generative fallback. Implemented by `GeminiClient`
/// for production; mock implementations drive the expansion-engine tests.
pub trait AdaptationSource {
    /// Candidate analogous concepts in the target language, in model order.
    async fn adapt(
        &self,
        concept: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, FallbackError>;
}

#[derive(Clone)]
struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Reads the credential once at construction. A missing key is surfaced
    /// here so a misconfigured run fails at startup, not mid-batch.
    pub fn from_env(http: Client) -> Result<Self, FallbackError> {
        let api_key = env::var("GEMINI_API_KEY").map_err(|_| FallbackError::ApiKeyNotSet)?;
        if api_key.trim().is_empty() {
            return Err(FallbackError::ApiKeyNotSet);
        }
        let model = env::var("GEMINI_MODEL")
            .ok()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Ok(Self {
            http,
            api_key: ApiKey(api_key.trim().to_string()),
            model,
            base_url: API_BASE.to_string(),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey("test-key".to_string()),
            model: DEFAULT_MODEL.to_string(),
            base_url: base_url.to_string(),
        }
    }

    async fn generate(&self, prompt: &str) -> Result<GenerateContentResponse, FallbackError> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
                role: None,
            }],
        };

        debug_assert!(
            url.starts_with("https://") || cfg!(test),
            "API key must only be sent over HTTPS"
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key.0)
            .header("User-Agent", crate::USER_AGENT)
            .json(&request)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Gemini API rate limited");
            return Err(FallbackError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if let Ok(body) = serde_json::from_str::<GenerateContentResponse>(&text)
                && let Some(err) = &body.error
            {
                let classified = classify_api_error(err);
                warn!(error = %classified, "Gemini API error");
                return Err(classified);
            }
            let snippet = if text.len() > 200 { &text[..200] } else { &text };
            warn!(status = %status, "Gemini API error (no structured body)");
            return Err(FallbackError::Api {
                code: status.as_u16(),
                message: format!("HTTP {status}: {snippet}"),
            });
        }

        let body: GenerateContentResponse = response.json().await?;
        debug!(model = %self.model, "fallback generation complete");

        if let Some(err) = &body.error {
            let classified = classify_api_error(err);
            warn!(error = %classified, "Gemini API error in 200 response");
            return Err(classified);
        }

        Ok(body)
    }
}

impl AdaptationSource for GeminiClient {
    async fn adapt(
        &self,
        concept: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, FallbackError> {
        let prompt = build_prompt(concept, source_language, target_language);
        let response = self.generate(&prompt).await?;

        let text = response
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.content.as_ref())
            .and_then(|content| content.parts.first())
            .map(|part| part.text.as_str())
            .unwrap_or_default();

        let concepts = parse_concept_list(text);
        if concepts.is_empty() {
            warn!(concept, "fallback returned no parseable concepts");
            return Err(FallbackError::EmptyResponse);
        }
        Ok(concepts)
    }
}

fn build_prompt(concept: &str, source_language: &str, target_language: &str) -> String {
    let source_full = lang::full_name(source_language);
    let target_full = lang::full_name(target_language);
    format!(
        "List up to 10 common {target_full} concepts that can be used analogously \
         to explain the {source_full} concept '{concept}'. Only list the concepts \
         themselves, without explanations. Separate each concept with a newline."
    )
}

/// One concept per line; leading enumeration ("1. ", "2) ") stripped, blank
/// lines skipped.
fn parse_concept_list(text: &str) -> Vec<String> {
    text.lines()
        .map(strip_enumeration)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_enumeration(line: &str) -> &str {
    let line = line.trim();
    let after_digits = line.trim_start_matches(|c: char| c.is_ascii_digit());
    if after_digits.len() < line.len()
        && let Some(rest) = after_digits
            .strip_prefix('.')
            .or_else(|| after_digits.strip_prefix(')'))
    {
        return rest.trim_start();
    }
    line
}

fn classify_api_error(err: &ApiError) -> FallbackError {
    let message = err
        .message
        .clone()
        .unwrap_or_else(|| "Unknown error".to_string());

    match err.code {
        Some(429) => FallbackError::RateLimited,
        Some(403) => FallbackError::QuotaExhausted(message),
        Some(code) => FallbackError::Api { code, message },
        None => FallbackError::Api {
            code: 0,
            message: format!("Unknown error (no status code): {message}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_uses_language_display_names() {
        let prompt = build_prompt("filial piety", "zh", "en");
        assert!(prompt.contains("Chinese concept 'filial piety'"));
        assert!(prompt.contains("English concepts"));
        assert!(prompt.contains("up to 10"));
    }

    #[test]
    fn prompt_survives_unknown_language_code() {
        let prompt = build_prompt("dog", "xx", "zh");
        assert!(prompt.contains("Unknown Language concept 'dog'"));
    }

    #[test]
    fn parse_plain_lines() {
        assert_eq!(parse_concept_list("苹果\n香蕉\n"), ["苹果", "香蕉"]);
    }

    #[test]
    fn parse_strips_numbered_enumeration() {
        let text = "1. apple pie\n2. thanksgiving\n3) county fair";
        assert_eq!(
            parse_concept_list(text),
            ["apple pie", "thanksgiving", "county fair"]
        );
    }

    #[test]
    fn parse_skips_blank_lines_and_whitespace() {
        assert_eq!(parse_concept_list("  apple  \n\n \nbanana"), ["apple", "banana"]);
    }

    #[test]
    fn parse_keeps_digits_that_are_not_enumeration() {
        assert_eq!(parse_concept_list("catch 22\n7-eleven"), ["catch 22", "7-eleven"]);
    }

    #[test]
    fn parse_empty_text_yields_nothing() {
        assert!(parse_concept_list("").is_empty());
        assert!(parse_concept_list("\n \n").is_empty());
    }

    #[test]
    fn classify_429_as_rate_limited() {
        let err = ApiError {
            code: Some(429),
            message: Some("Resource exhausted".into()),
        };
        assert!(matches!(classify_api_error(&err), FallbackError::RateLimited));
    }

    #[test]
    fn classify_403_as_quota_exhausted() {
        let err = ApiError {
            code: Some(403),
            message: Some("Quota exceeded".into()),
        };
        assert!(matches!(
            classify_api_error(&err),
            FallbackError::QuotaExhausted(_)
        ));
    }
}
