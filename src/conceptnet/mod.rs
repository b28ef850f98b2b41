pub mod types;

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use crate::graph::normalize_key;
use types::QueryResponse;

const API_BASE: &str = "https://api.conceptnet.io";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 300;
const HYPONYM_QUERY_LIMIT: &str = "1000";

#[derive(Debug, thiserror::Error)]
pub enum ConceptNetError {
    #[error("ConceptNet returned status {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Abstraction over the lexical-relation source. Implemented by
/// `ConceptNetClient` for production; mock implementations drive the
/// expansion-engine tests.
pub trait RelationSource {
    /// Whether the source has any edge at all for this concept/language pair.
    async fn concept_exists(&self, concept: &str, language: &str)
    -> Result<bool, ConceptNetError>;

    /// Synonyms of `concept` (in `from` language) expressed in `to` language.
    async fn translated_synonyms(
        &self,
        concept: &str,
        from: &str,
        to: &str,
    ) -> Result<Vec<String>, ConceptNetError>;

    /// Superordinate concepts (`IsA` targets) of `concept` in `language`.
    async fn hypernyms(
        &self,
        concept: &str,
        language: &str,
    ) -> Result<Vec<String>, ConceptNetError>;

    /// Subordinate concepts (`IsA` sources pointing at `concept`) in `language`.
    async fn hyponyms(&self, concept: &str, language: &str)
    -> Result<Vec<String>, ConceptNetError>;
}

#[derive(Clone)]
pub struct ConceptNetClient {
    http: Client,
    base_url: String,
}

impl ConceptNetClient {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
        }
    }

    fn concept_id(language: &str, concept: &str) -> String {
        format!("/c/{language}/{}", normalize_key(concept))
    }

    /// One GET with bounded retry. Server-side transient failures (5xx, 429)
    /// and timeouts/connection errors are retried with equal-jitter backoff;
    /// anything else returns immediately.
    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<QueryResponse, ConceptNetError> {
        for attempt in 0..MAX_ATTEMPTS {
            match self.request(url, query).await {
                Ok(body) => return Ok(body),
                Err(e) if is_retriable(&e) && attempt + 1 < MAX_ATTEMPTS => {
                    let delay_ms = jittered_backoff(attempt);
                    debug!(
                        attempt = attempt + 1,
                        delay_ms,
                        error = %e,
                        "retrying after transient ConceptNet error"
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(e) => return Err(e),
            }
        }
        unreachable!("retry loop always returns")
    }

    async fn request(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<QueryResponse, ConceptNetError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .header("User-Agent", crate::USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, url, "ConceptNet request failed");
            return Err(ConceptNetError::Status(status.as_u16()));
        }

        Ok(response.json().await?)
    }
}

impl RelationSource for ConceptNetClient {
    async fn concept_exists(
        &self,
        concept: &str,
        language: &str,
    ) -> Result<bool, ConceptNetError> {
        let url = format!("{}{}", self.base_url, Self::concept_id(language, concept));
        let body = self.get_json(&url, &[]).await?;
        debug!(concept, language, edges = body.edges.len(), "existence check");
        Ok(!body.edges.is_empty())
    }

    async fn translated_synonyms(
        &self,
        concept: &str,
        from: &str,
        to: &str,
    ) -> Result<Vec<String>, ConceptNetError> {
        let url = format!("{}/query", self.base_url);
        let query = [
            ("start", Self::concept_id(from, concept)),
            ("rel", "/r/Synonym".to_string()),
        ];
        let body = self.get_json(&url, &query).await?;

        Ok(body
            .edges
            .iter()
            .filter_map(|edge| {
                let end = edge.end.as_ref()?;
                if end.language.as_deref() != Some(to) {
                    return None;
                }
                end.label.clone().filter(|label| !label.is_empty())
            })
            .collect())
    }

    async fn hypernyms(
        &self,
        concept: &str,
        language: &str,
    ) -> Result<Vec<String>, ConceptNetError> {
        let key = normalize_key(concept);
        let url = format!("{}/query", self.base_url);
        let query = [
            ("start", Self::concept_id(language, concept)),
            ("rel", "/r/IsA".to_string()),
        ];
        let body = self.get_json(&url, &query).await?;

        // The query endpoint can return edges for compound terms that merely
        // contain the queried one; keep only edges that start at the concept
        // itself, compared under key normalization.
        Ok(body
            .edges
            .iter()
            .filter_map(|edge| {
                let start_label = edge.start.as_ref()?.label.as_deref()?;
                if normalize_key(start_label) != key {
                    return None;
                }
                edge.end
                    .as_ref()?
                    .label
                    .clone()
                    .filter(|label| !label.is_empty())
            })
            .collect())
    }

    async fn hyponyms(
        &self,
        concept: &str,
        language: &str,
    ) -> Result<Vec<String>, ConceptNetError> {
        let concept_id = Self::concept_id(language, concept);
        let url = format!("{}/query", self.base_url);
        let query = [
            ("node", concept_id.clone()),
            ("limit", HYPONYM_QUERY_LIMIT.to_string()),
        ];
        let body = self.get_json(&url, &query).await?;

        // The node query returns every edge touching the concept; hyponyms
        // are the IsA edges that point *at* it. The concept term is the last
        // path segment of the start id.
        Ok(body
            .edges
            .iter()
            .filter_map(|edge| {
                if edge.rel.as_ref()?.label.as_deref() != Some("IsA") {
                    return None;
                }
                let end_id = edge.end.as_ref()?.id.as_deref()?;
                if !end_id.eq_ignore_ascii_case(&concept_id) {
                    return None;
                }
                let start_id = edge.start.as_ref()?.id.as_deref()?;
                start_id
                    .rsplit('/')
                    .next()
                    .filter(|term| !term.is_empty())
                    .map(str::to_string)
            })
            .collect())
    }
}

fn is_retriable(e: &ConceptNetError) -> bool {
    match e {
        ConceptNetError::Status(code) => *code == 429 || (500..=599).contains(code),
        ConceptNetError::Network(e) => e.is_timeout() || e.is_connect(),
    }
}

/// Equal jitter backoff: base/2 + rand(0, base/2).
fn jittered_backoff(attempt: u32) -> u64 {
    let base = INITIAL_BACKOFF_MS * 2u64.pow(attempt);
    let half = base / 2;
    half + fastrand::u64(..half.max(1))
}
