use serde::Deserialize;

/// Response shape shared by `/c/{lang}/{term}` and `/query` lookups.
/// Absence of data is a successful empty-edge response, not an error.
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub edges: Vec<Edge>,
}

#[derive(Debug, Deserialize)]
pub struct Edge {
    pub rel: Option<Rel>,
    pub start: Option<EdgeNode>,
    pub end: Option<EdgeNode>,
}

#[derive(Debug, Deserialize)]
pub struct Rel {
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EdgeNode {
    #[serde(rename = "@id")]
    pub id: Option<String>,
    pub label: Option<String>,
    pub language: Option<String>,
}
