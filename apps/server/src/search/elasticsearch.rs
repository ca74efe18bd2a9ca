//! Elasticsearch/OpenSearch `_search` client

use super::backend::{SearchBackend, SearchHit, SearchHits, SearchRequest};
use crate::config::SearchConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::time::Duration;

pub struct ElasticsearchBackend {
    client: Client,
    base_url: String,
    index_prefix: String,
}

impl ElasticsearchBackend {
    /// Create a client for the configured search URL.
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let base_url = config
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| Error::Validation("search.url is not configured".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            index_prefix: config.index_prefix.clone(),
        })
    }

    fn search_url(&self, index: &str) -> String {
        format!("{}/{}{}/_search", self.base_url, self.index_prefix, index)
    }
}

#[async_trait]
impl SearchBackend for ElasticsearchBackend {
    async fn search(&self, index: &str, request: &SearchRequest) -> Result<SearchHits> {
        let url = self.search_url(index);
        tracing::debug!(%url, page = request.page, per_page = request.per_page, "Executing search");

        let response = self.client.post(&url).json(&request.to_body()).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Search(format!(
                "search on '{}' failed with status {}: {}",
                index, status, body
            )));
        }

        let body = response.bytes().await?;
        parse_search_response(&body)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    total: TotalHits,
    #[serde(default)]
    hits: Vec<RawHit>,
}

/// Older servers report a bare number, newer ones `{"value": n, "relation": ..}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TotalHits {
    Count(u64),
    Object { value: u64 },
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source", default)]
    source: JsonValue,
}

/// Decodes the body of a `_search` response.
pub(crate) fn parse_search_response(body: &[u8]) -> Result<SearchHits> {
    let response: SearchResponse = serde_json::from_slice(body)
        .map_err(|e| Error::Search(format!("unexpected search response: {}", e)))?;

    let total = match response.hits.total {
        TotalHits::Count(n) | TotalHits::Object { value: n } => n,
    };
    let hits = response
        .hits
        .hits
        .into_iter()
        .map(|hit| SearchHit {
            id: hit.id,
            source: hit.source,
        })
        .collect();

    Ok(SearchHits { total, hits })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(url: Option<&str>) -> SearchConfig {
        SearchConfig {
            url: url.map(str::to_string),
            index_prefix: "sms_".to_string(),
            ..SearchConfig::default()
        }
    }

    #[test]
    fn requires_a_url() {
        assert!(matches!(
            ElasticsearchBackend::new(&config(None)),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn search_url_uses_prefix() {
        let backend = ElasticsearchBackend::new(&config(Some("http://localhost:9200/"))).unwrap();
        assert_eq!(
            backend.search_url("devices"),
            "http://localhost:9200/sms_devices/_search"
        );
    }

    fn parse(body: JsonValue) -> Result<SearchHits> {
        parse_search_response(&serde_json::to_vec(&body).unwrap())
    }

    #[test]
    fn parses_object_total() {
        let parsed = parse(json!({
            "hits": {
                "total": {"value": 2, "relation": "eq"},
                "hits": [
                    {"_id": "1", "_source": {"short_name": "a"}},
                    {"_id": "2", "_source": {"short_name": "b"}},
                ]
            }
        }))
        .unwrap();
        assert_eq!(parsed.total, 2);
        assert_eq!(parsed.hits.len(), 2);
        assert_eq!(parsed.hits[1].id, "2");
        assert_eq!(parsed.hits[1].source, json!({"short_name": "b"}));
    }

    #[test]
    fn parses_numeric_total_and_missing_source() {
        let parsed = parse(json!({"hits": {"total": 1, "hits": [{"_id": "7"}]}})).unwrap();
        assert_eq!(parsed.total, 1);
        assert_eq!(parsed.hits[0].id, "7");
        assert_eq!(parsed.hits[0].source, JsonValue::Null);
    }

    #[test]
    fn missing_total_is_an_error() {
        assert!(matches!(
            parse(json!({"hits": {"hits": []}})),
            Err(Error::Search(_))
        ));
    }

    #[test]
    fn hit_without_id_is_an_error() {
        let body = json!({"hits": {"total": 1, "hits": [{"_source": {}}]}});
        assert!(matches!(parse(body), Err(Error::Search(_))));
    }

    #[test]
    fn undecodable_body_is_an_error() {
        assert!(matches!(
            parse_search_response(b"<html>gateway</html>"),
            Err(Error::Search(_))
        ));
    }
}
