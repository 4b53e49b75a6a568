//! Remote data access: SPARQL query client and per-entity lookups.
//!
//! All transport sits behind the narrow [`RemoteSource`] trait so the
//! aggregation and merge logic never touches HTTP or response shapes.
//! [`HttpRemote`] is the production implementation: one GET per SPARQL
//! query (`query` + `format=json` parameters, `results.bindings` body)
//! and one GET per entity for editor top-lists and page-author records.
//!
//! There is no retry, pagination, or rate limiting; a transport or shape
//! failure aborts the calling pipeline. Result sets are materialized fully
//! in memory.

mod bindings;

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use cellstats_shared::{CellStatsError, EditorRecord, Qid, Result, StatsConfig};

pub use bindings::{rows_to_cell_articles, rows_to_taxon_rows};

/// User-Agent string for all remote requests.
const USER_AGENT: &str = concat!("cellstats/", env!("CARGO_PKG_VERSION"));

/// Per-entity editor list size requested from the editor-stats endpoint.
const EDITOR_LIMIT: u32 = 1000;

/// Provenance query: cell-type statements joined to their source article.
pub const CELL_ARTICLE_QUERY: &str = "\
SELECT ?cell ?article WHERE {
  ?cell p:P31 ?statement .
  ?statement ps:P31 wd:Q189118 ;
             prov:wasDerivedFrom/pr:P248 ?article.
}
";

/// Taxon query: cell-type entities with their optional taxon label.
pub const CELL_TAXON_QUERY: &str = "\
SELECT ?qid ?taxon_name WHERE {
  ?qid wdt:P279+ wd:Q7868 .
  OPTIONAL {
    ?qid wdt:P703 ?taxon .
    ?taxon rdfs:label ?taxon_name .
    FILTER(LANG(?taxon_name) = \"en\")
  }
}
";

/// One query result row: variable name → bound value.
pub type Row = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// RemoteSource
// ---------------------------------------------------------------------------

/// Narrow interface over the remote knowledge base.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Run a structured query and return its rows in response order.
    async fn query_rows(&self, query: &str) -> Result<Vec<Row>>;

    /// Fetch the top-editor records for one entity.
    async fn fetch_editors(&self, qid: &Qid) -> Result<Vec<EditorRecord>>;

    /// Fetch the username credited as the entity's page creator.
    async fn fetch_author(&self, qid: &Qid) -> Result<String>;
}

// ---------------------------------------------------------------------------
// HttpRemote
// ---------------------------------------------------------------------------

/// HTTP-backed [`RemoteSource`] reusing one client across requests.
pub struct HttpRemote {
    client: Client,
    sparql_endpoint: Url,
    editor_stats_base: String,
    article_info_base: String,
}

impl HttpRemote {
    /// Build a remote source from the runtime configuration.
    pub fn new(config: &StatsConfig) -> Result<Self> {
        let sparql_endpoint = Url::parse(&config.sparql_endpoint).map_err(|e| {
            CellStatsError::config(format!(
                "invalid SPARQL endpoint '{}': {e}",
                config.sparql_endpoint
            ))
        })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CellStatsError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            sparql_endpoint,
            editor_stats_base: config.editor_stats_base.clone(),
            article_info_base: config.article_info_base.clone(),
        })
    }

    /// GET a URL and parse the body as JSON.
    async fn get_json(&self, url: &str) -> Result<serde_json::Value> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CellStatsError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CellStatsError::Network(format!("{url}: HTTP {status}")));
        }

        response
            .json()
            .await
            .map_err(|e| CellStatsError::parse(format!("{url}: invalid JSON body: {e}")))
    }
}

#[async_trait]
impl RemoteSource for HttpRemote {
    #[instrument(skip_all)]
    async fn query_rows(&self, query: &str) -> Result<Vec<Row>> {
        let response = self
            .client
            .get(self.sparql_endpoint.clone())
            .query(&[("query", query), ("format", "json")])
            .send()
            .await
            .map_err(|e| CellStatsError::Network(format!("{}: {e}", self.sparql_endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CellStatsError::Network(format!(
                "{}: HTTP {status}",
                self.sparql_endpoint
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CellStatsError::parse(format!("invalid query response JSON: {e}")))?;

        let bindings = body
            .get("results")
            .and_then(|r| r.get("bindings"))
            .and_then(|b| b.as_array())
            .ok_or_else(|| {
                CellStatsError::validation("query response has no 'results.bindings' array")
            })?;

        let mut rows = Vec::with_capacity(bindings.len());
        for binding in bindings {
            let object = binding.as_object().ok_or_else(|| {
                CellStatsError::validation("query binding entry is not an object")
            })?;

            let mut row = Row::new();
            for (var, term) in object {
                let value = term.get("value").and_then(|v| v.as_str()).ok_or_else(|| {
                    CellStatsError::validation(format!("binding for '{var}' has no 'value' field"))
                })?;
                row.insert(var.clone(), value.to_string());
            }
            rows.push(row);
        }

        debug!(endpoint = %self.sparql_endpoint, rows = rows.len(), "query returned");
        Ok(rows)
    }

    #[instrument(skip_all, fields(qid = %qid))]
    async fn fetch_editors(&self, qid: &Qid) -> Result<Vec<EditorRecord>> {
        let url = format!(
            "{}/{}?limit={EDITOR_LIMIT}",
            self.editor_stats_base,
            qid.as_str()
        );
        let body = self.get_json(&url).await?;

        let editors = body
            .get("top_editors")
            .and_then(|e| e.as_array())
            .ok_or_else(|| {
                CellStatsError::validation(format!(
                    "editor response for {qid} has no 'top_editors' array"
                ))
            })?;

        let mut records = Vec::with_capacity(editors.len());
        for editor in editors {
            let username = editor
                .get("username")
                .and_then(|u| u.as_str())
                .ok_or_else(|| {
                    CellStatsError::validation(format!(
                        "editor entry for {qid} has no 'username' field"
                    ))
                })?;
            let count = editor.get("count").and_then(|c| c.as_u64()).ok_or_else(|| {
                CellStatsError::validation(format!("editor entry for {qid} has no 'count' field"))
            })?;

            records.push(EditorRecord {
                username: username.to_string(),
                count,
                qid: qid.clone(),
            });
        }

        debug!(editors = records.len(), "fetched editor records");
        Ok(records)
    }

    #[instrument(skip_all, fields(qid = %qid))]
    async fn fetch_author(&self, qid: &Qid) -> Result<String> {
        let url = format!("{}/{}", self.article_info_base, qid.as_str());
        let body = self.get_json(&url).await?;

        let author = body.get("author").and_then(|a| a.as_str()).ok_or_else(|| {
            CellStatsError::validation(format!("page info for {qid} has no 'author' field"))
        })?;

        Ok(author.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> StatsConfig {
        let app = cellstats_shared::AppConfig::default();
        let mut config = StatsConfig::from(&app);
        config.sparql_endpoint = format!("{}/sparql", server.uri());
        config.editor_stats_base = format!("{}/top_editors", server.uri());
        config.article_info_base = format!("{}/articleinfo", server.uri());
        config
    }

    #[tokio::test]
    async fn query_rows_parses_bindings() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "head": {"vars": ["cell", "article"]},
            "results": {"bindings": [
                {
                    "cell": {"type": "uri", "value": "http://www.wikidata.org/entity/Q111"},
                    "article": {"type": "uri", "value": "http://www.wikidata.org/entity/Q222"}
                },
                {
                    "cell": {"type": "uri", "value": "http://www.wikidata.org/entity/Q333"},
                    "article": {"type": "uri", "value": "http://www.wikidata.org/entity/Q444"}
                }
            ]}
        });

        Mock::given(method("GET"))
            .and(path("/sparql"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let remote = HttpRemote::new(&config_for(&server)).unwrap();
        let rows = remote.query_rows(CELL_ARTICLE_QUERY).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].get("cell").map(String::as_str),
            Some("http://www.wikidata.org/entity/Q111")
        );
    }

    #[tokio::test]
    async fn query_rows_missing_bindings_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sparql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let remote = HttpRemote::new(&config_for(&server)).unwrap();
        let err = remote.query_rows(CELL_TAXON_QUERY).await.unwrap_err();
        assert!(err.to_string().contains("results.bindings"));
    }

    #[tokio::test]
    async fn query_rows_http_error_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sparql"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let remote = HttpRemote::new(&config_for(&server)).unwrap();
        let err = remote.query_rows(CELL_TAXON_QUERY).await.unwrap_err();
        assert!(matches!(err, CellStatsError::Network(_)));
    }

    #[tokio::test]
    async fn fetch_editors_parses_records() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "top_editors": [
                {"username": "alice", "count": 12, "minor": 3},
                {"username": "bob", "count": 1, "minor": 0}
            ]
        });

        Mock::given(method("GET"))
            .and(path("/top_editors/Q42"))
            .and(query_param("limit", "1000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let remote = HttpRemote::new(&config_for(&server)).unwrap();
        let records = remote.fetch_editors(&Qid::from("Q42")).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].username, "alice");
        assert_eq!(records[0].count, 12);
        assert_eq!(records[0].qid, Qid::from("Q42"));
    }

    #[tokio::test]
    async fn fetch_editors_missing_field_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/top_editors/Q42"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"editors": []})),
            )
            .mount(&server)
            .await;

        let remote = HttpRemote::new(&config_for(&server)).unwrap();
        let err = remote.fetch_editors(&Qid::from("Q42")).await.unwrap_err();
        assert!(err.to_string().contains("top_editors"));
    }

    #[tokio::test]
    async fn fetch_author_reads_author_field() {
        let server = MockServer::start().await;
        let body = serde_json::json!({"author": "alice", "created_at": "2020-01-01"});

        Mock::given(method("GET"))
            .and(path("/articleinfo/Q7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let remote = HttpRemote::new(&config_for(&server)).unwrap();
        let author = remote.fetch_author(&Qid::from("Q7")).await.unwrap();
        assert_eq!(author, "alice");
    }

    #[tokio::test]
    async fn fetch_author_missing_field_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/articleinfo/Q7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let remote = HttpRemote::new(&config_for(&server)).unwrap();
        let err = remote.fetch_author(&Qid::from("Q7")).await.unwrap_err();
        assert!(err.to_string().contains("author"));
    }
}
