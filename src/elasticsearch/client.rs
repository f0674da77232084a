//! Elasticsearch client wrapper.

use anyhow::{Context, Result};
use elasticsearch::{
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    Elasticsearch, SearchParts,
};
use url::Url;

/// Elasticsearch client wrapper with connection configuration
#[derive(Clone)]
pub struct EsClient {
    client: Elasticsearch,
    pub index_name: String,
}

impl EsClient {
    /// Create a new Elasticsearch client
    pub async fn new(es_url: &str, index_name: &str) -> Result<Self> {
        let url = Url::parse(es_url)?;
        let conn_pool = SingleNodeConnectionPool::new(url);
        let transport = TransportBuilder::new(conn_pool).disable_proxy().build()?;

        let client = Elasticsearch::new(transport);

        Ok(Self {
            client,
            index_name: index_name.to_string(),
        })
    }

    /// Get the underlying Elasticsearch client
    pub fn client(&self) -> &Elasticsearch {
        &self.client
    }

    /// Check if cluster is healthy
    pub async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .cluster()
            .health(elasticsearch::cluster::ClusterHealthParts::None)
            .send()
            .await?;

        Ok(response.status_code().is_success())
    }

    /// Get document count in index
    pub async fn doc_count(&self) -> Result<u64> {
        let response = self
            .client
            .count(elasticsearch::CountParts::Index(&[&self.index_name]))
            .send()
            .await?;

        let body = response.json::<serde_json::Value>().await?;
        Ok(body["count"].as_u64().unwrap_or(0))
    }

    /// Run a search against the index and return the `_source` of each hit.
    pub async fn search_sources(
        &self,
        body: serde_json::Value,
    ) -> Result<Vec<serde_json::Value>> {
        let response = self
            .client
            .search(SearchParts::Index(&[&self.index_name]))
            .body(body)
            .send()
            .await
            .context("Search request failed")?;

        let response_body = response.json::<serde_json::Value>().await?;

        if let Some(error) = response_body.get("error") {
            anyhow::bail!("Search request rejected: {}", error);
        }

        let hits = response_body["hits"]["hits"]
            .as_array()
            .cloned()
            .unwrap_or_default();

        Ok(hits
            .into_iter()
            .map(|mut hit| hit["_source"].take())
            .collect())
    }
}
