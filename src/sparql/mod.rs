//! Thin SPARQL-over-HTTP client for the Wikidata query service.

pub mod query;
mod wikidata;

pub use wikidata::{WikidataClient, ENTITY_URI_PREFIX};

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::SparqlConfig;
use crate::error::{Result, WikigraphError};

/// `application/sparql-results+json` body
#[derive(Debug, Deserialize)]
pub struct SparqlResponse {
    pub results: SparqlResults,
}

#[derive(Debug, Deserialize)]
pub struct SparqlResults {
    #[serde(default)]
    pub bindings: Vec<HashMap<String, BindingValue>>,
}

/// One bound variable of a result row
#[derive(Debug, Clone, Deserialize)]
pub struct BindingValue {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl SparqlResponse {
    /// Value of `?{var}{i}` for every `i < count`, taking the first row that
    /// binds it.
    pub fn first_values(&self, var: &str, count: usize) -> Vec<Option<String>> {
        (0..count)
            .map(|i| {
                let name = format!("{}{}", var, i);
                self.results
                    .bindings
                    .iter()
                    .find_map(|row| row.get(&name))
                    .map(|b| b.value.clone())
            })
            .collect()
    }
}

/// SPARQL endpoint client
///
/// Issues GET requests with `format=json`. A 429 answer becomes
/// [`WikigraphError::Throttled`]; other failures become
/// [`WikigraphError::Service`]. After every successful request the client
/// pauses for the configured politeness delay.
pub struct SparqlClient {
    client: Client,
    endpoint: String,
    pause: Duration,
}

impl SparqlClient {
    pub fn new(config: &SparqlConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            pause: Duration::from_millis(config.pause_ms),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run one SELECT query.
    pub async fn select(&self, query: &str) -> Result<SparqlResponse> {
        let start = std::time::Instant::now();

        let response = self
            .client
            .get(&self.endpoint)
            .header("Accept", "application/sparql-results+json")
            .query(&[("format", "json"), ("query", query)])
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(WikigraphError::Throttled);
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            log::error!("SPARQL endpoint returned {}", status);
            return Err(WikigraphError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: SparqlResponse = serde_json::from_str(&body)?;

        log::debug!(
            "SPARQL query took {:?} ({} rows)",
            start.elapsed(),
            parsed.results.bindings.len()
        );

        if !self.pause.is_zero() {
            tokio::time::sleep(self.pause).await;
        }

        Ok(parsed)
    }
}
