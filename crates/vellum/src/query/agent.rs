//! Hosted query agent over HTTP.

use std::sync::Arc;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{QueryConfig, StoreConfig};
use crate::error::{Result, VellumError};

use super::capability::{Answer, QueryCapability, QuerySession};

const CLUSTER_URL_HEADER: &str = "x-weaviate-cluster-url";

/// Query agent client authenticated with the store credentials.
pub struct QueryAgentClient {
    client: Client,
    endpoint: String,
    headers: HeaderMap,
}

impl QueryAgentClient {
    /// Create a client bound to the store cluster.
    pub fn new(store: &StoreConfig, query: &QueryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(query.timeout)
            .build()
            .map_err(|e| VellumError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: query.endpoint.clone(),
            headers: build_headers(&store.api_key, &store.url)?,
        })
    }
}

/// Build headers for agent requests.
fn build_headers(api_key: &str, cluster_url: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| VellumError::Config(format!("Invalid API key: {}", e)))?,
    );
    headers.insert(
        HeaderName::from_static(CLUSTER_URL_HEADER),
        HeaderValue::from_str(cluster_url)
            .map_err(|e| VellumError::Config(format!("Invalid cluster URL: {}", e)))?,
    );
    Ok(headers)
}

impl QueryCapability for QueryAgentClient {
    fn name(&self) -> &str {
        "query-agent"
    }

    fn create_session(
        &self,
        collections: &[String],
        system_prompt: &str,
    ) -> Result<Arc<dyn QuerySession>> {
        info!(collections = collections.len(), "query agent session bound");
        Ok(Arc::new(AgentSession {
            client: self.client.clone(),
            endpoint: self.endpoint.clone(),
            headers: self.headers.clone(),
            collections: collections.to_vec(),
            system_prompt: system_prompt.to_string(),
        }))
    }
}

struct AgentSession {
    client: Client,
    endpoint: String,
    headers: HeaderMap,
    collections: Vec<String>,
    system_prompt: String,
}

#[derive(Serialize)]
struct RunRequest<'a> {
    collections: &'a [String],
    system_prompt: &'a str,
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a Answer>,
}

impl AgentSession {
    fn send(&self, question: &str, context: Option<&Answer>) -> Result<Answer> {
        let request = RunRequest {
            collections: &self.collections,
            system_prompt: &self.system_prompt,
            query: question,
            context,
        };

        debug!(endpoint = %self.endpoint, "forwarding question");
        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .json(&request)
            .send()
            .map_err(query_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(VellumError::Query(format!(
                "query agent returned {}: {}",
                status, error_text
            )));
        }

        let body: Value = response.json().map_err(query_error)?;
        parse_answer(body)
    }
}

impl QuerySession for AgentSession {
    fn collections(&self) -> &[String] {
        &self.collections
    }

    fn run(&self, question: &str) -> Result<Answer> {
        self.send(question, None)
    }

    fn run_with_context(&self, question: &str, context: &Answer) -> Result<Answer> {
        self.send(question, Some(context))
    }
}

fn query_error(err: reqwest::Error) -> VellumError {
    if err.is_timeout() {
        VellumError::Timeout {
            operation: "query".to_string(),
        }
    } else {
        VellumError::Query(err.to_string())
    }
}

/// Extract the final answer, keeping the whole body as the trace.
fn parse_answer(body: Value) -> Result<Answer> {
    let final_answer = body
        .get("final_answer")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| VellumError::Query("response has no final_answer".to_string()))?;

    Ok(Answer {
        final_answer,
        trace: body,
    })
}
