//! Weaviate REST API store implementation.

use std::sync::atomic::{AtomicBool, Ordering};

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{Result, VellumError};
use crate::schema::AttributeSpec;

use super::{BatchOutcome, DocumentStore, ObjectError, StoreObject, VectorizerPolicy};

/// Connection to a Weaviate cluster.
pub struct WeaviateStore {
    client: Client,
    base_url: String,
    api_key: String,
    closed: AtomicBool,
}

impl WeaviateStore {
    /// Connect and verify the cluster is ready.
    pub fn connect(config: &StoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VellumError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let store = Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            closed: AtomicBool::new(false),
        };

        let response = store
            .client
            .get(store.url("/v1/.well-known/ready"))
            .headers(store.build_headers()?)
            .send()
            .map_err(|e| VellumError::from_http("connect", e))?;
        check_status(response, "connect")?;

        info!(url = %store.base_url, "connected to store");
        Ok(store)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Build headers for API requests.
    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| VellumError::Config(format!("Invalid API key: {}", e)))?,
        );
        Ok(headers)
    }
}

impl DocumentStore for WeaviateStore {
    fn name(&self) -> &str {
        "weaviate"
    }

    fn list_collections(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(self.url("/v1/schema"))
            .headers(self.build_headers()?)
            .send()
            .map_err(|e| VellumError::from_http("list collections", e))?;

        let schema: SchemaResponse = check_status(response, "list collections")?
            .json()
            .map_err(|e| VellumError::from_http("list collections", e))?;

        Ok(schema.classes.into_iter().map(|c| c.class).collect())
    }

    fn collection_exists(&self, name: &str) -> Result<bool> {
        let response = self
            .client
            .get(self.url(&format!("/v1/schema/{}", class_name(name))))
            .headers(self.build_headers()?)
            .send()
            .map_err(|e| VellumError::from_http("check collection", e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check_status(response, "check collection")?;
        Ok(true)
    }

    fn delete_collection(&self, name: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/v1/schema/{}", class_name(name))))
            .headers(self.build_headers()?)
            .send()
            .map_err(|e| VellumError::from_http("delete collection", e))?;

        check_status(response, "delete collection")?;
        debug!(collection = name, "deleted collection");
        Ok(())
    }

    fn create_collection(
        &self,
        name: &str,
        attributes: &[AttributeSpec],
        vectorizer: &VectorizerPolicy,
    ) -> Result<()> {
        let properties: Vec<_> = attributes
            .iter()
            .map(|a| json!({ "name": a.name, "dataType": [a.kind.store_type()] }))
            .collect();

        let body = json!({
            "class": class_name(name),
            "vectorizer": vectorizer.module,
            "properties": properties,
        });

        let response = self
            .client
            .post(self.url("/v1/schema"))
            .headers(self.build_headers()?)
            .json(&body)
            .send()
            .map_err(|e| VellumError::from_http("create collection", e))?;

        check_status(response, "create collection")?;
        debug!(collection = name, attributes = attributes.len(), "created collection");
        Ok(())
    }

    fn write_objects(&self, collection: &str, objects: &[StoreObject]) -> Result<BatchOutcome> {
        let class = class_name(collection);
        let payload: Vec<_> = objects
            .iter()
            .map(|properties| json!({ "class": class, "properties": properties }))
            .collect();

        let response = self
            .client
            .post(self.url("/v1/batch/objects"))
            .headers(self.build_headers()?)
            .json(&json!({ "objects": payload }))
            .send()
            .map_err(|e| VellumError::from_http("write objects", e))?;

        let items: Vec<BatchItem> = check_status(response, "write objects")?
            .json()
            .map_err(|e| VellumError::from_http("write objects", e))?;

        let errors: Vec<ObjectError> = items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let messages: Vec<String> = item
                    .result
                    .and_then(|r| r.errors)
                    .map(|e| e.error.into_iter().map(|m| m.message).collect())
                    .unwrap_or_default();
                if messages.is_empty() {
                    None
                } else {
                    Some(ObjectError {
                        index,
                        message: messages.join("; "),
                    })
                }
            })
            .collect();

        Ok(BatchOutcome {
            accepted: objects.len().saturating_sub(errors.len()),
            errors,
        })
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!(url = %self.base_url, "store connection closed");
        }
    }
}

impl Drop for WeaviateStore {
    fn drop(&mut self) {
        self.close();
    }
}

/// Class name as the store records it (first letter upper-cased).
fn class_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn check_status(response: Response, operation: &str) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response.text().unwrap_or_default();
    Err(VellumError::Store {
        operation: operation.to_string(),
        message: format!("{}: {}", status, error_text),
    })
}

/// Schema listing response.
#[derive(Debug, Deserialize)]
struct SchemaResponse {
    #[serde(default)]
    classes: Vec<ClassEntry>,
}

#[derive(Debug, Deserialize)]
struct ClassEntry {
    class: String,
}

/// One entry of a batch write response.
#[derive(Debug, Deserialize)]
struct BatchItem {
    #[serde(default)]
    result: Option<BatchResult>,
}

#[derive(Debug, Deserialize)]
struct BatchResult {
    #[serde(default)]
    errors: Option<BatchErrors>,
}

#[derive(Debug, Deserialize)]
struct BatchErrors {
    #[serde(default)]
    error: Vec<BatchErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct BatchErrorMessage {
    message: String,
}
