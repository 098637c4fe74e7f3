//! Content store client
//!
//! The content store speaks a declarative nested-projection query language
//! over HTTP. Reads go through `query`, writes through `mutate`.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::ContentConfig;

/// Access to the content store
#[async_trait]
pub trait ContentClient: Send + Sync {
    /// Run a query; `params` is a JSON object bound to `$name` placeholders.
    /// Returns the `result` member of the response (`Value::Null` when empty).
    async fn query(&self, query: &str, params: Value) -> Result<Value>;

    /// Apply a batch of mutations in one transaction
    async fn mutate(&self, mutations: Vec<Value>) -> Result<()>;
}

/// HTTP implementation of [`ContentClient`]
pub struct HttpContentClient {
    http: reqwest::Client,
    base_url: String,
    dataset: String,
    api_version: String,
    token: Option<String>,
}

impl HttpContentClient {
    pub fn new(config: &ContentConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            bail!("content.base_url is required");
        }
        let http = reqwest::Client::builder()
            .build()
            .context("failed to build content HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            dataset: config.dataset.clone(),
            api_version: config.api_version.clone(),
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/v{}/data/{}/{}",
            self.base_url, self.api_version, action, self.dataset
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Turn a non-success response into an error carrying the store's message
    async fn check(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .with_context(|| format!("content store returned an unreadable body ({status})"))?;

        if !status.is_success() {
            let description = body
                .pointer("/error/description")
                .or_else(|| body.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("request failed");
            return Err(anyhow!("content store error ({status}): {description}"));
        }
        Ok(body)
    }
}

/// Encode query parameters as `$name=<json>` pairs
fn encode_params(params: &Value) -> Result<Vec<(String, String)>> {
    match params {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => Ok(map
            .iter()
            .map(|(name, value)| (format!("${name}"), value.to_string()))
            .collect()),
        other => bail!("query params must be an object, got {other}"),
    }
}

#[async_trait]
impl ContentClient for HttpContentClient {
    async fn query(&self, query: &str, params: Value) -> Result<Value> {
        let mut pairs = vec![("query".to_string(), query.to_string())];
        pairs.extend(encode_params(&params)?);

        let request = self.http.get(self.endpoint("query")).query(&pairs);
        let response = self
            .authorize(request)
            .send()
            .await
            .context("content query request failed")?;

        let mut body = Self::check(response).await?;
        Ok(body.get_mut("result").map(Value::take).unwrap_or(Value::Null))
    }

    async fn mutate(&self, mutations: Vec<Value>) -> Result<()> {
        if mutations.is_empty() {
            return Ok(());
        }

        let request = self
            .http
            .post(self.endpoint("mutate"))
            .json(&json!({ "mutations": mutations }));
        let response = self
            .authorize(request)
            .send()
            .await
            .context("content mutate request failed")?;

        Self::check(response).await?;
        Ok(())
    }
}
