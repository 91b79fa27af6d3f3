//! Thin JSON-over-HTTP client shared by the provider variants.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, Response};
use serde_json::Value;

use crate::error::ProviderError;

/// Where a provider lives and how to authenticate against it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Endpoint {
    pub base_url: String,
    /// Header carrying the project id (e.g. `project_id`).
    pub auth_header: Option<String>,
    pub project_id: Option<String>,
}

impl Endpoint {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_auth(mut self, header: impl Into<String>, project_id: impl Into<String>) -> Self {
        self.auth_header = Some(header.into());
        self.project_id = Some(project_id.into());
        self
    }
}

#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    endpoint: Endpoint,
}

impl HttpClient {
    pub fn new(endpoint: Endpoint) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ProviderError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match (&self.endpoint.auth_header, &self.endpoint.project_id) {
            (Some(header), Some(id)) => request.header(header.as_str(), id.as_str()),
            _ => request,
        }
    }

    pub async fn get_json(&self, path: &str) -> Result<Value, ProviderError> {
        let response = self
            .authorize(self.http.get(self.url(path)))
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("GET {path}: {e}")))?;
        Self::read(response).await
    }

    pub async fn post_bytes(
        &self,
        path: &str,
        content_type: &'static str,
        body: Vec<u8>,
    ) -> Result<Value, ProviderError> {
        let response = self
            .authorize(self.http.post(self.url(path)))
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("POST {path}: {e}")))?;
        Self::read(response).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ProviderError> {
        let response = self
            .authorize(self.http.post(self.url(path)))
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("POST {path}: {e}")))?;
        Self::read(response).await
    }

    async fn read(response: Response) -> Result<Value, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json()
            .await
            .map_err(|e| ProviderError::decode("response body", e))
    }
}
