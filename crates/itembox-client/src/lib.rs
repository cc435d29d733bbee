//! HTTP client for the Itembox API.
//!
//! Provides a minimal client with generic GET/POST/PUT/DELETE helpers and
//! domain methods for item CRUD. Field validation runs locally with the same
//! rule table the server uses, so bad input fails before a request is sent.

pub mod api;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

pub use api::{ItemPage, PhotoUpload};
pub use itembox_core::{Item, Page, PageMeta};

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
    pub code: String,
    #[serde(default)]
    pub messages: Option<Vec<String>>,
}

/// HTTP client for the Itembox API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create client from environment: ITEMBOX_API_URL (or API_URL).
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("ITEMBOX_API_URL")
            .or_else(|_| std::env::var("API_URL"))
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-success response into an error, preferring the structured
    /// API error body when one is present.
    async fn error_from_response(response: reqwest::Response) -> anyhow::Error {
        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        match serde_json::from_str::<ApiErrorBody>(&text) {
            Ok(body) => {
                let detail = body
                    .messages
                    .filter(|m| !m.is_empty())
                    .map(|m| m.join("; "))
                    .unwrap_or(body.error);
                anyhow::anyhow!("API request failed with status {} ({}): {}", status, body.code, detail)
            }
            Err(_) => anyhow::anyhow!("API request failed with status {}: {}", status, text),
        }
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        response
            .json()
            .await
            .context("Failed to parse response as JSON")
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.build_url(path);
        let mut request = self.client.get(&url);

        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await.context("Failed to send request")?;
        Self::read_json(response).await
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.build_url(path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;
        Self::read_json(response).await
    }

    /// POST multipart form and deserialize response.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T> {
        let url = self.build_url(path);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .context("Failed to send request")?;
        Self::read_json(response).await
    }

    /// PUT JSON body and deserialize response.
    pub async fn put_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.build_url(path);
        let response = self
            .client
            .put(&url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;
        Self::read_json(response).await
    }

    /// PUT multipart form and deserialize response.
    pub async fn put_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T> {
        let url = self.build_url(path);
        let response = self
            .client
            .put(&url)
            .multipart(form)
            .send()
            .await
            .context("Failed to send request")?;
        Self::read_json(response).await
    }

    /// DELETE request. Returns Ok(()) on success.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let url = self.build_url(path);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        Ok(())
    }

    /// Raw client for custom requests.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_normalized() {
        let client = ApiClient::new("http://localhost:3000/".to_string()).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(client.build_url("/items"), "http://localhost:3000/items");
    }

    #[test]
    fn test_error_body_parses_messages() {
        let body: ApiErrorBody = serde_json::from_str(
            r#"{"error":"Validation failed","code":"VALIDATION_ERROR","messages":["title must be between 3 and 50 characters"]}"#,
        )
        .unwrap();
        assert_eq!(body.code, "VALIDATION_ERROR");
        assert_eq!(body.messages.unwrap().len(), 1);
    }
}
