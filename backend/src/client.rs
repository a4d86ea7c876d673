//! Outbound REST plumbing: URL construction against the configured host and
//! the bearer-authenticated verb wrappers used by every engine.
//!
//! Non-2xx responses are data, not errors — the batch engines surface them
//! row by row. Only transport-level faults (timeout, refused connection,
//! unparsable body) become a `ClientError`, so callers can distinguish
//! "the backend said no" from "the backend never answered".

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("response body was not valid JSON: {0}")]
    MalformedBody(String),
}

/// Raw outcome of one HTTP call.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    /// Success per the backend's convention for writes.
    pub fn is_success(&self) -> bool {
        matches!(self.status, 200 | 201)
    }

    /// Success per the backend's convention for deletes.
    pub fn is_deleted(&self) -> bool {
        matches!(self.status, 200 | 204)
    }

    pub fn json(&self) -> Result<Value, ClientError> {
        serde_json::from_str(&self.body).map_err(|e| ClientError::MalformedBody(e.to_string()))
    }
}

/// Collection URL for a resource under the standard API prefix.
pub fn resource_url(host: &str, resource: &str) -> String {
    format!("{}/resource-server/api/{}", host.trim_end_matches('/'), resource)
}

/// Read proxy used by the timecard flow; takes query parameters instead of
/// a path id.
pub fn timecard_proxy_url(host: &str) -> String {
    format!("{}/web-client/restProxy/timecards/", host.trim_end_matches('/'))
}

/// The verb surface the engines are written against. Production code uses
/// [`ApiClient`]; tests substitute recording fakes.
#[allow(async_fn_in_trait)]
pub trait ResourceClient {
    async fn get(&self, url: &str) -> Result<ApiResponse, ClientError>;
    async fn get_query(&self, url: &str, query: &[(&str, String)])
        -> Result<ApiResponse, ClientError>;
    async fn post(&self, url: &str, body: &Value) -> Result<ApiResponse, ClientError>;
    async fn put(&self, url: &str, body: &Value) -> Result<ApiResponse, ClientError>;
    async fn delete(&self, url: &str) -> Result<ApiResponse, ClientError>;
}

/// Bearer-authenticated client bound to one session token. Single attempt,
/// uniform timeout (configured on the underlying `reqwest::Client`), no
/// retries.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    token: String,
}

impl ApiClient {
    pub fn new(http: reqwest::Client, token: String) -> Self {
        Self { http, token }
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        query: Option<&[(&str, String)]>,
        body: Option<&Value>,
    ) -> Result<ApiResponse, ClientError> {
        let mut req = self
            .http
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        if let Some(query) = query {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(classify)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(classify)?;
        Ok(ApiResponse { status, body })
    }
}

fn classify(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout
    } else {
        ClientError::Connect(err.to_string())
    }
}

impl ResourceClient for ApiClient {
    async fn get(&self, url: &str) -> Result<ApiResponse, ClientError> {
        self.request(Method::GET, url, None, None).await
    }

    async fn get_query(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<ApiResponse, ClientError> {
        self.request(Method::GET, url, Some(query), None).await
    }

    async fn post(&self, url: &str, body: &Value) -> Result<ApiResponse, ClientError> {
        self.request(Method::POST, url, None, Some(body)).await
    }

    async fn put(&self, url: &str, body: &Value) -> Result<ApiResponse, ClientError> {
        self.request(Method::PUT, url, None, Some(body)).await
    }

    async fn delete(&self, url: &str) -> Result<ApiResponse, ClientError> {
        self.request(Method::DELETE, url, None, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_url_strips_trailing_slashes() {
        assert_eq!(
            resource_url("https://host.example/", "paycodes"),
            "https://host.example/resource-server/api/paycodes"
        );
        assert_eq!(
            resource_url("https://host.example", "roles"),
            "https://host.example/resource-server/api/roles"
        );
    }

    #[test]
    fn delete_accepts_204() {
        let resp = ApiResponse { status: 204, body: String::new() };
        assert!(resp.is_deleted());
        assert!(!resp.is_success());
    }
}
