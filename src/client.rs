//! HTTP client for the Task API.

use crate::errors::ApiError;
use crate::models::{Task, TaskPayload, TaskStats, TaskStatus, WelcomeResponse};
use reqwest::{Client, Method, RequestBuilder, header};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, error};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Arc<RwLock<String>>,
    in_flight: Arc<AtomicUsize>,
}

/// Keeps the loading indicator on while alive.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(3))
            .build()?;

        Ok(Self {
            http,
            base_url: Arc::new(RwLock::new(normalize_base_url(&base_url.into()))),
            in_flight: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn base_url(&self) -> String {
        self.base_url
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set_base_url(&self, base_url: &str) {
        let mut guard = self
            .base_url
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = normalize_base_url(base_url);
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub async fn welcome(&self) -> Result<WelcomeResponse, ApiError> {
        self.call(Method::GET, "/", None).await
    }

    pub async fn stats(&self) -> Result<TaskStats, ApiError> {
        self.call(Method::GET, "/stats", None).await
    }

    pub async fn tasks(&self, filter: Option<TaskStatus>) -> Result<Vec<Task>, ApiError> {
        let endpoint = match filter {
            Some(status) => format!("/tasks?status={status}"),
            None => "/tasks".to_string(),
        };
        self.call(Method::GET, &endpoint, None).await
    }

    pub async fn task(&self, id: u64) -> Result<Task, ApiError> {
        self.call(Method::GET, &format!("/tasks/{id}"), None).await
    }

    pub async fn create_task(&self, payload: &TaskPayload) -> Result<Task, ApiError> {
        self.call(Method::POST, "/tasks", Some(payload)).await
    }

    pub async fn update_task(&self, id: u64, payload: &TaskPayload) -> Result<Task, ApiError> {
        self.call(Method::PUT, &format!("/tasks/{id}"), Some(payload))
            .await
    }

    pub async fn delete_task(&self, id: u64) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .call(Method::DELETE, &format!("/tasks/{id}"), None)
            .await?;
        Ok(())
    }

    /// Prometheus exposition text from `GET /metrics`.
    pub async fn metrics(&self) -> Result<String, ApiError> {
        let _loading = LoadingGuard::start(&self.in_flight);
        let (request, url) = self.request(Method::GET, "/metrics");
        let response = self.send(request, &url).await?;
        Ok(response.text().await?)
    }

    async fn call<R: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&TaskPayload>,
    ) -> Result<R, ApiError> {
        let _loading = LoadingGuard::start(&self.in_flight);
        let (mut request, url) = self.request(method, endpoint);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = self.send(request, &url).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode(err.to_string()))
    }

    /// Every request carries the JSON content type, body or not.
    fn request(&self, method: Method, endpoint: &str) -> (RequestBuilder, String) {
        let url = format!("{}{endpoint}", self.base_url());
        debug!(%method, %url, "api call");
        let request = self
            .http
            .request(method, &url)
            .header(header::CONTENT_TYPE, "application/json");
        (request, url)
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<reqwest::Response, ApiError> {
        let response = request.send().await.map_err(|err| {
            if err.is_connect() {
                ApiError::Connection {
                    url: url.to_string(),
                }
            } else {
                ApiError::Request(err)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), %url, "response error: {body}");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_drops_trailing_slash() {
        let client = ApiClient::new("http://localhost:8000/ ").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        client.set_base_url("http://example.test/api/");
        assert_eq!(client.base_url(), "http://example.test/api");
    }

    #[tokio::test]
    async fn refused_connection_is_classified() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = ApiClient::new(format!("http://127.0.0.1:{port}")).unwrap();
        let err = client.stats().await.unwrap_err();
        assert!(err.is_connect());
        assert!(!client.is_loading());
    }

    #[test]
    fn metrics_request_carries_json_content_type() {
        let client = ApiClient::new("http://localhost:8000").unwrap();
        let (request, url) = client.request(Method::GET, "/metrics");
        let request = request.build().unwrap();

        assert_eq!(url, "http://localhost:8000/metrics");
        assert_eq!(request.url().as_str(), url);
        assert_eq!(request.headers()[header::CONTENT_TYPE], "application/json");
    }
}
