//! League backend REST client
//!
//! Thin reqwest wrapper: builds URLs, sends JSON, and turns non-success
//! responses into `GatewayError`s. No caching or retries happen here.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use super::error::{GatewayError, GatewayResult};

/// HTTP client for the league backend
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

/// Error body returned by the backend
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: serde_json::Value,
}

impl ApiClient {
    /// Create a client for `base_url`; `timeout` of `None` waits indefinitely
    pub fn new(base_url: &str, timeout: Option<Duration>) -> GatewayResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(GatewayError::Request)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> GatewayResult<T> {
        self.send(Method::GET, path, |req| req).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> GatewayResult<T> {
        self.send(Method::GET, path, |req| req.query(query)).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> GatewayResult<T> {
        self.send(Method::POST, path, |req| req.json(body)).await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> GatewayResult<T> {
        self.send(Method::PUT, path, |req| req.json(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> GatewayResult<T> {
        self.send(Method::DELETE, path, |req| req).await
    }

    async fn send<T, F>(&self, method: Method, path: &str, build: F) -> GatewayResult<T>
    where
        T: DeserializeOwned,
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let request_id = Uuid::new_v4().to_string();
        let url = self.url(path);

        tracing::debug!(request_id = %request_id, method = %method, path = %path, "Sending request");

        let request = build(self.client.request(method.clone(), &url))
            .header("X-Request-Id", &request_id);

        let response = request.send().await.map_err(|e| {
            let err = GatewayError::from_transport(e);
            tracing::error!(request_id = %request_id, method = %method, path = %path, error = %err, "Request failed");
            err
        })?;

        let status = response.status();
        if !status.is_success() {
            let err = error_from_response(response).await;
            match &err {
                GatewayError::Validation { .. } | GatewayError::NotFound { .. } => {
                    tracing::warn!(request_id = %request_id, status = status.as_u16(), error = %err, "Request rejected");
                }
                _ => {
                    tracing::error!(request_id = %request_id, status = status.as_u16(), error = %err, "Backend error");
                }
            }
            return Err(err);
        }

        response.json::<T>().await.map_err(|e| {
            tracing::error!(request_id = %request_id, path = %path, error = %e, "Failed to decode response");
            GatewayError::Decode(e.to_string())
        })
    }
}

/// Map a non-success response onto the error taxonomy
async fn error_from_response(response: Response) -> GatewayError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let detail = extract_detail(&text);

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => GatewayError::Validation {
            detail: detail.unwrap_or_default(),
        },
        StatusCode::NOT_FOUND => GatewayError::NotFound {
            detail: detail.unwrap_or_default(),
        },
        _ => GatewayError::Server {
            status: status.as_u16(),
            message: detail.unwrap_or(text),
        },
    }
}

/// Pull a readable `detail` out of an error body
///
/// `detail` is usually a string; structured validation errors are
/// flattened to their `msg` fields.
fn extract_detail(text: &str) -> Option<String> {
    let body: ErrorBody = serde_json::from_str(text).ok()?;
    match body.detail {
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        serde_json::Value::Array(items) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .map(str::to_string)
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}

/// Percent-encode one path segment
pub fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}
