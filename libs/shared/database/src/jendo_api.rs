use anyhow::Result;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, AUTHORIZATION},
    Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;
use shared_models::ApiResponse;

/// Failure kinds callers can recover with `anyhow::Error::downcast_ref`.
#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Authentication error: {0}")]
    Unauthorized(String),

    #[error("API error ({status}): {body}")]
    Status { status: StatusCode, body: String },

    #[error("Backend reported failure: {0}")]
    Rejected(String),
}

pub struct JendoApiClient {
    client: Client,
    base_url: String,
}

impl JendoApiClient {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_base_url(&config.jendo_api_url)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => debug!("Skipping authorization header with invalid characters"),
            }
        }

        headers
    }

    pub async fn request<T>(&self, method: Method, path: &str,
                            auth_token: Option<&str>, body: Option<Value>)
                            -> Result<T>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut req = self.client.request(method, &url)
            .headers(self.get_headers(auth_token));

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("API error ({}): {}", status, error_text);

            return Err(match status {
                StatusCode::NOT_FOUND => ApiClientError::NotFound(path.to_string()),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    ApiClientError::Unauthorized(error_text)
                }
                _ => ApiClientError::Status { status, body: error_text },
            }
            .into());
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// GETs `path` and unwraps the backend's `{success, message, data}` envelope.
    pub async fn get_data<T>(&self, path: &str, auth_token: Option<&str>) -> Result<T>
    where T: DeserializeOwned {
        let envelope: ApiResponse<T> = self.request(Method::GET, path, auth_token, None).await?;

        if !envelope.success {
            return Err(ApiClientError::Rejected(envelope.message).into());
        }

        Ok(envelope.data)
    }
}

/// True when the error chain carries a 404 from the backend.
pub fn is_not_found(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<ApiClientError>(), Some(ApiClientError::NotFound(_)))
}
