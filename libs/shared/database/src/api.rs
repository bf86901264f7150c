use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION},
    multipart, Client, Method, RequestBuilder,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use shared_config::AppConfig;
use shared_models::error::AppError;

/// A file attached to a multipart request.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// JSON REST client for the booking backend.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client with timeout, using defaults: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| AppError::Auth("Invalid characters in session token".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T, AppError>
    where
        T: DeserializeOwned,
    {
        let value = self.request_value(method, path, auth_token, body).await?;
        serde_json::from_value(value).map_err(|e| AppError::InvalidResponse(e.to_string()))
    }

    pub async fn request_value(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<Value, AppError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut req = self.client.request(method, &url).headers(self.get_headers(auth_token)?);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        self.send(req).await
    }

    pub async fn get_with_query(
        &self,
        path: &str,
        query: &[(&str, String)],
        auth_token: Option<&str>,
    ) -> Result<Value, AppError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making GET request to {} with {:?}", url, query);

        let req = self
            .client
            .get(&url)
            .headers(self.get_headers(auth_token)?)
            .query(query);

        self.send(req).await
    }

    /// Sends `upload` as the multipart field `field_name`.
    pub async fn upload_file(
        &self,
        path: &str,
        field_name: &str,
        upload: FileUpload,
        auth_token: Option<&str>,
    ) -> Result<Value, AppError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Uploading {} ({} bytes) to {}", upload.file_name, upload.bytes.len(), url);

        let part = multipart::Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.content_type)
            .map_err(|e| AppError::ValidationError(format!("Invalid file type: {}", e)))?;
        let form = multipart::Form::new().part(field_name.to_string(), part);

        let req = self
            .client
            .post(&url)
            .headers(self.get_headers(auth_token)?)
            .multipart(form);

        self.send(req).await
    }

    async fn send(&self, req: RequestBuilder) -> Result<Value, AppError> {
        let response = req.send().await.map_err(|e| {
            error!("Request failed before a response was received: {}", e);
            AppError::Network(e.to_string())
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("API error ({}): {}", status, text);
            return Err(AppError::from_response(status.as_u16(), &text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| {
            error!("Response from backend is not JSON: {}", e);
            AppError::InvalidResponse(e.to_string())
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
