//! CloudConvert API v2 client
//!
//! This module provides a [`ConversionService`] backed by
//! [CloudConvert](https://cloudconvert.com). Requests are authenticated
//! with an API key sent as a bearer token; upload forms and download URLs
//! handed out by the API are pre-signed and used without it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{ConvertError, Result};
use crate::job::{ConversionJob, Envelope, JobSpec, Task};
use crate::service::ConversionService;

/// Production API endpoint
pub const DEFAULT_API_URL: &str = "https://api.cloudconvert.com/v2";
/// Production synchronous endpoint (long-polling waits)
pub const DEFAULT_SYNC_URL: &str = "https://sync.api.cloudconvert.com/v2";
/// Sandbox API endpoint
pub const SANDBOX_API_URL: &str = "https://api.sandbox.cloudconvert.com/v2";
/// Sandbox synchronous endpoint
pub const SANDBOX_SYNC_URL: &str = "https://sync.api.sandbox.cloudconvert.com/v2";

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Client for the CloudConvert REST API
#[derive(Debug, Clone)]
pub struct CloudConvertClient {
    /// API key, sent as a bearer token
    api_key: String,
    /// Base URL for regular calls
    base_url: String,
    /// Base URL for waiting calls
    sync_url: String,
    /// HTTP client
    client: Client,
    /// Per-request timeout for regular calls
    timeout: Duration,
}

impl CloudConvertClient {
    /// Client for the production API
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_urls(api_key, DEFAULT_API_URL, DEFAULT_SYNC_URL)
    }

    /// Client for the production or sandbox API
    pub fn with_sandbox(api_key: impl Into<String>, sandbox: bool) -> Result<Self> {
        if sandbox {
            Self::with_urls(api_key, SANDBOX_API_URL, SANDBOX_SYNC_URL)
        } else {
            Self::new(api_key)
        }
    }

    /// Client for custom endpoints
    pub fn with_urls(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        sync_url: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            sync_url: sync_url.into().trim_end_matches('/').to_string(),
            client,
            timeout: Duration::from_secs(60),
        })
    }

    /// Set the per-request timeout for calls that do not wait on the job
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the synchronous base URL
    pub fn sync_url(&self) -> &str {
        &self.sync_url
    }

    /// Fetch a single task
    pub async fn get_task(&self, task_id: &str) -> Result<Task> {
        let url = format!("{}/tasks/{}", self.base_url, task_id);
        debug!(%url, "GET task");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .send()
            .await?;
        read_data(response).await
    }

    async fn get_job_from(
        &self,
        base: &str,
        job_id: &str,
        timeout: Option<Duration>,
    ) -> Result<ConversionJob> {
        let url = format!("{}/jobs/{}", base, job_id);
        debug!(%url, "GET job");

        let mut request = self.client.get(&url).bearer_auth(&self.api_key);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        read_data(request.send().await?).await
    }
}

#[async_trait]
impl ConversionService for CloudConvertClient {
    async fn create_job(&self, spec: &JobSpec) -> Result<ConversionJob> {
        let url = format!("{}/jobs", self.base_url);
        debug!(%url, tasks = spec.tasks.len(), "POST job");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&spec.to_payload())
            .send()
            .await?;
        read_data(response).await
    }

    async fn upload_file(&self, task_id: &str, bytes: &[u8], filename: &str) -> Result<()> {
        let task = self.get_task(task_id).await?;
        let form = task.upload_form().ok_or_else(|| {
            ConvertError::UnexpectedResponse(format!("task {} has no upload form", task_id))
        })?;

        let mut multipart = Form::new();
        for (key, value) in &form.parameters {
            multipart = multipart.text(key.clone(), form_value(value));
        }
        // The file part must come after the signed parameters
        let file = Part::bytes(bytes.to_vec())
            .file_name(filename.to_string())
            .mime_str(DOCX_MIME)?;
        multipart = multipart.part("file", file);

        debug!(url = %form.url, size = bytes.len(), filename, "upload");
        let response = self
            .client
            .post(&form.url)
            .timeout(self.timeout)
            .multipart(multipart)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn get_job(&self, job_id: &str) -> Result<ConversionJob> {
        self.get_job_from(&self.base_url, job_id, Some(self.timeout)).await
    }

    async fn wait_for_completion(&self, job_id: &str) -> Result<ConversionJob> {
        // Bounded by the caller; the sync endpoint holds the request open
        self.get_job_from(&self.sync_url, job_id, None).await
    }

    async fn fetch(&self, url: &str, filename: &str) -> Result<Vec<u8>> {
        debug!(%url, filename, "download");
        let response = self.client.get(url).timeout(self.timeout).send().await?;
        let response = check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Reject non-success responses, keeping the provider's message
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(ConvertError::ServerError {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

async fn read_data<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = check_status(response).await?;
    let body = response.bytes().await?;
    let envelope: Envelope<T> = serde_json::from_slice(&body)?;
    Ok(envelope.data)
}

/// `message` field of an API error body, or the body itself
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Multipart text for a signed form parameter
fn form_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
