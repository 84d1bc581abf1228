use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use tracing::debug;

use super::types::RemoteDiagnosisResponse;
use super::RemoteError;
use crate::pipeline::upload::ImageUpload;

/// Remote classification seam. One call, one multipart upload, no retries.
pub trait RemoteClassifier: Send + Sync {
    fn classify(
        &self,
        upload: &ImageUpload,
    ) -> impl Future<Output = Result<RemoteDiagnosisResponse, RemoteError>> + Send;

    /// Endpoint description used in logs.
    fn endpoint(&self) -> &str;
}

/// HTTP client posting the image as multipart field `file`.
pub struct HttpRemoteClassifier {
    url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpRemoteClassifier {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::HttpClient(e.to_string()))?;

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            client,
            timeout,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> RemoteError {
        if e.is_timeout() {
            RemoteError::Timeout(self.timeout)
        } else if e.is_connect() {
            RemoteError::Connection(self.url.clone())
        } else {
            RemoteError::HttpClient(e.to_string())
        }
    }
}

impl RemoteClassifier for HttpRemoteClassifier {
    async fn classify(&self, upload: &ImageUpload) -> Result<RemoteDiagnosisResponse, RemoteError> {
        let part = Part::bytes(upload.bytes.clone()).file_name(upload.file_name.clone());
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| self.map_send_error(e))?;
        let parsed: RemoteDiagnosisResponse = serde_json::from_str(&body)
            .map_err(|e| RemoteError::ResponseParsing(e.to_string()))?;

        debug!(
            disease = %parsed.disease,
            confidence = parsed.confidence,
            "Remote classifier responded"
        );
        Ok(parsed)
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

/// Mock remote classifier for testing. Returns a configurable outcome.
pub struct MockRemoteClassifier {
    outcome: Result<RemoteDiagnosisResponse, RemoteError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockRemoteClassifier {
    pub fn responding(response: RemoteDiagnosisResponse) -> Self {
        Self {
            outcome: Ok(response),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: RemoteError) -> Self {
        Self {
            outcome: Err(error),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Sleep before answering, to exercise timeouts and cancellation.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RemoteClassifier for MockRemoteClassifier {
    async fn classify(&self, _upload: &ImageUpload) -> Result<RemoteDiagnosisResponse, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }

    fn endpoint(&self) -> &str {
        "mock://remote"
    }
}
