//! Upload, convert, export, download
//!
//! The [`Orchestrator`] drives one document through a conversion job:
//!
//! ```text
//! Created -> Uploading -> Converting -> Exporting -> Finished
//!                                                 \-> Failed
//! ```
//!
//! Each call creates exactly one job and never retries. Waiting is bounded
//! by [`OrchestratorOptions::timeout`] whichever [`WaitMode`] is used.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ConvertError, FailureCause, Result};
use crate::job::{
    ConversionJob, JobSpec, JobState, JobTracker, TaskStatus, IMPORT_TASK, OP_EXPORT_URL,
};
use crate::service::ConversionService;

/// How to wait for a job to finish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitMode {
    /// Poll the job every `poll_interval`
    #[default]
    Poll,
    /// Use the service's own blocking wait
    Service,
}

/// Orchestration settings
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorOptions {
    /// Upper bound on the wait for a terminal state
    pub timeout: Duration,
    /// Delay between polls in [`WaitMode::Poll`]
    pub poll_interval: Duration,
    /// Wait strategy
    pub wait: WaitMode,
    /// File name the document is uploaded under
    pub upload_filename: String,
    /// Format of the uploaded document
    pub input_format: String,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            poll_interval: Duration::from_millis(1000),
            wait: WaitMode::Poll,
            upload_filename: "document.docx".to_string(),
            input_format: "docx".to_string(),
        }
    }
}

/// A downloaded conversion result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedFile {
    /// File name reported by the provider
    pub filename: String,
    /// File contents
    pub bytes: Vec<u8>,
}

/// Drives documents through a [`ConversionService`]
#[derive(Clone)]
pub struct Orchestrator {
    service: Arc<dyn ConversionService>,
    options: OrchestratorOptions,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Create an orchestrator over a service
    pub fn new(service: Arc<dyn ConversionService>, options: OrchestratorOptions) -> Self {
        Self { service, options }
    }

    /// Current options
    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Convert a document to PDF
    ///
    /// Provider rejections, failed tasks, timeouts and a missing export all
    /// surface as [`ConvertError::ConversionFailed`]; transport errors pass
    /// through as [`ConvertError::Http`].
    pub async fn convert(&self, document: &[u8]) -> Result<ConvertedFile> {
        let spec = JobSpec::document_to_pdf(&self.options.input_format);
        let job = self.service.create_job(&spec).await.map_err(classify)?;
        info!(job = %job.id, "created conversion job");

        let mut tracker = JobTracker::new(job.id.clone());
        let import = job.task(IMPORT_TASK).ok_or_else(|| {
            ConvertError::failed(
                FailureCause::Provider,
                format!("job {} has no {} task", job.id, IMPORT_TASK),
            )
        })?;

        tracker.advance(JobState::Uploading);
        self.service
            .upload_file(&import.id, document, &self.options.upload_filename)
            .await
            .map_err(classify)?;
        tracker.advance(JobState::Converting);

        let waited =
            tokio::time::timeout(self.options.timeout, self.wait(&job.id, &mut tracker)).await;
        let finished = match waited {
            Ok(result) => result?,
            Err(_) => {
                tracker.advance(JobState::Failed);
                warn!(job = %job.id, timeout = ?self.options.timeout, "conversion timed out");
                return Err(ConvertError::failed(
                    FailureCause::Timeout,
                    format!(
                        "job {} did not finish within {}s",
                        job.id,
                        self.options.timeout.as_secs_f64()
                    ),
                ));
            }
        };
        tracker.observe(&finished);

        self.download(&finished).await
    }

    async fn wait(&self, job_id: &str, tracker: &mut JobTracker) -> Result<ConversionJob> {
        match self.options.wait {
            WaitMode::Service => {
                let job = self
                    .service
                    .wait_for_completion(job_id)
                    .await
                    .map_err(classify)?;
                tracker.observe(&job);
                Ok(job)
            }
            WaitMode::Poll => loop {
                let job = self.service.get_job(job_id).await.map_err(classify)?;
                tracker.observe(&job);
                if job.state().is_terminal() {
                    return Ok(job);
                }
                tokio::time::sleep(self.options.poll_interval).await;
            },
        }
    }

    async fn download(&self, job: &ConversionJob) -> Result<ConvertedFile> {
        if job.state() == JobState::Failed {
            let detail = job.failure_detail();
            warn!(job = %job.id, %detail, "conversion task failed");
            return Err(ConvertError::failed(FailureCause::TaskFailed, detail));
        }

        let export = job
            .task_by_operation(OP_EXPORT_URL)
            .filter(|t| t.status == TaskStatus::Finished)
            .ok_or_else(|| {
                ConvertError::failed(
                    FailureCause::MissingExport,
                    format!("job {} finished without a finished export task", job.id),
                )
            })?;

        let (filename, url) = export.first_file().ok_or_else(|| {
            ConvertError::failed(
                FailureCause::MissingExport,
                format!("export task {} has no downloadable file", export.id),
            )
        })?;

        let bytes = self.service.fetch(url, filename).await.map_err(classify)?;
        debug!(job = %job.id, filename, size = bytes.len(), "downloaded result");
        info!(job = %job.id, filename, "conversion finished");

        Ok(ConvertedFile {
            filename: filename.to_string(),
            bytes,
        })
    }
}

/// Map provider rejections onto failure causes; everything else passes through
fn classify(err: ConvertError) -> ConvertError {
    match err {
        ConvertError::ServerError { status, message } if status == 402 || status == 429 => {
            ConvertError::failed(FailureCause::QuotaExceeded, message)
        }
        ConvertError::ServerError { status, message } => {
            ConvertError::failed(FailureCause::Provider, format!("{}: {}", status, message))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = OrchestratorOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(300));
        assert_eq!(options.poll_interval, Duration::from_secs(1));
        assert_eq!(options.wait, WaitMode::Poll);
        assert_eq!(options.upload_filename, "document.docx");
    }

    #[test]
    fn test_classify_quota() {
        for status in [402, 429] {
            let err = classify(ConvertError::ServerError {
                status,
                message: "Credits exceeded".to_string(),
            });
            assert_eq!(err.cause(), Some(FailureCause::QuotaExceeded));
        }
    }

    #[test]
    fn test_classify_other_rejections() {
        let err = classify(ConvertError::ServerError {
            status: 422,
            message: "Invalid task".to_string(),
        });
        assert_eq!(err.cause(), Some(FailureCause::Provider));
        assert!(err.to_string().contains("422: Invalid task"));
    }

    #[test]
    fn test_classify_leaves_other_errors() {
        let err = classify(ConvertError::UnexpectedResponse("x".to_string()));
        assert!(matches!(err, ConvertError::UnexpectedResponse(_)));
    }

    #[test]
    fn test_wait_mode_parses_lowercase() {
        let mode: WaitMode = serde_json::from_str(r#""service""#).unwrap();
        assert_eq!(mode, WaitMode::Service);
    }
}
