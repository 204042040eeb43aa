//! The conversion service seam
//!
//! The orchestrator talks to the provider only through this trait, so tests
//! and alternative providers can stand in for CloudConvert.

use async_trait::async_trait;

use crate::error::Result;
use crate::job::{ConversionJob, JobSpec};

/// Asynchronous document conversion provider
#[async_trait]
pub trait ConversionService: Send + Sync {
    /// Create a job from its task declarations
    async fn create_job(&self, spec: &JobSpec) -> Result<ConversionJob>;

    /// Attach a file to an upload task
    async fn upload_file(&self, task_id: &str, bytes: &[u8], filename: &str) -> Result<()>;

    /// Current snapshot of a job
    async fn get_job(&self, job_id: &str) -> Result<ConversionJob>;

    /// Block until the provider reports the job finished or failed
    async fn wait_for_completion(&self, job_id: &str) -> Result<ConversionJob>;

    /// Download a result file
    async fn fetch(&self, url: &str, filename: &str) -> Result<Vec<u8>>;
}
