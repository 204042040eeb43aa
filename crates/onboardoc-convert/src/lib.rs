//! # onboardoc-convert
//!
//! DOCX to PDF conversion through a remote conversion service.
//!
//! The [`Orchestrator`] runs a three-task job (upload, convert, export)
//! against any [`ConversionService`]; [`CloudConvertClient`] is the
//! production implementation.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use onboardoc_convert::{CloudConvertClient, Orchestrator, OrchestratorOptions};
//!
//! # async fn run(docx: Vec<u8>) -> onboardoc_convert::Result<()> {
//! let client = CloudConvertClient::new("api-key")?;
//! let orchestrator = Orchestrator::new(Arc::new(client), OrchestratorOptions::default());
//!
//! let pdf = orchestrator.convert(&docx).await?;
//! println!("{} ({} bytes)", pdf.filename, pdf.bytes.len());
//! # Ok(())
//! # }
//! ```

pub mod cloudconvert;
pub mod error;
pub mod job;
pub mod orchestrator;
pub mod service;

pub use cloudconvert::CloudConvertClient;
pub use error::{ConvertError, FailureCause, Result};
pub use job::{ConversionJob, JobSpec, JobState, JobTracker, Task, TaskStatus};
pub use orchestrator::{ConvertedFile, Orchestrator, OrchestratorOptions, WaitMode};
pub use service::ConversionService;
