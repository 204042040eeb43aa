//! Orchestrator behaviour against a scripted conversion service

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use onboardoc_convert::job::{
    ResultFile, TaskResult, CONVERT_TASK, EXPORT_TASK, IMPORT_TASK, OP_CONVERT, OP_EXPORT_URL,
    OP_IMPORT_UPLOAD,
};
use onboardoc_convert::{
    ConversionJob, ConversionService, ConvertError, FailureCause, JobSpec, Orchestrator,
    OrchestratorOptions, Result, Task, TaskStatus, WaitMode,
};

const PDF: &[u8] = b"%PDF-1.7 fake";
const EXPORT_URL: &str = "https://storage.example.com/document.pdf";

fn task(name: &str, operation: &str, status: TaskStatus) -> Task {
    Task {
        id: format!("{}-id", name),
        name: Some(name.to_string()),
        operation: operation.to_string(),
        status,
        ..Task::default()
    }
}

fn snapshot(import: TaskStatus, convert: TaskStatus, export: TaskStatus) -> ConversionJob {
    let mut export_task = task(EXPORT_TASK, OP_EXPORT_URL, export);
    if export == TaskStatus::Finished {
        export_task.result = Some(TaskResult {
            files: vec![ResultFile {
                filename: "document.pdf".to_string(),
                url: Some(EXPORT_URL.to_string()),
            }],
            form: None,
        });
    }

    ConversionJob {
        id: "job-1".to_string(),
        status: TaskStatus::Processing,
        tasks: vec![
            task(IMPORT_TASK, OP_IMPORT_UPLOAD, import),
            task(CONVERT_TASK, OP_CONVERT, convert),
            export_task,
        ],
    }
}

fn finished() -> ConversionJob {
    let mut job = snapshot(TaskStatus::Finished, TaskStatus::Finished, TaskStatus::Finished);
    job.status = TaskStatus::Finished;
    job
}

#[derive(Default)]
struct ScriptedService {
    create_error: Mutex<Option<ConvertError>>,
    polls: Mutex<VecDeque<ConversionJob>>,
    waited: Mutex<Option<ConversionJob>>,
    calls: Mutex<Vec<String>>,
    uploads: Mutex<Vec<(String, Vec<u8>, String)>>,
}

impl ScriptedService {
    fn polling(snapshots: Vec<ConversionJob>) -> Self {
        Self {
            polls: Mutex::new(snapshots.into()),
            ..Self::default()
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

#[async_trait]
impl ConversionService for ScriptedService {
    async fn create_job(&self, spec: &JobSpec) -> Result<ConversionJob> {
        self.record(format!("create:{}", spec.tasks.len()));
        if let Some(err) = self.create_error.lock().unwrap().take() {
            return Err(err);
        }
        Ok(snapshot(TaskStatus::Waiting, TaskStatus::Waiting, TaskStatus::Waiting))
    }

    async fn upload_file(&self, task_id: &str, bytes: &[u8], filename: &str) -> Result<()> {
        self.record(format!("upload:{}", task_id));
        self.uploads
            .lock()
            .unwrap()
            .push((task_id.to_string(), bytes.to_vec(), filename.to_string()));
        Ok(())
    }

    async fn get_job(&self, job_id: &str) -> Result<ConversionJob> {
        self.record(format!("get:{}", job_id));
        let mut polls = self.polls.lock().unwrap();
        // The last snapshot repeats forever
        let job = if polls.len() > 1 {
            polls.pop_front()
        } else {
            polls.front().cloned()
        };
        job.ok_or_else(|| ConvertError::UnexpectedResponse("no snapshot".to_string()))
    }

    async fn wait_for_completion(&self, job_id: &str) -> Result<ConversionJob> {
        self.record(format!("wait:{}", job_id));
        self.waited
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ConvertError::UnexpectedResponse("no wait result".to_string()))
    }

    async fn fetch(&self, url: &str, filename: &str) -> Result<Vec<u8>> {
        self.record(format!("fetch:{}:{}", url, filename));
        Ok(PDF.to_vec())
    }
}

fn orchestrator(service: &Arc<ScriptedService>, options: OrchestratorOptions) -> Orchestrator {
    Orchestrator::new(service.clone(), options)
}

fn fast() -> OrchestratorOptions {
    OrchestratorOptions {
        poll_interval: Duration::from_millis(1),
        ..OrchestratorOptions::default()
    }
}

#[tokio::test]
async fn test_polling_conversion_downloads_export() {
    let service = Arc::new(ScriptedService::polling(vec![
        snapshot(TaskStatus::Finished, TaskStatus::Processing, TaskStatus::Waiting),
        snapshot(TaskStatus::Finished, TaskStatus::Finished, TaskStatus::Processing),
        finished(),
    ]));

    let pdf = orchestrator(&service, fast()).convert(b"docx bytes").await.unwrap();

    assert_eq!(pdf.filename, "document.pdf");
    assert_eq!(pdf.bytes, PDF);
    assert_eq!(service.count("create"), 1);
    assert_eq!(service.count("get"), 3);
    assert_eq!(
        service.calls().last().unwrap(),
        &format!("fetch:{}:document.pdf", EXPORT_URL)
    );
}

#[tokio::test]
async fn test_upload_goes_to_import_task_as_document_docx() {
    let service = Arc::new(ScriptedService::polling(vec![finished()]));

    orchestrator(&service, fast()).convert(b"docx bytes").await.unwrap();

    let uploads = service.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].0, format!("{}-id", IMPORT_TASK));
    assert_eq!(uploads[0].1, b"docx bytes");
    assert_eq!(uploads[0].2, "document.docx");
}

#[tokio::test]
async fn test_service_wait_mode_skips_polling() {
    let service = Arc::new(ScriptedService {
        waited: Mutex::new(Some(finished())),
        ..ScriptedService::default()
    });
    let options = OrchestratorOptions {
        wait: WaitMode::Service,
        ..fast()
    };

    let pdf = orchestrator(&service, options).convert(b"x").await.unwrap();

    assert_eq!(pdf.bytes, PDF);
    assert_eq!(service.count("wait"), 1);
    assert_eq!(service.count("get"), 0);
}

#[tokio::test]
async fn test_failed_task_is_conversion_failure() {
    let mut failed = snapshot(TaskStatus::Finished, TaskStatus::Error, TaskStatus::Waiting);
    failed.status = TaskStatus::Error;
    failed.tasks[1].message = Some("Conversion engine crashed".to_string());
    let service = Arc::new(ScriptedService::polling(vec![failed]));

    let err = orchestrator(&service, fast()).convert(b"x").await.unwrap_err();

    assert_eq!(err.cause(), Some(FailureCause::TaskFailed));
    assert!(err.to_string().contains("Conversion engine crashed"));
    assert_eq!(service.count("fetch"), 0);
}

#[tokio::test]
async fn test_finished_job_without_export_is_missing_export() {
    let mut job = snapshot(TaskStatus::Finished, TaskStatus::Finished, TaskStatus::Waiting);
    job.status = TaskStatus::Finished;
    let service = Arc::new(ScriptedService::polling(vec![job]));

    let err = orchestrator(&service, fast()).convert(b"x").await.unwrap_err();

    assert_eq!(err.cause(), Some(FailureCause::MissingExport));
    assert_eq!(service.count("fetch"), 0);
}

#[tokio::test]
async fn test_export_without_url_is_missing_export() {
    let mut job = finished();
    job.tasks[2].result = Some(TaskResult {
        files: vec![ResultFile {
            filename: "document.pdf".to_string(),
            url: None,
        }],
        form: None,
    });
    let service = Arc::new(ScriptedService::polling(vec![job]));

    let err = orchestrator(&service, fast()).convert(b"x").await.unwrap_err();
    assert_eq!(err.cause(), Some(FailureCause::MissingExport));
}

#[tokio::test(start_paused = true)]
async fn test_job_that_never_finishes_times_out() {
    let service = Arc::new(ScriptedService::polling(vec![snapshot(
        TaskStatus::Finished,
        TaskStatus::Processing,
        TaskStatus::Waiting,
    )]));
    let options = OrchestratorOptions {
        timeout: Duration::from_secs(5),
        poll_interval: Duration::from_secs(1),
        ..OrchestratorOptions::default()
    };

    let err = orchestrator(&service, options).convert(b"x").await.unwrap_err();

    assert_eq!(err.cause(), Some(FailureCause::Timeout));
    assert_eq!(service.count("fetch"), 0);
}

#[tokio::test]
async fn test_quota_rejection_on_create() {
    let service = Arc::new(ScriptedService::default());
    *service.create_error.lock().unwrap() = Some(ConvertError::ServerError {
        status: 402,
        message: "Credits exceeded".to_string(),
    });

    let err = orchestrator(&service, fast()).convert(b"x").await.unwrap_err();

    assert_eq!(err.cause(), Some(FailureCause::QuotaExceeded));
    assert!(err.to_string().contains("Credits exceeded"));
    assert_eq!(service.calls(), vec!["create:3"]);
}

#[tokio::test]
async fn test_provider_rejection_is_not_retried() {
    let service = Arc::new(ScriptedService::default());
    *service.create_error.lock().unwrap() = Some(ConvertError::ServerError {
        status: 500,
        message: "Internal error".to_string(),
    });

    let err = orchestrator(&service, fast()).convert(b"x").await.unwrap_err();

    assert_eq!(err.cause(), Some(FailureCause::Provider));
    assert_eq!(service.count("create"), 1);
}
