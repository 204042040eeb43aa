//! End-to-end generation against an in-process conversion service

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use onboardoc_convert::job::{
    ResultFile, TaskResult, CONVERT_TASK, EXPORT_TASK, IMPORT_TASK, OP_CONVERT, OP_EXPORT_URL,
    OP_IMPORT_UPLOAD,
};
use onboardoc_convert::{
    ConversionJob, ConversionService, FailureCause, JobSpec, Orchestrator, OrchestratorOptions,
    Task, TaskStatus,
};
use onboardoc_core::{
    Generator, InMemoryTemplateStore, OnboardError, OnboardingRequest, Role, PDF_MIME,
};
use onboardoc_ooxml::test_utils::{paragraph, DocxFixture};
use onboardoc_ooxml::{RegionKind, TemplateDocument};

const PDF: &[u8] = b"%PDF-1.7 onboarding";

/// Converts by echoing a fixed PDF; remembers what was uploaded
#[derive(Default)]
struct EchoService {
    fail_conversion: bool,
    calls: Mutex<Vec<String>>,
    uploaded: Mutex<Vec<Vec<u8>>>,
}

impl EchoService {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn job(&self, status: TaskStatus) -> ConversionJob {
        let task = |name: &str, operation: &str| Task {
            id: format!("{}-id", name),
            name: Some(name.to_string()),
            operation: operation.to_string(),
            status,
            ..Task::default()
        };

        let mut export = task(EXPORT_TASK, OP_EXPORT_URL);
        if status == TaskStatus::Finished {
            export.result = Some(TaskResult {
                files: vec![ResultFile {
                    filename: "document.pdf".to_string(),
                    url: Some("https://storage.example.com/document.pdf".to_string()),
                }],
                form: None,
            });
        }

        ConversionJob {
            id: "job-1".to_string(),
            status,
            tasks: vec![
                task(IMPORT_TASK, OP_IMPORT_UPLOAD),
                task(CONVERT_TASK, OP_CONVERT),
                export,
            ],
        }
    }
}

#[async_trait]
impl ConversionService for EchoService {
    async fn create_job(&self, _spec: &JobSpec) -> onboardoc_convert::Result<ConversionJob> {
        self.calls.lock().unwrap().push("create".to_string());
        Ok(self.job(TaskStatus::Waiting))
    }

    async fn upload_file(
        &self,
        _task_id: &str,
        bytes: &[u8],
        _filename: &str,
    ) -> onboardoc_convert::Result<()> {
        self.calls.lock().unwrap().push("upload".to_string());
        self.uploaded.lock().unwrap().push(bytes.to_vec());
        Ok(())
    }

    async fn get_job(&self, _job_id: &str) -> onboardoc_convert::Result<ConversionJob> {
        self.calls.lock().unwrap().push("get".to_string());
        if self.fail_conversion {
            Ok(self.job(TaskStatus::Error))
        } else {
            Ok(self.job(TaskStatus::Finished))
        }
    }

    async fn wait_for_completion(&self, job_id: &str) -> onboardoc_convert::Result<ConversionJob> {
        self.get_job(job_id).await
    }

    async fn fetch(&self, _url: &str, _filename: &str) -> onboardoc_convert::Result<Vec<u8>> {
        self.calls.lock().unwrap().push("fetch".to_string());
        Ok(PDF.to_vec())
    }
}

fn template(title: &str) -> Vec<u8> {
    DocxFixture::new()
        .paragraph(title)
        .paragraph("Welcome {{GREETING}}")
        .body(&format!(
            "<w:tbl><w:tr><w:tc>{}</w:tc><w:tc>{}</w:tc></w:tr></w:tbl>",
            paragraph("Email"),
            paragraph("{{GMAIL}}")
        ))
        .footer(&paragraph("Canvas login: {{CANVAS_USERNAME}}"))
        .build()
        .unwrap()
}

fn generator(service: &Arc<EchoService>) -> Generator {
    let store = InMemoryTemplateStore::new()
        .with(Role::Designer, template("Designer Onboarding"))
        .with(Role::Installer, template("Installer Onboarding"));
    let options = OrchestratorOptions {
        poll_interval: Duration::from_millis(1),
        ..OrchestratorOptions::default()
    };

    Generator::new(Arc::new(store)).with_orchestrator(Orchestrator::new(service.clone(), options))
}

#[tokio::test]
async fn test_generate_produces_named_pdf() {
    let service = Arc::new(EchoService::default());
    let artifact = generator(&service)
        .generate(&OnboardingRequest::new("Designer", "mary-jane", "o'brien"))
        .await
        .unwrap();

    assert_eq!(artifact.filename, "designer-maryjane_obrien-onboarding.pdf");
    assert_eq!(artifact.bytes, PDF);
    assert_eq!(artifact.mime_type(), PDF_MIME);
    assert_eq!(artifact.identity.email, "mobrien@artofdrawers.com");
    assert_eq!(artifact.identity.username, "maryjane.obrien");
}

#[tokio::test]
async fn test_uploaded_document_is_filled_role_template() {
    let service = Arc::new(EchoService::default());
    generator(&service)
        .generate(&OnboardingRequest::new("installer", "Mat", "Fluker"))
        .await
        .unwrap();

    let uploaded = service.uploaded.lock().unwrap()[0].clone();
    let doc = TemplateDocument::from_bytes(&uploaded).unwrap();

    let body = doc.paragraph_texts(RegionKind::Body);
    assert_eq!(body[0], "Installer Onboarding");
    assert_eq!(body[1], "Welcome Mat,");
    assert_eq!(doc.body().tables()[0].rows[0][1], "mfluker@artofdrawers.com");
    assert_eq!(
        doc.paragraph_texts(RegionKind::Footer),
        vec!["Canvas login: mat.fluker"]
    );
    assert!(doc.find_placeholders("{{", "}}").is_empty());
}

#[tokio::test]
async fn test_invalid_name_does_no_network_work() {
    let service = Arc::new(EchoService::default());
    let err = generator(&service)
        .generate(&OnboardingRequest::new("designer", "!!!", "Fluker"))
        .await
        .unwrap_err();

    assert!(matches!(err, OnboardError::InvalidName(_)));
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_role_has_no_fallback() {
    let service = Arc::new(EchoService::default());
    let err = generator(&service)
        .generate(&OnboardingRequest::new("Manager", "Mat", "Fluker"))
        .await
        .unwrap_err();

    assert!(matches!(err, OnboardError::InvalidRole(_)));
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn test_failed_conversion_returns_no_artifact() {
    let service = Arc::new(EchoService {
        fail_conversion: true,
        ..EchoService::default()
    });
    let err = generator(&service)
        .generate(&OnboardingRequest::new("designer", "Mat", "Fluker"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OnboardError::ConversionFailed {
            cause: FailureCause::TaskFailed,
            ..
        }
    ));
    assert!(!service.calls().contains(&"fetch".to_string()));
}

#[tokio::test]
async fn test_spawned_requests_run_independently() {
    let service = Arc::new(EchoService::default());
    let generator = generator(&service);

    let a = generator.spawn(OnboardingRequest::new("designer", "Mat", "Fluker"));
    let b = generator.spawn(OnboardingRequest::new("installer", "Ann", "Lee"));

    let a = a.await.unwrap().unwrap();
    let b = b.await.unwrap().unwrap();
    assert_eq!(a.filename, "designer-mat_fluker-onboarding.pdf");
    assert_eq!(b.filename, "installer-ann_lee-onboarding.pdf");
    assert_eq!(service.uploaded.lock().unwrap().len(), 2);
}

#[test]
fn test_fill_document_offline() {
    let generator = Generator::new(Arc::new(
        InMemoryTemplateStore::new().with(Role::Designer, template("Designer Onboarding")),
    ));

    let filled = generator
        .fill_document(&OnboardingRequest::new("designer", "Mat", "Fluker"))
        .unwrap();

    assert_eq!(filled.report.count("{{GREETING}}"), 1);
    assert_eq!(filled.report.count("{{GMAIL}}"), 1);
    assert_eq!(filled.report.count("{{CANVAS_USERNAME}}"), 1);
    assert_eq!(filled.report.paragraphs_rewritten, 3);

    let doc = TemplateDocument::from_bytes(&filled.bytes).unwrap();
    assert!(doc.plain_text().contains("Welcome Mat,"));
}
