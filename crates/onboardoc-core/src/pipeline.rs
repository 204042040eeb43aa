//! End-to-end onboarding document generation
//!
//! A request flows through four steps:
//!
//! 1. Validate names and role, derive the identity (no I/O)
//! 2. Decode a working copy of the role's template and fill it
//! 3. Convert the filled document to PDF
//! 4. Hand back the PDF under the derived file name
//!
//! Nothing partial is returned: any failure aborts the request.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use onboardoc_convert::Orchestrator;
use onboardoc_ooxml::{FillReport, TemplateDocument};

use crate::error::{OnboardError, Result};
use crate::identity::{DerivedIdentity, NamePair};
use crate::role::Role;
use crate::store::TemplateStore;

/// MIME type of the produced artifact
pub const PDF_MIME: &str = "application/pdf";

/// A request as entered: role text and the two name components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnboardingRequest {
    pub role: String,
    pub first_name: String,
    pub last_name: String,
}

impl OnboardingRequest {
    pub fn new(
        role: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// Check names, then role, then derive the identity
    pub fn resolve(&self) -> Result<(Role, DerivedIdentity)> {
        let names = NamePair::new(&self.first_name, &self.last_name);
        names.validate()?;
        let role: Role = self.role.parse()?;
        let identity = DerivedIdentity::derive(role, &names)?;
        Ok((role, identity))
    }
}

/// A filled template that has not been converted
#[derive(Debug, Clone)]
pub struct FilledDocument {
    pub role: Role,
    pub identity: DerivedIdentity,
    /// DOCX bytes
    pub bytes: Vec<u8>,
    pub report: FillReport,
}

/// The finished PDF
#[derive(Debug, Clone, Serialize)]
pub struct OnboardingArtifact {
    pub filename: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub identity: DerivedIdentity,
}

impl OnboardingArtifact {
    /// MIME type of [`bytes`](Self::bytes)
    pub fn mime_type(&self) -> &'static str {
        PDF_MIME
    }
}

/// Produces onboarding documents from stored templates
#[derive(Clone)]
pub struct Generator {
    store: Arc<dyn TemplateStore>,
    orchestrator: Option<Orchestrator>,
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}

impl Generator {
    /// Generator that can fill templates but not convert them
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        Self {
            store,
            orchestrator: None,
        }
    }

    /// Enable conversion
    pub fn with_orchestrator(mut self, orchestrator: Orchestrator) -> Self {
        self.orchestrator = Some(orchestrator);
        self
    }

    /// Fill the role's template for a request, without converting it
    pub fn fill_document(&self, request: &OnboardingRequest) -> Result<FilledDocument> {
        let (role, identity) = request.resolve()?;
        self.fill(role, identity)
    }

    /// Fill and convert: the full pipeline
    pub async fn generate(&self, request: &OnboardingRequest) -> Result<OnboardingArtifact> {
        let (role, identity) = request.resolve()?;
        let orchestrator = self.orchestrator.as_ref().ok_or_else(|| {
            OnboardError::Config("conversion service is not configured".to_string())
        })?;

        let filled = self.fill(role, identity)?;
        let pdf = orchestrator.convert(&filled.bytes).await?;

        info!(
            role = %filled.role,
            filename = %filled.identity.filename,
            size = pdf.bytes.len(),
            "onboarding document ready"
        );
        Ok(OnboardingArtifact {
            filename: filled.identity.filename.clone(),
            bytes: pdf.bytes,
            identity: filled.identity,
        })
    }

    fn fill(&self, role: Role, identity: DerivedIdentity) -> Result<FilledDocument> {
        let template = self
            .store
            .get(role)
            .ok_or(OnboardError::TemplateMissing(role))?;

        let mut doc = TemplateDocument::from_bytes(&template)?;
        let report = doc.fill(&identity.placeholders());
        for hit in doc.find_placeholders("{{", "}}") {
            warn!(
                %role,
                region = %hit.region,
                part = %hit.path,
                token = %hit.token,
                "placeholder left unfilled"
            );
        }

        Ok(FilledDocument {
            role,
            identity,
            bytes: doc.to_bytes()?,
            report,
        })
    }

    /// Run [`generate`](Self::generate) as its own task
    pub fn spawn(&self, request: OnboardingRequest) -> JoinHandle<Result<OnboardingArtifact>> {
        let generator = self.clone();
        tokio::spawn(async move { generator.generate(&request).await })
    }
}
