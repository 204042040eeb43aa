//! # onboardoc-core
//!
//! Personalized onboarding documents: derive an employee's greeting, email
//! address and username from their name, fill the role's DOCX template, and
//! convert the result to PDF.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use onboardoc_core::{Generator, InMemoryTemplateStore, OnboardingRequest, Settings};
//!
//! # async fn run() -> onboardoc_core::Result<()> {
//! let settings = Settings::discover(None)?;
//! let store = InMemoryTemplateStore::from_settings(&settings.templates)?;
//! let generator = Generator::new(Arc::new(store))
//!     .with_orchestrator(settings.conversion.build_orchestrator()?);
//!
//! let artifact = generator
//!     .generate(&OnboardingRequest::new("designer", "Mat", "Fluker"))
//!     .await?;
//! std::fs::write(&artifact.filename, &artifact.bytes)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod identity;
pub mod pipeline;
pub mod role;
pub mod store;

pub use config::{ConversionSettings, Settings, TemplateSettings, TemplateSource};
pub use error::{OnboardError, Result};
pub use identity::{
    derive_email, derive_filename, derive_username, normalize_for_handle, normalize_greeting,
    title_case, DerivedIdentity, NamePair, EMAIL_DOMAIN,
};
pub use pipeline::{FilledDocument, Generator, OnboardingArtifact, OnboardingRequest, PDF_MIME};
pub use role::Role;
pub use store::{InMemoryTemplateStore, TemplateStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
