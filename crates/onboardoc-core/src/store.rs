//! Template storage
//!
//! Templates are read once at startup and shared read-only between
//! requests. Each request decodes its own working copy, so the stored bytes
//! are never modified.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, info};

use crate::config::{TemplateSettings, TemplateSource};
use crate::error::{OnboardError, Result};
use crate::role::Role;

/// Read-only role to template mapping
pub trait TemplateStore: Send + Sync {
    /// Template bytes for a role
    fn get(&self, role: Role) -> Option<Arc<[u8]>>;
}

/// Templates held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryTemplateStore {
    templates: HashMap<Role, Arc<[u8]>>,
}

impl InMemoryTemplateStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the template for a role
    pub fn insert(&mut self, role: Role, bytes: impl Into<Arc<[u8]>>) {
        self.templates.insert(role, bytes.into());
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, role: Role, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.insert(role, bytes);
        self
    }

    /// Roles that have a template, in role order
    pub fn roles(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = self.templates.keys().copied().collect();
        roles.sort();
        roles
    }

    /// Load `<role>.docx` files found in a directory
    ///
    /// Roles without a file are skipped.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut store = Self::new();
        for role in Role::ALL {
            let path = dir.join(role.template_file_name());
            if path.is_file() {
                debug!(%role, path = %path.display(), "loading template");
                store.insert(role, std::fs::read(&path)?);
            }
        }
        Ok(store)
    }

    /// Build from settings: per-role overrides first, then the template directory
    pub fn from_settings(settings: &TemplateSettings) -> Result<Self> {
        let mut store = Self::from_dir(&settings.dir)?;
        for role in Role::ALL {
            if let Some(source) = settings.source(role) {
                store.insert(role, load_source(role, source)?);
            }
        }

        info!(roles = ?store.roles(), "template store ready");
        Ok(store)
    }
}

impl TemplateStore for InMemoryTemplateStore {
    fn get(&self, role: Role) -> Option<Arc<[u8]>> {
        self.templates.get(&role).cloned()
    }
}

fn load_source(role: Role, source: &TemplateSource) -> Result<Vec<u8>> {
    match (&source.path, &source.base64) {
        (Some(path), None) => {
            debug!(%role, path = %path.display(), "loading template");
            Ok(std::fs::read(path)?)
        }
        (None, Some(encoded)) => {
            let compact: String = encoded.split_whitespace().collect();
            STANDARD.decode(compact).map_err(|e| {
                OnboardError::Config(format!("templates.{}.base64: {}", role, e))
            })
        }
        (Some(_), Some(_)) => Err(OnboardError::Config(format!(
            "templates.{}: set either path or base64, not both",
            role
        ))),
        (None, None) => Err(OnboardError::Config(format!(
            "templates.{}: no path or base64 given",
            role
        ))),
    }
}
