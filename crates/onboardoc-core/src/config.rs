//! Configuration settings
//!
//! Settings are loaded from `onboardoc.toml` (or an explicit path):
//!
//! ```toml
//! [conversion]
//! api_key = "..."      # CLOUDCONVERT_API_KEY takes precedence
//! sandbox = false
//! timeout_secs = 300
//! poll_interval_ms = 1000
//! wait = "poll"        # or "service"
//!
//! [templates]
//! dir = "templates"    # holds designer.docx and installer.docx
//!
//! [templates.designer]
//! path = "custom/designer.docx"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use onboardoc_convert::{CloudConvertClient, Orchestrator, OrchestratorOptions, WaitMode};

use crate::error::{OnboardError, Result};
use crate::role::Role;

/// Default settings file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "onboardoc.toml";

/// Environment variable holding the CloudConvert API key
pub const API_KEY_ENV: &str = "CLOUDCONVERT_API_KEY";

/// Top-level settings structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Conversion service settings
    pub conversion: ConversionSettings,
    /// Template locations
    pub templates: TemplateSettings,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
            .map_err(|e| OnboardError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load an explicit file, else `onboardoc.toml` if present, else defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let default = Path::new(DEFAULT_CONFIG_FILE);
        if default.is_file() {
            tracing::debug!(path = %default.display(), "loading settings");
            Self::load(default)
        } else {
            Ok(Self::default())
        }
    }
}

/// Conversion service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionSettings {
    /// API key; the environment variable wins when both are set
    pub api_key: Option<String>,
    /// Use the provider's sandbox endpoint
    pub sandbox: bool,
    /// Upper bound on waiting for a job, in seconds
    pub timeout_secs: u64,
    /// Delay between job polls, in milliseconds
    pub poll_interval_ms: u64,
    /// Wait strategy
    pub wait: WaitMode,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            sandbox: false,
            timeout_secs: 300,
            poll_interval_ms: 1000,
            wait: WaitMode::Poll,
        }
    }
}

impl ConversionSettings {
    /// Orchestration options implied by these settings
    pub fn orchestrator_options(&self) -> OrchestratorOptions {
        OrchestratorOptions {
            timeout: Duration::from_secs(self.timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            wait: self.wait,
            ..OrchestratorOptions::default()
        }
    }

    /// Pick the API key: `env` first, then the configured one
    ///
    /// Blank values count as missing.
    pub fn resolve_api_key(&self, env: Option<String>) -> Result<String> {
        env.into_iter()
            .chain(self.api_key.clone())
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
            .ok_or_else(|| {
                OnboardError::Config(format!(
                    "no CloudConvert API key; set {} or conversion.api_key",
                    API_KEY_ENV
                ))
            })
    }

    /// Build an orchestrator over the CloudConvert client
    pub fn build_orchestrator(&self) -> Result<Orchestrator> {
        let api_key = self.resolve_api_key(std::env::var(API_KEY_ENV).ok())?;
        let client = CloudConvertClient::with_sandbox(api_key, self.sandbox)?;
        Ok(Orchestrator::new(
            Arc::new(client),
            self.orchestrator_options(),
        ))
    }
}

/// Where a single template comes from
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct TemplateSource {
    /// Path to a DOCX file
    pub path: Option<PathBuf>,
    /// Inline base64-encoded DOCX
    pub base64: Option<String>,
}

/// Template configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
    /// Directory holding `<role>.docx` files
    pub dir: PathBuf,
    /// Override for the designer template
    pub designer: Option<TemplateSource>,
    /// Override for the installer template
    pub installer: Option<TemplateSource>,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("templates"),
            designer: None,
            installer: None,
        }
    }
}

impl TemplateSettings {
    /// Explicit source for a role, if configured
    pub fn source(&self, role: Role) -> Option<&TemplateSource> {
        match role {
            Role::Designer => self.designer.as_ref(),
            Role::Installer => self.installer.as_ref(),
        }
    }
}
