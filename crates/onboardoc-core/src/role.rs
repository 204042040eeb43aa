//! Employee roles

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OnboardError;

/// Role an employee is onboarded into; each has its own template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Designer,
    Installer,
}

impl Role {
    /// Every role
    pub const ALL: [Role; 2] = [Role::Designer, Role::Installer];

    /// Lowercase name, as used in file names
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Designer => "designer",
            Role::Installer => "installer",
        }
    }

    /// Default template file name within a template directory
    pub fn template_file_name(self) -> String {
        format!("{}.docx", self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = OnboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| OnboardError::InvalidRole(s.to_string()))
    }
}
