//! Identity derivation
//!
//! Every per-employee value is a pure function of the role and the two name
//! components. Case mapping is ASCII-only, so results never depend on the
//! host locale.
//!
//! | Input                      | Greeting     | Email                        | Username          |
//! |----------------------------|--------------|------------------------------|-------------------|
//! | `mary-jane` / `o'brien`    | `Mary-Jane,` | `mobrien@artofdrawers.com`   | `maryjane.obrien` |
//! | `Mat` / `Fluker`           | `Mat,`       | `mfluker@artofdrawers.com`   | `mat.fluker`      |

use serde::Serialize;

use onboardoc_ooxml::PlaceholderMap;

use crate::error::{OnboardError, Result};
use crate::role::Role;

/// Domain of generated email addresses
pub const EMAIL_DOMAIN: &str = "artofdrawers.com";

/// Token replaced by the greeting
pub const GREETING_TOKEN: &str = "{{GREETING}}";
/// Token replaced by the email address
pub const EMAIL_TOKEN: &str = "{{GMAIL}}";
/// Token replaced by the username
pub const USERNAME_TOKEN: &str = "{{CANVAS_USERNAME}}";

/// First and last name as entered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePair {
    pub first: String,
    pub last: String,
}

impl NamePair {
    /// Create a name pair, trimming surrounding whitespace
    pub fn new(first: impl AsRef<str>, last: impl AsRef<str>) -> Self {
        Self {
            first: first.as_ref().trim().to_string(),
            last: last.as_ref().trim().to_string(),
        }
    }

    /// Reject blank components
    pub fn validate(&self) -> Result<()> {
        if self.first.trim().is_empty() || self.last.trim().is_empty() {
            return Err(OnboardError::InvalidName(
                "both first and last name are required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Values derived for one employee
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedIdentity {
    pub greeting: String,
    pub email: String,
    pub username: String,
    pub filename: String,
}

impl DerivedIdentity {
    /// Derive every value for a role and name
    pub fn derive(role: Role, names: &NamePair) -> Result<Self> {
        names.validate()?;
        let first = names.first.trim();
        let last = names.last.trim();

        Ok(Self {
            greeting: normalize_greeting(first),
            email: derive_email(first, last)?,
            username: derive_username(first, last)?,
            filename: derive_filename(role, first, last)?,
        })
    }

    /// Placeholder map for filling a template
    pub fn placeholders(&self) -> PlaceholderMap {
        PlaceholderMap::new()
            .with(GREETING_TOKEN, self.greeting.as_str())
            .with(EMAIL_TOKEN, self.email.as_str())
            .with(USERNAME_TOKEN, self.username.as_str())
    }
}

/// Capitalize the first letter of every letter run, lower-case the rest
///
/// Anything that is not a letter starts a new run, so `o'brien` becomes
/// `O'Brien`. Non-ASCII characters are left as they are but still count as
/// letters.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_word = false;

    for ch in name.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.push(ch.to_ascii_lowercase());
            } else {
                out.push(ch.to_ascii_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }

    out
}

/// Greeting form of a first name: title case plus a trailing comma
pub fn normalize_greeting(first: &str) -> String {
    format!("{},", title_case(first))
}

/// Lower-cased ASCII letters and digits of a name
///
/// Idempotent. Fails with [`OnboardError::InvalidName`] if nothing is left.
pub fn normalize_for_handle(name: &str) -> Result<String> {
    let handle: String = name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if handle.is_empty() {
        return Err(OnboardError::InvalidName(format!(
            "'{}' has no letters or digits",
            name
        )));
    }
    Ok(handle)
}

/// `{first initial}{last}@artofdrawers.com`
pub fn derive_email(first: &str, last: &str) -> Result<String> {
    let first = normalize_for_handle(first)?;
    let last = normalize_for_handle(last)?;
    // Handles are ASCII, so the first byte is the first character
    Ok(format!("{}{}@{}", &first[..1], last, EMAIL_DOMAIN))
}

/// `{first}.{last}`
pub fn derive_username(first: &str, last: &str) -> Result<String> {
    let first = normalize_for_handle(first)?;
    let last = normalize_for_handle(last)?;
    Ok(format!("{}.{}", first, last))
}

/// `{role}-{first}_{last}-onboarding.pdf`
pub fn derive_filename(role: Role, first: &str, last: &str) -> Result<String> {
    let first = normalize_for_handle(first)?;
    let last = normalize_for_handle(last)?;
    Ok(format!("{}-{}_{}-onboarding.pdf", role, first, last))
}
