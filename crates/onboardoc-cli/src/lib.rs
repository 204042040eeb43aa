//! onboardoc CLI - Command-line interface library
//!
//! This library provides the CLI functionality for onboardoc, including:
//! - Generate: Fill a role template and convert it to PDF
//! - Fill: Fill a role template and keep the DOCX
//! - Preview: Show the derived greeting, email and username
//! - Inspect: List the placeholders a template contains
//!
//! # Binary Usage
//!
//! ```bash
//! # Produce designer-mat_fluker-onboarding.pdf in ./out
//! onboardoc generate --role designer --first Mat --last Fluker --output out/
//!
//! # Fill only, no conversion service needed
//! onboardoc fill --role installer --first Mat --last Fluker --output filled.docx
//!
//! # Check a template for misspelled placeholders
//! onboardoc inspect templates/designer.docx --format json
//! ```

pub mod app;

// Re-export main entry point and types
pub use app::{
    check_names, fill_command, generate_command, inspect_command, preview_command, run_cli,
    OutputFormat,
};
