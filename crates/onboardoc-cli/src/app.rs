//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use onboardoc_core::identity::{EMAIL_TOKEN, GREETING_TOKEN, USERNAME_TOKEN};
use onboardoc_core::{
    DerivedIdentity, Generator, InMemoryTemplateStore, OnboardingRequest, Role, Settings,
};
use onboardoc_ooxml::{RegionKind, TemplateDocument};

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for tool consumption
    Json,
}

#[derive(Parser)]
#[command(name = "onboardoc")]
#[command(author, version, about = "Personalized onboarding PDFs from DOCX templates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Role and name of the employee
#[derive(clap::Args, Debug, Clone)]
struct Employee {
    /// Role (designer or installer)
    #[arg(short, long)]
    role: String,

    /// First name
    #[arg(short, long)]
    first: String,

    /// Last name
    #[arg(short, long)]
    last: String,
}

impl Employee {
    fn request(&self) -> Result<OnboardingRequest> {
        check_names(&self.first, &self.last)?;
        Ok(OnboardingRequest::new(&self.role, &self.first, &self.last))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fill the role's template and convert it to PDF
    Generate {
        #[command(flatten)]
        employee: Employee,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Fill the role's template without converting it
    Fill {
        #[command(flatten)]
        employee: Employee,

        /// Output DOCX file
        #[arg(short, long)]
        output: PathBuf,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show the values derived for an employee
    Preview {
        #[command(flatten)]
        employee: Employee,

        /// Output format (text or json)
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List the placeholders found in a template
    Inspect {
        /// Template DOCX file
        template: PathBuf,

        /// Output format (text or json)
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Run the CLI application
///
/// Parses arguments and dispatches to the appropriate command.
pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            employee,
            output,
            config,
        } => {
            generate_command(&employee.request()?, &output, config.as_deref()).await?;
        }
        Commands::Fill {
            employee,
            output,
            config,
        } => {
            fill_command(&employee.request()?, &output, config.as_deref())?;
        }
        Commands::Preview { employee, format } => {
            print!("{}", preview_command(&employee.request()?, format)?);
        }
        Commands::Inspect { template, format } => {
            print!("{}", inspect_command(&template, format)?);
        }
    }

    Ok(())
}

/// Reject blank names before any other work
pub fn check_names(first: &str, last: &str) -> Result<()> {
    if first.trim().is_empty() || last.trim().is_empty() {
        anyhow::bail!("Please enter both first and last name.");
    }
    Ok(())
}

fn load_store(settings: &Settings) -> Result<InMemoryTemplateStore> {
    InMemoryTemplateStore::from_settings(&settings.templates).with_context(|| {
        format!(
            "Failed to load templates from {}",
            settings.templates.dir.display()
        )
    })
}

/// Execute the generate command; returns the written PDF path
pub async fn generate_command(
    request: &OnboardingRequest,
    output_dir: &Path,
    config: Option<&Path>,
) -> Result<PathBuf> {
    // Input problems are reported before configuration is touched
    request.resolve()?;

    let settings = Settings::discover(config).context("Failed to load settings")?;
    let orchestrator = settings.conversion.build_orchestrator()?;
    let store = load_store(&settings)?;
    let generator = Generator::new(Arc::new(store)).with_orchestrator(orchestrator);

    let artifact = generator
        .generate(request)
        .await
        .context("Error generating PDF")?;

    fs::create_dir_all(output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output_dir.display()
        )
    })?;
    let path = output_dir.join(&artifact.filename);
    fs::write(&path, &artifact.bytes)
        .with_context(|| format!("Failed to write PDF: {}", path.display()))?;

    println!("Created: {}", path.display());
    println!("  Email:    {}", artifact.identity.email);
    println!("  Username: {}", artifact.identity.username);

    Ok(path)
}

/// Execute the fill command
pub fn fill_command(
    request: &OnboardingRequest,
    output: &Path,
    config: Option<&Path>,
) -> Result<()> {
    request.resolve()?;

    let settings = Settings::discover(config).context("Failed to load settings")?;
    let generator = Generator::new(Arc::new(load_store(&settings)?));

    let filled = generator
        .fill_document(request)
        .context("Error filling template")?;
    fs::write(output, &filled.bytes)
        .with_context(|| format!("Failed to write DOCX: {}", output.display()))?;

    println!("Created: {}", output.display());
    println!(
        "  {} paragraphs rewritten, {} replacements",
        filled.report.paragraphs_rewritten,
        filled.report.total()
    );
    for token in filled.report.unused_tokens() {
        println!("  note: template has no {}", token);
    }

    Ok(())
}

#[derive(Serialize)]
struct Preview<'a> {
    role: Role,
    #[serde(flatten)]
    identity: &'a DerivedIdentity,
}

/// Execute the preview command; returns the rendered report
pub fn preview_command(request: &OnboardingRequest, format: OutputFormat) -> Result<String> {
    let (role, identity) = request.resolve()?;

    let out = match format {
        OutputFormat::Json => {
            let preview = Preview {
                role,
                identity: &identity,
            };
            let mut json = serde_json::to_string_pretty(&preview)
                .context("Failed to serialize preview to JSON")?;
            json.push('\n');
            json
        }
        OutputFormat::Text => format!(
            "Role:     {}\nGreeting: {}\nEmail:    {}\nUsername: {}\nFile:     {}\n",
            role, identity.greeting, identity.email, identity.username, identity.filename
        ),
    };
    Ok(out)
}

#[derive(Debug, Serialize)]
struct RegionReport {
    kind: RegionKind,
    path: String,
    paragraphs: usize,
    tables: usize,
    placeholders: Vec<String>,
    unknown: Vec<String>,
}

#[derive(Debug, Serialize)]
struct InspectReport {
    template: String,
    regions: Vec<RegionReport>,
}

fn is_known(token: &str) -> bool {
    [GREETING_TOKEN, EMAIL_TOKEN, USERNAME_TOKEN].contains(&token)
}

/// Execute the inspect command; returns the rendered report
pub fn inspect_command(template: &Path, format: OutputFormat) -> Result<String> {
    if !template.exists() {
        anyhow::bail!("Template file not found: {}", template.display());
    }

    let doc = TemplateDocument::open(template)
        .with_context(|| format!("Failed to open DOCX file: {}", template.display()))?;
    let hits = doc.find_placeholders("{{", "}}");

    let regions: Vec<RegionReport> = doc
        .regions()
        .iter()
        .map(|region| {
            let placeholders: Vec<String> = hits
                .iter()
                .filter(|hit| hit.path == region.path())
                .map(|hit| hit.token.clone())
                .collect();
            let unknown = placeholders
                .iter()
                .filter(|t| !is_known(t))
                .cloned()
                .collect();

            RegionReport {
                kind: region.kind(),
                path: region.path().to_string(),
                paragraphs: region.paragraph_texts().len(),
                tables: region.tables().len(),
                placeholders,
                unknown,
            }
        })
        .collect();

    let report = InspectReport {
        template: template.display().to_string(),
        regions,
    };

    match format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&report)
                .context("Failed to serialize inspection to JSON")?;
            json.push('\n');
            Ok(json)
        }
        OutputFormat::Text => Ok(render_inspection(&report)),
    }
}

fn render_inspection(report: &InspectReport) -> String {
    let mut out = format!("Template: {}\n", report.template);
    let mut unknown = 0;

    for region in &report.regions {
        out.push_str(&format!(
            "  {} ({}): {} paragraphs, {} tables\n",
            region.kind, region.path, region.paragraphs, region.tables
        ));
        for token in &region.placeholders {
            let marker = if is_known(token) { "" } else { "  (unknown)" };
            out.push_str(&format!("    {}{}\n", token, marker));
        }
        unknown += region.unknown.len();
    }

    let total: usize = report.regions.iter().map(|r| r.placeholders.len()).sum();
    out.push_str(&format!("{} placeholders, {} unknown\n", total, unknown));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_names() {
        assert!(check_names("Mat", "Fluker").is_ok());
        let err = check_names("  ", "Fluker").unwrap_err();
        assert_eq!(err.to_string(), "Please enter both first and last name.");
        assert!(check_names("Mat", "").is_err());
    }

    #[test]
    fn test_preview_text() {
        let out = preview_command(
            &OnboardingRequest::new("designer", "mary-jane", "o'brien"),
            OutputFormat::Text,
        )
        .unwrap();

        assert!(out.contains("Greeting: Mary-Jane,"));
        assert!(out.contains("Email:    mobrien@artofdrawers.com"));
        assert!(out.contains("Username: maryjane.obrien"));
        assert!(out.contains("File:     designer-maryjane_obrien-onboarding.pdf"));
    }

    #[test]
    fn test_preview_json() {
        let out = preview_command(
            &OnboardingRequest::new("Installer", "Mat", "Fluker"),
            OutputFormat::Json,
        )
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["role"], "installer");
        assert_eq!(value["email"], "mfluker@artofdrawers.com");
        assert_eq!(value["username"], "mat.fluker");
    }

    #[test]
    fn test_preview_rejects_unknown_role() {
        let err = preview_command(
            &OnboardingRequest::new("Manager", "Mat", "Fluker"),
            OutputFormat::Text,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Manager"));
    }

    #[test]
    fn test_is_known() {
        assert!(is_known("{{GMAIL}}"));
        assert!(!is_known("{{GMAIL_ADDRESS}}"));
    }
}
