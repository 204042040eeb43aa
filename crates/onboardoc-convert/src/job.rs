//! Conversion job model
//!
//! A job is a small pipeline of named tasks: the document is uploaded into
//! an import task, converted, then exported to a temporary download URL.
//! The types here mirror the CloudConvert v2 job and task resources.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Name of the upload task
pub const IMPORT_TASK: &str = "import-document";
/// Name of the conversion task
pub const CONVERT_TASK: &str = "convert-document";
/// Name of the export task
pub const EXPORT_TASK: &str = "export-document";

/// Operation: receive a file by multipart upload
pub const OP_IMPORT_UPLOAD: &str = "import/upload";
/// Operation: convert between formats
pub const OP_CONVERT: &str = "convert";
/// Operation: publish the result under a temporary URL
pub const OP_EXPORT_URL: &str = "export/url";

/// One task declaration of a job
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSpec {
    /// Task name, unique within the job
    pub name: String,
    /// Operation identifier
    pub operation: String,
    /// Name of the task this one consumes
    pub input: Option<String>,
    /// Extra operation options
    pub options: Map<String, Value>,
}

impl TaskSpec {
    /// Task with no input and no options
    pub fn new(name: &str, operation: &str) -> Self {
        Self {
            name: name.to_string(),
            operation: operation.to_string(),
            input: None,
            options: Map::new(),
        }
    }

    /// Set the input task
    pub fn with_input(mut self, input: &str) -> Self {
        self.input = Some(input.to_string());
        self
    }

    /// Set an operation option
    pub fn with_option(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }
}

/// Declaration of a job to create
#[derive(Debug, Clone, PartialEq)]
pub struct JobSpec {
    /// Tasks in declaration order
    pub tasks: Vec<TaskSpec>,
}

impl JobSpec {
    /// Upload, convert to PDF, export to URL
    pub fn document_to_pdf(input_format: &str) -> Self {
        Self {
            tasks: vec![
                TaskSpec::new(IMPORT_TASK, OP_IMPORT_UPLOAD),
                TaskSpec::new(CONVERT_TASK, OP_CONVERT)
                    .with_input(IMPORT_TASK)
                    .with_option("input_format", input_format)
                    .with_option("output_format", "pdf"),
                TaskSpec::new(EXPORT_TASK, OP_EXPORT_URL).with_input(CONVERT_TASK),
            ],
        }
    }

    /// Request body for job creation
    pub fn to_payload(&self) -> Value {
        let mut tasks = Map::new();
        for task in &self.tasks {
            let mut body = task.options.clone();
            body.insert("operation".to_string(), json!(task.operation));
            if let Some(input) = &task.input {
                body.insert("input".to_string(), json!(input));
            }
            tasks.insert(task.name.clone(), Value::Object(body));
        }
        json!({ "tasks": tasks })
    }
}

/// Status of a job or task as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Waiting,
    Processing,
    Finished,
    Error,
    #[serde(other)]
    Unknown,
}

/// A file produced by a task
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResultFile {
    pub filename: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Upload form handed out by an `import/upload` task
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UploadForm {
    pub url: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// Task result payload
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskResult {
    #[serde(default)]
    pub files: Vec<ResultFile>,
    #[serde(default)]
    pub form: Option<UploadForm>,
}

/// A task of a job
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub operation: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub result: Option<TaskResult>,
}

impl Task {
    /// Upload form, if the provider attached one
    pub fn upload_form(&self) -> Option<&UploadForm> {
        self.result.as_ref().and_then(|r| r.form.as_ref())
    }

    /// First result file that carries a download URL
    pub fn first_file(&self) -> Option<(&str, &str)> {
        self.result
            .as_ref()?
            .files
            .iter()
            .find_map(|f| f.url.as_deref().map(|url| (f.filename.as_str(), url)))
    }

    fn describe(&self) -> String {
        let name = self.name.as_deref().unwrap_or(&self.id);
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => format!("{}: {} ({})", name, message, code),
            (None, Some(message)) => format!("{}: {}", name, message),
            (Some(code), None) => format!("{}: {}", name, code),
            (None, None) => format!("{}: failed", name),
        }
    }
}

/// A conversion job and its tasks
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConversionJob {
    pub id: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl ConversionJob {
    /// Task by name
    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name.as_deref() == Some(name))
    }

    /// First task with the given operation
    pub fn task_by_operation(&self, operation: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.operation == operation)
    }

    /// Tasks that ended in error
    pub fn failed_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| t.status == TaskStatus::Error)
    }

    /// Provider messages of all failed tasks, joined
    pub fn failure_detail(&self) -> String {
        let details: Vec<String> = self.failed_tasks().map(Task::describe).collect();
        if details.is_empty() {
            format!("job {} ended in error", self.id)
        } else {
            details.join("; ")
        }
    }

    /// Pipeline stage implied by the job and task statuses
    pub fn state(&self) -> JobState {
        let finished =
            |op: &str| self.task_by_operation(op).map(|t| t.status) == Some(TaskStatus::Finished);

        if self.status == TaskStatus::Error || self.failed_tasks().next().is_some() {
            JobState::Failed
        } else if self.status == TaskStatus::Finished || finished(OP_EXPORT_URL) {
            JobState::Finished
        } else if finished(OP_CONVERT) {
            JobState::Exporting
        } else if finished(OP_IMPORT_UPLOAD) {
            JobState::Converting
        } else {
            JobState::Uploading
        }
    }
}

/// The `{"data": ...}` envelope around every API resource
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

/// Orchestration stage of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Created,
    Uploading,
    Converting,
    Exporting,
    Finished,
    Failed,
}

impl JobState {
    /// Whether no further transition is possible
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Finished | JobState::Failed)
    }

    fn rank(self) -> u8 {
        match self {
            JobState::Created => 0,
            JobState::Uploading => 1,
            JobState::Converting => 2,
            JobState::Exporting => 3,
            JobState::Finished | JobState::Failed => 4,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Created => "created",
            JobState::Uploading => "uploading",
            JobState::Converting => "converting",
            JobState::Exporting => "exporting",
            JobState::Finished => "finished",
            JobState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Forward-only state tracker for one job
///
/// Observations that would move the job backwards (a stale poll) are
/// ignored, as is anything after a terminal state.
#[derive(Debug, Clone)]
pub struct JobTracker {
    job_id: String,
    state: JobState,
}

impl JobTracker {
    /// Tracker in the `Created` state
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            state: JobState::Created,
        }
    }

    /// Current state
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Move to `next` if that is a forward transition
    ///
    /// Returns whether the state changed.
    pub fn advance(&mut self, next: JobState) -> bool {
        if self.state.is_terminal() || next == self.state {
            return false;
        }
        if next != JobState::Failed && next.rank() <= self.state.rank() {
            return false;
        }

        tracing::debug!(job = %self.job_id, from = %self.state, to = %next, "job state");
        self.state = next;
        true
    }

    /// Advance to the state implied by a job snapshot
    pub fn observe(&mut self, job: &ConversionJob) -> bool {
        self.advance(job.state())
    }
}
