use crate::model::error::ErrorProto;
use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobState {
    Pending,
    Running,
    Done,
}

impl JobState {
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Pending => Self::Running,
            Self::Running | Self::Done => Self::Done,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Running => write!(f, "RUNNING"),
            Self::Done => write!(f, "DONE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReference {
    project_id: String,
    job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<String>,
}

impl JobReference {
    pub fn new(project_id: impl Into<String>, job_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            job_id: job_id.into(),
            location: None,
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}

impl fmt::Display for JobReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.project_id, self.job_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    state: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_result: Option<ErrorProto>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    errors: Vec<ErrorProto>,
}

impl JobStatus {
    pub const fn new(state: JobState) -> Self {
        Self {
            state,
            error_result: None,
            errors: Vec::new(),
        }
    }

    pub const fn state(&self) -> JobState {
        self.state
    }

    pub const fn error_result(&self) -> Option<&ErrorProto> {
        self.error_result.as_ref()
    }

    pub fn errors(&self) -> &[ErrorProto] {
        &self.errors
    }
}

/// A BigQuery job (`bigquery#job`).
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    self_link: Option<String>,
    job_reference: JobReference,
    status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    configuration: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    statistics: Option<serde_json::Value>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

impl Job {
    pub const KIND: &'static str = "bigquery#job";

    const JOB_TYPES: [&'static str; 4] = ["copy", "extract", "load", "query"];

    pub fn new_job(
        job_reference: JobReference,
        configuration: serde_json::Value,
        self_link: impl Into<String>,
    ) -> Self {
        Self {
            kind: Self::KIND.to_string(),
            id: Some(job_reference.to_string()),
            self_link: Some(self_link.into()),
            job_reference,
            status: JobStatus::new(JobState::Pending),
            configuration: Some(configuration),
            statistics: None,
            extra: serde_json::Map::new(),
        }
    }

    pub const fn job_reference(&self) -> &JobReference {
        &self.job_reference
    }

    pub const fn status(&self) -> &JobStatus {
        &self.status
    }

    pub const fn state(&self) -> JobState {
        self.status.state
    }

    pub const fn configuration(&self) -> Option<&serde_json::Value> {
        self.configuration.as_ref()
    }

    pub const fn statistics(&self) -> Option<&serde_json::Value> {
        self.statistics.as_ref()
    }

    /// A job failed when its status carries an `errorResult`.
    pub const fn is_failed(&self) -> bool {
        self.status.error_result.is_some()
    }

    /// The first of `copy`, `extract`, `load` or `query` present in the configuration.
    pub fn job_type(&self) -> Option<&'static str> {
        let configuration = self.configuration.as_ref()?.as_object()?;
        Self::JOB_TYPES
            .into_iter()
            .find(|job_type| configuration.contains_key(*job_type))
    }

    pub const fn set_state(&mut self, state: JobState) {
        self.status.state = state;
    }

    pub fn set_error_result(&mut self, error_result: ErrorProto, errors: Vec<ErrorProto>) {
        self.status.error_result = Some(error_result);
        self.status.errors = errors;
    }

    pub fn set_statistics(&mut self, statistics: serde_json::Value) {
        self.statistics = Some(statistics);
    }
}

/// A page of jobs (`bigquery#jobList`).
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobList {
    kind: String,
    #[serde(default)]
    jobs: Vec<Job>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next_page_token: Option<String>,
}

impl JobList {
    pub const KIND: &'static str = "bigquery#jobList";

    pub fn new(jobs: Vec<Job>) -> Self {
        Self {
            kind: Self::KIND.to_string(),
            jobs,
            next_page_token: None,
        }
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn into_jobs(self) -> Vec<Job> {
        self.jobs
    }
}
