// Health check models

use crate::http::utils::ApiError;
use common::model::JobReference;
use common::model::JobState;
use common::model::Scope;

#[derive(Default, serde::Serialize)]
#[serde(rename_all = "UPPERCASE")]
enum StatusEnum {
    Up,

    #[default]
    Down,
}

#[derive(Default, serde::Serialize)]
pub struct HealthCheckResponse {
    status: StatusEnum,
}

impl HealthCheckResponse {
    pub const fn up() -> Self {
        Self {
            status: StatusEnum::Up,
        }
    }
}

// Compute models

/// Path parameters shared by the global, zonal and regional routes.
#[derive(Debug, serde::Deserialize)]
pub struct ScopedPath {
    project: String,
    zone: Option<String>,
    region: Option<String>,
    collection: Option<String>,
    name: Option<String>,
}

impl ScopedPath {
    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    pub fn scope(&self) -> Scope {
        match (&self.zone, &self.region) {
            (Some(zone), _) => Scope::Zone(zone.clone()),
            (None, Some(region)) => Scope::Region(region.clone()),
            (None, None) => Scope::Global,
        }
    }

    pub fn collection(&self) -> Result<&str, ApiError> {
        self.collection
            .as_deref()
            .ok_or_else(|| ApiError::invalid("Missing collection"))
    }

    pub fn name(&self) -> Result<&str, ApiError> {
        self.name
            .as_deref()
            .ok_or_else(|| ApiError::invalid("Missing resource name"))
    }
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertInstanceRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    machine_type: String,
}

impl InsertInstanceRequest {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn machine_type(&self) -> &str {
        &self.machine_type
    }
}

// Job models

#[derive(Debug, serde::Deserialize)]
pub struct JobPath {
    project: String,
    job_id: Option<String>,
}

impl JobPath {
    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn job_id(&self) -> Result<&str, ApiError> {
        self.job_id
            .as_deref()
            .ok_or_else(|| ApiError::invalid("Missing job id"))
    }
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertJobRequest {
    #[serde(default)]
    configuration: serde_json::Value,
    job_reference: Option<JobReference>,
}

impl InsertJobRequest {
    pub fn job_id(&self) -> Option<&str> {
        self.job_reference.as_ref().map(JobReference::job_id)
    }

    pub fn into_configuration(self) -> serde_json::Value {
        self.configuration
    }
}

/// `stateFilter` may be repeated, which the urlencoded extractor rejects.
pub fn parse_state_filter(query: Option<&str>) -> Result<Vec<JobState>, ApiError> {
    query
        .unwrap_or_default()
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(key, _)| *key == "stateFilter")
        .map(|(_, value)| match value.to_ascii_lowercase().as_str() {
            "pending" => Ok(JobState::Pending),
            "running" => Ok(JobState::Running),
            "done" => Ok(JobState::Done),
            other => Err(ApiError::invalid(format!("Invalid state filter: {other}"))),
        })
        .collect()
}
