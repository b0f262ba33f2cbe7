use chrono::SecondsFormat;
use chrono::Utc;
use common::model::ErrorProto;
use common::model::Instance;
use common::model::Job;
use common::model::JobReference;
use common::model::JobState;
use common::model::Operation;
use common::model::OperationError;
use common::model::OperationErrorDetail;
use common::model::OperationStatus;
use common::model::Scope;
use std::collections::BTreeMap;
use std::collections::HashMap;

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("The resource '{0}' was not found")]
    NotFound(String),

    #[error("The resource '{0}' already exists")]
    AlreadyExists(String),

    #[error("Already Exists: Job {0}")]
    DuplicateJob(String),

    #[error("Invalid value for field '{field}': {message}")]
    Invalid { field: String, message: String },

    #[error("Backend error. Please try again.")]
    BackendError,
}

/// Change applied to the resources once an operation reaches DONE.
#[derive(Debug, Clone)]
enum Effect {
    Insert {
        key: String,
        resource: serde_json::Value,
    },
    Delete {
        key: String,
    },
}

#[derive(Debug, Clone)]
struct StoredOperation {
    project: String,
    scope: Scope,
    operation: Operation,
    effect: Option<Effect>,
}

/// In-memory state of the emulated Compute and BigQuery services.
///
/// Operations and jobs move one state forward (`PENDING`, `RUNNING`, `DONE`)
/// every time they are fetched.
#[derive(Debug, Default)]
pub struct MockStore {
    base_url: String,
    operations: BTreeMap<String, StoredOperation>,
    resources: HashMap<String, serde_json::Value>,
    jobs: BTreeMap<(String, String), Job>,
    transient_failures: usize,
    sequence: u64,
}

impl MockStore {
    const COMPUTE_PATH: &'static str = "compute/v1";
    const BIGQUERY_PATH: &'static str = "bigquery/v2";

    #[must_use]
    pub const fn with_transient_failures(mut self, transient_failures: usize) -> Self {
        self.transient_failures = transient_failures;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
    }

    /// The next `count` operation, job or resource fetches answer with a backend error.
    pub const fn inject_transient_failures(&mut self, count: usize) {
        self.transient_failures = count;
    }

    pub const fn remaining_transient_failures(&self) -> usize {
        self.transient_failures
    }

    fn take_transient_failure(&mut self) -> Result<(), StoreError> {
        if self.transient_failures > 0 {
            self.transient_failures -= 1;
            return Err(StoreError::BackendError);
        }

        Ok(())
    }

    fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    fn timestamp() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn resource_key(project: &str, scope: &Scope, collection: &str, name: &str) -> String {
        format!("projects/{project}/{}/{collection}/{name}", scope.path())
    }

    fn compute_link(&self, path: &str) -> String {
        format!("{}/{}/{path}", self.base_url, Self::COMPUTE_PATH)
    }

    fn singular(collection: &str) -> &str {
        match collection {
            "addresses" => "address",
            other => other.strip_suffix('s').unwrap_or(other),
        }
    }

    // Compute resources

    /// Seeds a resource so that it can be fetched or deleted.
    pub fn add_resource(
        &mut self,
        project: &str,
        scope: &Scope,
        collection: &str,
        name: &str,
    ) -> serde_json::Value {
        let key = Self::resource_key(project, scope, collection, name);
        let resource = serde_json::json!({
            "kind": format!("compute#{}", Self::singular(collection)),
            "name": name,
            "selfLink": self.compute_link(&key),
        });

        self.resources.insert(key, resource.clone());
        resource
    }

    pub fn get_resource(
        &mut self,
        project: &str,
        scope: &Scope,
        collection: &str,
        name: &str,
    ) -> Result<serde_json::Value, StoreError> {
        self.take_transient_failure()?;
        let key = Self::resource_key(project, scope, collection, name);

        self.resources
            .get(&key)
            .cloned()
            .ok_or(StoreError::NotFound(key))
    }

    pub fn contains_resource(
        &self,
        project: &str,
        scope: &Scope,
        collection: &str,
        name: &str,
    ) -> bool {
        self.resources
            .contains_key(&Self::resource_key(project, scope, collection, name))
    }

    pub fn insert_instance(
        &mut self,
        project: &str,
        zone: &str,
        name: &str,
        machine_type: &str,
    ) -> Result<Operation, StoreError> {
        if name.is_empty() {
            return Err(StoreError::Invalid {
                field: "resource.name".to_string(),
                message: "Must be specified.".to_string(),
            });
        }

        let scope = Scope::Zone(zone.to_string());
        let key = Self::resource_key(project, &scope, "instances", name);
        if self.resources.contains_key(&key) {
            return Err(StoreError::AlreadyExists(key));
        }

        let mut instance =
            Instance::new_instance(name, zone, machine_type, self.compute_link(&key));
        instance.set_status("RUNNING");
        let resource = serde_json::to_value(instance).unwrap_or_default();

        Ok(self.submit_operation(
            project,
            scope,
            Operation::INSERT_OPERATION_TYPE,
            Effect::Insert { key, resource },
        ))
    }

    pub fn delete_resource(
        &mut self,
        project: &str,
        scope: &Scope,
        collection: &str,
        name: &str,
    ) -> Result<Operation, StoreError> {
        let key = Self::resource_key(project, scope, collection, name);
        if !self.resources.contains_key(&key) {
            return Err(StoreError::NotFound(key));
        }

        Ok(self.submit_operation(
            project,
            scope.clone(),
            Operation::DELETE_OPERATION_TYPE,
            Effect::Delete { key },
        ))
    }

    // Compute operations

    fn submit_operation(
        &mut self,
        project: &str,
        scope: Scope,
        operation_type: &str,
        effect: Effect,
    ) -> Operation {
        let name = format!(
            "operation-{}-{:04}",
            Utc::now().timestamp_millis(),
            self.next_sequence()
        );
        let target = match &effect {
            Effect::Insert { key, .. } | Effect::Delete { key } => self.compute_link(key),
        };
        let self_link = self.compute_link(&format!(
            "projects/{project}/{}/operations/{name}",
            scope.path()
        ));

        let mut operation =
            Operation::new_operation(name.as_str(), operation_type, &scope, self_link, target);
        operation.set_insert_time(Self::timestamp());

        tracing::debug!("Submitted operation {name}");

        self.operations.insert(
            name,
            StoredOperation {
                project: project.to_string(),
                scope,
                operation: operation.clone(),
                effect: Some(effect),
            },
        );

        operation
    }

    fn stored_operation(
        &mut self,
        project: &str,
        scope: &Scope,
        name: &str,
    ) -> Result<&mut StoredOperation, StoreError> {
        self.operations
            .get_mut(name)
            .filter(|stored| stored.project == project && stored.scope == *scope)
            .ok_or_else(|| {
                StoreError::NotFound(format!(
                    "projects/{project}/{}/operations/{name}",
                    scope.path()
                ))
            })
    }

    /// Fetches an operation, moving it one state forward.
    pub fn get_operation(
        &mut self,
        project: &str,
        scope: &Scope,
        name: &str,
    ) -> Result<Operation, StoreError> {
        self.take_transient_failure()?;

        let now = Self::timestamp();
        let stored = self.stored_operation(project, scope, name)?;

        match stored.operation.status() {
            OperationStatus::Pending => {
                stored.operation.set_status(OperationStatus::Running);
                stored.operation.set_start_time(now);
            }
            OperationStatus::Running => {
                stored.operation.set_status(OperationStatus::Done);
                stored.operation.set_end_time(now);

                let effect = stored.effect.take();
                let operation = stored.operation.clone();
                if let Some(error) = self.apply(effect) {
                    let stored = self.stored_operation(project, scope, name)?;
                    stored.operation.set_error(error);
                    return Ok(stored.operation.clone());
                }

                return Ok(operation);
            }
            OperationStatus::Done => {}
        }

        Ok(stored.operation.clone())
    }

    fn apply(&mut self, effect: Option<Effect>) -> Option<OperationError> {
        match effect? {
            Effect::Insert { key, resource } => {
                if self.resources.contains_key(&key) {
                    return Some(OperationError::new(vec![OperationErrorDetail::new(
                        "RESOURCE_ALREADY_EXISTS",
                        format!("The resource '{key}' already exists"),
                    )]));
                }
                self.resources.insert(key, resource);
            }
            Effect::Delete { key } => {
                if self.resources.remove(&key).is_none() {
                    return Some(OperationError::new(vec![OperationErrorDetail::new(
                        "RESOURCE_NOT_FOUND",
                        format!("The resource '{key}' was not found"),
                    )]));
                }
            }
        }

        None
    }

    pub fn list_operations(&self, project: &str, scope: &Scope) -> Vec<Operation> {
        self.operations
            .values()
            .filter(|stored| stored.project == project && stored.scope == *scope)
            .map(|stored| stored.operation.clone())
            .collect()
    }

    pub fn delete_operation(
        &mut self,
        project: &str,
        scope: &Scope,
        name: &str,
    ) -> Result<(), StoreError> {
        let _ = self.stored_operation(project, scope, name)?;
        self.operations.remove(name);

        Ok(())
    }

    pub fn operations_link(&self, project: &str, scope: &Scope) -> String {
        self.compute_link(&format!("projects/{project}/{}/operations", scope.path()))
    }

    // BigQuery jobs

    fn job_link(&self, project: &str, job_id: &str) -> String {
        format!(
            "{}/{}/projects/{project}/jobs/{job_id}",
            self.base_url,
            Self::BIGQUERY_PATH
        )
    }

    pub fn insert_job(
        &mut self,
        project: &str,
        job_id: Option<&str>,
        configuration: serde_json::Value,
    ) -> Result<Job, StoreError> {
        let job_id = match job_id {
            Some(job_id) if !job_id.is_empty() => job_id.to_string(),
            _ => format!(
                "job_{}_{}",
                Utc::now().timestamp_millis(),
                self.next_sequence()
            ),
        };

        let key = (project.to_string(), job_id.clone());
        if self.jobs.contains_key(&key) {
            return Err(StoreError::DuplicateJob(format!("{project}:{job_id}")));
        }

        let mut job = Job::new_job(
            JobReference::new(project, job_id.as_str()),
            configuration,
            self.job_link(project, &job_id),
        );
        job.set_statistics(serde_json::json!({
            "creationTime": Utc::now().timestamp_millis().to_string(),
        }));

        tracing::debug!("Inserted job {project}:{job_id}");

        self.jobs.insert(key, job.clone());
        Ok(job)
    }

    /// Fetches a job, moving it one state forward.
    ///
    /// A query job that does not start with `SELECT` ends with an
    /// `invalidQuery` error result.
    pub fn get_job(&mut self, project: &str, job_id: &str) -> Result<Job, StoreError> {
        self.take_transient_failure()?;

        let job = self
            .jobs
            .get_mut(&(project.to_string(), job_id.to_string()))
            .ok_or_else(|| StoreError::NotFound(format!("{project}:{job_id}")))?;

        match job.state() {
            JobState::Pending => job.set_state(JobState::Running),
            JobState::Running => {
                job.set_state(JobState::Done);

                if let Some(error) = Self::query_error(job) {
                    job.set_error_result(error.clone(), vec![error]);
                }
            }
            JobState::Done => {}
        }

        Ok(job.clone())
    }

    fn query_error(job: &Job) -> Option<ErrorProto> {
        let query = job
            .configuration()?
            .pointer("/query/query")
            .and_then(serde_json::Value::as_str)?;

        let statement = query.split_whitespace().next().unwrap_or_default();
        if statement.eq_ignore_ascii_case("SELECT") {
            return None;
        }

        Some(
            ErrorProto::new(
                "invalidQuery",
                format!("Syntax error: Expected SELECT but got \"{statement}\""),
            )
            .with_location("query"),
        )
    }

    /// Jobs of `project`, restricted to `states` when not empty.
    pub fn list_jobs(&self, project: &str, states: &[JobState]) -> Vec<Job> {
        self.jobs
            .iter()
            .filter(|((job_project, _), job)| {
                job_project == project && (states.is_empty() || states.contains(&job.state()))
            })
            .map(|(_, job)| job.clone())
            .collect()
    }
}
