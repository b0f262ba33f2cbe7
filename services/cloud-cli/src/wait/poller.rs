use crate::api::ComputeClient;
use crate::api::JobClient;
use crate::domain::OperationReference;
use crate::error::Result;
use common::model::Job;
use common::model::JobReference;
use common::model::JobState;
use common::model::Operation;

/// Outcome of one status fetch.
#[derive(Debug, Clone)]
pub struct PollResult<R> {
    done: bool,
    status: String,
    resource: R,
}

impl<R> PollResult<R> {
    pub fn new(done: bool, status: impl Into<String>, resource: R) -> Self {
        Self {
            done,
            status: status.into(),
            resource,
        }
    }

    pub const fn done(&self) -> bool {
        self.done
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub const fn resource(&self) -> &R {
        &self.resource
    }

    pub fn into_parts(self) -> (bool, String, R) {
        (self.done, self.status, self.resource)
    }
}

/// Fetches the status of one asynchronous unit of work.
///
/// Each call issues exactly one request. Errors are returned as-is; the
/// caller decides whether they are worth another attempt.
pub trait Poller: Send + Sync {
    type Resource: Send;

    fn id(&self) -> &str;

    /// Human readable target used in progress logs.
    fn description(&self) -> String {
        self.id().to_string()
    }

    fn poll(&self) -> impl Future<Output = Result<PollResult<Self::Resource>>> + Send;
}

pub struct OperationPoller {
    client: ComputeClient,
    reference: OperationReference,
    description: String,
}

impl OperationPoller {
    pub fn new(client: ComputeClient, reference: OperationReference) -> Self {
        let description = reference.name().to_string();

        Self {
            client,
            reference,
            description,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl Poller for OperationPoller {
    type Resource = Operation;

    fn id(&self) -> &str {
        self.reference.name()
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    async fn poll(&self) -> Result<PollResult<Operation>> {
        let operation = self.client.get_operation(&self.reference).await?;

        Ok(PollResult::new(
            operation.is_done(),
            operation.status().to_string(),
            operation,
        ))
    }
}

pub struct JobPoller {
    client: JobClient,
    reference: JobReference,
    desired_state: JobState,
}

impl JobPoller {
    pub const fn new(client: JobClient, reference: JobReference) -> Self {
        Self {
            client,
            reference,
            desired_state: JobState::Done,
        }
    }

    #[must_use]
    pub const fn with_desired_state(mut self, desired_state: JobState) -> Self {
        self.desired_state = desired_state;
        self
    }
}

impl Poller for JobPoller {
    type Resource = Job;

    fn id(&self) -> &str {
        self.reference.job_id()
    }

    fn description(&self) -> String {
        format!("job {}", self.reference)
    }

    async fn poll(&self) -> Result<PollResult<Job>> {
        let job = self.client.get_job(&self.reference).await?;

        Ok(PollResult::new(
            job.state() == self.desired_state,
            job.state().to_string(),
            job,
        ))
    }
}
