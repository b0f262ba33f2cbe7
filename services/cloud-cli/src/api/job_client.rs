use crate::api::api_client::ApiClient;
use crate::error::Error;
use crate::error::Result;
use common::model::Job;
use common::model::JobList;
use common::model::JobReference;
use common::model::JobState;

/// BigQuery job endpoints.
#[derive(Clone, Debug)]
pub struct JobClient {
    api_client: ApiClient,
    project: String,
}

impl JobClient {
    const API_PATH: &'static str = "bigquery/v2";

    const STATE_FILTER_PARAM: &'static str = "stateFilter";
    const ALL_USERS_PARAM: &'static str = "allUsers";

    pub fn new(api_client: ApiClient, project: impl Into<String>) -> Self {
        Self {
            api_client,
            project: project.into(),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Parses `job_id` or `project:job_id` into a reference.
    pub fn job_reference(&self, identifier: &str) -> Result<JobReference> {
        let (project, job_id) = identifier
            .rsplit_once(':')
            .unwrap_or((self.project.as_str(), identifier));

        if project.is_empty() || job_id.is_empty() {
            return Err(Error::Client(format!(
                "Cannot determine job described by {identifier}"
            )));
        }

        Ok(JobReference::new(project, job_id))
    }

    fn jobs_url(&self, project: &str) -> String {
        self.api_client
            .url(format!("{}/projects/{project}/jobs", Self::API_PATH))
    }

    #[tracing::instrument(skip(self), fields(job = %reference))]
    pub async fn get_job(&self, reference: &JobReference) -> Result<Job> {
        tracing::debug!("Getting job {}", reference.job_id());

        let url = format!(
            "{}/{}",
            self.jobs_url(reference.project_id()),
            reference.job_id()
        );
        match reference.location() {
            Some(location) => {
                self.api_client
                    .get_with_query(&url, &[("location", location)])
                    .await
            }
            None => self.api_client.get(&url).await,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_jobs(&self, state_filter: &[JobState]) -> Result<JobList> {
        tracing::debug!("Listing jobs");

        let states = state_filter
            .iter()
            .map(|state| state.to_string().to_lowercase())
            .collect::<Vec<_>>();
        let mut query = vec![(Self::ALL_USERS_PARAM, "false")];
        query.extend(
            states
                .iter()
                .map(|state| (Self::STATE_FILTER_PARAM, state.as_str())),
        );

        self.api_client
            .get_with_query(&self.jobs_url(&self.project), &query)
            .await
    }

    #[tracing::instrument(skip(self, configuration))]
    pub async fn insert_job(
        &self,
        job_id: Option<&str>,
        configuration: serde_json::Value,
    ) -> Result<Job> {
        tracing::debug!("Inserting a job");

        let mut payload = serde_json::json!({ "configuration": configuration });
        if let Some(job_id) = job_id {
            payload["jobReference"] =
                serde_json::to_value(JobReference::new(self.project.as_str(), job_id))
                    .map_err(|err| Error::Client(err.to_string()))?;
        }

        self.api_client
            .post(&self.jobs_url(&self.project), &payload)
            .await
    }
}
