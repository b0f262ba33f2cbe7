use crate::application::APPLICATION_NAME;
use crate::application::context::SharedApplicationState;
use crate::http::model::InsertJobRequest;
use crate::http::model::JobPath;
use crate::http::model::parse_state_filter;
use crate::http::utils::ApiError;
use axum::Json;
use axum::extract::Path;
use axum::extract::RawQuery;
use axum::extract::State;
use axum::response::IntoResponse;
use common::model::JobList;
use std::sync::LazyLock;

static INSERT_JOB_COUNTER: LazyLock<opentelemetry::metrics::Counter<u64>> = LazyLock::new(|| {
    opentelemetry::global::meter(APPLICATION_NAME)
        .u64_counter("http_server_insert_job_requests")
        .with_description("Number of insert job requests")
        .build()
});

static GET_JOB_COUNTER: LazyLock<opentelemetry::metrics::Counter<u64>> = LazyLock::new(|| {
    opentelemetry::global::meter(APPLICATION_NAME)
        .u64_counter("http_server_get_job_requests")
        .with_description("Number of get job requests")
        .build()
});

static LIST_JOBS_COUNTER: LazyLock<opentelemetry::metrics::Counter<u64>> = LazyLock::new(|| {
    opentelemetry::global::meter(APPLICATION_NAME)
        .u64_counter("http_server_list_jobs_requests")
        .with_description("Number of list jobs requests")
        .build()
});

pub struct JobController;

impl JobController {
    #[tracing::instrument(skip(state, request))]
    pub async fn insert_job_endpoint_handler(
        Path(path): Path<JobPath>,
        State(state): State<SharedApplicationState>,
        Json(request): Json<InsertJobRequest>,
    ) -> Result<impl IntoResponse, ApiError> {
        tracing::info!("Inserting a job in project {}", path.project());

        INSERT_JOB_COUNTER.add(1, &[]);

        let job_id = request.job_id().map(ToString::to_string);
        let job = state.store().write().await.insert_job(
            path.project(),
            job_id.as_deref(),
            request.into_configuration(),
        )?;

        Ok(Json(job))
    }

    #[tracing::instrument(skip(state))]
    pub async fn get_job_endpoint_handler(
        Path(path): Path<JobPath>,
        State(state): State<SharedApplicationState>,
    ) -> Result<impl IntoResponse, ApiError> {
        let job_id = path.job_id()?;
        tracing::info!("Getting job {job_id}");

        GET_JOB_COUNTER.add(1, &[]);

        let job = state
            .store()
            .write()
            .await
            .get_job(path.project(), job_id)?;

        Ok(Json(job))
    }

    #[tracing::instrument(skip(state))]
    pub async fn list_jobs_endpoint_handler(
        Path(path): Path<JobPath>,
        RawQuery(query): RawQuery,
        State(state): State<SharedApplicationState>,
    ) -> Result<impl IntoResponse, ApiError> {
        let states = parse_state_filter(query.as_deref())?;
        tracing::info!("Listing jobs of project {} in {states:?}", path.project());

        LIST_JOBS_COUNTER.add(1, &[]);

        let jobs = state
            .store()
            .read()
            .await
            .list_jobs(path.project(), &states);

        Ok(Json(JobList::new(jobs)))
    }
}
