use crate::application::context::SharedApplicationState;
use crate::http::fallback_controller::FallbackController;
use crate::http::health_check_controller::HealthCheckController;
use crate::http::job_controller::JobController;
use crate::http::operation_controller::OperationController;
use crate::http::resource_controller::ResourceController;
use anyhow::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::handler::Handler;
use axum::routing::get;
use axum::routing::post;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::DefaultMakeSpan;
use tower_http::trace::TraceLayer;

const COMPUTE_PREFIX: &str = "/compute/v1/projects/{project}";
const BIGQUERY_PREFIX: &str = "/bigquery/v2/projects/{project}";

/// Scope segments of the compute routes, relative to the project.
const COMPUTE_SCOPES: [&str; 3] = ["global", "zones/{zone}", "regions/{region}"];

pub struct HttpServer {
    listener: TcpListener,
    application_state: SharedApplicationState,
    cancellation_token: CancellationToken,
}

impl HttpServer {
    const BODY_LIMIT: DefaultBodyLimit = DefaultBodyLimit::max(1024 * 1024); // 1MB

    pub fn new(
        listener: TcpListener,
        application_state: SharedApplicationState,
        cancellation_token: CancellationToken,
    ) -> Self {
        tracing::debug!("Initializing the HTTP server");

        Self {
            listener,
            application_state,
            cancellation_token,
        }
    }

    pub fn start(self) -> Vec<JoinHandle<()>> {
        tracing::info!("Starting the HTTP server");

        vec![tokio::spawn(async move {
            if let Err(err) = Self::worker_axum(
                self.listener,
                self.application_state,
                self.cancellation_token,
            )
            .await
            {
                tracing::error!("HTTP server stopped: {err}");
            }
        })]
    }

    fn router(application_state: &SharedApplicationState) -> Router {
        let trace_layer =
            TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::new().include_headers(true));

        let mut router = Router::new().route(
            "/health",
            get(HealthCheckController::get_status_endpoint_handler),
        );

        for scope in COMPUTE_SCOPES {
            router = router
                .route(
                    &format!("{COMPUTE_PREFIX}/{scope}/operations"),
                    get(OperationController::list_operations_endpoint_handler),
                )
                .route(
                    &format!("{COMPUTE_PREFIX}/{scope}/operations/{{name}}"),
                    get(OperationController::get_operation_endpoint_handler)
                        .delete(OperationController::delete_operation_endpoint_handler),
                )
                .route(
                    &format!("{COMPUTE_PREFIX}/{scope}/{{collection}}/{{name}}"),
                    get(ResourceController::get_resource_endpoint_handler)
                        .delete(ResourceController::delete_resource_endpoint_handler),
                );
        }

        router
            .route(
                &format!("{COMPUTE_PREFIX}/zones/{{zone}}/instances"),
                post(ResourceController::insert_instance_endpoint_handler.layer(Self::BODY_LIMIT)),
            )
            .route(
                &format!("{BIGQUERY_PREFIX}/jobs"),
                get(JobController::list_jobs_endpoint_handler)
                    .post(JobController::insert_job_endpoint_handler.layer(Self::BODY_LIMIT)),
            )
            .route(
                &format!("{BIGQUERY_PREFIX}/jobs/{{job_id}}"),
                get(JobController::get_job_endpoint_handler),
            )
            .fallback(FallbackController::fallback_endpoint_handler)
            .layer(trace_layer)
            .with_state(Arc::clone(application_state))
    }

    async fn worker_axum(
        listener: TcpListener,
        application_state: SharedApplicationState,
        cancellation_token: CancellationToken,
    ) -> Result<()> {
        let router = Self::router(&application_state);

        tracing::info!("Starting HTTP Server on {}", listener.local_addr()?);

        axum::serve(listener, router)
            .with_graceful_shutdown(cancellation_token.cancelled_owned())
            .await?;

        tracing::info!("HTTP Server stopped");

        Ok(())
    }
}
