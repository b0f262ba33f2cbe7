use crate::application::APPLICATION_NAME;
use crate::application::context::SharedApplicationState;
use crate::http::model::ScopedPath;
use crate::http::utils::ApiError;
use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::model::OperationList;
use std::sync::LazyLock;

static GET_OPERATION_COUNTER: LazyLock<opentelemetry::metrics::Counter<u64>> =
    LazyLock::new(|| {
        opentelemetry::global::meter(APPLICATION_NAME)
            .u64_counter("http_server_get_operation_requests")
            .with_description("Number of get operation requests")
            .build()
    });

static LIST_OPERATIONS_COUNTER: LazyLock<opentelemetry::metrics::Counter<u64>> =
    LazyLock::new(|| {
        opentelemetry::global::meter(APPLICATION_NAME)
            .u64_counter("http_server_list_operations_requests")
            .with_description("Number of list operations requests")
            .build()
    });

static DELETE_OPERATION_COUNTER: LazyLock<opentelemetry::metrics::Counter<u64>> =
    LazyLock::new(|| {
        opentelemetry::global::meter(APPLICATION_NAME)
            .u64_counter("http_server_delete_operation_requests")
            .with_description("Number of delete operation requests")
            .build()
    });

pub struct OperationController;

impl OperationController {
    #[tracing::instrument(skip(state))]
    pub async fn get_operation_endpoint_handler(
        Path(path): Path<ScopedPath>,
        State(state): State<SharedApplicationState>,
    ) -> Result<impl IntoResponse, ApiError> {
        let name = path.name()?;
        tracing::info!("Getting operation {name} in {}", path.scope());

        GET_OPERATION_COUNTER.add(1, &[]);

        let operation = state
            .store()
            .write()
            .await
            .get_operation(path.project(), &path.scope(), name)?;

        Ok(Json(operation))
    }

    #[tracing::instrument(skip(state))]
    pub async fn list_operations_endpoint_handler(
        Path(path): Path<ScopedPath>,
        State(state): State<SharedApplicationState>,
    ) -> impl IntoResponse {
        tracing::info!("Listing operations in {}", path.scope());

        LIST_OPERATIONS_COUNTER.add(1, &[]);

        let store = state.store().read().await;
        let scope = path.scope();

        Json(OperationList::new(
            store.list_operations(path.project(), &scope),
            store.operations_link(path.project(), &scope),
        ))
    }

    #[tracing::instrument(skip(state))]
    pub async fn delete_operation_endpoint_handler(
        Path(path): Path<ScopedPath>,
        State(state): State<SharedApplicationState>,
    ) -> Result<impl IntoResponse, ApiError> {
        let name = path.name()?;
        tracing::info!("Deleting operation {name} in {}", path.scope());

        DELETE_OPERATION_COUNTER.add(1, &[]);

        state
            .store()
            .write()
            .await
            .delete_operation(path.project(), &path.scope(), name)?;

        Ok(StatusCode::NO_CONTENT)
    }
}
