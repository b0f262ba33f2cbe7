use crate::application::APPLICATION_NAME;
use crate::application::context::SharedApplicationState;
use crate::http::model::InsertInstanceRequest;
use crate::http::model::ScopedPath;
use crate::http::utils::ApiError;
use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use axum::response::IntoResponse;
use std::sync::LazyLock;

static GET_RESOURCE_COUNTER: LazyLock<opentelemetry::metrics::Counter<u64>> =
    LazyLock::new(|| {
        opentelemetry::global::meter(APPLICATION_NAME)
            .u64_counter("http_server_get_resource_requests")
            .with_description("Number of get resource requests")
            .build()
    });

static DELETE_RESOURCE_COUNTER: LazyLock<opentelemetry::metrics::Counter<u64>> =
    LazyLock::new(|| {
        opentelemetry::global::meter(APPLICATION_NAME)
            .u64_counter("http_server_delete_resource_requests")
            .with_description("Number of delete resource requests")
            .build()
    });

static INSERT_INSTANCE_COUNTER: LazyLock<opentelemetry::metrics::Counter<u64>> =
    LazyLock::new(|| {
        opentelemetry::global::meter(APPLICATION_NAME)
            .u64_counter("http_server_insert_instance_requests")
            .with_description("Number of insert instance requests")
            .build()
    });

pub struct ResourceController;

impl ResourceController {
    #[tracing::instrument(skip(state))]
    pub async fn get_resource_endpoint_handler(
        Path(path): Path<ScopedPath>,
        State(state): State<SharedApplicationState>,
    ) -> Result<impl IntoResponse, ApiError> {
        let (collection, name) = (path.collection()?, path.name()?);
        tracing::info!("Getting {collection} {name} in {}", path.scope());

        GET_RESOURCE_COUNTER.add(
            1,
            &[opentelemetry::KeyValue::new("collection", collection.to_string())],
        );

        let resource = state.store().write().await.get_resource(
            path.project(),
            &path.scope(),
            collection,
            name,
        )?;

        Ok(Json(resource))
    }

    #[tracing::instrument(skip(state))]
    pub async fn delete_resource_endpoint_handler(
        Path(path): Path<ScopedPath>,
        State(state): State<SharedApplicationState>,
    ) -> Result<impl IntoResponse, ApiError> {
        let (collection, name) = (path.collection()?, path.name()?);
        tracing::info!("Deleting {collection} {name} in {}", path.scope());

        DELETE_RESOURCE_COUNTER.add(
            1,
            &[opentelemetry::KeyValue::new("collection", collection.to_string())],
        );

        let operation = state.store().write().await.delete_resource(
            path.project(),
            &path.scope(),
            collection,
            name,
        )?;

        Ok(Json(operation))
    }

    #[tracing::instrument(skip(state, request))]
    pub async fn insert_instance_endpoint_handler(
        Path(path): Path<ScopedPath>,
        State(state): State<SharedApplicationState>,
        Json(request): Json<InsertInstanceRequest>,
    ) -> Result<impl IntoResponse, ApiError> {
        let zone = path
            .zone()
            .ok_or_else(|| ApiError::invalid("Instances live in a zone"))?;
        tracing::info!("Inserting instance {} in {zone}", request.name());

        INSERT_INSTANCE_COUNTER.add(1, &[]);

        let operation = state.store().write().await.insert_instance(
            path.project(),
            zone,
            request.name(),
            request.machine_type(),
        )?;

        Ok(Json(operation))
    }
}
