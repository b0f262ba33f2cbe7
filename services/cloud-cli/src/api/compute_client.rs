use crate::api::api_client::ApiClient;
use crate::domain::OperationReference;
use crate::domain::ResourceCollection;
use crate::error::Error;
use crate::error::Result;
use common::model::Operation;
use common::model::OperationList;
use common::model::Resource;
use common::model::Scope;

/// Compute Engine endpoints used by the operation commands.
#[derive(Clone, Debug)]
pub struct ComputeClient {
    api_client: ApiClient,
    project: String,
}

impl ComputeClient {
    const API_PATH: &'static str = "compute/v1";

    pub fn new(api_client: ApiClient, project: impl Into<String>) -> Self {
        Self {
            api_client,
            project: project.into(),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    fn scope_url(&self, project: &str, scope: &Scope, tail: &str) -> String {
        self.api_client.url(format!(
            "{}/projects/{project}/{}/{tail}",
            Self::API_PATH,
            scope.path()
        ))
    }

    fn operation_url(&self, reference: &OperationReference) -> String {
        self.scope_url(
            reference.project(),
            reference.scope(),
            &format!("operations/{}", reference.name()),
        )
    }

    #[tracing::instrument(skip(self), fields(operation = %reference))]
    pub async fn get_operation(&self, reference: &OperationReference) -> Result<Operation> {
        tracing::debug!("Getting operation {}", reference.name());

        self.api_client.get(&self.operation_url(reference)).await
    }

    #[tracing::instrument(skip(self), fields(operation = %reference))]
    pub async fn delete_operation(&self, reference: &OperationReference) -> Result<()> {
        tracing::debug!("Deleting operation {}", reference.name());

        self.api_client
            .delete_empty(&self.operation_url(reference))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_operations(&self, scope: &Scope) -> Result<OperationList> {
        tracing::debug!("Listing operations in {scope}");

        self.api_client
            .get(&self.scope_url(&self.project, scope, "operations"))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_resource(
        &self,
        collection: ResourceCollection,
        scope: &Scope,
        name: &str,
    ) -> Result<Operation> {
        tracing::debug!("Deleting {} {name}", collection.singular());

        self.api_client
            .delete(&self.scope_url(
                &self.project,
                scope,
                &format!("{}/{name}", collection.path()),
            ))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn insert_instance(
        &self,
        zone: &str,
        name: &str,
        machine_type: &str,
    ) -> Result<Operation> {
        tracing::debug!("Inserting instance {name}");

        let scope = Scope::Zone(zone.to_string());
        let machine_type_url =
            self.scope_url(&self.project, &scope, &format!("machineTypes/{machine_type}"));
        let payload = serde_json::json!({
            "name": name,
            "machineType": machine_type_url,
        });

        self.api_client
            .post(
                &self.scope_url(&self.project, &scope, ResourceCollection::Instances.path()),
                &payload,
            )
            .await
    }

    /// Fetches a resource by its absolute link, e.g. an operation's `targetLink`.
    #[tracing::instrument(skip(self))]
    pub async fn get_resource(&self, link: &str) -> Result<Resource> {
        let value = self.api_client.get::<serde_json::Value>(link).await?;

        Resource::try_from(value)
            .map_err(|err| Error::Interface(format!("Could not parse resource {link}: {err}")))
    }
}
