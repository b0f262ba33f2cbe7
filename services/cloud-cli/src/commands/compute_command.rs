use crate::api::ComputeClient;
use crate::application::cli::ComputeCommand;
use crate::application::context::ApplicationContext;
use crate::commands::CommandResult;
use crate::domain::OperationReference;
use crate::domain::ResourceCollection;
use crate::error::Error;
use crate::error::Result;
use crate::wait::OperationPoller;
use crate::wait::QuietWaitPrinter;
use crate::wait::Waiter;
use common::model::Operation;
use common::model::Resource;
use std::time::Duration;

const TARGET_FETCH_ATTEMPTS: u32 = 3;

pub async fn execute(
    context: &ApplicationContext,
    command: ComputeCommand,
) -> Result<CommandResult> {
    match command {
        ComputeCommand::GetOperation { name } => get_operation(context, &name).await,
        ComputeCommand::ListOperations => list_operations(context).await,
        ComputeCommand::DeleteOperation { names } => Ok(delete_operations(context, names).await),
        ComputeCommand::AddInstance {
            names,
            machine_type,
        } => add_instances(context, names, machine_type).await,
        ComputeCommand::DeleteInstance { names } => {
            delete_resources(context, ResourceCollection::Instances, names).await
        }
        ComputeCommand::DeleteDisk { names } => {
            delete_resources(context, ResourceCollection::Disks, names).await
        }
        ComputeCommand::DeleteFirewall { names } => {
            delete_resources(context, ResourceCollection::Firewalls, names).await
        }
        ComputeCommand::DeleteAddress { names } => {
            delete_resources(context, ResourceCollection::Addresses, names).await
        }
    }
}

#[tracing::instrument(skip(context))]
async fn get_operation(context: &ApplicationContext, name: &str) -> Result<CommandResult> {
    let client = context.compute_client();
    let reference = OperationReference::new(client.project(), context.settings().scope()?, name);

    let operation = client.get_operation(&reference).await?;

    Ok(CommandResult::from_resource(operation))
}

#[tracing::instrument(skip(context))]
async fn list_operations(context: &ApplicationContext) -> Result<CommandResult> {
    let operations = context
        .compute_client()
        .list_operations(&context.settings().scope()?)
        .await?;

    Ok(CommandResult::from_resource(operations))
}

#[tracing::instrument(skip(context))]
async fn delete_operations(context: &ApplicationContext, names: Vec<String>) -> CommandResult {
    let client = context.compute_client().clone();
    let scope = match context.settings().scope() {
        Ok(scope) => scope,
        Err(err) => return CommandResult::default().with_error(err),
    };

    let outcome = context
        .batch_executor()
        .execute(names, move |name| {
            let client = client.clone();
            let reference = OperationReference::new(client.project(), scope.clone(), name);

            async move {
                client.delete_operation(&reference).await?;
                Ok(Vec::new())
            }
        })
        .await;

    CommandResult::from_outcome(outcome)
}

#[tracing::instrument(skip(context))]
async fn add_instances(
    context: &ApplicationContext,
    names: Vec<String>,
    machine_type: String,
) -> Result<CommandResult> {
    let Some(zone) = context.settings().zone().map(ToString::to_string) else {
        return Err(Error::Client("--zone is required for instances".to_string()));
    };

    Ok(execute_requests(context, names, move |client, name| {
        let zone = zone.clone();
        let machine_type = machine_type.clone();

        async move { client.insert_instance(&zone, &name, &machine_type).await }
    })
    .await)
}

#[tracing::instrument(skip(context))]
async fn delete_resources(
    context: &ApplicationContext,
    collection: ResourceCollection,
    names: Vec<String>,
) -> Result<CommandResult> {
    let settings = context.settings();
    let scope = collection.scope(settings.zone(), settings.region())?;

    Ok(execute_requests(context, names, move |client, name| {
        let scope = scope.clone();

        async move { client.delete_resource(collection, &scope, &name).await }
    })
    .await)
}

/// Submits every request through the batch executor.
///
/// In synchronous mode each submitted operation is waited on inside its own
/// worker, otherwise the operations are returned as submitted.
async fn execute_requests<R, F, Fut>(
    context: &ApplicationContext,
    requests: Vec<R>,
    submit: F,
) -> CommandResult
where
    R: Send + 'static,
    F: Fn(ComputeClient, R) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Operation>> + Send + 'static,
{
    let client = context.compute_client().clone();
    let waiter = context.compute_waiter();
    let synchronous_mode = context.settings().synchronous_mode();

    let outcome = context
        .batch_executor()
        .execute(requests, move |request| {
            let client = client.clone();
            let submitted = submit(client.clone(), request);

            async move {
                let operation = submitted.await?;

                if synchronous_mode {
                    wait_for_operation(&client, waiter, operation).await
                } else {
                    Ok(vec![Resource::from(operation)])
                }
            }
        })
        .await;

    CommandResult::from_outcome(outcome)
}

/// Waits for `operation` and returns it with the resource it created or changed.
///
/// An operation that finished with errors becomes [`Error::OperationFailed`].
/// Deleted targets are not fetched.
pub async fn wait_for_operation(
    client: &ComputeClient,
    waiter: Waiter,
    operation: Operation,
) -> Result<Vec<Resource>> {
    let operation = if operation.is_done() {
        operation
    } else {
        let reference = OperationReference::from_operation(&operation, client.project())?;
        let description = match operation.target_name() {
            Some(target) => format!("{} of {target}", operation.operation_type()),
            None => reference.name().to_string(),
        };
        let poller = OperationPoller::new(client.clone(), reference).with_description(description);

        waiter.wait(&poller, &mut QuietWaitPrinter).await?
    };

    if operation.has_error() {
        return Err(Error::operation_failed(&operation));
    }

    let target = if operation.operation_type() == Operation::DELETE_OPERATION_TYPE {
        None
    } else {
        fetch_target(client, &operation).await
    };

    let mut resources = vec![Resource::from(operation)];
    resources.extend(target);

    Ok(resources)
}

/// Fetches the target of a finished operation. Failures only cost the extra output.
async fn fetch_target(client: &ComputeClient, operation: &Operation) -> Option<Resource> {
    let link = operation.target_link()?;

    for attempt in 0..TARGET_FETCH_ATTEMPTS {
        match client.get_resource(link).await {
            Ok(resource) => return Some(resource),
            Err(err) if err.is_transient() && attempt + 1 < TARGET_FETCH_ATTEMPTS => {
                let backoff = Duration::from_secs(2_u64.pow(attempt));
                tracing::warn!(
                    "Could not fetch {link}: {err}. Retrying in {}s",
                    backoff.as_secs()
                );
                tokio::time::sleep(backoff).await;
            }
            Err(err) => {
                tracing::warn!("Could not fetch {link}: {err}");
                return None;
            }
        }
    }

    None
}
