use cloud_cli::application::cli::Command;
use cloud_cli::application::cli::ComputeCommand;
use cloud_cli::application::context::ApplicationContext;
use cloud_cli::application::context::Settings;
use cloud_cli::commands;
use cloud_cli::commands::CommandResult;
use cloud_cli::error::Error;
use cloud_cli::error::ErrorKind;
use cloud_cli::output::OutputFormat;
use cloud_cli::wait::WaitPrinterKind;
use common::model::OperationStatus;
use common::model::Resource;
use common::model::Scope;
use mock_api_server::application::context::RunningApplication;
use mock_api_server::application::context::start_application;
use mock_api_server::domain::MockStore;
use std::time::Duration;

const PROJECT: &str = "test-project";
const ZONE: &str = "europe-west1-b";

async fn start(store: MockStore) -> RunningApplication {
    start_application("127.0.0.1:0".parse().unwrap(), store)
        .await
        .unwrap()
}

fn settings(application: &RunningApplication) -> Settings {
    Settings::new(application.base_url(), PROJECT)
        .with_sleep_between_polls(Duration::from_millis(10))
        .with_wait_printer(WaitPrinterKind::Quiet)
}

async fn run(settings: Settings, command: ComputeCommand) -> CommandResult {
    let context = ApplicationContext::new(settings).unwrap();

    commands::run(&context, Command::Compute(command))
        .await
        .unwrap()
}

fn with_firewalls(names: &[&str]) -> MockStore {
    let mut store = MockStore::default();
    for name in names {
        store.add_resource(PROJECT, &Scope::Global, "firewalls", name);
    }
    store
}

#[tokio::test]
async fn add_instance_returns_the_operation_and_the_instance() {
    let application = start(MockStore::default()).await;

    let result = run(
        settings(&application).with_zone(ZONE),
        ComputeCommand::AddInstance {
            names: vec!["vm-1".to_string()],
            machine_type: "n1-standard-1".to_string(),
        },
    )
    .await;

    assert!(result.is_success(), "{:?}", result.errors());
    let [Resource::Operation(operation), Resource::Instance(instance)] = result.resources() else {
        panic!("unexpected resources: {:?}", result.resources());
    };
    assert_eq!(operation.status(), OperationStatus::Done);
    assert!(!operation.has_error());
    assert_eq!(instance.name(), "vm-1");
    assert_eq!(instance.status(), Some("RUNNING"));

    assert!(application.state().store().read().await.contains_resource(
        PROJECT,
        &Scope::Zone(ZONE.to_string()),
        "instances",
        "vm-1"
    ));

    application.shutdown().await.unwrap();
}

#[tokio::test]
async fn transient_server_errors_are_retried() {
    let application = start(MockStore::default().with_transient_failures(3)).await;

    let result = run(
        settings(&application).with_zone(ZONE),
        ComputeCommand::AddInstance {
            names: vec!["vm-1".to_string()],
            machine_type: "n1-standard-1".to_string(),
        },
    )
    .await;

    assert!(result.is_success(), "{:?}", result.errors());
    assert_eq!(result.resources().len(), 2);
    assert_eq!(
        application
            .state()
            .store()
            .read()
            .await
            .remaining_transient_failures(),
        0
    );

    application.shutdown().await.unwrap();
}

#[tokio::test]
async fn adding_an_existing_instance_is_a_duplicate() {
    let mut store = MockStore::default();
    store.add_resource(PROJECT, &Scope::Zone(ZONE.to_string()), "instances", "vm-1");
    let application = start(store).await;

    let result = run(
        settings(&application).with_zone(ZONE),
        ComputeCommand::AddInstance {
            names: vec!["vm-1".to_string()],
            machine_type: "n1-standard-1".to_string(),
        },
    )
    .await;

    assert_eq!(result.exit_code(), 1);
    assert!(matches!(
        result.errors(),
        [Error::Service(error)] if error.kind() == ErrorKind::Duplicate
    ));

    application.shutdown().await.unwrap();
}

#[tokio::test]
async fn deleting_a_firewall_twice_fails_one_operation() {
    let application = start(with_firewalls(&["fw-1"])).await;

    // Both deletes are accepted before either one is applied
    let result = run(
        settings(&application)
            .with_sleep_between_polls(Duration::from_millis(100))
            .with_concurrent_operations(2),
        ComputeCommand::DeleteFirewall {
            names: vec!["fw-1".to_string(); 2],
        },
    )
    .await;

    assert_eq!(result.exit_code(), 1);
    let [Error::OperationFailed { errors, .. }] = result.errors() else {
        panic!("expected one failed operation, got {:?}", result.errors());
    };
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code(), "RESOURCE_NOT_FOUND");
    assert!(matches!(
        result.resources(),
        [Resource::Operation(operation)] if operation.is_done() && !operation.has_error()
    ));

    application.shutdown().await.unwrap();
}

#[tokio::test]
async fn failed_insert_operations_skip_the_target() {
    let application = start(MockStore::default()).await;

    let result = run(
        settings(&application)
            .with_zone(ZONE)
            .with_sleep_between_polls(Duration::from_millis(100))
            .with_concurrent_operations(2),
        ComputeCommand::AddInstance {
            names: vec!["vm-1".to_string(); 2],
            machine_type: "n1-standard-1".to_string(),
        },
    )
    .await;

    assert!(matches!(
        result.errors(),
        [Error::OperationFailed { errors, .. }] if errors[0].code() == "RESOURCE_ALREADY_EXISTS"
    ));
    // Only the successful insert brings its instance along
    assert!(matches!(
        result.resources(),
        [Resource::Operation(operation), Resource::Instance(instance)]
            if !operation.has_error() && instance.name() == "vm-1"
    ));

    application.shutdown().await.unwrap();
}

#[tokio::test]
async fn batch_delete_reports_each_failure() {
    let application = start(with_firewalls(&["fw-1", "fw-3", "fw-4"])).await;

    let result = run(
        settings(&application).with_concurrent_operations(2),
        ComputeCommand::DeleteFirewall {
            names: ["fw-1", "fw-2", "fw-3", "fw-4", "fw-5"]
                .map(ToString::to_string)
                .to_vec(),
        },
    )
    .await;

    assert_eq!(result.exit_code(), 1);
    assert_eq!(result.errors().len(), 2);
    assert!(
        result
            .errors()
            .iter()
            .all(|error| error.kind() == Some(ErrorKind::NotFound))
    );

    // Deleted targets are not fetched, only the operations are returned
    assert_eq!(result.resources().len(), 3);
    assert!(result.resources().iter().all(|resource| matches!(
        resource,
        Resource::Operation(operation) if operation.is_done()
    )));

    let store = application.state().store().read().await;
    for name in ["fw-1", "fw-3", "fw-4"] {
        assert!(!store.contains_resource(PROJECT, &Scope::Global, "firewalls", name));
    }
    drop(store);

    application.shutdown().await.unwrap();
}

#[tokio::test]
async fn asynchronous_mode_returns_submitted_operations() {
    let application = start(with_firewalls(&["fw-1"])).await;

    let result = run(
        settings(&application).with_synchronous_mode(false),
        ComputeCommand::DeleteFirewall {
            names: vec!["fw-1".to_string()],
        },
    )
    .await;

    let [Resource::Operation(operation)] = result.resources() else {
        panic!("unexpected resources: {:?}", result.resources());
    };
    assert_eq!(operation.status(), OperationStatus::Pending);
    assert!(
        application
            .state()
            .store()
            .read()
            .await
            .contains_resource(PROJECT, &Scope::Global, "firewalls", "fw-1")
    );

    // The operation can be looked up, then deleted, afterwards
    let name = operation.name().to_string();
    let result = run(
        settings(&application),
        ComputeCommand::GetOperation { name: name.clone() },
    )
    .await;
    assert!(matches!(
        result.resources(),
        [Resource::Operation(operation)] if operation.status() == OperationStatus::Running
    ));

    let result = run(
        settings(&application),
        ComputeCommand::DeleteOperation {
            names: vec![name, "operation-missing".to_string()],
        },
    )
    .await;
    assert_eq!(result.errors().len(), 1);
    assert!(result.resources().is_empty());

    let result = run(settings(&application), ComputeCommand::ListOperations).await;
    assert!(matches!(
        result.resources(),
        [Resource::OperationList(list)] if list.items().is_empty()
    ));

    application.shutdown().await.unwrap();
}

#[tokio::test]
async fn operations_render_in_every_format() {
    let application = start(with_firewalls(&["fw-1"])).await;
    let settings = settings(&application);

    let result = run(
        settings.clone(),
        ComputeCommand::DeleteFirewall {
            names: vec!["fw-1".to_string()],
        },
    )
    .await;

    let context = ApplicationContext::new(settings.with_format(OutputFormat::Names)).unwrap();
    let (mut out, mut err) = (Vec::new(), Vec::new());
    let code = result.report(context.renderer(), &mut out, &mut err).unwrap();

    assert_eq!(code, 0);
    assert!(String::from_utf8(out).unwrap().starts_with("operation-"));
    assert!(err.is_empty());

    application.shutdown().await.unwrap();
}

#[tokio::test]
async fn missing_zone_is_a_client_error() {
    let application = start(MockStore::default()).await;
    let context = ApplicationContext::new(settings(&application)).unwrap();

    let result = commands::run(
        &context,
        Command::Compute(ComputeCommand::DeleteDisk {
            names: vec!["disk-1".to_string()],
        }),
    )
    .await;

    assert!(matches!(result, Err(Error::Client(_))));

    application.shutdown().await.unwrap();
}
