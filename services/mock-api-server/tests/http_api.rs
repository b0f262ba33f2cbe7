use common::model::Scope;
use mock_api_server::application::context::RunningApplication;
use mock_api_server::application::context::start_application;
use mock_api_server::domain::MockStore;
use reqwest::StatusCode;
use serde_json::Value;
use serde_json::json;

const PROJECT: &str = "p";

async fn start(store: MockStore) -> RunningApplication {
    start_application("127.0.0.1:0".parse().unwrap(), store)
        .await
        .unwrap()
}

async fn get(client: &reqwest::Client, url: &str) -> (StatusCode, Value) {
    let response = client.get(url).send().await.unwrap();
    let status = response.status();

    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn health_check_is_up() {
    let application = start(MockStore::default()).await;

    let (status, body) = get(
        &reqwest::Client::new(),
        &format!("{}/health", application.base_url()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "UP" }));

    application.shutdown().await.unwrap();
}

#[tokio::test]
async fn unknown_routes_answer_the_error_envelope() {
    let application = start(MockStore::default()).await;

    let (status, body) = get(
        &reqwest::Client::new(),
        &format!("{}/storage/v1/b", application.base_url()),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], 404);
    assert_eq!(body["error"]["errors"][0]["reason"], "notFound");

    application.shutdown().await.unwrap();
}

#[tokio::test]
async fn operations_progress_on_each_poll() {
    let mut store = MockStore::default();
    store.add_resource(PROJECT, &Scope::Region("r".to_string()), "addresses", "ip-1");
    let application = start(store).await;
    let client = reqwest::Client::new();

    let resource_url = format!(
        "{}/compute/v1/projects/{PROJECT}/regions/r/addresses/ip-1",
        application.base_url()
    );
    let (status, resource) = get(&client, &resource_url).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resource["kind"], "compute#address");
    assert_eq!(resource["selfLink"], resource_url.as_str());

    let operation: Value = client
        .delete(&resource_url)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(operation["status"], "PENDING");
    assert_eq!(operation["targetLink"], resource_url.as_str());

    let operation_url = operation["selfLink"].as_str().unwrap().to_string();
    let statuses = [
        get(&client, &operation_url).await.1["status"].clone(),
        get(&client, &operation_url).await.1["status"].clone(),
        get(&client, &operation_url).await.1["status"].clone(),
    ];
    assert_eq!(statuses, [json!("RUNNING"), json!("DONE"), json!("DONE")]);

    let (status, _) = get(&client, &resource_url).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    application.shutdown().await.unwrap();
}

#[tokio::test]
async fn injected_failures_answer_backend_errors() {
    let mut store = MockStore::default().with_transient_failures(1);
    let job = store
        .insert_job(PROJECT, Some("job_1"), json!({ "query": { "query": "SELECT 1" } }))
        .unwrap();
    let application = start(store).await;
    let client = reqwest::Client::new();

    let job_url = format!(
        "{}/bigquery/v2/projects/{PROJECT}/jobs/{}",
        application.base_url(),
        job.job_reference().job_id()
    );

    let (status, body) = get(&client, &job_url).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["errors"][0]["reason"], "backendError");

    let (status, body) = get(&client, &job_url).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"]["state"], "RUNNING");

    application.shutdown().await.unwrap();
}

#[tokio::test]
async fn jobs_are_filtered_by_state() {
    let application = start(MockStore::default()).await;
    let client = reqwest::Client::new();
    let jobs_url = format!("{}/bigquery/v2/projects/{PROJECT}/jobs", application.base_url());

    for job_id in ["job_1", "job_2"] {
        let response = client
            .post(&jobs_url)
            .json(&json!({
                "configuration": { "query": { "query": "SELECT 1" } },
                "jobReference": { "projectId": PROJECT, "jobId": job_id },
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Two polls finish the first job
    for _ in 0..2 {
        get(&client, &format!("{jobs_url}/job_1")).await;
    }

    let (_, body) = get(
        &client,
        &format!("{jobs_url}?allUsers=false&stateFilter=pending&stateFilter=running"),
    )
    .await;
    let pending = body["jobs"].as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["jobReference"]["jobId"], "job_2");

    let (status, _) = get(&client, &format!("{jobs_url}?stateFilter=lost")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    application.shutdown().await.unwrap();
}
