use anyhow::Context as _;
use anyhow::Result;
use common::telemetry::TelemetryHandler;
use mock_api_server::application::APPLICATION_NAME;
use mock_api_server::application::context::start_application;
use mock_api_server::domain::MockStore;
use std::net::SocketAddr;

const PORT_ENV_VAR: &str = "MOCK_API_PORT";
const TRANSIENT_FAILURES_ENV_VAR: &str = "MOCK_API_TRANSIENT_FAILURES";
const DEFAULT_PORT: u16 = 8080;

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    std::env::var(name).map_or(Ok(default), |value| {
        value
            .parse()
            .with_context(|| format!("Invalid value for {name}: {value}"))
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logging and OpenTelemetry stack
    let _telemetry_handler =
        TelemetryHandler::new(APPLICATION_NAME, env!("CARGO_PKG_VERSION"), "info")?;

    let port = env_or(PORT_ENV_VAR, DEFAULT_PORT)?;
    let transient_failures = env_or(TRANSIENT_FAILURES_ENV_VAR, 0_usize)?;

    // Start the application
    let store = MockStore::default().with_transient_failures(transient_failures);
    let application = start_application(SocketAddr::from(([0, 0, 0, 0], port)), store).await?;

    let cancellation_token = application.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C, shutting down");
        }
        cancellation_token.cancel();
    });

    application.wait().await
}
