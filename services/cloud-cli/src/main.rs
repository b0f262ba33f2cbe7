use clap::Parser;
use cloud_cli::application::APPLICATION_NAME;
use cloud_cli::application::cli::Cli;
use cloud_cli::application::context::ApplicationContext;
use cloud_cli::application::context::Settings;
use common::telemetry::TelemetryHandler;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize the logging and OpenTelemetry stack
    let _telemetry_handler = match TelemetryHandler::new(
        APPLICATION_NAME,
        env!("CARGO_PKG_VERSION"),
        &cli.flags.log_level,
    ) {
        Ok(handler) => handler,
        Err(err) => {
            eprintln!("ERROR: Failed to initialize logging: {err}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("ERROR: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let settings = Settings::from_flags(&cli.flags);
    let context = ApplicationContext::new(settings)?;

    let result = cloud_cli::commands::run(&context, cli.command).await?;

    let code = result.report(
        context.renderer(),
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
    )?;

    Ok(code)
}
