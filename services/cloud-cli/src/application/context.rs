use crate::api::ApiClient;
use crate::api::ComputeClient;
use crate::api::JobClient;
use crate::application::cli::GlobalFlags;
use crate::batch::BatchExecutor;
use crate::error::Error;
use crate::error::Result;
use crate::output::OutputFormat;
use crate::output::OutputRenderer;
use crate::wait::PollSchedule;
use crate::wait::WaitOptions;
use crate::wait::WaitPrinterKind;
use crate::wait::Waiter;
use common::model::Scope;
use std::time::Duration;

/// Resolved configuration of one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    api_host: String,
    project: Option<String>,
    access_token: Option<String>,
    zone: Option<String>,
    region: Option<String>,
    format: OutputFormat,
    max_wait_time: i64,
    sleep_between_polls: Option<Duration>,
    synchronous_mode: bool,
    concurrent_operations: usize,
    wait_printer: WaitPrinterKind,
}

impl Settings {
    /// Compute operations are polled every few seconds unless told otherwise.
    const DEFAULT_COMPUTE_POLL_INTERVAL: Duration = Duration::from_secs(3);

    pub fn new(api_host: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            api_host: api_host.into(),
            project: Some(project.into()),
            access_token: None,
            zone: None,
            region: None,
            format: OutputFormat::default(),
            max_wait_time: crate::application::cli::DEFAULT_MAX_WAIT_TIME,
            sleep_between_polls: None,
            synchronous_mode: true,
            concurrent_operations: BatchExecutor::DEFAULT_CONCURRENCY,
            wait_printer: WaitPrinterKind::default(),
        }
    }

    pub fn from_flags(flags: &GlobalFlags) -> Self {
        Self {
            api_host: flags.api_host.clone(),
            project: flags.project.clone().filter(|project| !project.is_empty()),
            access_token: flags.access_token.clone().filter(|token| !token.is_empty()),
            zone: flags.zone.clone(),
            region: flags.region.clone(),
            format: flags.format,
            max_wait_time: flags.max_wait_time,
            sleep_between_polls: flags.sleep_between_polls.map(Duration::from_secs),
            synchronous_mode: flags.synchronous_mode,
            concurrent_operations: flags.concurrent_operations,
            wait_printer: flags.wait_printer,
        }
    }

    #[must_use]
    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    #[must_use]
    pub const fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub const fn with_max_wait_time(mut self, max_wait_time: i64) -> Self {
        self.max_wait_time = max_wait_time;
        self
    }

    #[must_use]
    pub const fn with_sleep_between_polls(mut self, interval: Duration) -> Self {
        self.sleep_between_polls = Some(interval);
        self
    }

    #[must_use]
    pub const fn with_synchronous_mode(mut self, synchronous_mode: bool) -> Self {
        self.synchronous_mode = synchronous_mode;
        self
    }

    #[must_use]
    pub const fn with_concurrent_operations(mut self, concurrent_operations: usize) -> Self {
        self.concurrent_operations = concurrent_operations;
        self
    }

    #[must_use]
    pub const fn with_wait_printer(mut self, wait_printer: WaitPrinterKind) -> Self {
        self.wait_printer = wait_printer;
        self
    }

    pub fn api_host(&self) -> &str {
        &self.api_host
    }

    pub fn project(&self) -> Result<&str> {
        self.project.as_deref().ok_or_else(|| {
            Error::Client(format!(
                "No project given, set --project or {}",
                crate::application::cli::PROJECT_ENV_VAR
            ))
        })
    }

    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub const fn synchronous_mode(&self) -> bool {
        self.synchronous_mode
    }

    pub const fn wait_printer(&self) -> WaitPrinterKind {
        self.wait_printer
    }

    /// Scope picked by `--zone` or `--region`, global when neither is set.
    pub fn scope(&self) -> Result<Scope> {
        match (self.zone(), self.region()) {
            (Some(_), Some(_)) => Err(Error::Client(
                "--zone and --region are mutually exclusive".to_string(),
            )),
            (Some(zone), None) => Ok(Scope::Zone(zone.to_string())),
            (None, Some(region)) => Ok(Scope::Region(region.to_string())),
            (None, None) => Ok(Scope::Global),
        }
    }

    pub fn compute_wait_options(&self) -> WaitOptions {
        let interval = self
            .sleep_between_polls
            .unwrap_or(Self::DEFAULT_COMPUTE_POLL_INTERVAL);

        WaitOptions::from_max_wait_secs(self.max_wait_time, PollSchedule::Fixed(interval))
    }

    pub fn job_wait_options(&self) -> WaitOptions {
        let schedule = self
            .sleep_between_polls
            .map_or(PollSchedule::Ramp, PollSchedule::Fixed);

        WaitOptions::from_max_wait_secs(self.max_wait_time, schedule)
    }
}

/// Clients and executors shared by the command handlers.
#[derive(Debug, Clone)]
pub struct ApplicationContext {
    settings: Settings,
    compute_client: ComputeClient,
    job_client: JobClient,
    batch_executor: BatchExecutor,
}

impl ApplicationContext {
    pub fn new(settings: Settings) -> Result<Self> {
        tracing::debug!("Initializing the application context");

        let project = settings.project()?.to_string();
        let api_client = ApiClient::new(settings.api_host(), settings.access_token.clone())?;

        Ok(Self {
            compute_client: ComputeClient::new(api_client.clone(), project.as_str()),
            job_client: JobClient::new(api_client, project),
            batch_executor: BatchExecutor::new(settings.concurrent_operations),
            settings,
        })
    }

    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    pub const fn compute_client(&self) -> &ComputeClient {
        &self.compute_client
    }

    pub const fn job_client(&self) -> &JobClient {
        &self.job_client
    }

    pub const fn batch_executor(&self) -> &BatchExecutor {
        &self.batch_executor
    }

    pub fn compute_waiter(&self) -> Waiter {
        Waiter::new(self.settings.compute_wait_options())
    }

    pub fn job_waiter(&self) -> Waiter {
        Waiter::new(self.settings.job_wait_options())
    }

    pub const fn renderer(&self) -> OutputRenderer {
        OutputRenderer::new(self.settings.format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_and_region_are_exclusive() {
        let settings = Settings::new("http://localhost", "p");
        assert_eq!(settings.scope().unwrap(), Scope::Global);

        let settings = settings.with_zone("z");
        assert_eq!(settings.scope().unwrap(), Scope::Zone("z".to_string()));

        assert!(matches!(
            settings.with_region("r").scope(),
            Err(Error::Client(_))
        ));
    }

    #[test]
    fn poll_pacing_depends_on_the_tool() {
        let settings = Settings::new("http://localhost", "p");

        assert_eq!(
            settings.compute_wait_options().schedule(),
            PollSchedule::Fixed(Duration::from_secs(3))
        );
        assert_eq!(settings.job_wait_options().schedule(), PollSchedule::Ramp);
        assert_eq!(
            settings.job_wait_options().timeout(),
            Some(Duration::from_secs(240))
        );

        let settings = settings.with_sleep_between_polls(Duration::from_secs(1));
        assert_eq!(
            settings.job_wait_options().schedule(),
            PollSchedule::Fixed(Duration::from_secs(1))
        );
    }

    #[test]
    fn a_project_is_required() {
        let mut settings = Settings::new("http://localhost", "p");
        settings.project = None;

        assert!(matches!(
            ApplicationContext::new(settings),
            Err(Error::Client(_))
        ));
    }
}
