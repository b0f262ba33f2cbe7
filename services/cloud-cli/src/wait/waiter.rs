use crate::application::APPLICATION_NAME;
use crate::error::Error;
use crate::error::Result;
use crate::wait::poller::Poller;
use crate::wait::printer::WaitPrinter;
use crate::wait::schedule::PollSchedule;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::time::Instant;

static POLL_COUNTER: LazyLock<opentelemetry::metrics::Counter<u64>> = LazyLock::new(|| {
    opentelemetry::global::meter(APPLICATION_NAME)
        .u64_counter("waiter_polls")
        .with_description("Number of status polls issued while waiting")
        .build()
});

static TRANSIENT_ERROR_COUNTER: LazyLock<opentelemetry::metrics::Counter<u64>> =
    LazyLock::new(|| {
        opentelemetry::global::meter(APPLICATION_NAME)
            .u64_counter("waiter_transient_errors")
            .with_description("Number of polls that failed with a retryable error")
            .build()
    });

static TIMEOUT_COUNTER: LazyLock<opentelemetry::metrics::Counter<u64>> = LazyLock::new(|| {
    opentelemetry::global::meter(APPLICATION_NAME)
        .u64_counter("waiter_timeouts")
        .with_description("Number of waits that ran out of time")
        .build()
});

/// Time budget and pacing of a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WaitOptions {
    timeout: Option<Duration>,
    schedule: PollSchedule,
}

impl WaitOptions {
    /// `None` waits until the unit of work reaches its terminal state.
    pub const fn new(timeout: Option<Duration>, schedule: PollSchedule) -> Self {
        Self { timeout, schedule }
    }

    /// Budget given in whole seconds on the command line. Negative means no limit.
    pub fn from_max_wait_secs(max_wait_secs: i64, schedule: PollSchedule) -> Self {
        let timeout = u64::try_from(max_wait_secs).ok().map(Duration::from_secs);

        Self::new(timeout, schedule)
    }

    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub const fn schedule(&self) -> PollSchedule {
        self.schedule
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Polls a [`Poller`] until it reports completion or the budget runs out.
#[derive(Debug, Clone, Copy, Default)]
pub struct Waiter {
    options: WaitOptions,
}

impl Waiter {
    const UNKNOWN_STATUS: &'static str = "UNKNOWN";

    pub const fn new(options: WaitOptions) -> Self {
        Self { options }
    }

    /// Same pacing, different budget.
    #[must_use]
    pub const fn with_timeout(self, timeout: Option<Duration>) -> Self {
        Self::new(self.options.with_timeout(timeout))
    }

    /// Waits for `poller` to finish.
    ///
    /// The first poll happens right away. Communication and backend errors are
    /// logged and the wait goes on; any other error ends it. The last poll is
    /// issued when the budget is exhausted, so a zero timeout polls exactly once.
    #[tracing::instrument(skip_all, fields(id = poller.id()))]
    pub async fn wait<P: Poller>(
        &self,
        poller: &P,
        printer: &mut dyn WaitPrinter,
    ) -> Result<P::Resource> {
        let start = Instant::now();
        let description = poller.description();
        let mut intervals = self.options.schedule.intervals();
        let mut last_status: Option<String> = None;

        loop {
            POLL_COUNTER.add(1, &[]);

            match poller.poll().await {
                Ok(result) => {
                    let (done, status, resource) = result.into_parts();
                    printer.print(poller.id(), start.elapsed(), &status);

                    if done {
                        printer.done();
                        tracing::debug!("{description} finished with status {status}");
                        return Ok(resource);
                    }
                    last_status = Some(status);
                }
                Err(err) if err.is_transient() => {
                    TRANSIENT_ERROR_COUNTER.add(1, &[]);
                    tracing::warn!("Transient error while polling {description}: {err}");
                }
                Err(err) => {
                    printer.done();
                    return Err(err);
                }
            }

            let elapsed = start.elapsed();
            let remaining = match self.options.timeout {
                Some(timeout) if elapsed >= timeout => {
                    printer.done();
                    TIMEOUT_COUNTER.add(1, &[]);
                    return Err(Error::WaitTimedOut {
                        id: poller.id().to_string(),
                        status: last_status.unwrap_or_else(|| Self::UNKNOWN_STATUS.to_string()),
                        elapsed,
                    });
                }
                Some(timeout) => Some(timeout - elapsed),
                None => None,
            };

            let interval = intervals.next().unwrap_or_default();
            let sleep_for = remaining.map_or(interval, |remaining| interval.min(remaining));

            tracing::info!(
                "Waiting for {description}. Sleeping for {:.1}s",
                sleep_for.as_secs_f64()
            );
            tokio::time::sleep(sleep_for).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wait::poller::PollResult;
    use crate::wait::printer::QuietWaitPrinter;
    use crate::wait::printer::TransitionWaitPrinter;
    use common::model::ErrorProto;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    /// Replays a script of poll results, then reports RUNNING forever.
    struct ScriptedPoller {
        script: Mutex<VecDeque<Result<PollResult<u32>>>>,
        polls: AtomicUsize,
    }

    impl ScriptedPoller {
        fn new(script: Vec<Result<PollResult<u32>>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                polls: AtomicUsize::new(0),
            }
        }

        fn polls(&self) -> usize {
            self.polls.load(Ordering::SeqCst)
        }
    }

    impl Poller for ScriptedPoller {
        type Resource = u32;

        fn id(&self) -> &str {
            "operation-1"
        }

        async fn poll(&self) -> Result<PollResult<u32>> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();

            next.unwrap_or_else(|| Ok(running()))
        }
    }

    fn running() -> PollResult<u32> {
        PollResult::new(false, "RUNNING", 0)
    }

    fn done(value: u32) -> PollResult<u32> {
        PollResult::new(true, "DONE", value)
    }

    fn service_error(reason: &str, status: u16) -> Error {
        Error::from_error_proto(
            &ErrorProto::new(reason, "boom"),
            &[],
            Some(status),
            None,
            "",
        )
    }

    fn waiter(timeout: Option<Duration>, schedule: PollSchedule) -> Waiter {
        Waiter::new(WaitOptions::new(timeout, schedule))
    }

    #[tokio::test(start_paused = true)]
    async fn returns_the_resource_once_done() {
        let poller = ScriptedPoller::new(vec![Ok(running()), Ok(running()), Ok(done(7))]);
        let start = Instant::now();

        let resource = waiter(
            Some(Duration::from_secs(10)),
            PollSchedule::Fixed(Duration::from_secs(1)),
        )
        .wait(&poller, &mut QuietWaitPrinter)
        .await
        .unwrap();

        assert_eq!(resource, 7);
        assert_eq!(poller.polls(), 3);
        assert_eq!(start.elapsed().as_secs(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_with_the_last_observed_status() {
        let poller = ScriptedPoller::new(vec![Ok(PollResult::new(false, "PENDING", 0))]);
        let start = Instant::now();

        let error = waiter(
            Some(Duration::from_secs(5)),
            PollSchedule::Fixed(Duration::from_secs(2)),
        )
        .wait(&poller, &mut QuietWaitPrinter)
        .await
        .unwrap_err();

        // Polls at 0s, 2s, 4s and a final one at the 5s deadline.
        assert_eq!(poller.polls(), 4);
        assert_eq!(start.elapsed().as_secs(), 5);
        match error {
            Error::WaitTimedOut {
                id,
                status,
                elapsed,
            } => {
                assert_eq!(id, "operation-1");
                assert_eq!(status, "RUNNING");
                assert!(elapsed >= Duration::from_secs(5));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_polls_exactly_once() {
        let poller = ScriptedPoller::new(vec![]);

        let error = waiter(Some(Duration::ZERO), PollSchedule::Ramp)
            .wait(&poller, &mut QuietWaitPrinter)
            .await
            .unwrap_err();

        assert!(error.is_timeout());
        assert_eq!(poller.polls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_still_returns_a_finished_resource() {
        let poller = ScriptedPoller::new(vec![Ok(done(3))]);

        let resource = waiter(Some(Duration::ZERO), PollSchedule::Ramp)
            .wait(&poller, &mut QuietWaitPrinter)
            .await
            .unwrap();

        assert_eq!(resource, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_retried() {
        let poller = ScriptedPoller::new(vec![
            Err(Error::Communication("connection reset".to_string())),
            Err(service_error("backendError", 503)),
            Err(service_error("backendError", 503)),
            Ok(done(42)),
        ]);

        let resource = waiter(
            Some(Duration::from_secs(60)),
            PollSchedule::Fixed(Duration::from_secs(1)),
        )
        .wait(&poller, &mut QuietWaitPrinter)
        .await
        .unwrap();

        assert_eq!(resource, 42);
        assert_eq!(poller.polls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_errors_end_the_wait() {
        let poller = ScriptedPoller::new(vec![Err(service_error("notFound", 404)), Ok(done(1))]);

        let error = waiter(None, PollSchedule::Fixed(Duration::from_secs(1)))
            .wait(&poller, &mut QuietWaitPrinter)
            .await
            .unwrap_err();

        assert_eq!(error.kind(), Some(crate::error::ErrorKind::NotFound));
        assert_eq!(poller.polls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn status_is_unknown_when_no_poll_succeeded() {
        let poller = ScriptedPoller::new(
            (0..10)
                .map(|_| Err(Error::Communication("unreachable".to_string())))
                .collect(),
        );

        let error = waiter(
            Some(Duration::from_secs(3)),
            PollSchedule::Fixed(Duration::from_secs(1)),
        )
        .wait(&poller, &mut QuietWaitPrinter)
        .await
        .unwrap_err();

        assert!(matches!(error, Error::WaitTimedOut { status, .. } if status == "UNKNOWN"));
    }

    #[tokio::test(start_paused = true)]
    async fn ramp_schedule_paces_polls_without_a_budget() {
        let mut script = (0..11).map(|_| Ok(running())).collect::<Vec<_>>();
        script.push(Ok(done(5)));
        let poller = ScriptedPoller::new(script);
        let start = Instant::now();

        waiter(None, PollSchedule::Ramp)
            .wait(&poller, &mut QuietWaitPrinter)
            .await
            .unwrap();

        // Eight 1s sleeps, then 2s, 5s and 8s.
        assert_eq!(poller.polls(), 12);
        assert_eq!(start.elapsed().as_secs(), 23);
    }

    #[tokio::test(start_paused = true)]
    async fn printer_sees_each_status_change() {
        let poller = ScriptedPoller::new(vec![
            Ok(PollResult::new(false, "PENDING", 0)),
            Ok(running()),
            Ok(running()),
            Ok(done(1)),
        ]);
        let mut printer = TransitionWaitPrinter::new(Vec::new());

        waiter(None, PollSchedule::Fixed(Duration::from_secs(1)))
            .wait(&poller, &mut printer)
            .await
            .unwrap();

        let output = String::from_utf8(printer.into_inner()).unwrap();
        assert_eq!(
            output.lines().collect::<Vec<_>>(),
            vec![
                "Waiting on operation-1 ... (0s) Current status: PENDING",
                "Waiting on operation-1 ... (1s) Current status: RUNNING",
                "Waiting on operation-1 ... (3s) Current status: DONE",
            ]
        );
    }

    #[test]
    fn negative_budget_means_no_limit() {
        assert_eq!(
            WaitOptions::from_max_wait_secs(-1, PollSchedule::Ramp).timeout(),
            None
        );
        assert_eq!(
            WaitOptions::from_max_wait_secs(240, PollSchedule::Ramp).timeout(),
            Some(Duration::from_secs(240))
        );
    }
}
