use crate::application::APPLICATION_NAME;
use crate::error::Error;
use crate::error::Result;
use std::sync::Arc;
use std::sync::LazyLock;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;

static BATCH_SUCCESS_COUNTER: LazyLock<opentelemetry::metrics::Counter<u64>> =
    LazyLock::new(|| {
        opentelemetry::global::meter(APPLICATION_NAME)
            .u64_counter("batch_request_successes")
            .with_description("Number of batch requests that completed successfully")
            .build()
    });

static BATCH_FAILURE_COUNTER: LazyLock<opentelemetry::metrics::Counter<u64>> =
    LazyLock::new(|| {
        opentelemetry::global::meter(APPLICATION_NAME)
            .u64_counter("batch_request_failures")
            .with_description("Number of batch requests that completed with an error")
            .build()
    });

/// Results of a batch, each tagged with the position of its request.
#[derive(Debug)]
pub struct BatchOutcome<T> {
    successes: Vec<(usize, T)>,
    failures: Vec<(usize, Error)>,
}

impl<T> Default for BatchOutcome<T> {
    fn default() -> Self {
        Self {
            successes: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<T> BatchOutcome<T> {
    pub fn successes(&self) -> &[(usize, T)] {
        &self.successes
    }

    pub fn failures(&self) -> &[(usize, Error)] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_parts(self) -> (Vec<(usize, T)>, Vec<(usize, Error)>) {
        (self.successes, self.failures)
    }

    fn record(&mut self, index: usize, result: Result<T>) {
        match result {
            Ok(value) => {
                BATCH_SUCCESS_COUNTER.add(1, &[]);
                self.successes.push((index, value));
            }
            Err(err) => {
                BATCH_FAILURE_COUNTER.add(1, &[]);
                self.failures.push((index, err));
            }
        }
    }
}

/// Runs independent requests with a bounded number in flight.
///
/// Every request is executed exactly once. A failing or panicking request
/// never cancels the others.
#[derive(Debug, Clone, Copy)]
pub struct BatchExecutor {
    concurrency: usize,
}

impl Default for BatchExecutor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CONCURRENCY)
    }
}

impl BatchExecutor {
    pub const DEFAULT_CONCURRENCY: usize = 10;

    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Executes `run` for every request and collects the outcomes.
    ///
    /// At most `concurrency` requests are in flight at once. Outcomes are
    /// sorted by request index.
    #[tracing::instrument(
        skip_all,
        fields(requests = requests.len(), concurrency = self.concurrency)
    )]
    pub async fn execute<R, T, F, Fut>(&self, requests: Vec<R>, run: F) -> BatchOutcome<T>
    where
        R: Send + 'static,
        T: Send + 'static,
        F: Fn(R) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        if requests.is_empty() {
            return BatchOutcome::default();
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let run = Arc::new(run);
        let mut tasks = JoinSet::new();
        let mut outcome = BatchOutcome::default();

        for (index, request) in requests.into_iter().enumerate() {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(err) => {
                    outcome.record(
                        index,
                        Err(Error::Client(format!("Request {index} not scheduled: {err}"))),
                    );
                    continue;
                }
            };
            let run = Arc::clone(&run);

            tasks.spawn(
                async move {
                    let _permit = permit;

                    // The request is built inside its own task so a panic,
                    // even before the first poll, stays in its slot.
                    let request = async move { run(request).await };
                    let result = match tokio::spawn(request.in_current_span()).await {
                        Ok(result) => result,
                        Err(err) => {
                            tracing::error!("Request {index} of the batch aborted: {err}");
                            Err(Error::Client(format!("Request {index} aborted: {err}")))
                        }
                    };

                    (index, result)
                }
                .in_current_span(),
            );
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => outcome.record(index, result),
                Err(err) => tracing::error!("Batch task stopped unexpectedly: {err}"),
            }
        }

        outcome.successes.sort_by_key(|(index, _)| *index);
        outcome.failures.sort_by_key(|(index, _)| *index);

        outcome
    }
}
