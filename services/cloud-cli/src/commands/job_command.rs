use crate::application::cli::JobCommand;
use crate::application::context::ApplicationContext;
use crate::commands::CommandResult;
use crate::error::Error;
use crate::error::Result;
use crate::wait::JobPoller;
use common::model::Job;
use common::model::JobReference;
use common::model::JobState;
use std::time::Duration;

pub async fn execute(context: &ApplicationContext, command: JobCommand) -> Result<CommandResult> {
    match command {
        JobCommand::Wait {
            job_id,
            secs,
            fail_on_error,
        } => wait(context, job_id.as_deref(), secs, fail_on_error).await,
        JobCommand::Show { job_id } => show(context, &job_id).await,
        JobCommand::Ls => list(context).await,
        JobCommand::Query {
            sql,
            job_id,
            nosync,
        } => query(context, &sql, job_id.as_deref(), nosync).await,
    }
}

/// Error described by the `errorResult` of a finished job.
pub fn job_error(job: &Job) -> Option<Error> {
    let error_result = job.status().error_result()?;
    let server_error = serde_json::to_string(job.status()).unwrap_or_default();

    Some(Error::from_error_proto(
        error_result,
        job.status().errors(),
        None,
        Some(job.job_reference()),
        &server_error,
    ))
}

/// Waits on `job_id`, or on the only unfinished job of the project.
#[tracing::instrument(skip(context))]
async fn wait(
    context: &ApplicationContext,
    job_id: Option<&str>,
    secs: Option<i64>,
    fail_on_error: bool,
) -> Result<CommandResult> {
    let timeout = match secs {
        Some(secs) => Some(
            u64::try_from(secs)
                .map(Duration::from_secs)
                .map_err(|_| Error::Client(format!("Invalid wait time: {secs}")))?,
        ),
        None => None,
    };

    let reference = match job_id {
        Some(job_id) => context.job_client().job_reference(job_id)?,
        None => running_job(context).await?,
    };

    let poller = JobPoller::new(context.job_client().clone(), reference);
    let mut printer = context.settings().wait_printer().create();

    match context
        .job_waiter()
        .with_timeout(timeout)
        .wait(&poller, printer.as_mut())
        .await
    {
        Ok(job) => {
            let error = job_error(&job).filter(|_| fail_on_error);
            let result = CommandResult::from_resource(job);

            Ok(match error {
                Some(error) => result.with_error(error),
                None => result,
            })
        }
        Err(err) if err.is_timeout() && !fail_on_error => {
            Ok(CommandResult::default().with_notice(err.to_string()))
        }
        Err(err) => Err(err),
    }
}

async fn running_job(context: &ApplicationContext) -> Result<JobReference> {
    let jobs = context
        .job_client()
        .list_jobs(&[JobState::Pending, JobState::Running])
        .await?
        .into_jobs();

    match jobs.as_slice() {
        [job] => Ok(job.job_reference().clone()),
        _ => Err(Error::Client(format!(
            "No job_id provided, found {} running jobs",
            jobs.len()
        ))),
    }
}

#[tracing::instrument(skip(context))]
async fn show(context: &ApplicationContext, job_id: &str) -> Result<CommandResult> {
    let client = context.job_client();
    let job = client.get_job(&client.job_reference(job_id)?).await?;

    Ok(CommandResult::from_resource(job))
}

#[tracing::instrument(skip(context))]
async fn list(context: &ApplicationContext) -> Result<CommandResult> {
    let jobs = context.job_client().list_jobs(&[]).await?;

    Ok(CommandResult::from_resource(jobs))
}

/// Submits a query job and, unless asynchronous, waits for it to finish.
#[tracing::instrument(skip(context))]
async fn query(
    context: &ApplicationContext,
    sql: &str,
    job_id: Option<&str>,
    nosync: bool,
) -> Result<CommandResult> {
    let configuration = serde_json::json!({ "query": { "query": sql } });
    let job = context.job_client().insert_job(job_id, configuration).await?;

    if nosync || !context.settings().synchronous_mode() {
        return Ok(CommandResult::from_resource(job));
    }

    let poller = JobPoller::new(context.job_client().clone(), job.job_reference().clone());
    let job = context
        .job_waiter()
        .with_timeout(None)
        .wait(&poller, context.settings().wait_printer().create().as_mut())
        .await?;

    match job_error(&job) {
        Some(error) => Err(error),
        None => Ok(CommandResult::from_resource(job)),
    }
}
