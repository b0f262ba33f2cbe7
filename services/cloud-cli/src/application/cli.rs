use crate::output::OutputFormat;
use crate::wait::WaitPrinterKind;
use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;

pub const API_HOST_ENV_VAR: &str = "CLOUD_API_URI";
pub const PROJECT_ENV_VAR: &str = "CLOUDSDK_CORE_PROJECT";
pub const ACCESS_TOKEN_ENV_VAR: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

pub const DEFAULT_API_HOST: &str = "https://www.googleapis.com";
pub const DEFAULT_MAX_WAIT_TIME: i64 = 240;
pub const DEFAULT_LOG_LEVEL: &str = "warn";
const DEFAULT_MACHINE_TYPE: &str = "n1-standard-1";

#[derive(Debug, Parser)]
#[command(
    name = "cloudctl",
    version,
    about = "Manage Compute Engine operations and BigQuery jobs"
)]
pub struct Cli {
    #[command(flatten)]
    pub flags: GlobalFlags,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct GlobalFlags {
    /// Project the commands act on.
    #[arg(long, global = true, env = PROJECT_ENV_VAR)]
    pub project: Option<String>,

    #[arg(long, global = true)]
    pub zone: Option<String>,

    #[arg(long, global = true)]
    pub region: Option<String>,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Seconds to wait for an operation or job. A negative value waits forever.
    #[arg(
        long = "max_wait_time",
        alias = "max-wait-time",
        global = true,
        allow_negative_numbers = true,
        default_value_t = DEFAULT_MAX_WAIT_TIME
    )]
    pub max_wait_time: i64,

    /// Fixed number of seconds between polls instead of the default pacing.
    #[arg(long = "sleep_between_polls", alias = "sleep-between-polls", global = true)]
    pub sleep_between_polls: Option<u64>,

    /// Wait for operations to finish before returning.
    #[arg(
        long = "synchronous_mode",
        alias = "synchronous-mode",
        global = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = true,
        default_missing_value = "true"
    )]
    pub synchronous_mode: bool,

    /// Maximum number of requests in flight at once.
    #[arg(
        long = "concurrent_operations",
        alias = "concurrent-operations",
        global = true,
        default_value_t = crate::batch::BatchExecutor::DEFAULT_CONCURRENCY
    )]
    pub concurrent_operations: usize,

    #[arg(
        long = "api_host",
        alias = "api-host",
        global = true,
        env = API_HOST_ENV_VAR,
        default_value = DEFAULT_API_HOST
    )]
    pub api_host: String,

    #[arg(
        long = "access_token",
        alias = "access-token",
        global = true,
        env = ACCESS_TOKEN_ENV_VAR,
        hide_env_values = true
    )]
    pub access_token: Option<String>,

    /// Progress output while waiting on a single job.
    #[arg(
        long = "wait_printer",
        alias = "wait-printer",
        global = true,
        value_enum,
        default_value_t = WaitPrinterKind::Verbose
    )]
    pub wait_printer: WaitPrinterKind,

    /// Log filter directive, overridden by `RUST_LOG`.
    #[arg(
        long = "log_level",
        alias = "log-level",
        global = true,
        default_value = DEFAULT_LOG_LEVEL
    )]
    pub log_level: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute Engine operations.
    #[command(subcommand)]
    Compute(ComputeCommand),

    /// BigQuery jobs.
    #[command(subcommand)]
    Bq(JobCommand),
}

#[derive(Debug, Subcommand)]
pub enum ComputeCommand {
    /// Get an operation.
    #[command(name = "getoperation")]
    GetOperation { name: String },

    /// List operations of the global, zone or region scope.
    #[command(name = "listoperations")]
    ListOperations,

    /// Delete one or more operations.
    #[command(name = "deleteoperation")]
    DeleteOperation {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Create one or more instances.
    #[command(name = "addinstance")]
    AddInstance {
        #[arg(required = true)]
        names: Vec<String>,

        #[arg(long = "machine_type", alias = "machine-type", default_value = DEFAULT_MACHINE_TYPE)]
        machine_type: String,
    },

    /// Delete one or more instances.
    #[command(name = "deleteinstance")]
    DeleteInstance {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Delete one or more disks.
    #[command(name = "deletedisk")]
    DeleteDisk {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Delete one or more firewalls.
    #[command(name = "deletefirewall")]
    DeleteFirewall {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Delete one or more addresses.
    #[command(name = "deleteaddress")]
    DeleteAddress {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum JobCommand {
    /// Wait some number of seconds for a job to finish.
    ///
    /// Without a job id, waits on the only job still running.
    Wait {
        job_id: Option<String>,

        /// Seconds to wait, forever when omitted. Zero polls once.
        #[arg(allow_negative_numbers = true)]
        secs: Option<i64>,

        /// Exit with an error when the job failed or did not finish.
        #[arg(
            long = "fail_on_error",
            alias = "fail-on-error",
            action = ArgAction::Set,
            num_args = 0..=1,
            default_value_t = true,
            default_missing_value = "true"
        )]
        fail_on_error: bool,
    },

    /// Show a job.
    Show { job_id: String },

    /// List the jobs of the project.
    Ls,

    /// Run a query.
    Query {
        sql: String,

        #[arg(long = "job_id", alias = "job-id")]
        job_id: Option<String>,

        /// Submit the job and return without waiting.
        #[arg(long)]
        nosync: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("cloudctl").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_the_documented_values() {
        let cli = parse(&["--project", "p", "compute", "listoperations"]);

        assert_eq!(cli.flags.max_wait_time, DEFAULT_MAX_WAIT_TIME);
        assert!(cli.flags.synchronous_mode);
        assert_eq!(cli.flags.concurrent_operations, 10);
        assert_eq!(cli.flags.format, OutputFormat::Table);
        assert_eq!(cli.flags.sleep_between_polls, None);
        assert!(matches!(
            cli.command,
            Command::Compute(ComputeCommand::ListOperations)
        ));
    }

    #[test]
    fn global_flags_are_accepted_after_subcommands() {
        let cli = parse(&[
            "compute",
            "deletedisk",
            "disk-1",
            "disk-2",
            "--zone",
            "z",
            "--synchronous_mode=false",
            "--max_wait_time",
            "-1",
            "--format",
            "json",
        ]);

        assert_eq!(cli.flags.zone.as_deref(), Some("z"));
        assert!(!cli.flags.synchronous_mode);
        assert_eq!(cli.flags.max_wait_time, -1);
        assert_eq!(cli.flags.format, OutputFormat::Json);
        match cli.command {
            Command::Compute(ComputeCommand::DeleteDisk { names }) => {
                assert_eq!(names, vec!["disk-1", "disk-2"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn bq_wait_takes_optional_positionals() {
        let cli = parse(&["bq", "wait", "job_1", "30", "--fail_on_error=false"]);

        match cli.command {
            Command::Bq(JobCommand::Wait {
                job_id,
                secs,
                fail_on_error,
            }) => {
                assert_eq!(job_id.as_deref(), Some("job_1"));
                assert_eq!(secs, Some(30));
                assert!(!fail_on_error);
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = parse(&["bq", "wait"]);
        assert!(matches!(
            cli.command,
            Command::Bq(JobCommand::Wait {
                job_id: None,
                secs: None,
                fail_on_error: true
            })
        ));
    }

    #[test]
    fn deletes_require_at_least_one_name() {
        assert!(Cli::try_parse_from(["cloudctl", "compute", "deleteinstance"]).is_err());
    }
}
