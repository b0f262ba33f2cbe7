pub mod compute_command;
pub mod job_command;

use crate::application::cli::Command;
use crate::application::context::ApplicationContext;
use crate::batch::BatchOutcome;
use crate::error::Error;
use crate::error::Result;
use crate::output::OutputRenderer;
use common::model::Resource;
use std::io::Write;

/// Everything a command produced: resources to print and errors to report.
#[derive(Debug, Default)]
pub struct CommandResult {
    resources: Vec<Resource>,
    errors: Vec<Error>,
    notices: Vec<String>,
}

impl CommandResult {
    pub fn from_resources(resources: Vec<Resource>) -> Self {
        Self {
            resources,
            ..Self::default()
        }
    }

    pub fn from_resource(resource: impl Into<Resource>) -> Self {
        Self::from_resources(vec![resource.into()])
    }

    /// Flattens a batch, keeping submission order on both sides.
    pub fn from_outcome(outcome: BatchOutcome<Vec<Resource>>) -> Self {
        let (successes, failures) = outcome.into_parts();

        Self {
            resources: successes
                .into_iter()
                .flat_map(|(_, resources)| resources)
                .collect(),
            errors: failures.into_iter().map(|(_, error)| error).collect(),
            notices: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_error(mut self, error: Error) -> Self {
        self.errors.push(error);
        self
    }

    /// Message printed to stderr without failing the command.
    #[must_use]
    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notices.push(notice.into());
        self
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn exit_code(&self) -> u8 {
        u8::from(!self.is_success())
    }

    /// Prints resources to `out`, notices and errors to `err`, and returns the exit code.
    pub fn report<O: Write, E: Write>(
        &self,
        renderer: OutputRenderer,
        out: &mut O,
        err: &mut E,
    ) -> Result<u8> {
        if !self.resources.is_empty() {
            renderer.render(&self.resources, out)?;
        }

        for notice in &self.notices {
            writeln!(err, "{notice}").map_err(|error| Error::Output(error.to_string()))?;
        }
        for error in &self.errors {
            writeln!(err, "ERROR: {error}").map_err(|error| Error::Output(error.to_string()))?;
        }

        Ok(self.exit_code())
    }
}

/// Runs one parsed command.
pub async fn run(context: &ApplicationContext, command: Command) -> Result<CommandResult> {
    match command {
        Command::Compute(command) => compute_command::execute(context, command).await,
        Command::Bq(command) => job_command::execute(context, command).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;

    #[test]
    fn errors_fail_the_command() {
        let result = CommandResult::default();
        assert_eq!(result.exit_code(), 0);

        let result = result.with_error(Error::Client("bad flag".to_string()));
        assert_eq!(result.exit_code(), 1);
    }

    #[test]
    fn report_splits_output_and_errors() {
        let result = CommandResult::default()
            .with_notice("still running")
            .with_error(Error::Client("bad flag".to_string()));
        let (mut out, mut err) = (Vec::new(), Vec::new());

        let code = result
            .report(OutputRenderer::new(OutputFormat::Names), &mut out, &mut err)
            .unwrap();

        assert_eq!(code, 1);
        assert!(out.is_empty());
        assert_eq!(
            String::from_utf8(err).unwrap(),
            "still running\nERROR: bad flag\n"
        );
    }
}
