use common::model::ErrorProto;
use common::model::JobReference;
use common::model::Operation;
use common::model::OperationErrorDetail;
use core::fmt;
use std::time::Duration;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Category of a structured service error, selected from the error `reason`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Duplicate,
    AccessDenied,
    InvalidQuery,
    TermsOfServiceNotAccepted,
    BackendError,
    Other,
}

impl ErrorKind {
    pub fn from_reason(reason: &str) -> Self {
        match reason {
            "notFound" => Self::NotFound,
            "duplicate" | "alreadyExists" => Self::Duplicate,
            "accessDenied" | "forbidden" => Self::AccessDenied,
            "invalidQuery" => Self::InvalidQuery,
            "termsOfServiceNotAccepted" => Self::TermsOfServiceNotAccepted,
            "backendError" => Self::BackendError,
            _ => Self::Other,
        }
    }

    /// Reason assumed when the server answers with a bare HTTP status.
    pub const fn reason_for_status(status: u16) -> Option<&'static str> {
        match status {
            403 => Some("accessDenied"),
            404 => Some("notFound"),
            409 => Some("duplicate"),
            500..=599 => Some("backendError"),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Duplicate => write!(f, "duplicate"),
            Self::AccessDenied => write!(f, "access denied"),
            Self::InvalidQuery => write!(f, "invalid query"),
            Self::TermsOfServiceNotAccepted => write!(f, "terms of service not accepted"),
            Self::BackendError => write!(f, "backend error"),
            Self::Other => write!(f, "service error"),
        }
    }
}

/// The server received the request and answered with a structured error.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ServiceError {
    kind: ErrorKind,
    status: Option<u16>,
    message: String,
    error: ErrorProto,
    errors: Vec<ErrorProto>,
    job_reference: Option<JobReference>,
}

impl ServiceError {
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn error(&self) -> &ErrorProto {
        &self.error
    }

    pub fn errors(&self) -> &[ErrorProto] {
        &self.errors
    }

    pub const fn job_reference(&self) -> Option<&JobReference> {
        self.job_reference.as_ref()
    }

    pub fn is_transient(&self) -> bool {
        self.kind == ErrorKind::BackendError || self.status.is_some_and(|status| status >= 500)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Error communicating with the server: {0}")]
    Communication(String),

    #[error("Unexpected response from the server: {0}")]
    Interface(String),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Wait timed out. Operation {id} not finished, in state {status}")]
    WaitTimedOut {
        id: String,
        status: String,
        elapsed: Duration,
    },

    #[error("Operation {name} failed: {message}")]
    OperationFailed {
        name: String,
        message: String,
        errors: Vec<OperationErrorDetail>,
    },

    #[error("{0}")]
    Client(String),

    #[error("Failed to write output: {0}")]
    Output(String),
}

impl Error {
    /// Builds the typed error for a server-reported `error`.
    ///
    /// Entries of `errors` other than `error` are appended to the message as
    /// failure details. An error without reason or message is reported as an
    /// interface error quoting `server_error`.
    pub fn from_error_proto(
        error: &ErrorProto,
        errors: &[ErrorProto],
        status: Option<u16>,
        job_reference: Option<&JobReference>,
        server_error: &str,
    ) -> Self {
        let (Some(reason), Some(message)) = (error.reason(), error.message()) else {
            return Self::Interface(format!(
                "Error reported by server with missing error fields. Server returned: {server_error}"
            ));
        };

        let mut message = match job_reference {
            Some(job_reference) => format!("Error processing job '{job_reference}': {message}"),
            None => message.to_string(),
        };

        let details = errors
            .iter()
            .filter(|other| *other != error)
            .map(|other| {
                let detail = [other.location(), other.message()]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(": ");
                format!(" - {detail}")
            })
            .collect::<Vec<_>>();
        if !details.is_empty() {
            message.push_str("\nFailure details:\n");
            message.push_str(&details.join("\n"));
        }

        Self::Service(ServiceError {
            kind: ErrorKind::from_reason(reason),
            status,
            message,
            error: error.clone(),
            errors: errors.to_vec(),
            job_reference: job_reference.cloned(),
        })
    }

    /// Error for an operation that reached DONE carrying errors.
    pub fn operation_failed(operation: &Operation) -> Self {
        let errors = operation
            .error()
            .map(|error| error.errors().to_vec())
            .unwrap_or_default();
        let message = errors
            .iter()
            .map(|error| {
                format!(
                    "{} ({})",
                    error.message().unwrap_or("no message"),
                    error.code()
                )
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::OperationFailed {
            name: operation.name().to_string(),
            message,
            errors,
        }
    }

    /// Communication failures and backend errors may disappear on the next attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Communication(_) => true,
            Self::Service(service_error) => service_error.is_transient(),
            Self::Interface(_)
            | Self::WaitTimedOut { .. }
            | Self::OperationFailed { .. }
            | Self::Client(_)
            | Self::Output(_) => false,
        }
    }

    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Service(service_error) => Some(service_error.kind),
            _ => None,
        }
    }

    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::WaitTimedOut { .. })
    }
}
