pub mod error;
pub mod instance;
pub mod job;
pub mod operation;
pub mod resource;
pub mod scope;

pub use error::ErrorBody;
pub use error::ErrorProto;
pub use error::ErrorResponse;
pub use instance::Instance;
pub use job::Job;
pub use job::JobList;
pub use job::JobReference;
pub use job::JobState;
pub use job::JobStatus;
pub use operation::Operation;
pub use operation::OperationError;
pub use operation::OperationErrorDetail;
pub use operation::OperationList;
pub use operation::OperationStatus;
pub use resource::Resource;
pub use scope::Scope;
