pub mod api_client;
pub mod compute_client;
pub mod job_client;

pub use api_client::ApiClient;
pub use compute_client::ComputeClient;
pub use job_client::JobClient;
