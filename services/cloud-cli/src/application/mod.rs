pub mod cli;
pub mod context;

pub const APPLICATION_NAME: &str = "cloud-cli";
