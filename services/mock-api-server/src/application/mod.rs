pub mod context;

pub const APPLICATION_NAME: &str = "mock-api-server";
