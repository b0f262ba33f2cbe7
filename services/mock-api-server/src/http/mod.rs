pub mod fallback_controller;
pub mod health_check_controller;
pub mod http_server;
pub mod job_controller;
pub mod model;
pub mod operation_controller;
pub mod resource_controller;
pub mod utils;
