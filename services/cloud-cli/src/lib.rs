pub mod api;
pub mod application;
pub mod batch;
pub mod commands;
pub mod domain;
pub mod error;
pub mod output;
pub mod wait;
