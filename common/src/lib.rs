// Common library shared between the scheduler core and the HTTP server

pub mod config;
pub mod errors;
pub mod models;
pub mod runlog;
pub mod runner;
pub mod schedule;
pub mod scheduler;
pub mod store;
