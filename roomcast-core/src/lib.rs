pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod protocol;
pub mod service;

pub use config::Config;
pub use error::{Error, Result};

// Global server start time for uptime calculation
use once_cell::sync::Lazy;
use std::time::Instant;

pub static SERVER_START_TIME: Lazy<Instant> = Lazy::new(Instant::now);
