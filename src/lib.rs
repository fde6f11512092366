//! Library crate for trustscan: a TCP reachability and banner scanner.
pub mod aggression;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod ports;
pub mod probe;
pub mod results;
pub mod scanner;
pub mod scheduler;
pub mod service;
pub mod targets;
pub mod types;

pub use error::{Error, Result};
