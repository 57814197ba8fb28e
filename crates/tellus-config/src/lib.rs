//! Configuration for the subdivision system.
//!
//! Runtime-tunable settings that persist to disk as RON files, with
//! hot-reload detection and forward/backward compatible serialization.

mod config;
mod error;

pub use config::{Config, CullingConfig, DebugConfig, PipelineConfig, SubdivisionConfig};
pub use error::ConfigError;
