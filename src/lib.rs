pub mod config;
pub mod constants;
pub mod error;
pub mod extract;
pub mod load;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod transform;

// Re-export commonly used types
pub use config::{EtlConfig, ValidationMode};
pub use error::{EtlError, Result};
pub use pipeline::{Pipeline, PipelineReport};
