pub mod config;
pub mod dataset;
pub mod error;
pub mod fetch;
pub mod load;
pub mod pipeline;
pub mod reference;
pub mod report;
pub mod table;
pub mod transform;

pub use config::PipelineConfig;
pub use error::{EtlError, Result};
