//! Pipeline conversions module
//!
//! Orchestration that ties the pieces together: read a raster, decode the
//! opcode lists, run them, and write the corrected raster.

mod apply_to_tiff;
pub mod types;

#[cfg(test)]
mod tests;

pub use apply_to_tiff::OpcodePipeline;
pub use types::{PipelineConfig, PipelineConfigBuilder};
