//! Opcode execution engine
//!
//! Interprets an ordered opcode sequence against a raster. Samples are
//! optionally linearised with a gamma curve, run through each enabled opcode
//! in order, and re-encoded at the end. Each opcode consumes the buffer
//! produced by the previous one.

mod buffer;
mod executor;
mod gain_map;
mod gamma;
mod report;
mod trim;
pub mod types;
mod vignette;
mod warp;


pub use executor::{Execution, OpcodeExecutor, apply};
pub use gamma::{GammaCurve, GammaDirection};
pub use report::{ExecutionReport, SkipReason, SkippedOpcode, StepTiming};
pub use types::{ApplyConfig, ApplyConfigBuilder, DEFAULT_GAMMA_EXPONENT};
