//! Common utilities module
//!
//! This module contains the error taxonomy shared across the opcode pipeline.

pub mod error;

pub use error::{
    HookError, OpcodeValidationError, ParseError, ParseResult, PipelineError, RasterError, Result,
};
