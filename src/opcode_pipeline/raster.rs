//! In-memory raster module
//!
//! This module provides the owned 16-bit sample buffer that opcode lists are
//! applied to.

pub mod types;

pub use types::Raster;
