//! DNG opcode list processing
//!
//! Decodes and encodes opcode list blobs, executes them against in-memory
//! rasters, and provides the surrounding pieces a front end needs: gain map
//! post-processing, TIFF persistence and a file pipeline.

pub mod codec;
pub mod common;
pub mod conversions;
pub mod engine;
pub mod gain_tools;
pub mod opcodes;
pub mod raster;
pub mod tiff;

pub use common::{HookError, OpcodeValidationError, ParseError, PipelineError, RasterError, Result};

pub use opcodes::{
    FixVignetteRadial, GainMap, Opcode, OpcodeFlags, OpcodeHeader, OpcodeId, OpcodePayload,
    OpcodeStage, TrimBounds, UnknownOpcode, WarpPlane, WarpRectilinear,
};

pub use codec::{decode, decode_stage, encode, encode_stage};

pub use engine::{
    ApplyConfig, ApplyConfigBuilder, Execution, ExecutionReport, GammaCurve, OpcodeExecutor,
    SkipReason, apply,
};

pub use gain_tools::{CfaFix, flat_field_gain_maps, min_gain, strip_luminance, swap_cfa_channels};

pub use raster::Raster;

pub use self::tiff::{
    RasterReader, RasterWriter, StandardTiffWriter, TiffCompression, TiffOptions,
    TiffRasterReader,
};

pub use conversions::{OpcodePipeline, PipelineConfig, PipelineConfigBuilder};
