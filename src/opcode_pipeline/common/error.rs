use thiserror::Error;

use crate::opcode_pipeline::opcodes::types::OpcodeId;

/// Failures while decoding an opcode list blob.
///
/// Any of these aborts the whole decode call; no partially decoded list is
/// ever returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("truncated opcode list at byte {offset}: needed {needed} bytes, {remaining} remain")]
    Truncated {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("opcode #{index} ({id}): payload is {actual} bytes, expected {expected}")]
    InvalidLength {
        index: usize,
        id: OpcodeId,
        expected: usize,
        actual: usize,
    },

    #[error("opcode #{index} has unsupported id {id} and is not flagged optional")]
    UnsupportedRequiredOpcode { index: usize, id: u32 },

    #[error("opcode #{index} ({id}): {source}")]
    InvalidParameter {
        index: usize,
        id: OpcodeId,
        #[source]
        source: OpcodeValidationError,
    },
}

pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Degenerate opcode parameters, rejected at decode or construction time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OpcodeValidationError {
    #[error("plane count must be at least 1")]
    ZeroPlanes,

    #[error("rectangle top={top} left={left} bottom={bottom} right={right} has no area")]
    EmptyRectangle {
        top: u32,
        left: u32,
        bottom: u32,
        right: u32,
    },

    #[error("row and column pitch must be non-zero")]
    ZeroPitch,

    #[error("gain map grid must have at least one point per axis and one map plane")]
    EmptyGrid,

    #[error("gain grid holds {actual} values, expected {expected}")]
    GridLength { expected: usize, actual: usize },

    #[error("optical center ({cx}, {cy}) lies outside the unit square")]
    CenterOutOfRange { cx: f64, cy: f64 },

    #[error("{field} is not a finite number")]
    NonFinite { field: &'static str },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    #[error("sample buffer holds {actual} values, expected {expected}")]
    DataLength { expected: usize, actual: usize },

    #[error("raster must have at least one channel")]
    ZeroChannels,

    #[error("invalid raster dimensions: width={0}, height={1}")]
    ZeroDimensions(usize, usize),

    #[error("unsupported sample depth: {0} bits")]
    UnsupportedDepth(u32),
}

/// Preconditions of the gain-map post-processing hooks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    #[error("expected 4 gain maps in the linear stage, found {0}")]
    GainMapCount(usize),

    #[error("gain maps have mismatched grid lengths: {0:?}")]
    MismatchedGrids(Vec<usize>),

    #[error("flat field must be a single-channel raster with even dimensions, got {width}x{height}x{channels}")]
    UnsupportedFlatField {
        width: usize,
        height: usize,
        channels: usize,
    },
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode TIFF image: {0}")]
    DecodeError(String),

    #[error("Failed to encode TIFF image: {0}")]
    EncodeError(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),

    #[error("Opcode list error: {0}")]
    Opcode(#[from] ParseError),

    #[error("Raster error: {0}")]
    Raster(#[from] RasterError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
