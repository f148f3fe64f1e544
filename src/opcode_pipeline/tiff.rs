//! Raster persistence module
//!
//! Reads source rasters from TIFF files and writes corrected rasters back,
//! behind small traits so the orchestration layer can be exercised without
//! touching real files.

mod reader;
mod standard_tiff_writer;
mod tiff_raster_reader;
pub mod types;
mod writer;


pub use reader::RasterReader;
pub use standard_tiff_writer::StandardTiffWriter;
pub use tiff_raster_reader::TiffRasterReader;
pub use types::{TiffCompression, TiffOptions, TiffOptionsBuilder};
pub use writer::RasterWriter;
