use std::io::Write;

use crate::opcode_pipeline::common::error::Result;
use crate::opcode_pipeline::raster::Raster;
use crate::opcode_pipeline::tiff::types::TiffOptions;

pub trait RasterWriter {
    fn write_raster(&self, raster: &Raster, output: &mut dyn Write, options: &TiffOptions) -> Result<()>;
}
