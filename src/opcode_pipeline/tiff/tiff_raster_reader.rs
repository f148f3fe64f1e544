use std::io::Cursor;

use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};
use tracing::debug;

use crate::opcode_pipeline::common::error::{PipelineError, Result};
use crate::opcode_pipeline::raster::Raster;
use crate::opcode_pipeline::tiff::reader::RasterReader;

/// Reads grayscale or RGB TIFF images with 8, 16 or 32-bit integer samples.
///
/// 32-bit samples keep their declared depth but are scaled into the 16-bit
/// working range.
pub struct TiffRasterReader;

impl RasterReader for TiffRasterReader {
    fn read_raster(&self, data: &[u8]) -> Result<Raster> {
        debug!("Decoding TIFF image, {} bytes", data.len());

        let mut decoder = Decoder::new(Cursor::new(data))
            .map_err(|e| PipelineError::DecodeError(e.to_string()))?;
        let (width, height) = decoder
            .dimensions()
            .map_err(|e| PipelineError::DecodeError(e.to_string()))?;
        let color = decoder
            .colortype()
            .map_err(|e| PipelineError::DecodeError(e.to_string()))?;

        let (channels, bits) = match color {
            ColorType::Gray(bits) => (1, bits),
            ColorType::RGB(bits) => (3, bits),
            other => {
                return Err(PipelineError::UnsupportedFormat(format!("{other:?}")));
            }
        };

        let samples: Vec<u16> = match decoder
            .read_image()
            .map_err(|e| PipelineError::DecodeError(e.to_string()))?
        {
            DecodingResult::U8(values) => values.into_iter().map(u16::from).collect(),
            DecodingResult::U16(values) => values,
            DecodingResult::U32(values) => values.into_iter().map(|v| (v >> 16) as u16).collect(),
            _ => {
                return Err(PipelineError::UnsupportedFormat(format!(
                    "{color:?} sample format"
                )));
            }
        };

        debug!(width, height, channels, bits, "Decoded TIFF image");
        Ok(Raster::new(
            width as usize,
            height as usize,
            channels,
            u32::from(bits),
            samples,
        )?)
    }
}
