use std::borrow::Cow;
use std::io::Write;

use tiff::encoder::colortype::{Gray16, RGB16};
use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::{Compression, TiffEncoder};
use tiff::tags::Predictor;
use tracing::debug;

use crate::opcode_pipeline::common::error::{PipelineError, Result};
use crate::opcode_pipeline::raster::Raster;
use crate::opcode_pipeline::tiff::types::{TiffCompression, TiffOptions};
use crate::opcode_pipeline::tiff::writer::RasterWriter;

/// Writes Gray16 or RGB16 TIFF images.
///
/// Samples of shallower rasters are stretched to the full 16-bit range.
pub struct StandardTiffWriter;

fn full_range(raster: &Raster) -> Cow<'_, [u16]> {
    let max = u32::from(raster.max_value());
    if max == u32::from(u16::MAX) {
        return Cow::Borrowed(raster.data());
    }
    Cow::Owned(
        raster
            .data()
            .iter()
            .map(|&v| (u32::from(v).min(max) * u32::from(u16::MAX) / max) as u16)
            .collect(),
    )
}

impl RasterWriter for StandardTiffWriter {
    fn write_raster(&self, raster: &Raster, output: &mut dyn Write, options: &TiffOptions) -> Result<()> {
        debug!("Encoding TIFF image: {}x{}", raster.width(), raster.height());

        let compression = match options.compression {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Lzw => Compression::Lzw,
            TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
            TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
        };

        let mut buffer = Vec::new();
        let mut encoder = TiffEncoder::new(std::io::Cursor::new(&mut buffer))
            .map_err(|e| PipelineError::EncodeError(e.to_string()))?
            .with_compression(compression);

        if let Some(predictor_val) = options.predictor {
            let predictor = match predictor_val {
                2 => Predictor::Horizontal,
                _ => Predictor::None,
            };
            encoder = encoder.with_predictor(predictor);
        }

        let (width, height) = (raster.width() as u32, raster.height() as u32);
        let samples = full_range(raster);
        match raster.channels() {
            1 => encoder.write_image::<Gray16>(width, height, &samples),
            3 => encoder.write_image::<RGB16>(width, height, &samples),
            n => {
                return Err(PipelineError::UnsupportedFormat(format!(
                    "{n}-channel raster"
                )));
            }
        }
        .map_err(|e| PipelineError::EncodeError(e.to_string()))?;

        output.write_all(&buffer)?;

        debug!("TIFF encoding complete");
        Ok(())
    }
}
