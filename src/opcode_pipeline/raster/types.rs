//! Raster data types

use crate::opcode_pipeline::common::error::RasterError;

/// Largest sample depth a raster may declare.
pub const MAX_BITS_PER_SAMPLE: u32 = 32;

/// Depth of the working representation; deeper sources are scaled into it.
pub const WORKING_BITS: u32 = 16;

/// Owned image buffer with interleaved channels.
///
/// Samples are stored as `u16`. Sources deeper than 16 bits are expected to
/// be scaled into the 16-bit working range before construction; the declared
/// `bits_per_sample` is kept so callers can tell where the data came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    channels: usize,
    bits_per_sample: u32,
    data: Vec<u16>,
}

impl Raster {
    /// Builds a raster from interleaved samples `[c0, c1, .., c0, c1, ..]`.
    pub fn new(
        width: usize,
        height: usize,
        channels: usize,
        bits_per_sample: u32,
        data: Vec<u16>,
    ) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::ZeroDimensions(width, height));
        }
        if channels == 0 {
            return Err(RasterError::ZeroChannels);
        }
        if bits_per_sample == 0 || bits_per_sample > MAX_BITS_PER_SAMPLE {
            return Err(RasterError::UnsupportedDepth(bits_per_sample));
        }
        let expected = width * height * channels;
        if data.len() != expected {
            return Err(RasterError::DataLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            bits_per_sample,
            data,
        })
    }

    /// Assembles a raster whose shape the caller already guarantees.
    pub(crate) fn from_parts(
        width: usize,
        height: usize,
        channels: usize,
        bits_per_sample: u32,
        data: Vec<u16>,
    ) -> Self {
        debug_assert_eq!(data.len(), width * height * channels);
        Self {
            width,
            height,
            channels,
            bits_per_sample,
            data,
        }
    }

    /// A raster with every sample set to `value`.
    pub fn filled(
        width: usize,
        height: usize,
        channels: usize,
        bits_per_sample: u32,
        value: u16,
    ) -> Result<Self, RasterError> {
        Self::new(
            width,
            height,
            channels,
            bits_per_sample,
            vec![value; width * height * channels],
        )
    }

    /// Builds a raster from one buffer per channel.
    pub fn from_planar(
        width: usize,
        height: usize,
        bits_per_sample: u32,
        planes: &[Vec<u16>],
    ) -> Result<Self, RasterError> {
        let pixels = width * height;
        for plane in planes {
            if plane.len() != pixels {
                return Err(RasterError::DataLength {
                    expected: pixels,
                    actual: plane.len(),
                });
            }
        }
        let channels = planes.len();
        let mut data = Vec::with_capacity(pixels * channels);
        for i in 0..pixels {
            data.extend(planes.iter().map(|plane| plane[i]));
        }
        Self::new(width, height, channels, bits_per_sample, data)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn bits_per_sample(&self) -> u32 {
        self.bits_per_sample
    }

    /// Largest representable sample in the working range.
    pub fn max_value(&self) -> u16 {
        let bits = self.bits_per_sample.min(WORKING_BITS);
        ((1u32 << bits) - 1) as u16
    }

    pub fn data(&self) -> &[u16] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u16] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u16> {
        self.data
    }

    /// Number of samples in one row.
    pub fn row_len(&self) -> usize {
        self.width * self.channels
    }

    pub fn row(&self, y: usize) -> &[u16] {
        let len = self.row_len();
        &self.data[y * len..(y + 1) * len]
    }

    pub fn get(&self, x: usize, y: usize, channel: usize) -> Option<u16> {
        if x >= self.width || y >= self.height || channel >= self.channels {
            return None;
        }
        Some(self.data[(y * self.width + x) * self.channels + channel])
    }

    /// Writes one sample; returns `false` when the position is out of range.
    pub fn set(&mut self, x: usize, y: usize, channel: usize, value: u16) -> bool {
        if x >= self.width || y >= self.height || channel >= self.channels {
            return false;
        }
        self.data[(y * self.width + x) * self.channels + channel] = value;
        true
    }

    /// Reads, transforms and writes back every sample of one pixel.
    pub fn change_pixel(&mut self, x: usize, y: usize, f: impl Fn(u16) -> u16) {
        if x >= self.width || y >= self.height {
            return;
        }
        let start = (y * self.width + x) * self.channels;
        for sample in &mut self.data[start..start + self.channels] {
            *sample = f(*sample);
        }
    }

    /// Splits the interleaved buffer into one buffer per channel.
    pub fn to_planar(&self) -> Vec<Vec<u16>> {
        (0..self.channels)
            .map(|c| {
                self.data
                    .iter()
                    .skip(c)
                    .step_by(self.channels)
                    .copied()
                    .collect()
            })
            .collect()
    }
}
