use crate::opcode_pipeline::raster::Raster;

/// Floating-point copy of a raster used for the duration of one pass.
///
/// Every stage leaves samples within `[0, max_value]`; quantisation back to
/// 16 bits happens once, in [`WorkBuffer::into_raster`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WorkBuffer {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub max_value: f32,
    pub data: Vec<f32>,
}

impl WorkBuffer {
    pub fn from_raster(raster: &Raster) -> Self {
        Self {
            width: raster.width(),
            height: raster.height(),
            channels: raster.channels(),
            max_value: f32::from(raster.max_value()),
            data: raster.data().iter().map(|&v| f32::from(v)).collect(),
        }
    }

    /// Rounds and clamps every sample into `[0, max_value]`, including
    /// samples that were out of range in the source raster.
    pub fn into_raster(self, bits_per_sample: u32) -> Raster {
        let max = self.max_value;
        let data = self
            .data
            .into_iter()
            .map(|v| v.round().clamp(0.0, max) as u16)
            .collect();
        Raster::from_parts(self.width, self.height, self.channels, bits_per_sample, data)
    }

    pub fn row_len(&self) -> usize {
        self.width * self.channels
    }

    pub fn clamp(&self, value: f64) -> f32 {
        value.clamp(0.0, f64::from(self.max_value)) as f32
    }

    fn at(&self, x: usize, y: usize, channel: usize) -> f32 {
        self.data[(y * self.width + x) * self.channels + channel]
    }

    /// Bilinear sample at a fractional position; positions outside the
    /// buffer read the nearest edge sample.
    pub fn bilinear(&self, x: f64, y: f64, channel: usize) -> f32 {
        let x = if x.is_nan() { 0.0 } else { x.clamp(0.0, (self.width - 1) as f64) };
        let y = if y.is_nan() { 0.0 } else { y.clamp(0.0, (self.height - 1) as f64) };

        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let fx = (x - x0 as f64) as f32;
        let fy = (y - y0 as f64) as f32;

        let a = self.at(x0, y0, channel);
        let b = self.at(x1, y0, channel);
        let c = self.at(x0, y1, channel);
        let d = self.at(x1, y1, channel);
        let top = a + (b - a) * fx;
        let bottom = c + (d - c) * fx;
        top + (bottom - top) * fy
    }
}

/// Optical centre and normalising radius for the radial opcodes.
///
/// The centre sits at `(cx * width, cy * height)` on the continuous frame,
/// where pixel `x` covers `[x, x + 1)`. It is stored in sample-index units,
/// so `cx`/`cy` are directly comparable with `x`/`y` and with positions
/// passed to [`WorkBuffer::bilinear`]. The radius is the distance from the
/// centre to the farthest frame corner.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OpticalFrame {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
    radius_sq: f64,
}

impl OpticalFrame {
    pub fn new(width: usize, height: usize, center_x: f64, center_y: f64) -> Self {
        let (w, h) = (width as f64, height as f64);
        let (px, py) = (center_x * w, center_y * h);
        let dx = px.max(w - px);
        let dy = py.max(h - py);
        let radius_sq = dx * dx + dy * dy;
        Self {
            cx: px - 0.5,
            cy: py - 0.5,
            radius: radius_sq.sqrt(),
            radius_sq,
        }
    }

    /// Squared distance from the centre, in units of the normalising radius.
    pub fn radius_squared(&self, x: usize, y: usize) -> f64 {
        let dx = x as f64 - self.cx;
        let dy = y as f64 - self.cy;
        (dx * dx + dy * dy) / self.radius_sq
    }
}
