use rayon::prelude::*;

use crate::opcode_pipeline::engine::buffer::WorkBuffer;
use crate::opcode_pipeline::opcodes::GainMap;

/// Position of one image coordinate along a grid axis.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisPosition {
    lower: usize,
    upper: usize,
    weight: f64,
}

fn axis_position(fraction: f64, origin: f64, spacing: f64, points: u32) -> AxisPosition {
    let last = points.saturating_sub(1) as usize;
    if last == 0 || spacing <= 0.0 {
        return AxisPosition {
            lower: 0,
            upper: 0,
            weight: 0.0,
        };
    }
    let index = ((fraction - origin) / spacing).clamp(0.0, last as f64);
    let lower = (index.floor() as usize).min(last);
    AxisPosition {
        lower,
        upper: (lower + 1).min(last),
        weight: index - lower as f64,
    }
}

impl GainMap {
    fn interpolate(&self, v: AxisPosition, h: AxisPosition, map_plane: usize) -> f64 {
        let g = |row, col| f64::from(self.gain_at(row, col, map_plane));
        let top = g(v.lower, h.lower) + (g(v.lower, h.upper) - g(v.lower, h.lower)) * h.weight;
        let bottom = g(v.upper, h.lower) + (g(v.upper, h.upper) - g(v.upper, h.lower)) * h.weight;
        top + (bottom - top) * v.weight
    }
}

/// Multiplies the selected samples by the interpolated gain grid.
///
/// Rows and columns are stepped by the pitch starting at `top`/`left`. Image
/// plane `plane + i` reads map plane `min(i, map_planes - 1)`.
pub(crate) fn apply_gain_map(mut buffer: WorkBuffer, map: &GainMap) -> WorkBuffer {
    let (width, height, channels) = (buffer.width, buffer.height, buffer.channels);
    let top = map.top as usize;
    let left = map.left as usize;
    let bottom = (map.bottom as usize).min(height);
    let right = (map.right as usize).min(width);
    if top >= bottom || left >= right {
        return buffer;
    }

    let row_pitch = map.row_pitch.max(1) as usize;
    let col_pitch = map.col_pitch.max(1) as usize;
    let first_plane = map.plane as usize;
    let last_plane = (first_plane + map.planes as usize).min(channels);
    let last_map_plane = map.map_planes.saturating_sub(1) as usize;
    let max = f64::from(buffer.max_value);

    let columns: Vec<(usize, AxisPosition)> = (left..right)
        .step_by(col_pitch)
        .map(|x| {
            let fraction = x as f64 / width as f64;
            (x, axis_position(fraction, map.map_origin_h, map.map_spacing_h, map.map_points_h))
        })
        .collect();

    let row_len = buffer.row_len();
    buffer
        .data
        .par_chunks_mut(row_len)
        .enumerate()
        .skip(top)
        .take(bottom - top)
        .filter(|(y, _)| (y - top) % row_pitch == 0)
        .for_each(|(y, row)| {
            let fraction = y as f64 / height as f64;
            let v = axis_position(fraction, map.map_origin_v, map.map_spacing_v, map.map_points_v);
            for &(x, h) in &columns {
                for channel in first_plane..last_plane {
                    let map_plane = (channel - first_plane).min(last_map_plane);
                    let gain = map.interpolate(v, h, map_plane);
                    let sample = &mut row[x * channels + channel];
                    *sample = (f64::from(*sample) * gain).clamp(0.0, max) as f32;
                }
            }
        });
    buffer
}
