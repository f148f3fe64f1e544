//! Gain map post-processing
//!
//! Corrections applied to decoded gain maps before they are re-encoded. They
//! operate on the four per-CFA-site maps of the linear stage, in list order,
//! and never touch the codec or the engine.

#[cfg(test)]
mod tests;

use tracing::{debug, info};

use crate::opcode_pipeline::common::error::HookError;
use crate::opcode_pipeline::opcodes::{GainMap, Opcode, OpcodePayload, OpcodeStage};
use crate::opcode_pipeline::raster::Raster;

/// Number of colour filter sites in a 2x2 mosaic.
pub const CFA_SITES: usize = 4;

/// Reorders per-site gains written for a different mosaic layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfaFix {
    /// Exchanges the first and last site.
    Bggr,
    /// Exchanges sites pairwise along each row.
    Grbg,
}

fn gain_maps(opcodes: &[Opcode]) -> impl Iterator<Item = &GainMap> {
    opcodes.iter().filter_map(|op| match &op.payload {
        OpcodePayload::GainMap(map) => Some(map),
        _ => None,
    })
}

/// Positions of the linear-stage gain maps, which must number exactly four
/// and share one grid length.
fn site_maps(opcodes: &[Opcode]) -> Result<[usize; CFA_SITES], HookError> {
    let indices: Vec<usize> = opcodes
        .iter()
        .enumerate()
        .filter(|(_, op)| {
            op.header.stage == OpcodeStage::Linear && matches!(op.payload, OpcodePayload::GainMap(_))
        })
        .map(|(i, _)| i)
        .collect();
    let indices: [usize; CFA_SITES] = indices
        .try_into()
        .map_err(|found: Vec<usize>| HookError::GainMapCount(found.len()))?;

    let lengths: Vec<usize> = indices
        .iter()
        .map(|&i| gains(&opcodes[i]).map_or(0, <[f32]>::len))
        .collect();
    if lengths.iter().any(|&len| len != lengths[0]) {
        return Err(HookError::MismatchedGrids(lengths));
    }
    Ok(indices)
}

fn gains(opcode: &Opcode) -> Option<&[f32]> {
    match &opcode.payload {
        OpcodePayload::GainMap(map) => Some(&map.gains),
        _ => None,
    }
}

fn gains_mut(opcode: &mut Opcode) -> Option<&mut Vec<f32>> {
    match &mut opcode.payload {
        OpcodePayload::GainMap(map) => Some(&mut map.gains),
        _ => None,
    }
}

fn swap_gains(opcodes: &mut [Opcode], a: usize, b: usize) {
    let (low, high) = (a.min(b), a.max(b));
    let (head, tail) = opcodes.split_at_mut(high);
    if let (Some(x), Some(y)) = (gains_mut(&mut head[low]), gains_mut(&mut tail[0])) {
        std::mem::swap(x, y);
    }
}

/// Smallest gain across every gain map in the list, `None` without maps.
pub fn min_gain(opcodes: &[Opcode]) -> Option<f32> {
    gain_maps(opcodes)
        .flat_map(|map| map.gains.iter().copied())
        .reduce(f32::min)
}

/// Divides the common (luminance) part out of the four site maps.
///
/// At every grid node the smallest of the four gains is divided out, leaving
/// only the colour ratio. When `global_min` is below this frame's minimum
/// gain, the result is rescaled by `frame_min / global_min` so frames of one
/// batch stay consistent.
pub fn strip_luminance(opcodes: &mut [Opcode], global_min: Option<f32>) -> Result<(), HookError> {
    let sites = site_maps(opcodes)?;
    let frame_min = sites
        .iter()
        .filter_map(|&i| gains(&opcodes[i]))
        .flat_map(|g| g.iter().copied())
        .reduce(f32::min)
        .unwrap_or(1.0);
    let rescale = match global_min {
        Some(global) if global > 0.0 && global < frame_min => frame_min / global,
        _ => 1.0,
    };
    info!(frame_min, ?global_min, rescale, "Stripping luminance from gain maps");

    let nodes = gains(&opcodes[sites[0]]).map_or(0, <[f32]>::len);
    for node in 0..nodes {
        let node_min = sites
            .iter()
            .filter_map(|&i| gains(&opcodes[i]).map(|g| g[node]))
            .fold(f32::INFINITY, f32::min);
        if node_min.is_nan() || node_min <= 0.0 {
            debug!(node, node_min, "Leaving node with non-positive gain");
            continue;
        }
        for &i in &sites {
            if let Some(g) = gains_mut(&mut opcodes[i]) {
                g[node] = g[node] / node_min * rescale;
            }
        }
    }
    Ok(())
}

pub fn swap_cfa_channels(opcodes: &mut [Opcode], fix: CfaFix) -> Result<(), HookError> {
    let [a, b, c, d] = site_maps(opcodes)?;
    debug!(?fix, "Swapping gain map sites");
    match fix {
        CfaFix::Bggr => swap_gains(opcodes, a, d),
        CfaFix::Grbg => {
            swap_gains(opcodes, a, b);
            swap_gains(opcodes, c, d);
        }
    }
    Ok(())
}

/// Derives four pitch-2 gain maps from a flat-field exposure of a 2x2 mosaic.
///
/// Each site's gain at a node is `site max / sample`, so applying the maps
/// lifts the flat field to its per-site maximum. With `strip_luminance` the
/// per-node minimum across sites is divided out as well. Zero samples count
/// as one.
pub fn flat_field_gain_maps(flat: &Raster, strip_luminance: bool) -> Result<Vec<Opcode>, HookError> {
    let (width, height) = (flat.width(), flat.height());
    if flat.channels() != 1 || width < 2 || height < 2 || width % 2 != 0 || height % 2 != 0 {
        return Err(HookError::UnsupportedFlatField {
            width,
            height,
            channels: flat.channels(),
        });
    }

    let (points_h, points_v) = (width / 2, height / 2);
    let sites = [(0usize, 0usize), (0, 1), (1, 0), (1, 1)];
    let sample = |site: (usize, usize), v: usize, h: usize| {
        f32::from(flat.get(site.1 + 2 * h, site.0 + 2 * v, 0).unwrap_or(0).max(1))
    };

    let mut site_gains: Vec<Vec<f32>> = sites
        .iter()
        .map(|&site| {
            let samples: Vec<f32> = (0..points_v)
                .flat_map(|v| (0..points_h).map(move |h| (v, h)))
                .map(|(v, h)| sample(site, v, h))
                .collect();
            let max = samples.iter().copied().fold(1.0, f32::max);
            samples.into_iter().map(|s| max / s).collect()
        })
        .collect();

    if strip_luminance {
        for node in 0..points_v * points_h {
            let lum = site_gains.iter().map(|g| g[node]).fold(f32::INFINITY, f32::min);
            for g in &mut site_gains {
                g[node] /= lum;
            }
        }
    }

    info!(width, height, strip_luminance, "Built flat-field gain maps");
    let opcodes = sites
        .iter()
        .zip(site_gains)
        .map(|(&(dy, dx), gains)| {
            Opcode::from(GainMap {
                top: dy as u32,
                left: dx as u32,
                bottom: height as u32,
                right: width as u32,
                plane: 0,
                planes: 1,
                row_pitch: 2,
                col_pitch: 2,
                map_points_v: points_v as u32,
                map_points_h: points_h as u32,
                map_spacing_v: 2.0 / height as f64,
                map_spacing_h: 2.0 / width as f64,
                map_origin_v: dy as f64 / height as f64,
                map_origin_h: dx as f64 / width as f64,
                map_planes: 1,
                gains,
            })
            .with_stage(OpcodeStage::Linear)
        })
        .collect();
    Ok(opcodes)
}
