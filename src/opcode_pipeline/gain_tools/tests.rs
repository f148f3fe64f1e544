use super::*;
use crate::opcode_pipeline::engine::apply;
use crate::opcode_pipeline::opcodes::{FixVignetteRadial, TrimBounds};

fn site_map(gains: Vec<f32>) -> Opcode {
    let mut map = GainMap::uniform(TrimBounds::full_frame(4, 4), 1, gains.len() as u32, 1.0);
    map.gains = gains;
    Opcode::from(map)
}

fn four_sites() -> Vec<Opcode> {
    vec![
        site_map(vec![2.0, 4.0]),
        site_map(vec![3.0, 2.0]),
        site_map(vec![4.0, 8.0]),
        site_map(vec![5.0, 6.0]),
    ]
}

fn all_gains(opcodes: &[Opcode]) -> Vec<Vec<f32>> {
    opcodes
        .iter()
        .filter_map(|op| gains(op).map(<[f32]>::to_vec))
        .collect()
}

#[test]
fn test_min_gain_spans_all_maps() {
    let mut opcodes = four_sites();
    opcodes.push(FixVignetteRadial::default().into());
    assert_eq!(min_gain(&opcodes), Some(2.0));
    assert_eq!(min_gain(&[FixVignetteRadial::default().into()]), None);
}

#[test]
fn test_strip_luminance_divides_node_minimum() {
    let mut opcodes = four_sites();
    strip_luminance(&mut opcodes, None).unwrap();
    assert_eq!(
        all_gains(&opcodes),
        vec![vec![1.0, 2.0], vec![1.5, 1.0], vec![2.0, 4.0], vec![2.5, 3.0]]
    );
}

#[test]
fn test_strip_luminance_rescales_to_batch_minimum() {
    let mut opcodes = four_sites();
    strip_luminance(&mut opcodes, Some(1.0)).unwrap();
    assert_eq!(
        all_gains(&opcodes),
        vec![vec![2.0, 4.0], vec![3.0, 2.0], vec![4.0, 8.0], vec![5.0, 6.0]]
    );

    let mut opcodes = four_sites();
    strip_luminance(&mut opcodes, Some(3.0)).unwrap();
    assert_eq!(all_gains(&opcodes)[0], vec![1.0, 2.0]);
}

#[test]
fn test_hooks_ignore_other_stages() {
    let mut opcodes = four_sites();
    opcodes.push(site_map(vec![9.0, 9.0]).with_stage(OpcodeStage::Demosaiced));
    swap_cfa_channels(&mut opcodes, CfaFix::Bggr).unwrap();
    assert_eq!(all_gains(&opcodes)[4], vec![9.0, 9.0]);
}

#[test]
fn test_hooks_require_four_maps() {
    let mut opcodes = four_sites();
    opcodes.pop();
    assert_eq!(
        swap_cfa_channels(&mut opcodes, CfaFix::Bggr),
        Err(HookError::GainMapCount(3))
    );
    assert_eq!(strip_luminance(&mut opcodes, None), Err(HookError::GainMapCount(3)));
}

#[test]
fn test_hooks_require_matching_grids() {
    let mut opcodes = four_sites();
    opcodes[2] = site_map(vec![1.0]);
    assert_eq!(
        strip_luminance(&mut opcodes, None),
        Err(HookError::MismatchedGrids(vec![2, 2, 1, 2]))
    );
}

#[test]
fn test_bggr_swaps_outer_sites() {
    let mut opcodes = four_sites();
    swap_cfa_channels(&mut opcodes, CfaFix::Bggr).unwrap();
    assert_eq!(
        all_gains(&opcodes),
        vec![vec![5.0, 6.0], vec![3.0, 2.0], vec![4.0, 8.0], vec![2.0, 4.0]]
    );
}

#[test]
fn test_grbg_swaps_pairs() {
    let mut opcodes = four_sites();
    swap_cfa_channels(&mut opcodes, CfaFix::Grbg).unwrap();
    assert_eq!(
        all_gains(&opcodes),
        vec![vec![3.0, 2.0], vec![2.0, 4.0], vec![5.0, 6.0], vec![4.0, 8.0]]
    );
}

fn flat_field() -> Raster {
    let (width, height): (usize, usize) = (8, 6);
    let data = (0..width * height)
        .map(|i| {
            let (x, y) = (i % width, i / width);
            let falloff = (x.abs_diff(4) + y.abs_diff(3)) as u16 * 300;
            let site = ((y % 2) * 2 + x % 2) as u16 * 1000;
            20000 + site - falloff
        })
        .collect();
    Raster::new(width, height, 1, 16, data).unwrap()
}

#[test]
fn test_flat_field_maps_lift_to_site_maximum() {
    let flat = flat_field();
    let opcodes = flat_field_gain_maps(&flat, false).unwrap();
    assert_eq!(opcodes.len(), 4);

    let out = apply(&flat, &opcodes, false, false, 2.2);
    for y in 0..6 {
        for x in 0..8 {
            let (dy, dx) = (y % 2, x % 2);
            let site_max = (0..3)
                .flat_map(|v| (0..4).map(move |h| (v, h)))
                .filter_map(|(v, h)| flat.get(dx + 2 * h, dy + 2 * v, 0))
                .max()
                .unwrap();
            let value = out.get(x, y, 0).unwrap();
            assert!(value.abs_diff(site_max) <= 1, "({x}, {y}): {value} vs {site_max}");
        }
    }
}

#[test]
fn test_flat_field_layout() {
    let opcodes = flat_field_gain_maps(&flat_field(), true).unwrap();
    for (opcode, (top, left)) in opcodes.iter().zip([(0, 0), (0, 1), (1, 0), (1, 1)]) {
        assert_eq!(opcode.header.stage, OpcodeStage::Linear);
        assert_eq!(opcode.validate(), Ok(()));
        let OpcodePayload::GainMap(map) = &opcode.payload else {
            panic!("expected a gain map");
        };
        assert_eq!((map.top, map.left, map.bottom, map.right), (top, left, 6, 8));
        assert_eq!((map.row_pitch, map.col_pitch), (2, 2));
        assert_eq!((map.map_points_v, map.map_points_h), (3, 4));
    }

    let stripped = all_gains(&opcodes);
    for node in 0..12 {
        let lum = stripped.iter().map(|g| g[node]).fold(f32::INFINITY, f32::min);
        assert!((lum - 1.0).abs() < 1e-6);
    }
}

#[test]
fn test_flat_field_rejects_odd_or_color_input() {
    let odd = Raster::filled(5, 4, 1, 16, 100).unwrap();
    assert!(matches!(
        flat_field_gain_maps(&odd, false),
        Err(HookError::UnsupportedFlatField { width: 5, .. })
    ));
    let rgb = Raster::filled(4, 4, 3, 16, 100).unwrap();
    assert!(matches!(
        flat_field_gain_maps(&rgb, false),
        Err(HookError::UnsupportedFlatField { channels: 3, .. })
    ));
}
