use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use dng_opcodes_rs::opcode_pipeline::{
    FixVignetteRadial, GainMap, Opcode, Raster, TrimBounds, WarpPlane, WarpRectilinear, apply,
    decode, encode,
};

fn generate_raster(width: usize, height: usize) -> Raster {
    let data = (0..width * height * 3)
        .map(|i| ((i * 31) % 60000) as u16)
        .collect();
    Raster::new(width, height, 3, 16, data).unwrap()
}

fn lens_correction(width: u32, height: u32) -> Vec<Opcode> {
    let mut map = GainMap::uniform(TrimBounds::full_frame(width, height), 17, 17, 1.05);
    map.planes = 3;
    vec![
        WarpRectilinear {
            planes: vec![WarpPlane {
                radial: [0.98, 0.02, -0.004, 0.0],
                tangential: [1e-4, -1e-4],
            }],
            center_x: 0.5,
            center_y: 0.5,
        }
        .into(),
        FixVignetteRadial {
            k: [0.4, -0.1, 0.02, 0.0, 0.0],
            center_x: 0.5,
            center_y: 0.5,
        }
        .into(),
        map.into(),
        TrimBounds::new(8, 8, height - 8, width - 8).into(),
    ]
}

fn benchmark_apply_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_by_size");

    let sizes = vec![(256, 256, "256x256"), (1024, 768, "1024x768")];

    for (width, height, label) in sizes {
        let raster = generate_raster(width, height);
        let opcodes = lens_correction(width as u32, height as u32);

        group.bench_with_input(BenchmarkId::from_parameter(label), &raster, |b, raster| {
            b.iter(|| apply(black_box(raster), &opcodes, false, false, 2.2));
        });
    }

    group.finish();
}

fn benchmark_gamma_overhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("gamma_overhead");
    let raster = generate_raster(512, 512);

    group.bench_function("without_gamma", |b| {
        b.iter(|| apply(black_box(&raster), &[], false, false, 2.2));
    });

    group.bench_function("with_gamma", |b| {
        b.iter(|| apply(black_box(&raster), &[], true, true, 2.2));
    });

    group.finish();
}

fn benchmark_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    let mut map = GainMap::uniform(TrimBounds::full_frame(6000, 4000), 101, 151, 1.0);
    map.gains = (0..map.gains.len()).map(|i| 1.0 + (i % 97) as f32 * 0.001).collect();
    let opcodes = vec![Opcode::from(map); 4];
    let bytes = encode(&opcodes);

    group.bench_function("encode_gain_maps", |b| {
        b.iter(|| encode(black_box(&opcodes)));
    });

    group.bench_function("decode_gain_maps", |b| {
        b.iter(|| decode(black_box(&bytes)).unwrap());
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_apply_sizes,
    benchmark_gamma_overhead,
    benchmark_codec
);
criterion_main!(benches);
