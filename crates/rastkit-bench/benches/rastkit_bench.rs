//! Benchmarks for rastkit operators.
//!
//! Run with: `cargo bench`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use rastkit_core::{Raster, Rect, Roi, ValueRange};
use rastkit_ops::band_combine::{BandCombine, BandCombineConfig};
use rastkit_ops::dither::{ColorMap, DitherConfig, ErrorDiffusion};
use rastkit_ops::mosaic::{Mosaic, MosaicConfig, MosaicSource, MosaicType, SourceTile};
use rastkit_ops::scale::{Interpolation, Scale, ScaleConfig};
use rastkit_ops::tiling::{render_tiles, TileGrid};

fn gradient(size: u32, bands: usize) -> Raster<u8> {
    Raster::from_fn(Rect::from_size(size, size), bands, |x, y, b| {
        ((x + y * 3 + b as i32 * 40) & 0xff) as u8
    })
}

/// Mosaic of four sources, plain and fully masked.
fn bench_mosaic(c: &mut Criterion) {
    let mut group = c.benchmark_group("mosaic");
    let size = 512;
    let tile = Rect::from_size(size, size);
    let sources: Vec<Raster<u8>> = (0..4).map(|_| gradient(size, 3)).collect();
    let roi = Roi::from_rect(Rect::new(64, 64, 256, 256));
    group.throughput(Throughput::Elements(tile.area()));

    for mosaic_type in [MosaicType::Overlay, MosaicType::Blend] {
        for masked in [false, true] {
            let mut config = MosaicConfig::new(mosaic_type);
            for _ in &sources {
                let mut source = MosaicSource::new(3);
                if masked {
                    source = source.with_no_data(ValueRange::point(0)).with_roi(roi.clone());
                }
                config = config.with_source(source);
            }
            let mosaic = Mosaic::<u8>::new(config).unwrap();
            let id = format!("{:?}/{}", mosaic_type, if masked { "general" } else { "nomask" });
            let mut out = Raster::new(tile, 3, 0u8);
            group.bench_function(BenchmarkId::new("compute_tile", id), |b| {
                b.iter(|| {
                    let tiles: Vec<_> = sources.iter().map(|s| SourceTile::new(s.view())).collect();
                    mosaic.compute_tile(black_box(&tiles), &mut out.view_mut(), tile).unwrap();
                })
            });
        }
    }

    group.finish();
}

/// RGB to luma band combine, sequential and tile-parallel.
fn bench_band_combine(c: &mut Criterion) {
    let mut group = c.benchmark_group("band_combine");
    let matrix = vec![vec![0.299, 0.587, 0.114, 0.0]];

    for size in [256u32, 1024].iter() {
        let src = gradient(*size, 3);
        let bounds = src.bounds();
        let op = BandCombine::<u8>::new(BandCombineConfig::new(3, matrix.clone())).unwrap();
        group.throughput(Throughput::Elements(bounds.area()));

        group.bench_with_input(BenchmarkId::new("single_tile", size), &src, |b, src| {
            let mut out = Raster::new(bounds, 1, 0u8);
            b.iter(|| op.compute_tile(black_box(&src.view()), &mut out.view_mut(), bounds).unwrap())
        });

        let grid = TileGrid::new(bounds, 128, 128).unwrap();
        group.bench_with_input(BenchmarkId::new("render_tiles", size), &src, |b, src| {
            b.iter(|| {
                render_tiles(&grid, 1, |tile, dst| op.compute_tile(&src.view(), dst, tile)).unwrap()
            })
        });
    }

    group.finish();
}

/// Error diffusion on the lookup-table path and the generic search path.
fn bench_dither(c: &mut Criterion) {
    let mut group = c.benchmark_group("dither");
    let src = gradient(512, 3);
    group.throughput(Throughput::Elements(src.bounds().area()));

    let cube = ColorMap::cube(&[6, 6, 6], 0.0, 255.0).unwrap();
    let flat = ColorMap::from_entries((0..cube.len()).map(|i| cube.entry(i).to_vec()).collect()).unwrap();

    for (name, map) in [("cube_lut", cube), ("search", flat)] {
        let op = ErrorDiffusion::<u8, u8>::new(DitherConfig::new(map)).unwrap();
        let mut out = Raster::new(src.bounds(), 1, 0u8);
        group.bench_function(name, |b| {
            b.iter(|| op.run(black_box(&src.view()), &mut out.view_mut()).unwrap())
        });
    }

    group.finish();
}

/// Upscale by 2.5 with each filter.
fn bench_scale(c: &mut Criterion) {
    let mut group = c.benchmark_group("scale");
    let src = gradient(256, 1);

    for interpolation in [Interpolation::Nearest, Interpolation::Bilinear] {
        let op = Scale::<u8>::new(ScaleConfig::new(1, 2.5, 2.5).with_interpolation(interpolation)).unwrap();
        let bounds = op.dest_bounds(src.bounds());
        let mut out = Raster::new(bounds, 1, 0u8);
        group.throughput(Throughput::Elements(bounds.area()));
        group.bench_function(BenchmarkId::new("u8", format!("{interpolation:?}")), |b| {
            b.iter(|| op.compute_tile(black_box(&src.view()), &mut out.view_mut(), bounds).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_mosaic, bench_band_combine, bench_dither, bench_scale);
criterion_main!(benches);
