//! Integration tests for rastkit crates.
//!
//! End-to-end checks of the operators against each other: the worked
//! scenarios, the cross-operator properties, tile-parallel equivalence and
//! serialization of configuration enums.

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rastkit_core::{AlphaMode, AnyRasterMut, MaskCase, Raster, Rect, Roi, Sample, SampleKind, ValueRange};
    use rastkit_ops::band_combine::{BandCombine, BandCombineConfig};
    use rastkit_ops::dither::{ColorMap, DitherConfig, ErrorDiffusion, ErrorKernel};
    use rastkit_ops::mosaic::{Mosaic, MosaicConfig, MosaicSource, MosaicType, SourceTile};
    use rastkit_ops::scale::{Interpolation, Scale, ScaleConfig};
    use rastkit_ops::tiling::{render_tiles, TileGrid};

    const TILE: Rect = Rect::from_size(4, 4);

    fn two_source_mosaic(mosaic_type: MosaicType, first_no_data: Option<u8>) -> Mosaic<u8> {
        let mut first = MosaicSource::new(1);
        if let Some(v) = first_no_data {
            first = first.with_no_data(ValueRange::point(v));
        }
        let config = MosaicConfig::new(mosaic_type)
            .with_source(first)
            .with_source(MosaicSource::new(1));
        Mosaic::new(config).unwrap()
    }

    fn run_mosaic(mosaic: &Mosaic<u8>, a: &Raster<u8>, b: &Raster<u8>) -> Raster<u8> {
        let mut out = Raster::new(TILE, 1, 0u8);
        let sources = [SourceTile::new(a.view()), SourceTile::new(b.view())];
        mosaic.compute_tile(&sources, &mut out.view_mut(), TILE).unwrap();
        out
    }

    // ========================================================================
    // Worked scenarios
    // ========================================================================

    #[test]
    fn test_scenario_a_blend_mean() {
        let a = Raster::new(TILE, 1, 10u8);
        let b = Raster::new(TILE, 1, 20u8);
        let out = run_mosaic(&two_source_mosaic(MosaicType::Blend, None), &a, &b);
        assert_eq!(out.bands(), 1);
        assert!(out.data().iter().all(|&v| v == 15));
    }

    #[test]
    fn test_scenario_b_blend_skips_no_data() {
        let a = Raster::new(TILE, 1, 10u8);
        let b = Raster::new(TILE, 1, 20u8);
        let out = run_mosaic(&two_source_mosaic(MosaicType::Blend, Some(10)), &a, &b);
        assert!(out.data().iter().all(|&v| v == 20));
    }

    #[test]
    fn test_scenario_c_overlay_order() {
        let a = Raster::new(TILE, 1, 10u8);
        let b = Raster::new(TILE, 1, 20u8);
        let overlay = two_source_mosaic(MosaicType::Overlay, None);
        assert!(run_mosaic(&overlay, &a, &b).data().iter().all(|&v| v == 10));
        assert!(run_mosaic(&overlay, &b, &a).data().iter().all(|&v| v == 20));
    }

    #[test]
    fn test_scenario_d_band_sum() {
        let src = Raster::from_fn(TILE, 2, |_, _, b| [3u8, 4][b]);
        let op = BandCombine::<u8>::new(BandCombineConfig::new(2, vec![vec![1.0, 1.0, 0.0]])).unwrap();
        assert_eq!(op.dest_bands(), 1);
        let mut out = Raster::new(TILE, 1, 0u8);
        op.compute_tile(&src.view(), &mut out.view_mut(), TILE).unwrap();
        assert!(out.data().iter().all(|&v| v == 7));
    }

    #[test]
    fn test_scenario_e_nearest_replication() {
        let src = Raster::from_vec(Rect::from_size(2, 2), 1, vec![1u8, 2, 3, 4]).unwrap();
        let op = Scale::<u8>::new(ScaleConfig::new(1, 2.0, 2.0)).unwrap();
        let bounds = op.dest_bounds(src.bounds());
        assert_eq!(bounds, TILE);
        let mut out = Raster::new(bounds, 1, 0u8);
        op.compute_tile(&src.view(), &mut out.view_mut(), bounds).unwrap();
        for (x, y) in bounds.iter_coords() {
            assert_eq!(out.get(x, y, 0), src.get(x / 2, y / 2, 0), "({x}, {y})");
        }
    }

    // ========================================================================
    // Properties
    // ========================================================================

    #[test]
    fn test_p1_no_data_never_influences() {
        // source 0 is no-data on the left half only
        let a = Raster::from_fn(TILE, 1, |x, _, _| if x < 2 { 0u8 } else { 90 });
        let b = Raster::new(TILE, 1, 30u8);
        let blend = run_mosaic(&two_source_mosaic(MosaicType::Blend, Some(0)), &a, &b);
        let overlay = run_mosaic(&two_source_mosaic(MosaicType::Overlay, Some(0)), &a, &b);
        for (x, y) in TILE.iter_coords() {
            let (b_expected, o_expected) = if x < 2 { (30, 30) } else { (60, 90) };
            assert_eq!(blend.get(x, y, 0), b_expected);
            assert_eq!(overlay.get(x, y, 0), o_expected);
        }
    }

    #[test]
    fn test_p2_fallback_totality() {
        // every source excluded a different way
        let roi = Roi::from_rect(Rect::new(10, 10, 2, 2));
        let config = MosaicConfig::<u16>::new(MosaicType::Blend)
            .with_source(MosaicSource::new(2).with_no_data(ValueRange::at_least(100)))
            .with_source(MosaicSource::new(2).with_roi(roi))
            .with_source(MosaicSource::new(2).with_alpha())
            .with_alpha_mode(AlphaMode::Weighted)
            .with_fallback(vec![7.0, 8.0]);
        let mosaic = Mosaic::new(config).unwrap();

        let nodata = Raster::new(TILE, 2, 500u16);
        let outside = Raster::new(TILE, 2, 5u16);
        let transparent = Raster::new(TILE, 2, 6u16);
        let alpha = Raster::new(TILE, 1, 0u8);
        let sources = [
            SourceTile::new(nodata.view()),
            SourceTile::new(outside.view()),
            SourceTile::new(transparent.view()).with_alpha(alpha.view()),
        ];
        let mut out = Raster::new(TILE, 2, 0u16);
        mosaic.compute_tile(&sources, &mut out.view_mut(), TILE).unwrap();
        for (x, y) in TILE.iter_coords() {
            assert_eq!((out.get(x, y, 0), out.get(x, y, 1)), (7, 8));
        }
    }

    #[test]
    fn test_p3_blend_is_arithmetic_mean() {
        let rasters: Vec<Raster<f32>> = (0..5)
            .map(|i| Raster::from_fn(TILE, 3, |x, y, b| (i * 7 + x * 3 + y + b as i32) as f32 * 0.5))
            .collect();
        let mut config = MosaicConfig::new(MosaicType::Blend);
        for _ in &rasters {
            config = config.with_source(MosaicSource::new(3));
        }
        let mosaic = Mosaic::<f32>::new(config).unwrap();
        assert_eq!(mosaic.mask_case(), MaskCase::NoMask);

        let sources: Vec<_> = rasters.iter().map(|r| SourceTile::new(r.view())).collect();
        let mut out = Raster::new(TILE, 3, 0.0f32);
        mosaic.compute_tile(&sources, &mut out.view_mut(), TILE).unwrap();
        for (x, y) in TILE.iter_coords() {
            for b in 0..3 {
                let mean = rasters.iter().map(|r| r.get(x, y, b) as f64).sum::<f64>() / 5.0;
                assert_abs_diff_eq!(out.get(x, y, b) as f64, mean, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_p4_overlay_priority() {
        let a = Raster::from_fn(TILE, 1, |x, y, _| (x + 4 * y) as u8);
        let overlay = two_source_mosaic(MosaicType::Overlay, None);
        for fill in [0u8, 128, 255] {
            let b = Raster::new(TILE, 1, fill);
            assert_eq!(run_mosaic(&overlay, &a, &b), a);
        }

        // swapping matters once source 0 is no-data
        let masked = two_source_mosaic(MosaicType::Overlay, Some(3));
        let a = Raster::new(TILE, 1, 3u8);
        let b = Raster::new(TILE, 1, 44u8);
        let mosaic_swapped = two_source_mosaic(MosaicType::Overlay, Some(44));
        assert!(run_mosaic(&masked, &a, &b).data().iter().all(|&v| v == 44));
        assert!(run_mosaic(&mosaic_swapped, &b, &a).data().iter().all(|&v| v == 3));
    }

    fn identity_roundtrip<T: Sample>(values: [T; 3]) {
        let src = Raster::from_fn(TILE, 3, |x, y, b| if (x + y) % 2 == 0 { values[b] } else { values[2 - b] });
        let op = BandCombine::<T>::new(BandCombineConfig::identity(3)).unwrap();
        let mut out = Raster::new(TILE, 3, T::default());
        op.compute_tile(&src.view(), &mut out.view_mut(), TILE).unwrap();
        assert_eq!(out, src, "{:?}", T::KIND);
    }

    #[test]
    fn test_p5_band_combine_identity() {
        identity_roundtrip([0u8, 127, 255]);
        identity_roundtrip([0u16, 40_000, u16::MAX]);
        identity_roundtrip([i16::MIN, -1, i16::MAX]);
        identity_roundtrip([i32::MIN, 0, i32::MAX]);
        identity_roundtrip([-1.5f32, 0.25, 1e6]);
        identity_roundtrip([f64::MIN_POSITIVE, -3.75, 1e300]);

        // identity sub-matrix picking bands 2 and 0
        let src = Raster::from_fn(TILE, 3, |x, y, b| (x * 10 + y + b as i32 * 100) as i16);
        let config = BandCombineConfig::new(3, vec![vec![0.0, 0.0, 1.0, 0.0], vec![1.0, 0.0, 0.0, 0.0]]);
        let op = BandCombine::<i16>::new(config).unwrap();
        let mut out = Raster::new(TILE, 2, 0i16);
        op.compute_tile(&src.view(), &mut out.view_mut(), TILE).unwrap();
        for (x, y) in TILE.iter_coords() {
            assert_eq!(out.get(x, y, 0), src.get(x, y, 2));
            assert_eq!(out.get(x, y, 1), src.get(x, y, 0));
        }
    }

    #[test]
    fn test_p6_error_conservation() {
        let kernels = [
            ErrorKernel::floyd_steinberg(),
            ErrorKernel::jarvis_judice_ninke(),
            ErrorKernel::stucki(),
            ErrorKernel::burkes(),
            ErrorKernel::sierra(),
        ];
        for kernel in &kernels {
            let total: f32 = kernel.data().iter().sum();
            assert_abs_diff_eq!(total, 1.0, epsilon = 1e-6);
            for err in [-127.5f32, -1.0, 0.0, 0.3, 64.0] {
                let spread: f32 = kernel.spread(err).map(|(_, _, e)| e).sum();
                assert_abs_diff_eq!(spread, err, epsilon = 1e-4);
            }
        }

        // interior pixel of a real pass: the pixel to the right sees 7/16 of the error
        let map = ColorMap::cube(&[2], 0.0, 255.0).unwrap();
        let op = ErrorDiffusion::<f32, u8>::new(DitherConfig::new(map)).unwrap();
        let bounds = Rect::from_size(2, 1);
        let mut dst = Raster::new(bounds, 1, 9u8);
        // second pixel sees 7/16 of the first pixel's error
        for (first, second, expected) in [
            (100.0f32, 100.0f32, [0u8, 1]), // 143.75
            (100.0, 80.0, [0, 0]),          // 123.75
            (120.0, 80.0, [0, 1]),          // 132.5
            (200.0, 150.0, [1, 0]),         // 125.9375
        ] {
            let src = Raster::from_vec(bounds, 1, vec![first, second]).unwrap();
            op.run(&src.view(), &mut dst.view_mut()).unwrap();
            assert_eq!(dst.data(), &expected, "{first} {second}");
        }
    }

    macro_rules! check_range_bounds {
        ($t:ty, $lo:expr, $hi:expr, $below:expr, $above:expr) => {{
            let (lo, hi): ($t, $t) = ($lo, $hi);
            let inclusive = ValueRange::new(lo, true, hi, true).unwrap();
            assert!(inclusive.contains(lo) && inclusive.contains(hi));
            assert!(!inclusive.contains($below) && !inclusive.contains($above));

            let exclusive = ValueRange::new(lo, false, hi, false).unwrap();
            assert!(!exclusive.contains(lo) && !exclusive.contains(hi));

            let point = ValueRange::point(lo);
            assert!(point.contains(lo) && !point.contains($below));

            let doubled = ValueRange::<$t>::from_f64_bounds(lo.to_f64(), true, hi.to_f64(), true).unwrap();
            assert_eq!((doubled.lower(), doubled.upper()), (lo, hi));
        }};
    }

    #[test]
    fn test_p7_value_range_bounds() {
        check_range_bounds!(u8, 10, 20, 9, 21);
        check_range_bounds!(u16, 1, 65_534, 0, 65_535);
        check_range_bounds!(i16, i16::MIN + 1, i16::MAX - 1, i16::MIN, i16::MAX);
        check_range_bounds!(i32, -5, i32::MAX - 1, -6, i32::MAX);
        check_range_bounds!(
            f32,
            -1.0,
            1.0,
            f32::from_bits((-1.0f32).to_bits() + 1),
            f32::from_bits(1.0f32.to_bits() + 1)
        );
        check_range_bounds!(f64, 0.0, 1e10, -f64::MIN_POSITIVE, 1e10 + 1.0);
    }

    // ========================================================================
    // Mask-case equivalence
    // ========================================================================

    #[test]
    fn test_mask_cases_agree_when_masks_are_inert() {
        let bounds = Rect::from_size(9, 7);
        let src = Raster::from_fn(bounds, 2, |x, y, b| (x * 13 + y * 7 + b as i32 * 50) as u8);
        let everywhere = Roi::from_mask(Raster::new(bounds, 1, 255u8), 1);
        // the no-data value never occurs in the data
        let never = ValueRange::point(254u8);
        let matrix = vec![vec![0.5, 0.25, 3.0]];

        let plain = BandCombine::<u8>::new(BandCombineConfig::new(2, matrix.clone())).unwrap();
        let general = BandCombine::<u8>::new(
            BandCombineConfig::new(2, matrix)
                .with_roi(everywhere.clone())
                .with_no_data(never),
        )
        .unwrap();
        assert_eq!(plain.mask_case(), MaskCase::NoMask);
        assert_eq!(general.mask_case(), MaskCase::General);

        let mut a = Raster::new(bounds, 1, 0u8);
        let mut b = Raster::new(bounds, 1, 0u8);
        plain.compute_tile(&src.view(), &mut a.view_mut(), bounds).unwrap();
        general.compute_tile(&src.view(), &mut b.view_mut(), bounds).unwrap();
        assert_eq!(a, b);

        for interpolation in [Interpolation::Nearest, Interpolation::Bilinear] {
            let plain = Scale::<u8>::new(ScaleConfig::new(2, 1.5, 0.75).with_interpolation(interpolation)).unwrap();
            let general = Scale::<u8>::new(
                ScaleConfig::new(2, 1.5, 0.75)
                    .with_interpolation(interpolation)
                    .with_roi(everywhere.clone())
                    .with_no_data(never),
            )
            .unwrap();
            let dst_bounds = plain.dest_bounds(bounds);
            let mut a = Raster::new(dst_bounds, 2, 0u8);
            let mut b = Raster::new(dst_bounds, 2, 0u8);
            plain.compute_tile(&src.view(), &mut a.view_mut(), dst_bounds).unwrap();
            general.compute_tile(&src.view(), &mut b.view_mut(), dst_bounds).unwrap();
            assert_eq!(a, b, "{interpolation:?}");
        }
    }

    #[test]
    fn test_mosaic_mask_cases_agree_when_masks_are_inert() {
        let bounds = Rect::from_size(9, 7);
        let rasters: Vec<Raster<u8>> = (0..3)
            .map(|k| Raster::from_fn(bounds, 2, |x, y, b| (x * 13 + y * 7 + b as i32 * 50 + k * 3) as u8))
            .collect();
        let everywhere = Roi::from_mask(Raster::new(bounds, 1, 255u8), 1);
        let never = ValueRange::point(254u8);

        for mosaic_type in [MosaicType::Overlay, MosaicType::Blend] {
            let build = |roi: bool, no_data: bool| {
                let mut config = MosaicConfig::new(mosaic_type);
                for _ in &rasters {
                    let mut source = MosaicSource::new(2);
                    if roi {
                        source = source.with_roi(everywhere.clone());
                    }
                    if no_data {
                        source = source.with_no_data(never);
                    }
                    config = config.with_source(source);
                }
                Mosaic::<u8>::new(config).unwrap()
            };
            let render = |mosaic: &Mosaic<u8>| {
                let tiles: Vec<_> = rasters.iter().map(|r| SourceTile::new(r.view())).collect();
                let mut out = Raster::new(bounds, 2, 0u8);
                mosaic.compute_tile(&tiles, &mut out.view_mut(), bounds).unwrap();
                out
            };

            let plain = build(false, false);
            assert_eq!(plain.mask_case(), MaskCase::NoMask);
            let expected = render(&plain);
            for (roi, no_data, case) in [
                (true, false, MaskCase::MaskOnly),
                (false, true, MaskCase::NoDataOnly),
                (true, true, MaskCase::General),
            ] {
                let mosaic = build(roi, no_data);
                assert_eq!(mosaic.mask_case(), case, "{mosaic_type:?}");
                assert_eq!(render(&mosaic), expected, "{mosaic_type:?} {case:?}");
            }
        }
    }

    // ========================================================================
    // Tile parallelism
    // ========================================================================

    #[test]
    fn test_tiled_render_matches_single_tile() {
        let src_bounds = Rect::new(-5, 3, 37, 23);
        let src = Raster::from_fn(src_bounds, 2, |x, y, b| ((x * 31 + y * 17 + b as i32 * 5) % 1000) as u16);
        let other = Raster::from_fn(src_bounds, 2, |x, y, _| ((x ^ y) & 0xff) as u16);
        let roi = Roi::from_mask(Raster::from_fn(src_bounds, 1, |x, y, _| u8::from((x + y) % 5 != 0)), 1);

        // band combine
        let combine = BandCombine::<u16>::new(
            BandCombineConfig::new(2, vec![vec![0.5, 0.5, 1.0], vec![2.0, -1.0, 0.0]])
                .with_roi(roi.clone())
                .with_no_data(ValueRange::at_most(20)),
        )
        .unwrap();
        let grid = TileGrid::new(src_bounds, 8, 6).unwrap();
        let tiled = render_tiles(&grid, 2, |tile, dst| combine.compute_tile(&src.view(), dst, tile)).unwrap();
        let mut whole = Raster::new(src_bounds, 2, 0u16);
        combine.compute_tile(&src.view(), &mut whole.view_mut(), src_bounds).unwrap();
        assert_eq!(tiled, whole);

        // mosaic
        let mosaic = Mosaic::<u16>::new(
            MosaicConfig::new(MosaicType::Blend)
                .with_source(MosaicSource::new(2).with_roi(roi.clone()))
                .with_source(MosaicSource::new(2).with_no_data(ValueRange::point(0))),
        )
        .unwrap();
        let tiled = render_tiles(&grid, 2, |tile, dst| {
            let sources = [SourceTile::new(src.view()), SourceTile::new(other.view())];
            mosaic.compute_tile(&sources, dst, tile)
        })
        .unwrap();
        let mut whole = Raster::new(src_bounds, 2, 0u16);
        let sources = [SourceTile::new(src.view()), SourceTile::new(other.view())];
        mosaic.compute_tile(&sources, &mut whole.view_mut(), src_bounds).unwrap();
        assert_eq!(tiled, whole);

        // scale, both filters
        for interpolation in [Interpolation::Nearest, Interpolation::Bilinear] {
            let scale = Scale::<u16>::new(
                ScaleConfig::new(2, 1.7, 2.3)
                    .with_translation(0.25, -1.5)
                    .with_interpolation(interpolation)
                    .with_roi(roi.clone()),
            )
            .unwrap();
            let dst_bounds = scale.dest_bounds(src_bounds);
            let grid = TileGrid::new(dst_bounds, 7, 5).unwrap();
            let tiled = render_tiles(&grid, 2, |tile, dst| scale.compute_tile(&src.view(), dst, tile)).unwrap();
            let mut whole = Raster::new(dst_bounds, 2, 0u16);
            scale.compute_tile(&src.view(), &mut whole.view_mut(), dst_bounds).unwrap();
            assert_eq!(tiled, whole, "{interpolation:?}");
        }
    }

    #[test]
    fn test_concurrent_roi_builds_once() {
        let bounds = Rect::from_size(64, 64);
        let roi = Roi::from_mask(Raster::from_fn(bounds, 1, |x, y, _| u8::from(x > y)), 1);
        let counts: Vec<u64> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let roi = roi.clone();
                    s.spawn(move || roi.image().data().iter().map(|&v| v as u64).sum::<u64>())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(counts.iter().all(|&c| c == counts[0]));
        assert_eq!(counts[0], 64 * 63 / 2);
        assert_eq!(roi.image_builds(), 1);
    }

    // ========================================================================
    // Dither fast path
    // ========================================================================

    fn generic_twin(map: &ColorMap) -> ColorMap {
        ColorMap::from_entries((0..map.len()).map(|i| map.entry(i).to_vec()).collect()).unwrap()
    }

    fn dither_u8(map: ColorMap, src: &Raster<u8>) -> (bool, Raster<u8>) {
        let op = ErrorDiffusion::<u8, u8>::new(DitherConfig::new(map)).unwrap();
        let mut dst = Raster::new(src.bounds(), 1, 0u8);
        op.run(&src.view(), &mut dst.view_mut()).unwrap();
        (op.uses_fast_path(), dst)
    }

    #[test]
    fn test_fast_path_matches_on_level_input() {
        let bounds = Rect::from_size(16, 8);
        let src = Raster::from_fn(bounds, 3, |x, y, b| if (x + y + b as i32) % 3 == 0 { 255 } else { 0 });
        let cube = ColorMap::cube(&[2, 2, 2], 0.0, 255.0).unwrap();
        let (fast, a) = dither_u8(cube.clone(), &src);
        let (slow, b) = dither_u8(generic_twin(&cube), &src);
        assert!(fast && !slow);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fast_path_preserves_mean() {
        let bounds = Rect::from_size(256, 64);
        let src = Raster::from_fn(bounds, 3, |x, y, b| match b {
            0 => x as u8,
            1 => (y * 4) as u8,
            _ => (255 - x) as u8,
        });
        let cube = ColorMap::cube(&[2, 3, 2], 0.0, 255.0).unwrap();
        let (fast, a) = dither_u8(cube.clone(), &src);
        let (_, b) = dither_u8(generic_twin(&cube), &src);
        assert!(fast);

        let pixels = bounds.area() as f64;
        for band in 0..3 {
            let input = bounds.iter_coords().map(|(x, y)| src.get(x, y, band) as f64).sum::<f64>() / pixels;
            for out in [&a, &b] {
                let recon = bounds
                    .iter_coords()
                    .map(|(x, y)| cube.entry(out.get(x, y, 0) as usize)[band] as f64)
                    .sum::<f64>()
                    / pixels;
                assert_abs_diff_eq!(recon, input, epsilon = 3.0);
            }
        }
    }

    // ========================================================================
    // Runtime kinds and serialization
    // ========================================================================

    #[test]
    fn test_any_raster_entry_points() {
        let src = Raster::from_fn(TILE, 1, |x, _, _| x as f32 * 1.25);
        let op = Scale::<f32>::new(ScaleConfig::new(1, 1.0, 1.0)).unwrap();
        let mut out = Raster::new(TILE, 1, 0.0f32);
        {
            let mut dst: AnyRasterMut = out.view_mut().into();
            op.compute_any(&src.view().into(), &mut dst, TILE).unwrap();
        }
        assert_eq!(out, src);

        let bytes = Raster::new(TILE, 1, 1u8);
        let mut dst: AnyRasterMut = out.view_mut().into();
        assert!(op.compute_any(&bytes.view().into(), &mut dst, TILE).is_err());
    }

    #[test]
    fn test_serde_config_enums() {
        let json = serde_json::to_string(&MosaicType::Blend).unwrap();
        assert_eq!(serde_json::from_str::<MosaicType>(&json).unwrap(), MosaicType::Blend);

        for mode in [AlphaMode::Bitmask, AlphaMode::Weighted] {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(serde_json::from_str::<AlphaMode>(&json).unwrap(), mode);
        }
        for case in [MaskCase::NoMask, MaskCase::MaskOnly, MaskCase::NoDataOnly, MaskCase::General] {
            let json = serde_json::to_string(&case).unwrap();
            assert_eq!(serde_json::from_str::<MaskCase>(&json).unwrap(), case);
        }
        for kind in SampleKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(serde_json::from_str::<SampleKind>(&json).unwrap(), kind);
        }

        let interp: Interpolation = serde_json::from_str("\"Bilinear\"").unwrap();
        assert_eq!(interp, Interpolation::Bilinear);

        let rect = Rect::new(-2, 3, 10, 20);
        let json = serde_json::to_string(&rect).unwrap();
        assert_eq!(serde_json::from_str::<Rect>(&json).unwrap(), rect);
    }
}
