use super::*;
use crate::buffers::extract::DEPTH_NO_HIT;
use crate::film::passes::{AovType, PassLayout};

fn params(width: u32, height: u32, passes: PassLayout) -> BufferParams {
    BufferParams {
        width,
        height,
        full_x: 0,
        full_y: 0,
        full_width: width,
        full_height: height,
        passes,
    }
}

/// Allocate, let `fill` play the accumulation kernel for every pixel, then sync to host.
fn accumulate(
    p: &BufferParams,
    fill: impl Fn(usize, &mut [f32]),
) -> RenderBuffers<HostMemory<f32>> {
    let mut rb = RenderBuffers::new_host();
    rb.reset(p).unwrap();
    let stride = p.passes.size();
    let device = rb.buffer_mut().device_mut().unwrap();
    for (i, px) in device.chunks_mut(stride).enumerate() {
        fill(i, px);
    }
    assert!(rb.copy_from_device().unwrap());
    rb
}

fn offset_of(p: &BufferParams, kind: PassType) -> usize {
    p.passes.get_pass(kind).unwrap().offset
}

#[test]
fn reset_allocates_exact_size_and_zeroes() {
    let p = params(3, 2, PassLayout::with_passes([PassType::Combined, PassType::Depth]));
    let mut rb = RenderBuffers::new_host();
    rb.reset(&p).unwrap();
    assert_eq!(rb.buffer().len(), 3 * 2 * 5);
    assert_eq!(rb.params(), &p);

    rb.buffer_mut().device_mut().unwrap().fill(3.0);
    rb.zero().unwrap();
    rb.copy_from_device().unwrap();
    assert!(rb.buffer().host().iter().all(|v| *v == 0.0));
}

#[test]
fn failed_reset_leaves_buffers_empty() {
    let small = params(2, 2, PassLayout::with_passes([PassType::Combined]));
    let mut rb = accumulate(&small, |_, px| px.fill(1.0));

    let huge = params(1 << 31, 1 << 31, PassLayout::with_passes([PassType::Combined]));
    assert!(rb.reset(&huge).is_err());
    assert_eq!(rb.params(), &BufferParams::default());
    assert!(!rb.buffer().is_allocated());

    let mut out = [0.0f32; 16];
    assert!(!rb.get_pass_rect(PassType::Combined, 1.0, 1, 4, &mut out));
}

#[test]
fn copy_from_unallocated_device_is_a_noop() {
    let mut rb = RenderBuffers::new_host();
    assert!(!rb.copy_from_device().unwrap());
}

#[test]
fn absent_pass_or_aov_returns_false() {
    let p = params(1, 1, PassLayout::with_passes([PassType::Combined]));
    let rb = accumulate(&p, |_, _| {});
    let mut out = [0.0f32; 4];
    assert!(!rb.get_pass_rect(PassType::Mist, 1.0, 1, 1, &mut out));
    assert!(!rb.get_aov_rect("missing", 1.0, 1, 1, &mut out));
    assert!(!rb.get_denoising_pass_rect(DenoisingFeature::Color, 1.0, 1, 3, &mut out));
}

#[test]
fn unit_sample_and_exposure_round_trips_raw_values() {
    let p = params(2, 2, PassLayout::with_passes([PassType::Mist, PassType::ObjectId]));
    let mist = offset_of(&p, PassType::Mist);
    let object = offset_of(&p, PassType::ObjectId);
    let rb = accumulate(&p, |i, px| {
        px[mist] = 0.1 * i as f32;
        px[object] = 7.0 + i as f32;
    });

    let mut out = [0.0f32; 4];
    assert!(rb.get_pass_rect(PassType::Mist, 1.0, 1, 1, &mut out));
    let expected: [f32; 4] = std::array::from_fn(|i| 0.1 * i as f32);
    assert_eq!(out, expected);

    // Not filtered: the sample count is ignored.
    assert!(rb.get_pass_rect(PassType::ObjectId, 1.0, 16, 1, &mut out));
    assert_eq!(out, [7.0, 8.0, 9.0, 10.0]);
}

#[test]
fn depth_zero_means_no_hit_regardless_of_scaling() {
    let p = params(3, 1, PassLayout::with_passes([PassType::Depth]));
    let raw = [0.0f32, 8.0, 3.0];
    let rb = accumulate(&p, |i, px| px[0] = raw[i]);

    for (sample, exposure) in [(1u32, 1.0f32), (4, 2.0), (16, 0.5)] {
        let mut out = [0.0f32; 3];
        assert!(rb.get_pass_rect(PassType::Depth, exposure, sample, 1, &mut out));
        assert_eq!(out[0], DEPTH_NO_HIT);
        assert_eq!(out[1], 8.0 / sample as f32);
        assert_eq!(out[2], 3.0 / sample as f32);
    }
}

#[test]
fn mist_is_always_saturated() {
    let p = params(5, 1, PassLayout::with_passes([PassType::Mist]));
    let raw = [-4.0f32, 0.5, 3.0, 1e9, f32::NAN];
    let rb = accumulate(&p, |i, px| px[0] = raw[i]);

    for sample in [1u32, 2, 7, 1000] {
        let mut out = [0.0f32; 5];
        assert!(rb.get_pass_rect(PassType::Mist, 1.0, sample, 1, &mut out));
        assert!(out.iter().all(|v| (0.0..=1.0).contains(v)), "{out:?}");
    }
}

#[test]
fn debug_passes_ignore_exposure() {
    let p = params(1, 1, PassLayout::with_passes([PassType::RayBounces]));
    let rb = accumulate(&p, |_, px| px[0] = 12.0);
    let mut out = [0.0f32; 1];
    assert!(rb.get_pass_rect(PassType::RayBounces, 5.0, 4, 1, &mut out));
    assert_eq!(out, [3.0]);
}

#[test]
fn shadow_divides_by_weight_when_positive() {
    let p = params(2, 1, PassLayout::with_passes([PassType::Shadow]));
    let raw = [[2.0f32, 4.0, 6.0, 2.0], [2.0, 4.0, 6.0, 0.0]];
    let rb = accumulate(&p, |i, px| px[..4].copy_from_slice(&raw[i]));

    let mut rgb = [0.0f32; 6];
    assert!(rb.get_pass_rect(PassType::Shadow, 3.0, 5, 3, &mut rgb));
    assert_eq!(rgb, [1.0, 2.0, 3.0, 2.0, 4.0, 6.0]);

    let mut rgba = [0.0f32; 8];
    assert!(rb.get_pass_rect(PassType::Shadow, 3.0, 5, 4, &mut rgba));
    assert_eq!(rgba, [1.0, 2.0, 3.0, 1.0, 2.0, 4.0, 6.0, 1.0]);
}

#[test]
fn lighting_pass_is_divided_by_its_color_without_rescaling() {
    let p = params(
        1,
        1,
        PassLayout::with_passes([PassType::DiffuseDirect, PassType::DiffuseColor]),
    );
    let light = offset_of(&p, PassType::DiffuseDirect);
    let color = offset_of(&p, PassType::DiffuseColor);
    let rb = accumulate(&p, |_, px| {
        px[light..light + 4].copy_from_slice(&[4.0, 6.0, 8.0, 1.0]);
        px[color..color + 4].copy_from_slice(&[2.0, 0.0, 4.0, 1.0]);
    });

    let mut out = [0.0f32; 3];
    // Sample count must not matter: the ratio cancels it.
    assert!(rb.get_pass_rect(PassType::DiffuseDirect, 2.0, 9, 3, &mut out));
    // (8, 12, 16) / (2, 0, 4) -> (4, 0, 4), then the zero channel takes the mean.
    assert_eq!(out, [4.0, 4.0, 4.0]);
}

#[test]
fn lighting_pass_without_companion_is_absent() {
    let p = params(1, 1, PassLayout::with_passes([PassType::GlossyDirect]));
    let rb = accumulate(&p, |_, px| px.fill(1.0));
    let mut out = [0.0f32; 3];
    assert!(!rb.get_pass_rect(PassType::GlossyDirect, 1.0, 1, 3, &mut out));
}

#[test]
fn motion_is_normalized_by_its_weight_pass() {
    let p = params(
        2,
        1,
        PassLayout::with_passes([PassType::Motion, PassType::MotionWeight]),
    );
    let motion = offset_of(&p, PassType::Motion);
    let weight = offset_of(&p, PassType::MotionWeight);
    let rb = accumulate(&p, |i, px| {
        px[motion..motion + 4].copy_from_slice(&[4.0, -8.0, 2.0, 6.0]);
        px[weight] = if i == 0 { 2.0 } else { 0.0 };
    });

    let mut out = [9.0f32; 8];
    assert!(rb.get_pass_rect(PassType::Motion, 10.0, 64, 4, &mut out));
    assert_eq!(out, [2.0, -4.0, 1.0, 3.0, 0.0, 0.0, 0.0, 0.0]);
}

#[test]
fn rgba_clamps_alpha_but_not_color() {
    let p = params(1, 1, PassLayout::with_passes([PassType::Combined]));
    let rb = accumulate(&p, |_, px| px.copy_from_slice(&[8.0, 4.0, 2.0, 6.0]));

    let mut out = [0.0f32; 4];
    assert!(rb.get_pass_rect(PassType::Combined, 2.0, 2, 4, &mut out));
    assert_eq!(out, [8.0, 4.0, 2.0, 1.0]);

    let mut rgb = [0.0f32; 3];
    assert!(rb.get_pass_rect(PassType::Combined, 0.5, 2, 3, &mut rgb));
    assert_eq!(rgb, [2.0, 1.0, 0.5]);
}

#[test]
fn non_exposure_pass_ignores_exposure() {
    let p = params(1, 1, PassLayout::with_passes([PassType::Normal]));
    let rb = accumulate(&p, |_, px| px.copy_from_slice(&[2.0, 4.0, -6.0, 0.0]));
    let mut out = [0.0f32; 3];
    assert!(rb.get_pass_rect(PassType::Normal, 100.0, 2, 3, &mut out));
    assert_eq!(out, [1.0, 2.0, -3.0]);
}

#[test]
fn resolved_descriptor_matches_lookup_path() {
    let p = params(4, 4, PassLayout::with_passes([PassType::Combined, PassType::Ao]));
    let rb = accumulate(&p, |i, px| {
        for (c, v) in px.iter_mut().enumerate() {
            *v = (i * 8 + c) as f32;
        }
    });
    let resolved = p.passes.get_pass(PassType::Ao).unwrap();

    let mut a = vec![0.0f32; 16 * 4];
    let mut b = vec![0.0f32; 16 * 4];
    assert!(rb.get_pass_rect(PassType::Ao, 1.0, 3, 4, &mut a));
    assert!(rb.get_resolved_pass_rect(&resolved, 1.0, 3, 4, &mut b));
    assert_eq!(a, b);
}

#[test]
#[should_panic(expected = "scalar extraction requested")]
fn scalar_extraction_of_color_pass_is_a_contract_violation() {
    let p = params(1, 1, PassLayout::with_passes([PassType::Combined]));
    let rb = accumulate(&p, |_, _| {});
    let mut out = [0.0f32; 1];
    rb.get_pass_rect(PassType::Combined, 1.0, 1, 1, &mut out);
}

#[test]
#[should_panic(expected = "RGB extraction needs 4")]
fn rgb_extraction_of_scalar_pass_is_a_contract_violation() {
    let p = params(1, 1, PassLayout::with_passes([PassType::Depth]));
    let rb = accumulate(&p, |_, _| {});
    let mut out = [0.0f32; 3];
    rb.get_pass_rect(PassType::Depth, 1.0, 1, 3, &mut out);
}

#[test]
#[should_panic(expected = "unsupported component count 2")]
fn two_component_extraction_is_a_contract_violation() {
    let p = params(1, 1, PassLayout::with_passes([PassType::Combined]));
    let rb = accumulate(&p, |_, _| {});
    let mut out = [0.0f32; 2];
    rb.get_pass_rect(PassType::Combined, 1.0, 1, 2, &mut out);
}

fn denoising_params(store_clean: bool) -> BufferParams {
    let mut layout = PassLayout::with_passes([PassType::Combined]);
    layout.enable_denoising(store_clean);
    params(2, 1, layout)
}

#[test]
fn variance_is_reconstructed_from_mean_and_square_sums() {
    let p = denoising_params(false);
    let base = p.passes.denoising_offset().unwrap();
    let depth = base + DenoisingFeature::Depth.offset() as usize;
    // Pixel 0: samples {1, 3} -> m = 4, q = 10. Pixel 1: q below m^2/n, clamps to 0.
    let rb = accumulate(&p, |i, px| {
        let (m, q) = if i == 0 { (4.0, 10.0) } else { (4.0, 1.0) };
        px[depth] = m;
        px[depth + 1] = q;
    });

    let mut out = [0.0f32; 2];
    assert!(rb.get_denoising_pass_rect(DenoisingFeature::DepthVar, 1.0, 2, 1, &mut out));
    assert_eq!(out[0], (10.0 - 16.0 / 2.0) / 2.0);
    assert_eq!(out[1], 0.0);

    assert!(rb.get_denoising_pass_rect(DenoisingFeature::Depth, 1.0, 2, 1, &mut out));
    assert_eq!(out, [2.0, 2.0]);
}

#[test]
fn color_features_take_exposure_and_its_square() {
    let p = denoising_params(false);
    let base = p.passes.denoising_offset().unwrap();
    let color = base + DenoisingFeature::Color.offset() as usize;
    let color_var = base + DenoisingFeature::ColorVar.offset() as usize;
    let rb = accumulate(&p, |_, px| {
        px[color..color + 3].copy_from_slice(&[2.0, 2.0, 2.0]);
        px[color_var..color_var + 3].copy_from_slice(&[6.0, 6.0, 6.0]);
    });

    let mut out = [0.0f32; 6];
    assert!(rb.get_denoising_pass_rect(DenoisingFeature::Color, 3.0, 2, 3, &mut out));
    assert_eq!(out, [3.0; 6]);

    // max(0, 6 - 4/2) * (1/2) * 3^2
    assert!(rb.get_denoising_pass_rect(DenoisingFeature::ColorVar, 3.0, 2, 3, &mut out));
    assert_eq!(out, [18.0; 6]);
}

#[test]
fn denoising_rejects_unsupported_component_counts_and_missing_clean() {
    let p = denoising_params(false);
    let rb = accumulate(&p, |_, _| {});
    let mut out = [0.0f32; 8];
    assert!(!rb.get_denoising_pass_rect(DenoisingFeature::Normal, 1.0, 1, 4, &mut out));
    assert!(!rb.get_denoising_pass_rect(DenoisingFeature::Normal, 1.0, 1, 2, &mut out));
    assert!(!rb.get_denoising_pass_rect(DenoisingFeature::Clean, 1.0, 1, 3, &mut out));

    let with_clean = accumulate(&denoising_params(true), |_, _| {});
    assert!(with_clean.get_denoising_pass_rect(DenoisingFeature::Clean, 1.0, 1, 3, &mut out));
}

fn aov_params() -> BufferParams {
    let mut layout = PassLayout::with_passes([PassType::Combined]);
    layout.add_aov("density", AovType::Float).unwrap();
    layout.add_aov("tint", AovType::Rgb).unwrap();
    layout.add_aov("crypto", AovType::Cryptomatte).unwrap();
    params(2, 1, layout)
}

#[test]
fn float_and_color_aovs_scale_differently() {
    let p = aov_params();
    let density = p.passes.get_aov("density").unwrap().offset;
    let tint = p.passes.get_aov("tint").unwrap().offset;
    let rb = accumulate(&p, |_, px| {
        px[density] = 8.0;
        px[tint..tint + 3].copy_from_slice(&[4.0, 8.0, 12.0]);
    });

    let mut f = [0.0f32; 2];
    assert!(rb.get_aov_rect("density", 10.0, 4, 1, &mut f));
    assert_eq!(f, [2.0, 2.0]);

    let mut c = [0.0f32; 6];
    assert!(rb.get_aov_rect("tint", 2.0, 4, 3, &mut c));
    assert_eq!(c, [2.0, 4.0, 6.0, 2.0, 4.0, 6.0]);
}

#[test]
fn cryptomatte_sorts_two_layers_by_weight() {
    let p = aov_params();
    let crypto = p.passes.get_aov("crypto").unwrap().offset;
    let rb = accumulate(&p, |i, px| {
        let raw = if i == 0 {
            [11.0, 6.0, 22.0, 2.0]
        } else {
            [11.0, 2.0, 22.0, 6.0]
        };
        px[crypto..crypto + 4].copy_from_slice(&raw);
    });

    let mut out = [0.0f32; 8];
    assert!(rb.get_aov_rect("crypto", 5.0, 2, 4, &mut out));
    assert_eq!(&out[..4], &[11.0, 3.0, 22.0, 1.0]);
    assert_eq!(&out[4..], &[22.0, 3.0, 11.0, 1.0]);
}

#[test]
fn cryptomatte_tie_keeps_first_layer_first() {
    let p = aov_params();
    let crypto = p.passes.get_aov("crypto").unwrap().offset;
    let rb = accumulate(&p, |_, px| {
        px[crypto..crypto + 4].copy_from_slice(&[1.0, 4.0, 2.0, 4.0]);
    });
    let mut out = [0.0f32; 8];
    assert!(rb.get_aov_rect("crypto", 1.0, 1, 4, &mut out));
    assert_eq!(&out[..4], &[1.0, 4.0, 2.0, 4.0]);
}

#[test]
#[should_panic(expected = "is not a float AOV")]
fn aov_type_mismatch_is_a_contract_violation() {
    let p = aov_params();
    let rb = accumulate(&p, |_, _| {});
    let mut out = [0.0f32; 2];
    rb.get_aov_rect("tint", 1.0, 1, 1, &mut out);
}

#[test]
#[should_panic(expected = "sample count must be at least 1")]
fn zero_samples_is_a_contract_violation() {
    let p = params(1, 1, PassLayout::with_passes([PassType::Combined]));
    let rb = accumulate(&p, |_, _| {});
    let mut out = [0.0f32; 4];
    rb.get_pass_rect(PassType::Combined, 1.0, 0, 4, &mut out);
}

#[test]
#[should_panic(expected = "output holds")]
fn short_output_is_a_contract_violation() {
    let p = params(2, 2, PassLayout::with_passes([PassType::Depth]));
    let rb = accumulate(&p, |_, _| {});
    let mut out = [0.0f32; 3];
    rb.get_pass_rect(PassType::Depth, 1.0, 1, 1, &mut out);
}
