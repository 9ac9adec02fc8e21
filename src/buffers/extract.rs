//! Decoding of interleaved accumulation data into plain pixel rectangles.
//!
//! The render buffer stores `pass_stride` floats per pixel; each pass occupies a fixed
//! window of that stride. Decoders walk one window per pass with a [`StridedView`] and write
//! `components` floats per pixel into the caller's output, one pixel per rayon task chunk.

use rayon::prelude::*;

use crate::film::passes::{AovType, DenoisingFeature, PassType, ResolvedAov, ResolvedPass};
use crate::foundation::math::{safe_divide_even_color, saturate};
use crate::foundation::strided::StridedView;

/// Decoded depth of pixels whose camera ray hit nothing.
pub const DEPTH_NO_HIT: f32 = 1e10;

/// Host-side accumulation data of one tile.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PassSource<'a> {
    pub(crate) data: &'a [f32],
    pub(crate) stride: usize,
    pub(crate) pixels: usize,
}

impl<'a> PassSource<'a> {
    fn view(&self, offset: usize, width: usize) -> StridedView<'a, f32> {
        StridedView::new(self.data, offset, self.stride as isize, width, self.pixels)
    }
}

fn decode<F>(out: &mut [f32], components: usize, pixels: usize, f: F)
where
    F: Fn(usize, &mut [f32]) + Sync + Send,
{
    let len = pixels * components;
    assert!(
        out.len() >= len,
        "output holds {} floats, {pixels} pixels x {components} components needed",
        out.len()
    );
    out[..len]
        .par_chunks_mut(components)
        .enumerate()
        .for_each(|(i, px)| f(i, px));
}

fn inv_sample(sample: u32) -> f32 {
    assert!(sample > 0, "sample count must be at least 1");
    1.0 / sample as f32
}

pub(crate) fn pass_rect(
    src: PassSource<'_>,
    resolved: &ResolvedPass,
    exposure: f32,
    sample: u32,
    components: usize,
    out: &mut [f32],
) -> bool {
    let pass = resolved.pass;
    let scale = if pass.filter { inv_sample(sample) } else { 1.0 };
    let scale_exposure = if pass.exposure { scale * exposure } else { scale };
    let n = src.pixels;

    match components {
        1 => {
            assert_eq!(
                pass.components, 1,
                "{:?} stores {} components, scalar extraction requested",
                pass.kind, pass.components
            );
            let input = src.view(resolved.offset, 1);
            match pass.kind {
                PassType::Depth => decode(out, 1, n, |i, px| {
                    let f = input.get(i)[0];
                    px[0] = if f == 0.0 { DEPTH_NO_HIT } else { f * scale_exposure };
                }),
                PassType::Mist => decode(out, 1, n, |i, px| {
                    px[0] = saturate(input.get(i)[0] * scale_exposure);
                }),
                kind if kind.is_debug() => decode(out, 1, n, |i, px| {
                    px[0] = input.get(i)[0] * scale;
                }),
                _ => decode(out, 1, n, |i, px| {
                    px[0] = input.get(i)[0] * scale_exposure;
                }),
            }
        }
        3 => {
            assert_eq!(
                pass.components, 4,
                "{:?} stores {} components, RGB extraction needs 4",
                pass.kind, pass.components
            );
            let input = src.view(resolved.offset, 4);
            if pass.kind == PassType::Shadow {
                decode(out, 3, n, |i, px| {
                    let f = input.get(i);
                    let invw = if f[3] > 0.0 { 1.0 / f[3] } else { 1.0 };
                    px[0] = f[0] * invw;
                    px[1] = f[1] * invw;
                    px[2] = f[2] * invw;
                });
            } else if let Some(divide) = pass.divide {
                let Some(divide_offset) = resolved.divide_offset else {
                    tracing::warn!(
                        pass = ?pass.kind,
                        companion = ?divide,
                        "divide pass not enabled"
                    );
                    return false;
                };
                let color = src.view(divide_offset, 3);
                decode(out, 3, n, |i, px| {
                    let f = input.get(i);
                    let d = color.get(i);
                    let rgb = safe_divide_even_color(
                        [f[0] * exposure, f[1] * exposure, f[2] * exposure],
                        [d[0], d[1], d[2]],
                    );
                    px.copy_from_slice(&rgb);
                });
            } else {
                decode(out, 3, n, |i, px| {
                    let f = input.get(i);
                    px[0] = f[0] * scale_exposure;
                    px[1] = f[1] * scale_exposure;
                    px[2] = f[2] * scale_exposure;
                });
            }
        }
        4 => {
            assert_eq!(
                pass.components, 4,
                "{:?} stores {} components, RGBA extraction requested",
                pass.kind, pass.components
            );
            let input = src.view(resolved.offset, 4);
            match pass.kind {
                PassType::Shadow => decode(out, 4, n, |i, px| {
                    let f = input.get(i);
                    let invw = if f[3] > 0.0 { 1.0 / f[3] } else { 1.0 };
                    px[0] = f[0] * invw;
                    px[1] = f[1] * invw;
                    px[2] = f[2] * invw;
                    px[3] = 1.0;
                }),
                PassType::Motion => {
                    let Some(weight_offset) = resolved.motion_weight_offset else {
                        tracing::warn!("motion pass requested without motion weight pass");
                        return false;
                    };
                    let weight = src.view(weight_offset, 1);
                    decode(out, 4, n, |i, px| {
                        let f = input.get(i);
                        let w = weight.get(i)[0];
                        let invw = if w > 0.0 { 1.0 / w } else { 0.0 };
                        for (o, v) in px.iter_mut().zip(f) {
                            *o = v * invw;
                        }
                    });
                }
                _ => decode(out, 4, n, |i, px| {
                    let f = input.get(i);
                    px[0] = f[0] * scale_exposure;
                    px[1] = f[1] * scale_exposure;
                    px[2] = f[2] * scale_exposure;
                    // Stochastic path termination can push accumulated alpha past 1.
                    px[3] = saturate(f[3] * scale);
                }),
            }
        }
        _ => panic!(
            "unsupported component count {components} for pass {:?}",
            pass.kind
        ),
    }
    true
}

pub(crate) fn denoising_rect(
    src: PassSource<'_>,
    block_offset: usize,
    feature: DenoisingFeature,
    exposure: f32,
    sample: u32,
    components: usize,
    out: &mut [f32],
) -> bool {
    if components != 1 && components != 3 {
        return false;
    }

    let invsample = inv_sample(sample);
    let scale = match feature {
        DenoisingFeature::Color => invsample * exposure,
        DenoisingFeature::ColorVar => invsample * exposure * exposure,
        _ => invsample,
    };
    let offset = block_offset + feature.offset() as usize;
    let n = src.pixels;

    if feature.is_variance() {
        // Variance is approximated as E[x^2] - E[x]^2 / N from the adjacent mean slot,
        // since an online update does not combine with atomic accumulation.
        assert!(offset >= components, "variance slot without a mean before it");
        let mean = src.view(offset - components, components);
        let var = src.view(offset, components);
        decode(out, components, n, |i, px| {
            let m = mean.get(i);
            let q = var.get(i);
            for ((o, q), m) in px.iter_mut().zip(q).zip(m) {
                *o = (q - m * m * invsample).max(0.0) * scale;
            }
        });
    } else {
        let input = src.view(offset, components);
        decode(out, components, n, |i, px| {
            for (o, v) in px.iter_mut().zip(input.get(i)) {
                *o = v * scale;
            }
        });
    }
    true
}

pub(crate) fn aov_rect(
    src: PassSource<'_>,
    resolved: &ResolvedAov,
    exposure: f32,
    sample: u32,
    components: usize,
    out: &mut [f32],
) -> bool {
    let kind = resolved.aov.kind;
    let invsample = inv_sample(sample);
    // Only color AOVs are exposure-scaled.
    let scale = match kind {
        AovType::Rgb => exposure * invsample,
        AovType::Float | AovType::Cryptomatte => invsample,
    };
    let n = src.pixels;

    match components {
        1 => {
            assert_eq!(kind, AovType::Float, "AOV '{}' is not a float AOV", resolved.aov.name);
            let input = src.view(resolved.offset, 1);
            decode(out, 1, n, |i, px| px[0] = input.get(i)[0] * scale);
        }
        3 => {
            assert_eq!(kind, AovType::Rgb, "AOV '{}' is not a color AOV", resolved.aov.name);
            let input = src.view(resolved.offset, 3);
            decode(out, 3, n, |i, px| {
                let f = input.get(i);
                px[0] = f[0] * scale;
                px[1] = f[1] * scale;
                px[2] = f[2] * scale;
            });
        }
        4 => {
            assert_eq!(
                kind,
                AovType::Cryptomatte,
                "AOV '{}' is not a cryptomatte AOV",
                resolved.aov.name
            );
            let input = src.view(resolved.offset, 4);
            // Fixed two-layer sort, heavier layer first.
            decode(out, 4, n, |i, px| {
                let f = input.get(i);
                let (first, second) = if f[1] >= f[3] {
                    ((f[0], f[1]), (f[2], f[3]))
                } else {
                    ((f[2], f[3]), (f[0], f[1]))
                };
                px[0] = first.0;
                px[1] = first.1 * scale;
                px[2] = second.0;
                px[3] = second.1 * scale;
            });
        }
        _ => panic!(
            "unsupported component count {components} for AOV '{}'",
            resolved.aov.name
        ),
    }
    true
}
