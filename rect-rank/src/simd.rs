//! Vectorized membership tests.
//!
//! Two entry points: a rectangle scan over the linear tier's coordinate
//! arrays and a one-axis band scan over a shard slice. Both dispatch to an
//! AVX path at runtime on x86/x86_64 and fall back to scalar loops that
//! produce identical results elsewhere. NaN fails every comparison in both
//! paths, which is what makes NaN padding lanes and NaN rectangle bounds
//! safe.

use crate::types::{RankHeap, Rect};

/// Append to `out` the index of every position whose `(xs[i], ys[i])` lies
/// inside `rect`, in ascending index order, stopping once `out` holds
/// `limit` entries.
///
/// Both arrays must be 64-byte aligned and of equal length, a multiple of
/// the 8-lane block width; the builder pads them with NaN.
pub(crate) fn scan_rect(xs: &[f32], ys: &[f32], rect: &Rect, limit: usize, out: &mut Vec<u32>) {
    debug_assert_eq!(xs.len(), ys.len());
    debug_assert_eq!(xs.len() % 8, 0);

    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    if is_x86_feature_detected!("avx") {
        return unsafe { x86::scan_rect(xs, ys, rect, limit, out) };
    }

    for i in 0..xs.len() {
        if rect.contains(xs[i], ys[i]) {
            out.push(i as u32);
            if out.len() == limit {
                return;
            }
        }
    }
}

/// Push into `heap` the origin of every position with `lo <= keys[i] <= hi`.
///
/// `keys` and `origins` are parallel slices into a shard; they may start at
/// any offset within their 64-byte-aligned backing arrays.
pub(crate) fn scan_band(keys: &[f32], origins: &[u32], lo: f32, hi: f32, heap: &mut RankHeap) {
    debug_assert_eq!(keys.len(), origins.len());

    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    if is_x86_feature_detected!("avx") {
        return unsafe { x86::scan_band(keys, origins, lo, hi, heap) };
    }

    for (&key, &origin) in keys.iter().zip(origins) {
        if lo <= key && key <= hi {
            heap.push(origin);
        }
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
mod x86 {
    #[cfg(target_arch = "x86")]
    use std::arch::x86::*;
    #[cfg(target_arch = "x86_64")]
    use std::arch::x86_64::*;

    use crate::types::{RankHeap, Rect};

    #[target_feature(enable = "avx")]
    pub(super) unsafe fn scan_rect(
        xs: &[f32],
        ys: &[f32],
        rect: &Rect,
        limit: usize,
        out: &mut Vec<u32>,
    ) {
        let lx = _mm256_set1_ps(rect.lx);
        let hx = _mm256_set1_ps(rect.hx);
        let ly = _mm256_set1_ps(rect.ly);
        let hy = _mm256_set1_ps(rect.hy);

        let mut i = 0;
        while i < xs.len() {
            let x = _mm256_load_ps(xs.as_ptr().add(i));
            let y = _mm256_load_ps(ys.as_ptr().add(i));
            let x_in = _mm256_and_ps(
                _mm256_cmp_ps::<_CMP_LE_OQ>(lx, x),
                _mm256_cmp_ps::<_CMP_LE_OQ>(x, hx),
            );
            let y_in = _mm256_and_ps(
                _mm256_cmp_ps::<_CMP_LE_OQ>(ly, y),
                _mm256_cmp_ps::<_CMP_LE_OQ>(y, hy),
            );

            if _mm256_testz_ps(x_in, y_in) == 0 {
                let mut mask = _mm256_movemask_ps(_mm256_and_ps(x_in, y_in)) as u32;
                while mask != 0 {
                    let lane = mask.trailing_zeros() as usize;
                    out.push((i + lane) as u32);
                    if out.len() == limit {
                        return;
                    }
                    mask &= mask - 1;
                }
            }
            i += 8;
        }
    }

    #[target_feature(enable = "avx")]
    pub(super) unsafe fn scan_band(
        keys: &[f32],
        origins: &[u32],
        lo: f32,
        hi: f32,
        heap: &mut RankHeap,
    ) {
        // Scalar prefix until the key pointer is 32-byte aligned, so the
        // block loop can use aligned loads.
        let mut i = 0;
        while i < keys.len() && keys.as_ptr().add(i) as usize % 32 != 0 {
            if lo <= keys[i] && keys[i] <= hi {
                heap.push(origins[i]);
            }
            i += 1;
        }

        let vlo = _mm256_set1_ps(lo);
        let vhi = _mm256_set1_ps(hi);
        while i + 8 <= keys.len() {
            let k = _mm256_load_ps(keys.as_ptr().add(i));
            let lo_in = _mm256_cmp_ps::<_CMP_LE_OQ>(vlo, k);
            let hi_in = _mm256_cmp_ps::<_CMP_LE_OQ>(k, vhi);

            if _mm256_testz_ps(lo_in, hi_in) == 0 {
                let mut mask = _mm256_movemask_ps(_mm256_and_ps(lo_in, hi_in)) as u32;
                while mask != 0 {
                    let lane = mask.trailing_zeros() as usize;
                    heap.push(origins[i + lane]);
                    mask &= mask - 1;
                }
            }
            i += 8;
        }

        for j in i..keys.len() {
            if lo <= keys[j] && keys[j] <= hi {
                heap.push(origins[j]);
            }
        }
    }
}
