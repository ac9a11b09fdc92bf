//! 高斯平滑.
//!
//! 边界按 "半采样对称" 方式延拓 (`d c b a | a b c d | d c b a`),
//! 核半径为 `(truncate * sigma + 0.5)` 取整.

use crate::consts::GAUSSIAN_TRUNCATE;
use ndarray::{Array2, ArrayView2, Axis};

/// 归一化的一维高斯核, 长度为 `2 * radius + 1`.
pub fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (GAUSSIAN_TRUNCATE * sigma + 0.5) as i64;
    let mut k: Vec<f64> = (-radius..=radius)
        .map(|x| (-0.5 * (x as f64 / sigma).powi(2)).exp())
        .collect();
    let sum: f64 = k.iter().sum();
    k.iter_mut().for_each(|v| *v /= sum);
    k
}

/// 将任意整数下标以对称方式折回 `[0, n)`.
#[inline]
fn reflect(i: i64, n: usize) -> usize {
    let n = n as i64;
    let m = i.rem_euclid(2 * n);
    (if m < n { m } else { 2 * n - 1 - m }) as usize
}

/// 以 `kernel` 对 `src` 做一维卷积, 结果写入 `dst`.
fn convolve_into(src: &[f64], kernel: &[f64], dst: &mut [f64]) {
    let n = src.len();
    let radius = (kernel.len() / 2) as i64;
    for (i, out) in dst.iter_mut().enumerate() {
        *out = kernel
            .iter()
            .enumerate()
            .map(|(k, w)| w * src[reflect(i as i64 + k as i64 - radius, n)])
            .sum();
    }
}

/// 一维高斯平滑. `sigma` 不为正时原样返回.
pub fn gaussian_filter1d(src: &[f64], sigma: f64) -> Vec<f64> {
    if src.is_empty() || sigma <= 0.0 {
        return src.to_vec();
    }
    let kernel = gaussian_kernel(sigma);
    let mut dst = vec![0.0; src.len()];
    convolve_into(src, &kernel, &mut dst);
    dst
}

/// 二维各向同性高斯平滑 (先逐列, 后逐行). `sigma` 不为正时原样返回.
pub fn gaussian_filter2d(src: &ArrayView2<f32>, sigma: f64) -> Array2<f32> {
    let mut out = src.mapv(f64::from);
    if sigma > 0.0 && !out.is_empty() {
        let kernel = gaussian_kernel(sigma);
        for axis in [Axis(0), Axis(1)] {
            for mut lane in out.lanes_mut(axis) {
                let line: Vec<f64> = lane.iter().copied().collect();
                let mut smoothed = vec![0.0; line.len()];
                convolve_into(&line, &kernel, &mut smoothed);
                lane.iter_mut().zip(smoothed).for_each(|(o, s)| *o = s);
            }
        }
    }
    out.mapv(|v| v as f32)
}
