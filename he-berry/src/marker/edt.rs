//! 精确欧氏距离变换 (Felzenszwalb-Huttenlocher 下包络法).

use crate::data::MaskSlice;
use crate::consts::gray::is_foreground;
use ndarray::{s, Array2, Axis};

/// 一维平方距离变换. `f[i]` 为 0 (背景) 或正无穷 (前景).
/// 整行都是前景时输出保持为正无穷.
fn dt1d(f: &[f64], out: &mut [f64]) {
    // 下包络中的抛物线顶点, 及每条抛物线生效区间的左端点.
    let mut v: Vec<usize> = Vec::with_capacity(f.len());
    let mut z: Vec<f64> = Vec::with_capacity(f.len());

    let sect = |p: usize, q: usize| -> f64 {
        let (p2, q2) = ((p * p) as f64, (q * q) as f64);
        ((f[q] + q2) - (f[p] + p2)) / (2.0 * (q as f64 - p as f64))
    };

    for q in (0..f.len()).filter(|q| f[*q].is_finite()) {
        let mut s = f64::NEG_INFINITY;
        while let Some(&p) = v.last() {
            s = sect(p, q);
            if s <= *z.last().unwrap_or(&f64::NEG_INFINITY) {
                v.pop();
                z.pop();
            } else {
                break;
            }
        }
        v.push(q);
        z.push(if v.len() == 1 { f64::NEG_INFINITY } else { s });
    }

    if v.is_empty() {
        out.iter_mut().for_each(|o| *o = f64::INFINITY);
        return;
    }
    let mut k = 0usize;
    for (q, o) in out.iter_mut().enumerate() {
        while k + 1 < v.len() && z[k + 1] < q as f64 {
            k += 1;
        }
        let d = q as f64 - v[k] as f64;
        *o = d * d + f[v[k]];
    }
}

/// 对二维平方距离数组 `g` 先逐列, 后逐行做一维变换.
fn dt2d(g: &mut Array2<f64>) {
    for axis in [Axis(0), Axis(1)] {
        for mut lane in g.lanes_mut(axis) {
            let line: Vec<f64> = lane.iter().copied().collect();
            let mut out = vec![0.0; line.len()];
            dt1d(&line, &mut out);
            lane.iter_mut().zip(out).for_each(|(o, d)| *o = d);
        }
    }
}

/// 每个前景像素到最近背景像素的欧氏距离, 背景为 0.
///
/// 掩码中没有任何背景像素时, 视图像外一圈为背景, 即度量到图像边框外的距离.
pub fn euclidean_distance(mask: &MaskSlice) -> Array2<f32> {
    let (h, w) = mask.shape();
    let has_background = mask.iter().any(|p| !is_foreground(*p));

    let mut g = if has_background {
        mask.array_view()
            .mapv(|p| if is_foreground(p) { f64::INFINITY } else { 0.0 })
    } else {
        let mut padded = Array2::zeros((h + 2, w + 2));
        padded
            .slice_mut(s![1..h + 1, 1..w + 1])
            .fill(f64::INFINITY);
        padded
    };
    dt2d(&mut g);

    let g = if has_background {
        g
    } else {
        g.slice(s![1..h + 1, 1..w + 1]).to_owned()
    };
    g.mapv(|d| d.sqrt() as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OwnedMask;

    fn f32_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    /// 暴力计算, 用于对照.
    fn brute(mask: &Array2<u8>) -> Array2<f32> {
        let bg: Vec<_> = mask
            .indexed_iter()
            .filter_map(|(p, v)| (*v == 0).then_some(p))
            .collect();
        Array2::from_shape_fn(mask.dim(), |(i, j)| {
            if mask[(i, j)] == 0 {
                return 0.0;
            }
            bg.iter()
                .map(|&(a, b)| {
                    let (di, dj) = (i as f64 - a as f64, j as f64 - b as f64);
                    (di * di + dj * dj).sqrt()
                })
                .fold(f64::INFINITY, f64::min) as f32
        })
    }

    #[test]
    fn test_edt_matches_brute_force() {
        let mut a = Array2::zeros((9, 11));
        for i in 1..8 {
            for j in 2..10 {
                a[(i, j)] = 255u8;
            }
        }
        a[(4, 5)] = 0;
        a[(2, 8)] = 0;
        let d = euclidean_distance(&OwnedMask::from_raw(a.clone()).as_immut());
        let b = brute(&a);
        for (x, y) in d.iter().zip(b.iter()) {
            assert!(f32_eq(*x, *y), "{x} != {y}");
        }
    }

    #[test]
    fn test_edt_degenerate() {
        let empty = OwnedMask::background((4, 4));
        assert!(euclidean_distance(&empty.as_immut()).iter().all(|v| *v == 0.0));

        let full = OwnedMask::from_raw(Array2::from_elem((3, 5), 255));
        let d = euclidean_distance(&full.as_immut());
        assert!(f32_eq(d[(0, 0)], 1.0));
        assert!(f32_eq(d[(1, 2)], 2.0));
    }
}
