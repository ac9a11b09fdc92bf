//! 二维局部极大值检测.

use crate::consts::gray::is_foreground;
use crate::data::MaskSlice;
use crate::Idx2d;
use itertools::Itertools;
use ndarray::{Array2, ArrayView2, Axis};
use ordered_float::OrderedFloat;

/// 以 `radius` 为半径的一维滑动最大值, 窗口在边界处截断.
fn max_filter1d(line: &[f32], radius: usize) -> Vec<f32> {
    (0..line.len())
        .map(|i| {
            let lo = i.saturating_sub(radius);
            let hi = (i + radius + 1).min(line.len());
            line[lo..hi].iter().copied().fold(f32::NEG_INFINITY, f32::max)
        })
        .collect()
}

/// `(2 * radius + 1)^2` 窗口的二维最大值滤波 (可分离).
fn max_filter2d(src: &ArrayView2<f32>, radius: usize) -> Array2<f32> {
    let mut out = src.to_owned();
    for axis in [Axis(0), Axis(1)] {
        for mut lane in out.lanes_mut(axis) {
            let line: Vec<f32> = lane.iter().copied().collect();
            lane.iter_mut()
                .zip(max_filter1d(&line, radius))
                .for_each(|(o, v)| *o = v);
        }
    }
    out
}

/// 在 `mask` 的前景内寻找 `field` 的局部极大值.
///
/// 候选点需同时满足:
/// - 等于以其为中心、边长 `2 * min_distance + 1` 的窗口内最大值;
/// - 严格大于 `field` 的全局最小值;
/// - 位于前景内; `exclude_border` 时还需与图像边缘保持至少 `min_distance` 像素.
///
/// 候选点按值降序 (同值时行优先) 依次接受, 与已接受点的切比雪夫距离小于
/// `min_distance` 的候选点被丢弃. 返回值按接受顺序排列.
pub fn peak_local_max(
    field: &ArrayView2<f32>,
    mask: &MaskSlice,
    min_distance: usize,
    exclude_border: bool,
) -> Vec<Idx2d> {
    let (h, w) = field.dim();
    assert_eq!((h, w), mask.shape());
    let floor = field.iter().copied().fold(f32::INFINITY, f32::min);
    let local_max = max_filter2d(field, min_distance);

    let border = if exclude_border { min_distance } else { 0 };
    let inner = |(i, j): Idx2d| i >= border && j >= border && i + border < h && j + border < w;

    let candidates = field
        .indexed_iter()
        .filter(|&(pos, &v)| {
            v > floor && v == local_max[pos] && is_foreground(mask[pos]) && inner(pos)
        })
        .sorted_by_key(|&(_, &v)| std::cmp::Reverse(OrderedFloat(v)))
        .map(|(pos, _)| pos);

    let reach = min_distance.saturating_sub(1);
    let mut taken = Array2::from_elem((h, w), false);
    let mut ans = Vec::new();
    for (i, j) in candidates {
        let blocked = (i.saturating_sub(reach)..(i + reach + 1).min(h))
            .cartesian_product(j.saturating_sub(reach)..(j + reach + 1).min(w))
            .any(|p| taken[p]);
        if min_distance > 0 && blocked {
            continue;
        }
        taken[(i, j)] = true;
        ans.push((i, j));
    }
    ans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OwnedMask;
    use ndarray::Array2;

    fn cone(shape: Idx2d, centers: &[(Idx2d, f32)]) -> Array2<f32> {
        Array2::from_shape_fn(shape, |(i, j)| {
            centers
                .iter()
                .map(|&((ci, cj), top)| {
                    let d = (i as f32 - ci as f32).hypot(j as f32 - cj as f32);
                    (top - d).max(0.0)
                })
                .fold(0.0, f32::max)
        })
    }

    fn full(shape: Idx2d) -> OwnedMask {
        OwnedMask::from_raw(Array2::from_elem(shape, 255))
    }

    #[test]
    fn test_two_separate_peaks() {
        let f = cone((20, 30), &[((10, 8), 6.0), ((10, 22), 5.0)]);
        let m = full((20, 30));
        let p = peak_local_max(&f.view(), &m.as_immut(), 3, true);
        assert_eq!(p, vec![(10, 8), (10, 22)]);
    }

    #[test]
    fn test_close_peaks_suppressed() {
        let mut f = Array2::zeros((15, 15));
        f[(7, 5)] = 3.0;
        f[(7, 9)] = 2.0;
        let m = full((15, 15));
        // 两峰切比雪夫距离为 4.
        assert_eq!(
            peak_local_max(&f.view(), &m.as_immut(), 3, false),
            vec![(7, 5), (7, 9)]
        );
        // 窗口半径 4 时较低的峰不再是窗口最大值.
        assert_eq!(peak_local_max(&f.view(), &m.as_immut(), 4, false), vec![(7, 5)]);
    }

    #[test]
    fn test_plateau_spacing() {
        let mut f = Array2::zeros((10, 12));
        for j in 2..10 {
            f[(5, j)] = 1.0;
        }
        let m = full((10, 12));
        let p = peak_local_max(&f.view(), &m.as_immut(), 3, false);
        assert_eq!(p, vec![(5, 2), (5, 5), (5, 8)]);
    }

    #[test]
    fn test_border_and_mask() {
        let mut f = Array2::zeros((10, 10));
        f[(1, 1)] = 5.0;
        f[(6, 6)] = 4.0;
        let mut m = full((10, 10));
        assert_eq!(peak_local_max(&f.view(), &m.as_immut(), 2, true), vec![(6, 6)]);
        assert_eq!(
            peak_local_max(&f.view(), &m.as_immut(), 2, false),
            vec![(1, 1), (6, 6)]
        );
        m.as_mutable()[(6, 6)] = 0;
        assert!(peak_local_max(&f.view(), &m.as_immut(), 2, true).is_empty());
    }

    #[test]
    fn test_constant_field_has_no_peak() {
        let f = Array2::from_elem((8, 8), 2.0f32);
        assert!(peak_local_max(&f.view(), &full((8, 8)).as_immut(), 1, false).is_empty());
    }
}
