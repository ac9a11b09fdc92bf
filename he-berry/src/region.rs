//! 区域属性: 面积, 周长, 外接矩形, 质心及若干形态学指标.

use crate::data::{BBox, LabelMap};
use crate::eval::ratio;
use crate::post_proc::crack_perimeter;
use crate::{Area2d, Idx2d};
use itertools::Itertools;
use std::f64::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 一个标签的几何属性.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct RegionProps {
    /// 标签值.
    pub label: u32,
    /// 像素个数.
    pub area: usize,
    /// 裂缝周长 (像素边条数).
    pub perimeter: usize,
    /// 外接矩形.
    pub bbox: BBox,
    /// 质心 (高, 宽).
    pub centroid: (f64, f64),
    /// 全部像素, 行优先.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub pixels: Area2d,
}

impl RegionProps {
    /// 面积或周长为 0 时返回 `None`.
    fn new(labels: &LabelMap, label: u32, pixels: Area2d) -> Option<Self> {
        let bbox = BBox::from_points(pixels.iter().copied())?;
        let area = pixels.len();
        let perimeter = crack_perimeter(labels, label, &pixels);
        if area == 0 || perimeter == 0 {
            return None;
        }
        let (sh, sw) = pixels
            .iter()
            .fold((0usize, 0usize), |(a, b), &(h, w)| (a + h, b + w));
        Some(Self {
            label,
            area,
            perimeter,
            bbox,
            centroid: (ratio(sh, area), ratio(sw, area)),
            pixels,
        })
    }

    /// 圆度 `4 * pi * A / P^2`. 周长为 0 时返回 0.
    pub fn circularity(&self) -> f64 {
        ratio(4.0 * PI * self.area as f64, (self.perimeter * self.perimeter) as f64)
    }

    /// 等效直径: 与区域面积相同的圆的直径.
    #[inline]
    pub fn equivalent_diameter(&self) -> f64 {
        (4.0 * self.area as f64 / PI).sqrt()
    }

    /// 凸包面积. 凸包取自全部像素的四个角点.
    pub fn convex_area(&self) -> f64 {
        let corners = self
            .pixels
            .iter()
            .flat_map(|&(h, w)| [(h, w), (h + 1, w), (h, w + 1), (h + 1, w + 1)])
            .unique()
            .collect_vec();
        polygon_area(&convex_hull(corners))
    }

    /// 实心度 `A / 凸包面积`. 凸包面积为 0 时返回 0.
    #[inline]
    pub fn solidity(&self) -> f64 {
        ratio(self.area, self.convex_area())
    }

    /// 外接矩形长边与短边之比, 不小于 1.
    #[inline]
    pub fn aspect_ratio(&self) -> f64 {
        let (h, w) = (self.bbox.height(), self.bbox.width());
        ratio(h.max(w), h.min(w))
    }
}

/// 二维叉积 `(a - o) x (b - o)`.
#[inline]
fn cross(o: Idx2d, a: Idx2d, b: Idx2d) -> i64 {
    let (oh, ow) = (o.0 as i64, o.1 as i64);
    (a.0 as i64 - oh) * (b.1 as i64 - ow) - (a.1 as i64 - ow) * (b.0 as i64 - oh)
}

/// Andrew 单调链凸包. 共线点被剔除.
fn convex_hull(mut points: Vec<Idx2d>) -> Vec<Idx2d> {
    points.sort_unstable();
    points.dedup();
    if points.len() < 3 {
        return points;
    }
    let mut lower: Vec<Idx2d> = Vec::with_capacity(points.len());
    for &p in points.iter() {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0 {
            lower.pop();
        }
        lower.push(p);
    }
    let mut upper: Vec<Idx2d> = Vec::with_capacity(points.len());
    for &p in points.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0 {
            upper.pop();
        }
        upper.push(p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// 鞋带公式求简单多边形面积.
fn polygon_area(vertices: &[Idx2d]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    let twice: i64 = vertices
        .iter()
        .circular_tuple_windows()
        .map(|(a, b)| a.0 as i64 * b.1 as i64 - b.0 as i64 * a.1 as i64)
        .sum();
    twice.abs() as f64 / 2.0
}

/// 标签图中所有对象的属性, 按标签升序. 面积或周长为 0 的对象被跳过.
pub fn regions(labels: &LabelMap) -> Vec<RegionProps> {
    labels
        .pixels_by_label()
        .into_iter()
        .filter_map(|(l, pixels)| RegionProps::new(labels, l, pixels))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_rectangle_props() {
        let mut a = Array2::zeros((10, 10));
        for i in 2..5 {
            for j in 1..5 {
                a[(i, j)] = 6u32;
            }
        }
        let r = regions(&LabelMap::from_raw(a));
        assert_eq!(r.len(), 1);
        let r = &r[0];
        assert_eq!((r.label, r.area, r.perimeter), (6, 12, 14));
        assert!(f64_eq(r.centroid.0, 3.0));
        assert!(f64_eq(r.centroid.1, 2.5));
        assert!(f64_eq(r.convex_area(), 12.0));
        assert!(f64_eq(r.solidity(), 1.0));
        assert!(f64_eq(r.circularity(), 4.0 * PI * 12.0 / 196.0));
    }

    #[test]
    fn test_l_shape_solidity() {
        let l = LabelMap::from_raw(array![[1, 0], [1, 1]]);
        let r = &regions(&l)[0];
        // 角点凸包为去掉一个角三角形的正方形.
        assert!(f64_eq(r.convex_area(), 3.5));
        assert!(f64_eq(r.solidity(), 3.0 / 3.5));
        assert!(f64_eq(r.equivalent_diameter(), (12.0 / PI).sqrt()));
    }

    #[test]
    fn test_single_pixel_and_empty() {
        assert!(regions(&LabelMap::from_raw(Array2::zeros((4, 4)))).is_empty());

        let l = LabelMap::from_raw(array![[0, 0, 0], [0, 9, 0]]);
        let r = regions(&l);
        assert_eq!(r.len(), 1);
        assert_eq!((r[0].area, r[0].perimeter), (1, 4));
        assert!(f64_eq(r[0].circularity(), PI / 4.0));
        assert!(f64_eq(r[0].aspect_ratio(), 1.0));
        assert!(f64_eq(r[0].solidity(), 1.0));
    }

    #[test]
    fn test_aspect_ratio() {
        let l = LabelMap::from_raw(array![[0, 0, 0, 0], [3, 3, 3, 3], [3, 3, 3, 3]]);
        assert!(f64_eq(regions(&l)[0].aspect_ratio(), 2.0));
    }

    #[test]
    fn test_hull_drops_collinear() {
        let h = convex_hull(vec![(0, 0), (0, 1), (0, 2), (2, 2), (2, 0), (1, 1)]);
        assert_eq!(h.len(), 4);
        assert!(f64_eq(polygon_area(&h), 4.0));
        assert_eq!(polygon_area(&[(0, 0), (5, 5)]), 0.0);
    }
}
