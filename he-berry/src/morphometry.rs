//! 形态学统计: 逐对象的形状指标, 整体分布, 以及据此给出的分割参数建议.
//!
//! 典型用法是对真值标签图统计, 以了解真实细胞核的大小与形状范围.

use crate::data::LabelMap;
use crate::region::{regions, RegionProps};
use std::f64::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 建议的最小实心度不低于该值.
const SOLIDITY_FLOOR: f64 = 0.75;

/// 一个对象的形状指标.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeRecord {
    /// 标签值.
    pub label: u32,
    /// 像素个数.
    pub area: usize,
    /// 裂缝周长.
    pub perimeter: usize,
    /// 外接矩形的宽.
    pub width: usize,
    /// 外接矩形的高.
    pub height: usize,
    /// 圆度.
    pub circularity: f64,
    /// 实心度.
    pub solidity: f64,
    /// 长宽比.
    pub aspect_ratio: f64,
    /// 等效直径.
    pub equivalent_diameter: f64,
}

impl From<&RegionProps> for ShapeRecord {
    fn from(r: &RegionProps) -> Self {
        Self {
            label: r.label,
            area: r.area,
            perimeter: r.perimeter,
            width: r.bbox.width(),
            height: r.bbox.height(),
            circularity: r.circularity(),
            solidity: r.solidity(),
            aspect_ratio: r.aspect_ratio(),
            equivalent_diameter: r.equivalent_diameter(),
        }
    }
}

/// `labels` 中面积不小于 `min_area` 的对象的形状指标, 按标签升序.
pub fn shape_records(labels: &LabelMap, min_area: usize) -> Vec<ShapeRecord> {
    regions(labels)
        .iter()
        .filter(|r| r.area >= min_area)
        .map(ShapeRecord::from)
        .collect()
}

/// 线性插值的分位数, `q` 取值 `[0, 100]`. `sorted` 须已升序排列, 为空时返回 0.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    let Some(last) = sorted.len().checked_sub(1) else {
        return 0.0;
    };
    let rank = q.clamp(0.0, 100.0) / 100.0 * last as f64;
    let (lo, hi) = (rank.floor() as usize, rank.ceil() as usize);
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// 一组数值的描述统计. 空输入时各项均为 0.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Stats {
    /// 个数.
    pub count: usize,
    /// 均值.
    pub mean: f64,
    /// 总体标准差.
    pub std: f64,
    /// 最小值.
    pub min: f64,
    /// 5% 分位数.
    pub p5: f64,
    /// 25% 分位数.
    pub p25: f64,
    /// 中位数.
    pub median: f64,
    /// 75% 分位数.
    pub p75: f64,
    /// 95% 分位数.
    pub p95: f64,
    /// 最大值.
    pub max: f64,
}

impl Stats {
    /// 统计 `values`. 非有限值被忽略.
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let mut v: Vec<f64> = values.into_iter().filter(|x| x.is_finite()).collect();
        if v.is_empty() {
            return Self::default();
        }
        v.sort_by(f64::total_cmp);
        let n = v.len() as f64;
        let mean = v.iter().sum::<f64>() / n;
        let var = v.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        Self {
            count: v.len(),
            mean,
            std: var.sqrt(),
            min: v[0],
            p5: percentile(&v, 5.0),
            p25: percentile(&v, 25.0),
            median: percentile(&v, 50.0),
            p75: percentile(&v, 75.0),
            p95: percentile(&v, 95.0),
            max: v[v.len() - 1],
        }
    }
}

/// 根据真值分布给出的分割参数建议.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Suggestions {
    /// 最小对象面积: 面积的 5% 分位数.
    pub min_object_area: f64,
    /// 最小圆度: 圆度的 5% 分位数.
    pub min_circularity: f64,
    /// 最小实心度: 实心度的 5% 分位数, 但不低于 0.75.
    pub min_solidity: f64,
    /// 最大长宽比: 长宽比的 95% 分位数.
    pub max_aspect_ratio: f64,
    /// 预期面积范围: 面积的 5% 至 95% 分位数.
    pub area_range: (f64, f64),
    /// 平均面积对应的等效直径.
    pub mean_diameter: f64,
}

/// 一批对象的形态学统计.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Morphometry {
    /// 对象个数.
    pub objects: usize,
    /// 面积.
    pub area: Stats,
    /// 周长.
    pub perimeter: Stats,
    /// 圆度.
    pub circularity: Stats,
    /// 实心度.
    pub solidity: Stats,
    /// 长宽比.
    pub aspect_ratio: Stats,
    /// 等效直径.
    pub equivalent_diameter: Stats,
    /// 参数建议.
    pub suggestions: Suggestions,
}

impl Morphometry {
    /// 汇总 `records`. 没有任何对象时返回 `None`.
    pub fn from_records<'a, I>(records: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a ShapeRecord>,
    {
        let records: Vec<&ShapeRecord> = records.into_iter().collect();
        if records.is_empty() {
            return None;
        }
        let stats = |f: &dyn Fn(&ShapeRecord) -> f64| {
            Stats::from_values(records.iter().map(|r| f(*r)))
        };

        let area = stats(&|r| r.area as f64);
        let circularity = stats(&|r| r.circularity);
        let solidity = stats(&|r| r.solidity);
        let aspect_ratio = stats(&|r| r.aspect_ratio);
        let suggestions = Suggestions {
            min_object_area: area.p5,
            min_circularity: circularity.p5,
            min_solidity: solidity.p5.max(SOLIDITY_FLOOR),
            max_aspect_ratio: aspect_ratio.p95,
            area_range: (area.p5, area.p95),
            mean_diameter: (4.0 * area.mean / PI).sqrt(),
        };
        Some(Self {
            objects: records.len(),
            area,
            perimeter: stats(&|r| r.perimeter as f64),
            circularity,
            solidity,
            aspect_ratio,
            equivalent_diameter: stats(&|r| r.equivalent_diameter),
            suggestions,
        })
    }
}
