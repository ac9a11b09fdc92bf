//! 流水线可调参数.
//!
//! 所有参数都带有默认值 (见 [`crate::consts`]); 对单个数据集调参时,
//! 可以通过 `with_*` 方法链式修改, 并用 `validate` 检查取值是否合理.

use crate::consts::*;
use crate::error::ParamsError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 分割流水线参数.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentParams {
    /// 直方图高斯平滑 sigma.
    pub hist_sigma: f64,

    /// 直方图峰最小突出度.
    pub peak_prominence: f64,

    /// 直方图峰最小间距 (分箱个数).
    pub peak_distance: usize,

    /// 最小细胞核面积. 更小的前景连通区域会被移除.
    pub min_object_area: usize,

    /// 最小空洞面积. 更小的封闭背景区域会被填充.
    pub min_hole_area: usize,

    /// 种子点最小间距.
    pub min_distance: usize,

    /// 距离场平滑 sigma.
    pub dist_smooth_sigma: f64,

    /// 是否丢弃距离图像边缘不足 `min_distance` 的种子点.
    pub exclude_border: bool,

    /// 碎片合并接触比阈值.
    pub contact_ratio: f64,

    /// 碎片合并最大轮数.
    pub max_merge_passes: usize,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            hist_sigma: DEFAULT_HIST_SIGMA,
            peak_prominence: DEFAULT_PEAK_PROMINENCE,
            peak_distance: DEFAULT_PEAK_DISTANCE,
            min_object_area: DEFAULT_MIN_OBJECT_AREA,
            min_hole_area: DEFAULT_MIN_HOLE_AREA,
            min_distance: DEFAULT_MIN_DISTANCE,
            dist_smooth_sigma: DEFAULT_DIST_SMOOTH_SIGMA,
            exclude_border: true,
            contact_ratio: DEFAULT_CONTACT_RATIO,
            max_merge_passes: DEFAULT_MAX_MERGE_PASSES,
        }
    }
}

impl SegmentParams {
    /// 设置直方图平滑 sigma.
    #[inline]
    pub fn with_hist_sigma(mut self, sigma: f64) -> Self {
        self.hist_sigma = sigma;
        self
    }

    /// 设置直方图峰检测参数.
    #[inline]
    pub fn with_peaks(mut self, prominence: f64, distance: usize) -> Self {
        self.peak_prominence = prominence;
        self.peak_distance = distance;
        self
    }

    /// 设置最小细胞核面积与最小空洞面积.
    #[inline]
    pub fn with_areas(mut self, min_object: usize, min_hole: usize) -> Self {
        self.min_object_area = min_object;
        self.min_hole_area = min_hole;
        self
    }

    /// 设置种子点最小间距.
    #[inline]
    pub fn with_min_distance(mut self, d: usize) -> Self {
        self.min_distance = d;
        self
    }

    /// 设置距离场平滑 sigma.
    #[inline]
    pub fn with_dist_smooth_sigma(mut self, sigma: f64) -> Self {
        self.dist_smooth_sigma = sigma;
        self
    }

    /// 设置是否丢弃边缘种子点.
    #[inline]
    pub fn with_exclude_border(mut self, exclude: bool) -> Self {
        self.exclude_border = exclude;
        self
    }

    /// 设置碎片合并接触比阈值.
    #[inline]
    pub fn with_contact_ratio(mut self, ratio: f64) -> Self {
        self.contact_ratio = ratio;
        self
    }

    /// 设置碎片合并最大轮数.
    #[inline]
    pub fn with_max_merge_passes(mut self, passes: usize) -> Self {
        self.max_merge_passes = passes;
        self
    }

    /// 检查参数取值.
    pub fn validate(&self) -> Result<(), ParamsError> {
        check_sigma("hist_sigma", self.hist_sigma)?;
        check_sigma("dist_smooth_sigma", self.dist_smooth_sigma)?;
        if !(self.peak_prominence >= 0.0 && self.peak_prominence.is_finite()) {
            return Err(ParamsError::InvalidProminence(self.peak_prominence));
        }
        if self.peak_distance == 0 {
            return Err(ParamsError::ZeroCount("peak_distance"));
        }
        if self.min_distance == 0 {
            return Err(ParamsError::ZeroCount("min_distance"));
        }
        if self.max_merge_passes == 0 {
            return Err(ParamsError::ZeroCount("max_merge_passes"));
        }
        check_ratio("contact_ratio", self.contact_ratio)
    }
}

/// 评估参数.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct EvalParams {
    /// IoU 匹配阈值. IoU 不小于该值的候选对才参与匹配.
    pub iou_threshold: f64,
}

impl Default for EvalParams {
    fn default() -> Self {
        Self {
            iou_threshold: DEFAULT_IOU_THRESHOLD,
        }
    }
}

impl EvalParams {
    /// 设置 IoU 匹配阈值.
    #[inline]
    pub fn with_iou_threshold(mut self, thr: f64) -> Self {
        self.iou_threshold = thr;
        self
    }

    /// 检查参数取值.
    pub fn validate(&self) -> Result<(), ParamsError> {
        check_ratio("iou_threshold", self.iou_threshold)
    }
}

fn check_sigma(name: &'static str, v: f64) -> Result<(), ParamsError> {
    if v > 0.0 && v.is_finite() {
        Ok(())
    } else {
        Err(ParamsError::InvalidSigma(name, v))
    }
}

fn check_ratio(name: &'static str, v: f64) -> Result<(), ParamsError> {
    if (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(ParamsError::RatioOutOfRange(name, v))
    }
}
