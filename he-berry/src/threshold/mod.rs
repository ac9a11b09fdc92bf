//! 基于直方图形状的自适应二值化阈值.
//!
//! 平滑后的直方图若有至少 3 个峰, 采用三类 Otsu 并取最暗类的上边界;
//! 否则采用二类 Otsu. 三类 Otsu 失败时同样退回二类 Otsu.
//! 细胞核在 H&E 染色下是最暗的一类, 前景判定为 `强度 < 阈值`.

pub mod histogram;
pub mod otsu;

use crate::config::SegmentParams;
use crate::data::{IntensityImage, OwnedMask};
use crate::error::{ThresholdError, ThresholdResult};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 阈值选取方式.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ThresholdMethod {
    /// 二类 Otsu.
    Otsu,

    /// 三类 Otsu, 取最暗类与其余类的分界.
    MultiOtsu3,
}

impl ThresholdMethod {
    /// 简短描述标签.
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Otsu => "otsu",
            Self::MultiOtsu3 => "multiotsu_3class",
        }
    }
}

impl fmt::Display for ThresholdMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// 阈值决策结果.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ThresholdDecision {
    /// 阈值. 强度严格小于该值的像素为前景.
    pub value: f32,

    /// 选取方式.
    pub method: ThresholdMethod,

    /// 平滑直方图中检测到的峰 (模态) 个数.
    pub modes: usize,
}

impl ThresholdDecision {
    /// 以该阈值二值化 `img`.
    pub fn apply(&self, img: &IntensityImage) -> OwnedMask {
        let thr = self.value;
        OwnedMask::from_predicate(&img.array_view(), |v| *v < thr)
    }
}

/// 暗类最后一个分箱为 `t` 时, 对应的强度阈值 (即分箱 `t + 1` 的左边界).
#[inline]
fn value_after_bin(t: usize) -> f32 {
    histogram::bin_lower_edge(t + 1) as f32
}

/// 二类 Otsu, 不会因灰度级过少而失败: 仅有一个灰度级时阈值即为该灰度,
/// 此时没有任何像素成为前景.
fn otsu_value(img: &IntensityImage, counts: &[u64]) -> ThresholdResult<f32> {
    match otsu::otsu(counts) {
        Ok(t) => Ok(value_after_bin(t)),
        Err(ThresholdError::TooFewLevels(..)) => img
            .iter()
            .copied()
            .find(|v| histogram::bin_of(*v).is_some())
            .ok_or(ThresholdError::EmptyImage),
        Err(e) => Err(e),
    }
}

/// 计算 `img` 的自适应阈值.
///
/// 仅当图像中没有任何位于 `[0, 255]` 的采样时返回 `Err(ThresholdError::EmptyImage)`.
/// 平坦图像检测不到峰, 走二类 Otsu 分支, 不会报错.
pub fn modal_threshold(
    img: &IntensityImage,
    params: &SegmentParams,
) -> ThresholdResult<ThresholdDecision> {
    let counts = histogram::counts(img);
    let smooth = crate::filter::gaussian_filter1d(&histogram::density(&counts), params.hist_sigma);
    let modes = histogram::find_peaks(&smooth, params.peak_prominence, params.peak_distance).len();

    if modes >= 3 {
        match otsu::multi_otsu3(&counts) {
            Ok((t1, _)) => {
                return Ok(ThresholdDecision {
                    value: value_after_bin(t1),
                    method: ThresholdMethod::MultiOtsu3,
                    modes,
                })
            }
            Err(e) => log::debug!("multi-level Otsu failed ({e}), falling back to Otsu"),
        }
    }
    Ok(ThresholdDecision {
        value: otsu_value(img, &counts)?,
        method: ThresholdMethod::Otsu,
        modes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn image_from(levels: &[(f32, usize)], width: usize) -> IntensityImage {
        let mut v = Vec::new();
        for (level, n) in levels {
            v.extend(std::iter::repeat(*level).take(*n));
        }
        let h = v.len() / width;
        v.truncate(h * width);
        IntensityImage::from_raw(Array2::from_shape_vec((h, width), v).unwrap())
    }

    #[test]
    fn test_flat_image_falls_back() {
        let img = IntensityImage::from_raw(Array2::from_elem((20, 20), 128.0));
        let d = modal_threshold(&img, &SegmentParams::default()).unwrap();
        assert_eq!(d.method, ThresholdMethod::Otsu);
        // 平滑后只剩一个峰.
        assert_eq!(d.modes, 1);
        assert_eq!(d.value, 128.0);
        assert_eq!(d.apply(&img).as_immut().count_foreground(), 0);
    }

    #[test]
    fn test_bimodal_uses_otsu() {
        let img = image_from(&[(50.0, 300), (200.0, 700)], 100);
        let d = modal_threshold(&img, &SegmentParams::default()).unwrap();
        assert_eq!(d.method, ThresholdMethod::Otsu);
        assert_eq!(d.modes, 2);
        assert!(d.value > 50.0 && d.value < 200.0);
        assert_eq!(d.apply(&img).as_immut().count_foreground(), 300);
    }

    #[test]
    fn test_trimodal_uses_multi_otsu() {
        let img = image_from(&[(40.0, 200), (130.0, 300), (220.0, 500)], 100);
        let d = modal_threshold(&img, &SegmentParams::default()).unwrap();
        assert_eq!(d.method, ThresholdMethod::MultiOtsu3);
        assert_eq!(d.modes, 3);
        // 只有最暗的一类成为前景.
        assert_eq!(d.apply(&img).as_immut().count_foreground(), 200);
    }

    #[test]
    fn test_empty_image() {
        let img = IntensityImage::from_raw(Array2::from_elem((2, 2), -5.0));
        assert_eq!(
            modal_threshold(&img, &SegmentParams::default()),
            Err(ThresholdError::EmptyImage)
        );
    }
}
