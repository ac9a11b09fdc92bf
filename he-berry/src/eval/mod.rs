//! 预测标签图与真值标签图的比较评估.
//!
//! 提供两种互相独立的模式:
//!
//! 1. 目标级 ([`match_regions`]): 逐个细胞核做 IoU 匹配, 统计检测质量, 计数与面积误差;
//! 2. 像素级 ([`score_pixels`]): 只看前景/背景, 统计混淆矩阵.
//!
//! 两者在尺寸不一致时都会先将预测以最近邻插值缩放到真值尺寸.

mod object;
mod pixel;

pub use object::{match_regions, MatchRecord, ObjectScore};
pub use pixel::{score_pixels, PixelScore};

use crate::data::LabelMap;
use num::ToPrimitive;
use std::borrow::Cow;

/// 带保护的除法. 分母为 0 (或无法转换为 `f64`) 时返回 0.
#[inline]
pub fn ratio<N: ToPrimitive, D: ToPrimitive>(numerator: N, denominator: D) -> f64 {
    match (numerator.to_f64(), denominator.to_f64()) {
        (Some(n), Some(d)) if d != 0.0 => n / d,
        _ => 0.0,
    }
}

/// 百分比形式的 "精度": `max(0, 100 - 误差百分比)`.
#[inline]
pub(crate) fn precision_from_error(error_percent: f64) -> f64 {
    (100.0 - error_percent).max(0.0)
}

/// 保证 `pred` 与 `gt_shape` 同尺寸. 尺寸不一致时以最近邻缩放并输出警告.
pub(crate) fn align_to<'a>(pred: &'a LabelMap, gt_shape: crate::Idx2d) -> Cow<'a, LabelMap> {
    if pred.shape() == gt_shape {
        Cow::Borrowed(pred)
    } else {
        log::warn!(
            "prediction shape {:?} differs from ground truth {:?}, resizing (nearest)",
            pred.shape(),
            gt_shape
        );
        Cow::Owned(pred.resize_nearest(gt_shape))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_guard() {
        assert_eq!(ratio(3usize, 4usize), 0.75);
        assert_eq!(ratio(3.0, 0u64), 0.0);
        assert_eq!(ratio(0u32, 0.0), 0.0);
        assert_eq!(precision_from_error(130.0), 0.0);
        assert_eq!(precision_from_error(12.5), 87.5);
    }
}
