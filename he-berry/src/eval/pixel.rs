use super::{align_to, ratio};
use crate::consts::BACKGROUND_LABEL;
use crate::data::LabelMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 像素级二分类混淆矩阵及派生指标. 分母为 0 的比值均为 0.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PixelScore {
    /// 真阳性像素数.
    pub tp: u64,
    /// 假阳性像素数.
    pub fp: u64,
    /// 假阴性像素数.
    #[cfg_attr(feature = "serde", serde(rename = "fn"))]
    pub fn_: u64,
    /// 真阴性像素数.
    pub tn: u64,
    /// `TP / (TP + FP)`.
    pub precision: f64,
    /// `TP / (TP + FN)`.
    pub recall: f64,
    /// `2TP / (2TP + FP + FN)`, 即 Dice 系数.
    pub f1: f64,
    /// `TP / (TP + FP + FN)`.
    pub iou: f64,
    /// `(TP + TN) / 全部像素`.
    pub accuracy: f64,
}

impl PixelScore {
    /// 由混淆矩阵计算各项指标.
    pub fn from_counts(tp: u64, fp: u64, fn_: u64, tn: u64) -> Self {
        Self {
            tp,
            fp,
            fn_,
            tn,
            precision: ratio(tp, tp + fp),
            recall: ratio(tp, tp + fn_),
            f1: ratio(2 * tp, 2 * tp + fp + fn_),
            iou: ratio(tp, tp + fp + fn_),
            accuracy: ratio(tp + tn, tp + fp + fn_ + tn),
        }
    }
}

/// 把两张标签图都视为前景/背景二值图, 逐像素比较.
pub fn score_pixels(gt: &LabelMap, pred: &LabelMap) -> PixelScore {
    let pred = align_to(pred, gt.shape());
    let (mut tp, mut fp, mut fn_, mut tn) = (0u64, 0u64, 0u64, 0u64);
    for (g, p) in gt.iter().zip(pred.iter()) {
        match (*g != BACKGROUND_LABEL, *p != BACKGROUND_LABEL) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => tn += 1,
        }
    }
    PixelScore::from_counts(tp, fp, fn_, tn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_all_background() {
        let z = LabelMap::background((100, 100));
        let s = score_pixels(&z, &z);
        assert_eq!((s.precision, s.recall, s.f1, s.iou), (0.0, 0.0, 0.0, 0.0));
        assert_eq!(s.accuracy, 1.0);
        assert_eq!(s.tn, 10_000);
    }

    #[test]
    fn test_confusion_counts() {
        let gt = LabelMap::from_raw(array![[1, 1, 0], [0, 2, 0]]);
        // 标签值不同不影响像素级比较.
        let pred = LabelMap::from_raw(array![[5, 0, 3], [0, 5, 0]]);
        let s = score_pixels(&gt, &pred);
        assert_eq!((s.tp, s.fp, s.fn_, s.tn), (2, 1, 1, 2));
        assert!(f64_eq(s.precision, 2.0 / 3.0));
        assert!(f64_eq(s.iou, 0.5));
        assert!(f64_eq(s.accuracy, 4.0 / 6.0));
    }

    #[test]
    fn test_f1_is_dice() {
        // 伪随机标签图.
        let mut rng = StdRng::seed_from_u64(7);
        let mut next = || rng.random_range(0..3u32);
        let gt = LabelMap::from_raw(Array2::from_shape_fn((16, 16), |_| next()));
        let pred = LabelMap::from_raw(Array2::from_shape_fn((16, 16), |_| next()));
        let s = score_pixels(&gt, &pred);
        let (tp, fp, fn_) = (s.tp as f64, s.fp as f64, s.fn_ as f64);
        assert_eq!(s.f1, 2.0 * tp / (2.0 * tp + fp + fn_));
        let harmonic = 2.0 * s.precision * s.recall / (s.precision + s.recall);
        assert!(f64_eq(s.f1, harmonic));
    }
}
