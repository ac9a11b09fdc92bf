//! Otsu 类间方差最大化阈值.
//!
//! 所有函数都在分箱下标上工作, 返回值 `t` 表示 "暗类的最后一个分箱",
//! 即分箱 `0..=t` 属于较暗一类. 多个分割点取得相同类间方差时, 取最靠前的一个.

use crate::error::{ThresholdError, ThresholdResult};

/// 前缀和: `weight[i]` 为分箱 `0..i` 的计数和, `moment[i]` 为其一阶矩.
struct Prefix {
    weight: Vec<f64>,
    moment: Vec<f64>,
}

impl Prefix {
    fn new(counts: &[u64]) -> Self {
        let mut weight = Vec::with_capacity(counts.len() + 1);
        let mut moment = Vec::with_capacity(counts.len() + 1);
        weight.push(0.0);
        moment.push(0.0);
        for (i, c) in counts.iter().enumerate() {
            let c = *c as f64;
            weight.push(weight[i] + c);
            moment.push(moment[i] + c * i as f64);
        }
        Self { weight, moment }
    }

    /// 分箱 `lo..=hi` 的 `w * mu^2`. 空类贡献为 0.
    #[inline]
    fn term(&self, lo: usize, hi: usize) -> f64 {
        let w = self.weight[hi + 1] - self.weight[lo];
        if w <= 0.0 {
            return 0.0;
        }
        let m = self.moment[hi + 1] - self.moment[lo];
        m * m / w
    }
}

/// 第一个与最后一个非空分箱, 以及非空分箱个数.
fn occupied(counts: &[u64]) -> Option<(usize, usize, usize)> {
    let first = counts.iter().position(|c| *c > 0)?;
    let last = counts.iter().rposition(|c| *c > 0)?;
    let n = counts.iter().filter(|c| **c > 0).count();
    Some((first, last, n))
}

/// 二类 Otsu 阈值.
///
/// 非空分箱少于 2 个时返回 `Err(ThresholdError::TooFewLevels)`;
/// 直方图为空时返回 `Err(ThresholdError::EmptyImage)`.
pub fn otsu(counts: &[u64]) -> ThresholdResult<usize> {
    let (first, last, n) = occupied(counts).ok_or(ThresholdError::EmptyImage)?;
    if n < 2 {
        return Err(ThresholdError::TooFewLevels(n, 2));
    }
    let pre = Prefix::new(counts);
    let mut best = (first, f64::NEG_INFINITY);
    for t in first..last {
        let v = pre.term(first, t) + pre.term(t + 1, last);
        if v > best.1 {
            best = (t, v);
        }
    }
    Ok(best.0)
}

/// 三类 Otsu 阈值 `(t1, t2)`, `t1 < t2`. 分箱 `0..=t1` 为最暗类.
///
/// 非空分箱少于 3 个时返回 `Err(ThresholdError::TooFewLevels)`;
/// 直方图为空时返回 `Err(ThresholdError::EmptyImage)`.
pub fn multi_otsu3(counts: &[u64]) -> ThresholdResult<(usize, usize)> {
    let (first, last, n) = occupied(counts).ok_or(ThresholdError::EmptyImage)?;
    if n < 3 {
        return Err(ThresholdError::TooFewLevels(n, 3));
    }
    let pre = Prefix::new(counts);
    let mut best = ((first, first + 1), f64::NEG_INFINITY);
    for t1 in first..last {
        let dark = pre.term(first, t1);
        for t2 in t1 + 1..last {
            let v = dark + pre.term(t1 + 1, t2) + pre.term(t2 + 1, last);
            if v > best.1 {
                best = ((t1, t2), v);
            }
        }
    }
    Ok(best.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hist(pairs: &[(usize, u64)]) -> Vec<u64> {
        let mut h = vec![0; 256];
        pairs.iter().for_each(|(b, c)| h[*b] = *c);
        h
    }

    #[test]
    fn test_otsu_bimodal() {
        let h = hist(&[(40, 100), (41, 50), (200, 300), (201, 10)]);
        // 空白区间中取最靠前的分割点.
        assert_eq!(otsu(&h), Ok(41));
    }

    #[test]
    fn test_otsu_degenerate() {
        assert_eq!(otsu(&hist(&[])), Err(ThresholdError::EmptyImage));
        assert_eq!(
            otsu(&hist(&[(77, 9)])),
            Err(ThresholdError::TooFewLevels(1, 2))
        );
        assert_eq!(otsu(&hist(&[(3, 1), (4, 1)])), Ok(3));
    }

    #[test]
    fn test_multi_otsu_three_modes() {
        let h = hist(&[(30, 100), (31, 100), (120, 100), (121, 80), (220, 100)]);
        assert_eq!(multi_otsu3(&h), Ok((31, 121)));
        assert_eq!(
            multi_otsu3(&hist(&[(10, 1), (20, 1)])),
            Err(ThresholdError::TooFewLevels(2, 3))
        );
    }
}
