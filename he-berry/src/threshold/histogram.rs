//! 灰度直方图与一维峰检测.

use crate::consts::HIST_BINS;
use crate::data::IntensityImage;
use itertools::Itertools;

/// 每个分箱的宽度. 256 个分箱均匀覆盖 `[0, 255]`.
pub const BIN_WIDTH: f64 = 255.0 / HIST_BINS as f64;

/// 采样值 `v` 所在分箱. `v` 不在 `[0, 255]` 内 (含 NaN) 时返回 `None`.
///
/// 最后一个分箱为闭区间, 因此 `255.0` 落入第 255 号分箱.
#[inline]
pub fn bin_of(v: f32) -> Option<usize> {
    let v = f64::from(v);
    (0.0..=255.0)
        .contains(&v)
        .then(|| ((v / BIN_WIDTH) as usize).min(HIST_BINS - 1))
}

/// 分箱 `b` 的左边界.
#[inline]
pub fn bin_lower_edge(b: usize) -> f64 {
    b as f64 * BIN_WIDTH
}

/// 统计各分箱计数. 范围外采样被忽略.
pub fn counts(img: &IntensityImage) -> Vec<u64> {
    let mut ans = vec![0u64; HIST_BINS];
    for b in img.iter().filter_map(|v| bin_of(*v)) {
        ans[b] += 1;
    }
    ans
}

/// 将计数归一化为概率密度 (积分为 1). 总数为 0 时全为 0.
pub fn density(counts: &[u64]) -> Vec<f64> {
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return vec![0.0; counts.len()];
    }
    let norm = total as f64 * BIN_WIDTH;
    counts.iter().map(|c| *c as f64 / norm).collect()
}

/// 严格局部极大值. 平台取中点 (偏左), 两端点永远不是峰.
fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut ans = Vec::new();
    if x.len() < 3 {
        return ans;
    }
    let i_max = x.len() - 1;
    let mut i = 1;
    while i < i_max {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < i_max && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                ans.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    ans
}

/// 从高到低保留峰, 移除与已保留峰距离小于 `distance` 的较低峰.
fn select_by_distance(x: &[f64], peaks: &[usize], distance: usize) -> Vec<usize> {
    let mut keep = vec![true; peaks.len()];
    let order = (0..peaks.len())
        .sorted_by(|&a, &b| x[peaks[a]].total_cmp(&x[peaks[b]]))
        .rev();
    for j in order {
        if !keep[j] {
            continue;
        }
        for k in (0..j).rev() {
            if peaks[j] - peaks[k] >= distance {
                break;
            }
            keep[k] = false;
        }
        for k in j + 1..peaks.len() {
            if peaks[k] - peaks[j] >= distance {
                break;
            }
            keep[k] = false;
        }
    }
    peaks
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// 峰 `peak` 的突出度: 峰值减去两侧 "基底" 中较高者.
/// 基底为向一侧延伸到出现更高值 (或到达端点) 为止的最小值.
pub fn prominence(x: &[f64], peak: usize) -> f64 {
    let top = x[peak];
    let left_min = x[..=peak]
        .iter()
        .rev()
        .take_while(|v| **v <= top)
        .copied()
        .fold(top, f64::min);
    let right_min = x[peak..]
        .iter()
        .take_while(|v| **v <= top)
        .copied()
        .fold(top, f64::min);
    top - left_min.max(right_min)
}

/// 一维峰检测. 依次按最小间距 `distance` 和最小突出度 `min_prominence` 筛选,
/// 返回升序排列的峰下标.
pub fn find_peaks(x: &[f64], min_prominence: f64, distance: usize) -> Vec<usize> {
    let peaks = local_maxima(x);
    let peaks = select_by_distance(x, &peaks, distance.max(1));
    peaks
        .into_iter()
        .filter(|p| prominence(x, *p) >= min_prominence)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_bins() {
        assert_eq!(bin_of(0.0), Some(0));
        assert_eq!(bin_of(100.0), Some(100));
        assert_eq!(bin_of(254.0), Some(254));
        assert_eq!(bin_of(255.0), Some(255));
        assert_eq!(bin_of(255.5), None);
        assert_eq!(bin_of(-0.1), None);
        assert_eq!(bin_of(f32::NAN), None);
    }

    #[test]
    fn test_density_integrates_to_one() {
        let img = IntensityImage::from_raw(array![[0.0, 10.0], [10.0, 300.0]]);
        let c = counts(&img);
        assert_eq!(c.iter().sum::<u64>(), 3);
        let d = density(&c);
        assert!(f64_eq(d.iter().sum::<f64>() * BIN_WIDTH, 1.0));
        assert!(density(&[0, 0]).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_local_maxima_plateau() {
        let x = [0.0, 1.0, 1.0, 1.0, 0.0, 2.0, 0.0, 3.0];
        assert_eq!(local_maxima(&x), vec![2, 5]);
        assert!(local_maxima(&[1.0, 1.0, 1.0]).is_empty());
    }

    #[test]
    fn test_distance_keeps_highest() {
        let x = [0.0, 2.0, 0.0, 3.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        assert_eq!(find_peaks(&x, 0.0, 1), vec![1, 3, 8]);
        assert_eq!(find_peaks(&x, 0.0, 5), vec![3, 8]);
    }

    #[test]
    fn test_prominence() {
        let x = [0.0, 5.0, 1.0, 3.0, 0.5, 0.0];
        assert!(f64_eq(prominence(&x, 1), 5.0));
        // 左侧被更高的峰截断, 基底为 max(1.0, 0.0).
        assert!(f64_eq(prominence(&x, 3), 2.0));
        assert_eq!(find_peaks(&x, 2.5, 1), vec![1]);
    }
}
