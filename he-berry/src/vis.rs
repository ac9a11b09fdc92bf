//! 可视化: 标签图着色与分割差异叠加图.

use crate::consts::{BACKGROUND_LABEL, DEFAULT_COLOR_SEED};
use crate::data::LabelMap;
use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

/// 漏检 (仅真值为前景) 的颜色.
pub const FN_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// 命中 (两者均为前景) 的颜色.
pub const TP_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// 误检 (仅预测为前景) 的颜色.
pub const FP_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

/// 为每个标签生成颜色. 按标签升序依次取随机数, 各通道位于 `[50, 255)`.
pub fn palette(labels: &LabelMap, seed: u64) -> BTreeMap<u32, Rgb<u8>> {
    let mut rng = StdRng::seed_from_u64(seed);
    labels
        .labels()
        .into_iter()
        .map(|l| {
            let c = Rgb([
                rng.random_range(50..255),
                rng.random_range(50..255),
                rng.random_range(50..255),
            ]);
            (l, c)
        })
        .collect()
}

/// 以种子 `seed` 给标签图着色, 背景为黑色. 相同输入与种子总是得到相同图像.
pub fn colorize(labels: &LabelMap, seed: u64) -> RgbImage {
    let colors = palette(labels, seed);
    let (height, width) = labels.shape();
    let mut buf = RgbImage::new(width as u32, height as u32);
    for ((h, w), l) in labels.indexed_iter() {
        if let Some(&c) = colors.get(l) {
            buf.put_pixel(w as u32, h as u32, c);
        }
    }
    buf
}

/// 以默认种子着色.
#[inline]
pub fn colorize_default(labels: &LabelMap) -> RgbImage {
    colorize(labels, DEFAULT_COLOR_SEED)
}

/// 像素级差异图: 漏检为红色, 命中为绿色, 误检为蓝色, 其余为黑色.
/// 尺寸不一致时, 预测先被缩放到真值尺寸.
pub fn diff_overlay(gt: &LabelMap, pred: &LabelMap) -> RgbImage {
    let pred = crate::eval::align_to(pred, gt.shape());
    let (height, width) = gt.shape();
    let mut buf = RgbImage::new(width as u32, height as u32);
    for (((h, w), g), p) in gt.indexed_iter().zip(pred.iter()) {
        let color = match (*g != BACKGROUND_LABEL, *p != BACKGROUND_LABEL) {
            (true, true) => TP_COLOR,
            (true, false) => FN_COLOR,
            (false, true) => FP_COLOR,
            (false, false) => continue,
        };
        buf.put_pixel(w as u32, h as u32, color);
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_colorize_deterministic() {
        let l = LabelMap::from_raw(array![[0, 3, 3], [7, 0, 3]]);
        let a = colorize(&l, 42);
        let b = colorize_default(&l);
        assert_eq!(a, b);
        assert_eq!(*a.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(a.get_pixel(1, 0), a.get_pixel(2, 1));
        for c in a.get_pixel(1, 0).0.iter().chain(a.get_pixel(0, 1).0.iter()) {
            assert!((50..255).contains(c));
        }
    }

    #[test]
    fn test_palette_ignores_raster_order() {
        // 同一组标签, 不同的空间排列, 颜色一致.
        let a = LabelMap::from_raw(array![[1, 2], [0, 0]]);
        let b = LabelMap::from_raw(array![[0, 2], [0, 1]]);
        assert_eq!(palette(&a, 5), palette(&b, 5));
    }

    #[test]
    fn test_diff_overlay() {
        let gt = LabelMap::from_raw(array![[1, 1, 0, 0]]);
        let pred = LabelMap::from_raw(array![[0, 2, 2, 0]]);
        let img = diff_overlay(&gt, &pred);
        assert_eq!(*img.get_pixel(0, 0), FN_COLOR);
        assert_eq!(*img.get_pixel(1, 0), TP_COLOR);
        assert_eq!(*img.get_pixel(2, 0), FP_COLOR);
        assert_eq!(*img.get_pixel(3, 0), Rgb([0, 0, 0]));
    }
}
