use crate::consts::gray::*;
use crate::MaskSliceMut;

/// 形态学清理实现块.
impl<'a> MaskSliceMut<'a> {
    /// 移除面积小于 `min_area` 的 4-连通前景区域. 返回被移除的区域个数.
    pub fn remove_small_objects(&mut self, min_area: usize) -> usize {
        let small: Vec<_> = self
            .foreground_areas()
            .into_iter()
            .filter(|area| area.len() < min_area)
            .collect();
        for area in small.iter() {
            self.fill_batch(area.iter().copied(), MASK_BACKGROUND);
        }
        small.len()
    }

    /// 填充面积小于 `max_area` 且不接触图像边缘的 4-连通背景区域 (即被前景包围的空洞).
    /// 返回被填充的空洞个数.
    pub fn fill_small_holes(&mut self, max_area: usize) -> usize {
        let holes: Vec<_> = self
            .background_areas()
            .into_iter()
            .filter(|area| area.len() < max_area && self.all_within(area))
            .collect();
        for area in holes.iter() {
            self.fill_batch(area.iter().copied(), MASK_FOREGROUND);
        }
        holes.len()
    }

    /// 先移除小目标, 再填充小空洞. 顺序不可交换: 噪声造成的假空洞不应被填充.
    pub fn clean(&mut self, min_object_area: usize, min_hole_area: usize) {
        let removed = self.remove_small_objects(min_object_area);
        let filled = self.fill_small_holes(min_hole_area);
        log::debug!("mask cleaning: {removed} small objects removed, {filled} holes filled");
    }
}

#[cfg(test)]
mod tests {
    use crate::OwnedMask;
    use ndarray::Array2;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn square(mask: &mut Array2<u8>, (h, w): (usize, usize), side: usize) {
        for i in h..h + side {
            for j in w..w + side {
                mask[(i, j)] = 255;
            }
        }
    }

    #[test]
    fn test_remove_small_objects() {
        let mut a = Array2::zeros((30, 30));
        square(&mut a, (1, 1), 3); // 9
        square(&mut a, (10, 10), 8); // 64
        let mut m = OwnedMask::from_raw(a);
        assert_eq!(m.as_mutable().remove_small_objects(50), 1);
        assert_eq!(m.as_immut().count_foreground(), 64);
        assert_eq!(m[(2, 2)], 0);
    }

    #[test]
    fn test_fill_only_enclosed_small_holes() {
        let mut a = Array2::zeros((20, 20));
        square(&mut a, (0, 0), 12);
        a[(5, 5)] = 0; // 封闭小空洞
        a[(0, 3)] = 0; // 接触边缘的缺口
        let mut m = OwnedMask::from_raw(a);
        assert_eq!(m.as_mutable().fill_small_holes(50), 1);
        assert_eq!(m[(5, 5)], 255);
        assert_eq!(m[(0, 3)], 0);
    }

    #[test]
    fn test_large_hole_kept() {
        let mut a = Array2::zeros((20, 20));
        square(&mut a, (2, 2), 16);
        for i in 5..15 {
            for j in 5..15 {
                a[(i, j)] = 0;
            }
        }
        let mut m = OwnedMask::from_raw(a.clone());
        assert_eq!(m.as_mutable().fill_small_holes(50), 0);
        assert_eq!(m.into_raw(), a);
    }

    #[test]
    fn test_clean_never_adds_outside_enclosed_holes() {
        // 伪随机噪声掩码.
        let mut rng = StdRng::seed_from_u64(12345);
        let a = Array2::from_shape_fn((24, 24), |_| {
            if rng.random_range(0..3u8) == 0 {
                0u8
            } else {
                255
            }
        });
        let before = OwnedMask::from_raw(a);
        let mut after = before.clone();
        after.as_mutable().clean(5, 6);

        let b = before.as_immut();
        let fillable: Vec<_> = b
            .background_areas()
            .into_iter()
            .filter(|area| area.len() < 6 && b.all_within(area))
            .flatten()
            .collect();
        for (pos, &pix) in after.as_immut().indexed_iter() {
            if pix != 0 && b[pos] == 0 {
                assert!(!b.is_at_border(pos));
                assert!(fillable.contains(&pos));
            }
        }
    }
}
