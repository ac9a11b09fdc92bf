use crate::data::{BBox, Connectivity, LabelMap, OwnedMask};
use crate::eight::{fill_polygon, trace_outer_contour};
use crate::consts::gray::MASK_FOREGROUND;

/// 外轮廓填充实现块.
impl LabelMap {
    /// 将每个标签替换为其外轮廓围成的实心区域, 返回被改写的像素个数.
    ///
    /// 标签按升序处理, 每个标签的每个 8-连通分量各自跟踪外轮廓并光栅化 (含轮廓本身).
    /// 填充直接覆盖原有像素: 被某标签外轮廓包围的其它标签像素会被改写为该标签.
    /// 每个标签使用处理到它时的当前像素, 因此先前被覆盖的部分不再参与.
    pub fn fill_by_contour(&mut self) -> usize {
        let shape = self.shape();
        let mut changed = 0usize;

        for (label, pixels) in self.pixels_by_label() {
            let current: Vec<_> = pixels.into_iter().filter(|p| self[*p] == label).collect();
            let Some(bbox) = BBox::from_points(current.iter().copied()) else {
                continue;
            };

            // 在外接矩形内做 8-连通分量标记, 坐标均为局部坐标.
            let mut local = OwnedMask::background((bbox.height(), bbox.width()));
            local.as_mutable().fill_batch(
                current.iter().map(|&(h, w)| (h - bbox.top, w - bbox.left)),
                MASK_FOREGROUND,
            );
            let parts = LabelMap::from_mask(&local.as_immut(), Connectivity::Eight);

            for (part, part_pixels) in parts.pixels_by_label() {
                // 行优先的第一个像素是外轮廓跟踪的合法起点.
                let start = part_pixels[0];
                let contour = trace_outer_contour(start, |p| parts.get(p) == Some(&part));
                let vertices: Vec<(i64, i64)> = contour
                    .into_iter()
                    .map(|(h, w)| ((h + bbox.top) as i64, (w + bbox.left) as i64))
                    .collect();
                fill_polygon(&vertices, shape, |p| {
                    if self[p] != label {
                        self[p] = label;
                        changed += 1;
                    }
                });
            }
        }
        log::debug!("contour filling rewrote {changed} pixels");
        changed
    }
}

#[cfg(test)]
mod tests {
    use crate::data::LabelMap;
    use crate::Idx2d;
    use ndarray::Array2;

    fn paint(a: &mut Array2<u32>, (h0, w0): Idx2d, (h1, w1): Idx2d, label: u32) {
        for i in h0..h1 {
            for j in w0..w1 {
                a[(i, j)] = label;
            }
        }
    }

    fn total_area(l: &LabelMap) -> usize {
        l.areas().values().sum()
    }

    /// 10x10 的环, 中间有 4x4 空洞.
    fn ring(a: &mut Array2<u32>, (h, w): Idx2d, label: u32) {
        paint(a, (h, w), (h + 10, w + 10), label);
        paint(a, (h + 3, w + 3), (h + 7, w + 7), 0);
    }

    #[test]
    fn test_fill_ring() {
        let mut a = Array2::zeros((20, 20));
        ring(&mut a, (2, 2), 3);
        let mut l = LabelMap::from_raw(a);
        assert_eq!(l.fill_by_contour(), 16);
        assert_eq!(l.count(3), 100);
    }

    #[test]
    fn test_concavity_not_filled() {
        // 开口向右的 "C" 形.
        let mut a = Array2::zeros((8, 8));
        paint(&mut a, (1, 1), (7, 7), 1);
        paint(&mut a, (3, 3), (5, 7), 0);
        let mut l = LabelMap::from_raw(a.clone());
        assert_eq!(l.fill_by_contour(), 0);
        assert_eq!(l.into_raw(), a);
    }

    #[test]
    fn test_enclosed_label_overwritten() {
        let mut a = Array2::zeros((20, 20));
        ring(&mut a, (2, 2), 1);
        a[(6, 6)] = 2;
        let mut l = LabelMap::from_raw(a);
        let before = total_area(&l);
        l.fill_by_contour();
        assert_eq!(l.labels(), vec![1]);
        assert!(total_area(&l) >= before);
    }

    #[test]
    fn test_fill_idempotent_and_growing() {
        let mut a = Array2::zeros((40, 40));
        ring(&mut a, (1, 1), 1);
        ring(&mut a, (1, 25), 1);
        ring(&mut a, (20, 5), 2);
        paint(&mut a, (20, 15), (30, 25), 3);
        a[(35, 35)] = 4;
        a[(36, 36)] = 4;
        let mut once = LabelMap::from_raw(a);
        let before = total_area(&once);
        once.fill_by_contour();
        assert!(total_area(&once) >= before);
        assert_eq!(once.count(1), 200);
        assert_eq!(once.count(2), 100);
        assert_eq!(once.count(3), 100);
        assert_eq!(once.count(4), 2);

        let mut twice = once.clone();
        assert_eq!(twice.fill_by_contour(), 0);
        assert_eq!(twice, once);
    }
}
