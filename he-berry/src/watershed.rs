//! 基于优先队列的标记控制分水岭.

use crate::consts::BACKGROUND_LABEL;
use crate::data::{Connectivity, LabelMap, MaskSlice};
use crate::marker::{DistanceField, MarkerSet};
use crate::Idx2d;
use binary_heap_plus::BinaryHeap;
use ndarray::ArrayView2;
use std::cmp::Ordering;

/// 待淹没的像素. 同一高度时先入队者先出队.
#[derive(Copy, Clone, Debug)]
struct Flood {
    level: f32,
    age: u64,
    pos: Idx2d,
}

/// 堆顶为高度最低 (同高度时入队最早) 的像素.
#[inline]
fn lower_first(a: &Flood, b: &Flood) -> Ordering {
    b.level.total_cmp(&a.level).then(b.age.cmp(&a.age))
}

/// 以 `markers` 为种子, 在 `mask` 的前景内按 `elevation` 从低到高淹没.
///
/// 每个像素在首次被某个已标记的 4-邻居触及时获得该邻居的标签, 之后不再改变.
/// 位于背景的种子被忽略; 不与任何种子连通的前景像素保持为背景标签.
pub fn watershed(elevation: &ArrayView2<f32>, markers: &MarkerSet, mask: &MaskSlice) -> LabelMap {
    let shape = mask.shape();
    assert_eq!(elevation.dim(), shape);
    let mut labels = LabelMap::background(shape);

    let mut heap: BinaryHeap<Flood, _> = BinaryHeap::new_by(lower_first);
    heap.reserve(markers.seeds().len() * 4);
    let mut age = 0u64;
    for &(pos, id) in markers.seeds() {
        if !mask.is_foreground_at(pos) {
            continue;
        }
        labels[pos] = id;
        heap.push(Flood {
            level: elevation[pos],
            age,
            pos,
        });
        age += 1;
    }

    while let Some(Flood { pos, .. }) = heap.pop() {
        let id = labels[pos];
        for neigh in Connectivity::Four.neighbours(pos) {
            if !mask.check(neigh)
                || !mask.is_foreground_at(neigh)
                || labels[neigh] != BACKGROUND_LABEL
            {
                continue;
            }
            labels[neigh] = id;
            heap.push(Flood {
                level: elevation[neigh],
                age,
                pos: neigh,
            });
            age += 1;
        }
    }
    labels
}

/// 以距离场的相反数为地形做分水岭, 即从各目标中心向外扩张.
pub fn watershed_on_distance(
    field: &DistanceField,
    markers: &MarkerSet,
    mask: &MaskSlice,
) -> LabelMap {
    let elevation = field.array_view().mapv(|d| -d);
    watershed(&elevation.view(), markers, mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OwnedMask;
    use ndarray::Array2;

    fn rect(a: &mut Array2<u8>, (h0, w0): Idx2d, (h1, w1): Idx2d) {
        for i in h0..h1 {
            for j in w0..w1 {
                a[(i, j)] = 255;
            }
        }
    }

    #[test]
    fn test_two_disjoint_squares() {
        let mut a = Array2::zeros((30, 40));
        rect(&mut a, (5, 5), (15, 15));
        rect(&mut a, (12, 25), (22, 35));
        let m = OwnedMask::from_raw(a);
        let markers = MarkerSet::from_peaks((30, 40), &[(10, 10), (17, 30)]);
        let field = DistanceField::from_mask(&m.as_immut());
        let labels = watershed_on_distance(&field, &markers, &m.as_immut());

        assert_eq!(labels.object_count(), 2);
        let areas = labels.areas();
        assert_eq!(areas[&1], 100);
        assert_eq!(areas[&2], 100);
        assert_eq!(labels[(5, 5)], 1);
        assert_eq!(labels[(21, 34)], 2);
    }

    #[test]
    fn test_touching_squares_split() {
        let mut a = Array2::zeros((20, 30));
        rect(&mut a, (5, 4), (15, 14));
        rect(&mut a, (5, 14), (15, 24));
        let m = OwnedMask::from_raw(a);
        let markers = MarkerSet::from_peaks((20, 30), &[(9, 8), (9, 19)]);
        let field = DistanceField::from_mask(&m.as_immut());
        let labels = watershed_on_distance(&field, &markers, &m.as_immut());

        // 标签恰好覆盖前景, 且每个标签 4-连通.
        assert_eq!(labels.to_mask(), m);
        for (_, pixels) in labels.pixels_by_label() {
            let mut sub = OwnedMask::background((20, 30));
            sub.as_mutable().fill_batch(pixels, 255);
            assert_eq!(sub.as_immut().foreground_areas().len(), 1);
        }
        assert_eq!(labels[(9, 5)], 1);
        assert_eq!(labels[(9, 22)], 2);
    }

    #[test]
    fn test_unseeded_component_stays_background() {
        let mut a = Array2::zeros((10, 20));
        rect(&mut a, (2, 2), (6, 6));
        rect(&mut a, (2, 12), (6, 16));
        let m = OwnedMask::from_raw(a);
        // 第二个种子落在背景上.
        let markers = MarkerSet::from_peaks((10, 20), &[(3, 3), (8, 8)]);
        let elevation = Array2::zeros((10, 20));
        let labels = watershed(&elevation.view(), &markers, &m.as_immut());
        assert_eq!(labels.labels(), vec![1]);
        assert_eq!(labels.count(1), 16);
        assert_eq!(labels[(3, 13)], 0);
    }
}
