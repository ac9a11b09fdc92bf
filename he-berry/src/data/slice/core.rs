use crate::consts::gray::*;
use crate::{Area2d, Areas2d, Idx2d, Predicate};
use ndarray::iter::{Iter, IterMut};
use ndarray::{Array2, ArrayView2, ArrayViewMut2, Ix2};
use std::collections::VecDeque;
use std::ops::{Index, IndexMut};

/// 不可变、借用的二维二值掩码.
pub struct MaskSlice<'a> {
    /// 底层数据的轻量级视图, 借用于 [`OwnedMask`] 或外部数组.
    data: ArrayView2<'a, u8>,
}

impl Index<Idx2d> for MaskSlice<'_> {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

/// 可变、借用的二维二值掩码.
pub struct MaskSliceMut<'a> {
    /// 底层数据的轻量级视图, 借用于 [`OwnedMask`] 或外部数组.
    data: ArrayViewMut2<'a, u8>,
}

/// 可变方法集合.
impl<'a> MaskSliceMut<'a> {
    /// 获得 **底层** 数据的一份可变 shallow copy.
    #[inline]
    pub fn array_view_mut(&mut self) -> ArrayViewMut2<u8> {
        self.data.view_mut()
    }

    /// 获取可以迭代并修改图像像素的迭代器.
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, u8, Ix2> {
        self.data.iter_mut()
    }

    /// 获取给定位置 (高, 宽) 的像素值, 并可就地修改. 越界时返回 `None`.
    #[inline]
    pub fn get_mut(&mut self, pos: Idx2d) -> Option<&mut u8> {
        self.data.get_mut(pos)
    }

    /// 将 `it` 中的每个索引对应的像素改为 `new`.
    pub fn fill_batch<I: IntoIterator<Item = Idx2d>>(&mut self, it: I, new: u8) {
        for pos in it.into_iter() {
            self[pos] = new;
        }
    }

    /// 将所有非零像素规范化为 [`MASK_FOREGROUND`]. 返回被改写的像素个数.
    pub fn normalize(&mut self) -> usize {
        let mut cnt = 0usize;
        self.iter_mut()
            .filter(|p| is_foreground(**p) && **p != MASK_FOREGROUND)
            .for_each(|p| {
                cnt += 1;
                *p = MASK_FOREGROUND;
            });
        cnt
    }
}

impl Index<Idx2d> for MaskSliceMut<'_> {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx2d> for MaskSliceMut<'_> {
    #[inline]
    fn index_mut(&mut self, index: Idx2d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

/// mask 不可变方法集合.
macro_rules! impl_mask_slice_immut {
    ($life: lifetime, $slice: ty, $array: ty) => {
        /// 不可变方法集合.
        impl<$life> $slice {
            /// 直接初始化.
            #[inline]
            pub fn new(data: $array) -> Self {
                Self { data }
            }

            /// 获得 **底层** 数据的一份不可变 shallow copy.
            #[inline]
            pub fn array_view(&self) -> ArrayView2<u8> {
                self.data.view()
            }

            /// 获取可以迭代图像像素的迭代器.
            #[inline]
            pub fn iter(&self) -> Iter<'_, u8, Ix2> {
                self.data.iter()
            }

            /// 获取给定位置 (高, 宽) 的像素值. 越界时返回 `None`.
            #[inline]
            pub fn get(&self, pos: Idx2d) -> Option<&u8> {
                self.data.get(pos)
            }

            /// 该图是否为全背景图?
            #[inline]
            pub fn is_background(&self) -> bool {
                self.data.iter().copied().all(is_background)
            }

            /// 图像的分辨率 (高, 宽).
            #[inline]
            pub fn shape(&self) -> Idx2d {
                self.data.dim()
            }

            /// 图像的像素个数.
            #[inline]
            pub fn size(&self) -> usize {
                let (h, w) = self.shape();
                h * w
            }

            /// 获得图像的高.
            #[inline]
            pub fn height(&self) -> usize {
                self.shape().0
            }

            /// 获得图像的宽.
            #[inline]
            pub fn width(&self) -> usize {
                self.shape().1
            }

            /// 判断一个索引是否合法 (未越界).
            #[inline]
            pub fn check(&self, (h, w): Idx2d) -> bool {
                let (h_len, w_len) = self.shape();
                h < h_len && w < w_len
            }

            /// 统计前景像素个数.
            #[inline]
            pub fn count_foreground(&self) -> usize {
                self.data.iter().filter(|p| is_foreground(**p)).count()
            }

            /// 判断 `pos` 处是否为前景.
            #[inline]
            pub fn is_foreground_at(&self, pos: Idx2d) -> bool {
                matches!(self.get(pos), Some(&p) if is_foreground(p))
            }

            /// 克隆自己, 获得一个拥有所有权的掩码对象.
            pub fn to_owned(&self) -> OwnedMask {
                OwnedMask {
                    data: self.data.to_owned(),
                }
            }

            /// 判断一个索引是否位于图像的边缘.
            #[inline]
            pub fn is_at_border(&self, (h, w): Idx2d) -> bool {
                h == 0
                    || h.saturating_add(1) == self.height()
                    || w == 0
                    || w.saturating_add(1) == self.width()
            }

            /// 判断 `positions` 的索引是否全部都在图像的内部.
            #[inline]
            pub fn all_within(&self, positions: &[Idx2d]) -> bool {
                positions.iter().all(|p| !self.is_at_border(*p))
            }

            /// 以行优先规则, 获取能迭代图像所有索引的迭代器.
            #[inline]
            pub fn pos_iter(&self) -> impl Iterator<Item = Idx2d> {
                super::iter::PosIter::new(self.shape())
            }

            /// 以行优先规则, 获取能迭代图像所有 `(索引, 像素值)` 的迭代器.
            #[inline]
            pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &u8)> {
                self.data.indexed_iter()
            }

            /// 按照 4-相邻规则获取所有区域. 两个像素 `p1` 和 `p2` 属于同一个区域,
            /// 当且仅当存在一条从 `p1` 到 `p2` 的 4-相邻路径, 且路径上的所有像素
            /// (包括 `p1` 和 `p2`) 都满足谓词 `pred`.
            ///
            /// 区域按照其首个像素的行优先顺序排列, 区域内像素按 BFS 顺序排列.
            pub fn areas(&self, pred: Predicate) -> Areas2d {
                self.areas_from_local(self.pos_iter(), pred)
            }

            /// 按照 4-相邻原则获得图像中所有前景区域.
            #[inline]
            pub fn foreground_areas(&self) -> Areas2d {
                self.areas(is_foreground)
            }

            /// 按照 4-相邻原则获得图像中所有背景区域.
            #[inline]
            pub fn background_areas(&self) -> Areas2d {
                self.areas(is_background)
            }

            /// 按照 4-相邻规则获取所有区域, 但区域的起点由 `it` 指定.
            /// 两个像素 `p1` 和 `p2` 属于同一个区域, 当且仅当存在一条从 `p1` 到
            /// `p2` 的 4-相邻路径, 且路径上的所有像素 (包括 `p1` 和 `p2`)
            /// 都满足谓词 `pred`.
            pub fn areas_from_local<I: IntoIterator<Item = Idx2d>>(
                &self,
                it: I,
                pred: Predicate,
            ) -> Areas2d {
                let mut ans = Areas2d::with_capacity(1);
                let mut bfs_q = VecDeque::with_capacity(4);
                let mut visited = Array2::from_elem(self.shape(), false);

                for pos in it.into_iter() {
                    if visited[pos] || !pred(self[pos]) {
                        continue;
                    }
                    visited[pos] = true;
                    bfs_q.push_back(pos);
                    let mut this_area = Area2d::with_capacity(1);
                    while let Some(cur) = bfs_q.pop_front() {
                        this_area.push(cur);
                        for neigh in crate::eight::neighbour4(cur) {
                            if self.check(neigh) && !visited[neigh] && pred(self[neigh]) {
                                visited[neigh] = true;
                                bfs_q.push_back(neigh);
                            }
                        }
                    }
                    ans.push(this_area);
                }
                ans
            }
        }
    };
}

impl_mask_slice_immut!('a, MaskSlice<'a>, ArrayView2<'a, u8>);
impl_mask_slice_immut!('a, MaskSliceMut<'a>, ArrayViewMut2<'a, u8>);

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 拥有所有权的二维二值掩码.
///
/// `OwnedMask` 仅提供到 `MaskSlice` 和 `MaskSliceMut`
/// 的轻量转换和底层数据移动, 以及少量构造方法.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedMask {
    data: Array2<u8>,
}

impl OwnedMask {
    /// 创建全背景掩码.
    #[inline]
    pub fn background(shape: Idx2d) -> Self {
        Self {
            data: Array2::from_elem(shape, MASK_BACKGROUND),
        }
    }

    /// 从原始数组创建掩码. 任何非零值都会被规范化为 [`MASK_FOREGROUND`].
    pub fn from_raw(mut data: Array2<u8>) -> Self {
        MaskSliceMut::new(data.view_mut()).normalize();
        Self { data }
    }

    /// 以 `pred` 逐元素判定前景, 从任意二维数组创建掩码.
    pub fn from_predicate<T, F>(src: &ArrayView2<T>, mut pred: F) -> Self
    where
        F: FnMut(&T) -> bool,
    {
        Self {
            data: src.map(|v| if pred(v) { MASK_FOREGROUND } else { MASK_BACKGROUND }),
        }
    }

    /// 获得不可变切片引用.
    #[inline]
    pub fn as_immut(&self) -> MaskSlice<'_> {
        MaskSlice::new(self.data.view())
    }

    /// 获得可变切片引用.
    #[inline]
    pub fn as_mutable(&mut self) -> MaskSliceMut<'_> {
        MaskSliceMut::new(self.data.view_mut())
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<u8> {
        self.data
    }
}

impl Index<Idx2d> for OwnedMask {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Connectivity;
    use ndarray::array;

    #[test]
    fn test_areas_n4() {
        // 对角相邻的两个像素不属于同一 4-连通区域.
        let m = OwnedMask::from_raw(array![[1, 0, 0], [0, 1, 1], [0, 0, 1]]);
        let m = m.as_immut();
        let areas = m.foreground_areas();
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0], vec![(0, 0)]);
        assert_eq!(areas[1].len(), 3);
        assert_eq!(m.background_areas().len(), 2);
    }

    #[test]
    fn test_from_raw_normalizes() {
        let m = OwnedMask::from_raw(array![[0, 7], [255, 1]]);
        assert_eq!(m.clone().into_raw(), array![[0, 255], [255, 255]]);
        assert_eq!(m.as_immut().count_foreground(), 3);
    }

    #[test]
    fn test_border_and_neighbours() {
        let m = OwnedMask::background((3, 4));
        let m = m.as_immut();
        assert!(m.is_at_border((0, 1)));
        assert!(m.is_at_border((2, 2)));
        assert!(!m.is_at_border((1, 1)));
        let inside = |c: Connectivity, p: Idx2d| c.neighbours(p).filter(|n| m.check(*n)).count();
        assert_eq!(inside(Connectivity::Four, (0, 0)), 2);
        assert_eq!(inside(Connectivity::Eight, (1, 1)), 8);
        assert_eq!(inside(Connectivity::Eight, (2, 3)), 3);
        assert!(m.all_within(&[(1, 1), (1, 2)]));
        assert!(!m.all_within(&[(1, 1), (0, 2)]));
        assert!(m.is_background());
    }
}
