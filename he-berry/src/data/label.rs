//! 细胞核标签图.

use super::slice::{MaskSlice, OwnedMask};
use crate::consts::gray::*;
use crate::consts::BACKGROUND_LABEL;
use crate::{Area2d, Idx2d};
use ndarray::iter::Iter;
use ndarray::{Array2, ArrayView2, ArrayViewMut2, Ix2};
use std::collections::{BTreeMap, VecDeque};
use std::ops::{Index, IndexMut};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 连通性规则.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Connectivity {
    /// 4-邻接.
    Four,

    /// 8-邻接.
    Eight,
}

impl Connectivity {
    /// 获得 `pos` 在该规则下的邻居索引. 不检查越界.
    #[inline]
    pub(crate) fn neighbours(&self, pos: Idx2d) -> impl Iterator<Item = Idx2d> {
        let n8 = crate::eight::neighbour8(pos);
        let four = matches!(self, Self::Four);
        // neighbour8 中下标 1, 3, 4, 6 恰为 4-邻居.
        n8.into_iter()
            .enumerate()
            .filter(move |(i, _)| !four || matches!(i, 1 | 3 | 4 | 6))
            .map(|(_, p)| p)
    }
}

/// 拥有所有权的二维标签图.
///
/// `0` 为背景, 每个正整数代表一个细胞核. 标签值不要求连续;
/// 经过碎片合并后, 某些标签值可能不再有任何像素, 它们不构成对象.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelMap {
    data: Array2<u32>,
}

impl Index<Idx2d> for LabelMap {
    type Output = u32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx2d> for LabelMap {
    #[inline]
    fn index_mut(&mut self, index: Idx2d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl LabelMap {
    /// 创建全背景标签图.
    #[inline]
    pub fn background(shape: Idx2d) -> Self {
        Self {
            data: Array2::from_elem(shape, BACKGROUND_LABEL),
        }
    }

    /// 直接初始化.
    #[inline]
    pub fn from_raw(data: Array2<u32>) -> Self {
        Self { data }
    }

    /// 对二值掩码做连通域标记. 标签从 1 开始, 按各区域首个像素的行优先顺序编号.
    pub fn from_mask(mask: &MaskSlice, conn: Connectivity) -> Self {
        let shape = mask.shape();
        let mut data = Array2::from_elem(shape, BACKGROUND_LABEL);
        let mut next = 1u32;
        let mut q = VecDeque::with_capacity(16);

        for (pos, &pix) in mask.indexed_iter() {
            if !is_foreground(pix) || data[pos] != BACKGROUND_LABEL {
                continue;
            }
            data[pos] = next;
            q.push_back(pos);
            while let Some(cur) = q.pop_front() {
                for neigh in conn.neighbours(cur) {
                    if mask.is_foreground_at(neigh) && data[neigh] == BACKGROUND_LABEL {
                        data[neigh] = next;
                        q.push_back(neigh);
                    }
                }
            }
            next += 1;
        }
        Self { data }
    }

    /// 获得 **底层** 数据的一份不可变 shallow copy.
    #[inline]
    pub fn array_view(&self) -> ArrayView2<u32> {
        self.data.view()
    }

    /// 获得 **底层** 数据的一份可变 shallow copy.
    #[inline]
    pub fn array_view_mut(&mut self) -> ArrayViewMut2<u32> {
        self.data.view_mut()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<u32> {
        self.data
    }

    /// 获取可以迭代图像像素的迭代器.
    #[inline]
    pub fn iter(&self) -> Iter<'_, u32, Ix2> {
        self.data.iter()
    }

    /// 以行优先规则, 获取能迭代图像所有 `(索引, 标签)` 的迭代器.
    #[inline]
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &u32)> {
        self.data.indexed_iter()
    }

    /// 获取给定位置 (高, 宽) 的标签. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<&u32> {
        self.data.get(pos)
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
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

    /// 该图是否为全背景图?
    #[inline]
    pub fn is_background(&self) -> bool {
        self.data.iter().all(|l| *l == BACKGROUND_LABEL)
    }

    /// 所有出现过的非背景标签, 升序排列.
    pub fn labels(&self) -> Vec<u32> {
        self.areas().into_keys().collect()
    }

    /// 对象 (至少有一个像素的非背景标签) 个数.
    #[inline]
    pub fn object_count(&self) -> usize {
        self.areas().len()
    }

    /// 每个非背景标签的像素个数, 按标签升序.
    pub fn areas(&self) -> BTreeMap<u32, usize> {
        let mut ans = BTreeMap::new();
        for &l in self.data.iter().filter(|l| **l != BACKGROUND_LABEL) {
            *ans.entry(l).or_insert(0usize) += 1;
        }
        ans
    }

    /// `(标签, 面积)` 列表, 按标签升序.
    #[inline]
    pub fn label_areas(&self) -> Vec<(u32, usize)> {
        self.areas().into_iter().collect()
    }

    /// 每个非背景标签的全部像素 (行优先顺序).
    pub fn pixels_by_label(&self) -> BTreeMap<u32, Area2d> {
        let mut ans: BTreeMap<u32, Area2d> = BTreeMap::new();
        for (pos, &l) in self.data.indexed_iter() {
            if l != BACKGROUND_LABEL {
                ans.entry(l).or_default().push(pos);
            }
        }
        ans
    }

    /// 统计标签为 `label` 的像素个数.
    #[inline]
    pub fn count(&self, label: u32) -> usize {
        self.data.iter().filter(|l| **l == label).count()
    }

    /// 转换为二值掩码: 任意非背景标签均为前景.
    pub fn to_mask(&self) -> OwnedMask {
        OwnedMask::from_predicate(&self.data.view(), |l| *l != BACKGROUND_LABEL)
    }

    /// 将所有标签为 `old` 的像素改为 `new`. 返回改写的像素个数.
    pub fn replace(&mut self, old: u32, new: u32) -> usize {
        let mut cnt = 0usize;
        self.data
            .iter_mut()
            .filter(|l| **l == old)
            .for_each(|l| {
                cnt += 1;
                *l = new;
            });
        cnt
    }

    /// 以最近邻插值缩放到 `(h, w)`. 源索引为 `floor(dst * src_len / dst_len)`.
    pub fn resize_nearest(&self, (h, w): Idx2d) -> Self {
        let (sh, sw) = self.shape();
        if (sh, sw) == (h, w) {
            return self.clone();
        }
        if sh == 0 || sw == 0 {
            return Self::background((h, w));
        }
        let data = Array2::from_shape_fn((h, w), |(y, x)| {
            let sy = (y * sh / h).min(sh - 1);
            let sx = (x * sw / w).min(sw - 1);
            self.data[(sy, sx)]
        });
        Self { data }
    }
}
