use crate::Idx2d;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 轴对齐外接矩形. 上/左边界包含在内, 下/右边界不包含 (半开区间).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BBox {
    /// 最小行号.
    pub top: usize,
    /// 最小列号.
    pub left: usize,
    /// 最大行号 + 1.
    pub bottom: usize,
    /// 最大列号 + 1.
    pub right: usize,
}

impl BBox {
    /// 仅包含一个像素的矩形.
    #[inline]
    pub fn from_point((h, w): Idx2d) -> Self {
        Self {
            top: h,
            left: w,
            bottom: h + 1,
            right: w + 1,
        }
    }

    /// 包含 `it` 中全部像素的最小矩形. `it` 为空时返回 `None`.
    pub fn from_points<I: IntoIterator<Item = Idx2d>>(it: I) -> Option<Self> {
        let mut it = it.into_iter();
        let mut ans = Self::from_point(it.next()?);
        it.for_each(|p| ans.extend(p));
        Some(ans)
    }

    /// 扩展矩形, 使其包含 `(h, w)`.
    #[inline]
    pub fn extend(&mut self, (h, w): Idx2d) {
        self.top = self.top.min(h);
        self.left = self.left.min(w);
        self.bottom = self.bottom.max(h + 1);
        self.right = self.right.max(w + 1);
    }

    /// 同时包含两者的最小矩形.
    #[inline]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            top: self.top.min(other.top),
            left: self.left.min(other.left),
            bottom: self.bottom.max(other.bottom),
            right: self.right.max(other.right),
        }
    }

    /// 两个矩形是否有公共像素.
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.top < other.bottom
            && other.top < self.bottom
            && self.left < other.right
            && other.left < self.right
    }

    /// 向四周各扩张 `margin` 个像素. 上/左边界在 0 处截断, 下/右边界不截断.
    #[inline]
    pub fn expand(&self, margin: usize) -> Self {
        Self {
            top: self.top.saturating_sub(margin),
            left: self.left.saturating_sub(margin),
            bottom: self.bottom + margin,
            right: self.right + margin,
        }
    }

    /// 矩形是否包含 `(h, w)`.
    #[inline]
    pub fn contains(&self, (h, w): Idx2d) -> bool {
        (self.top..self.bottom).contains(&h) && (self.left..self.right).contains(&w)
    }

    /// 高.
    #[inline]
    pub fn height(&self) -> usize {
        self.bottom - self.top
    }

    /// 宽.
    #[inline]
    pub fn width(&self) -> usize {
        self.right - self.left
    }

    /// 面积.
    #[inline]
    pub fn area(&self) -> usize {
        self.height() * self.width()
    }
}
