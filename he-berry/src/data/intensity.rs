//! 单通道强度图像.

use crate::error::LoadError;
use crate::Idx2d;
use image::GrayImage;
use ndarray::iter::Iter;
use ndarray::{Array2, ArrayView2, Ix2};
use std::ops::Index;
use std::path::Path;

/// 拥有所有权的只读单通道强度图像.
///
/// 像素以 `f32` 存储, 取值约定为 8-bit 灰度范围 `[0, 255]`.
/// 细胞核在 H&E 染色下比背景更暗.
#[derive(Clone, Debug, PartialEq)]
pub struct IntensityImage {
    data: Array2<f32>,
}

impl Index<Idx2d> for IntensityImage {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl IntensityImage {
    /// 直接初始化.
    #[inline]
    pub fn from_raw(data: Array2<f32>) -> Self {
        Self { data }
    }

    /// 从 8-bit 数组创建.
    pub fn from_u8(data: &ArrayView2<u8>) -> Self {
        Self {
            data: data.mapv(f32::from),
        }
    }

    /// 从 8-bit 灰度图创建.
    pub fn from_gray(img: &GrayImage) -> Self {
        let (w, h) = img.dimensions();
        let data = Array2::from_shape_fn((h as usize, w as usize), |(y, x)| {
            f32::from(img.get_pixel(x as u32, y as u32)[0])
        });
        Self { data }
    }

    /// 从图像文件读取. 彩色图像会转换为亮度通道.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let img = image::open(path)?.to_luma8();
        Ok(Self::from_gray(&img))
    }

    /// 获得底层数据的一份不可变 shallow copy.
    #[inline]
    pub fn array_view(&self) -> ArrayView2<f32> {
        self.data.view()
    }

    /// 获取可以迭代图像像素的迭代器.
    #[inline]
    pub fn iter(&self) -> Iter<'_, f32, Ix2> {
        self.data.iter()
    }

    /// 以行优先规则, 获取能迭代图像所有 `(索引, 强度)` 的迭代器.
    #[inline]
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &f32)> {
        self.data.indexed_iter()
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 图像的像素个数.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 有限像素值的最小值与最大值. 没有有限像素时返回 `None`.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        use itertools::{Itertools, MinMaxResult};
        match self.data.iter().copied().filter(|v| v.is_finite()).minmax_by(f32::total_cmp) {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(v) => Some((v, v)),
            MinMaxResult::MinMax(a, b) => Some((a, b)),
        }
    }
}
