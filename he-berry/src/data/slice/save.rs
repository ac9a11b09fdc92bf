//! 图像的持久化存储.

use crate::data::LabelMap;
use crate::error::LoadError;
use crate::{MaskSlice, MaskSliceMut, OwnedMask};
use image::ImageResult;
use ndarray_npy::{read_npy, write_npy, WriteNpyError};
use std::path::Path;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// `ImgWriteVis` trait 的意图是, 图像将以 "可视化友好"
/// 的方式保存, 而不是 "as is" 的方式. 对于二值掩码, 前景映射为白色;
/// 对于标签图, 每个标签使用固定种子生成的随机颜色;
/// 对于距离场, 以 `[0, 最大值]` 窗口规范化.
pub trait ImgWriteVis {
    /// 按照一定的可视化规则将图片保存到 `path` 路径.
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 表明一个可以通过 **按原样** 模式持久化存储的图像对象.
pub trait ImgWriteRaw {
    /// 按原样将图片保存到 `path` 路径.
    fn save_raw<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 使像素更有利于单通道可视化.
#[inline]
pub(crate) fn pretty(pix: u8) -> u8 {
    use crate::consts::gray::*;
    if is_foreground(pix) {
        WHITE
    } else {
        BLACK
    }
}

macro_rules! impl_mask_save {
    ($($slice: ty),+) => {
        $(
            /// 背景为黑色, 前景为白色.
            impl ImgWriteVis for $slice {
                fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
                    let (height, width) = self.shape();
                    let mut buf = image::GrayImage::new(width as u32, height as u32);
                    for ((h, w), &pix) in self.indexed_iter() {
                        buf.put_pixel(w as u32, h as u32, image::Luma([pretty(pix)]));
                    }
                    buf.save(path)
                }
            }

            /// 按原样存储.
            impl ImgWriteRaw for $slice {
                fn save_raw<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
                    let (height, width) = self.shape();
                    let mut buf = image::GrayImage::new(width as u32, height as u32);
                    for ((h, w), &pix) in self.indexed_iter() {
                        buf.put_pixel(w as u32, h as u32, image::Luma([pix]));
                    }
                    buf.save(path)
                }
            }
        )+
    };
}

impl_mask_save!(MaskSlice<'_>, MaskSliceMut<'_>);

impl ImgWriteVis for OwnedMask {
    #[inline]
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        self.as_immut().save(path)
    }
}

/// 每个标签着以固定种子的随机颜色, 背景为黑色.
impl ImgWriteVis for LabelMap {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        crate::vis::colorize_default(self).save(path)
    }
}

/// 以 16-bit 灰度存储标签值, 超出 `u16` 范围的标签被截断为 `u16::MAX`.
impl ImgWriteRaw for LabelMap {
    fn save_raw<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let (height, width) = self.shape();
        let mut buf = image::ImageBuffer::<image::Luma<u16>, Vec<u16>>::new(width as u32, height as u32);
        for ((h, w), &l) in self.indexed_iter() {
            let v = u16::try_from(l).unwrap_or(u16::MAX);
            buf.put_pixel(w as u32, h as u32, image::Luma([v]));
        }
        buf.save(path)
    }
}

impl LabelMap {
    /// 将标签图按原样存储为 `.npy` 文件.
    pub fn save_npy<P: AsRef<Path>>(&self, path: P) -> Result<(), WriteNpyError> {
        write_npy(path, &self.array_view())
    }

    /// 从 `.npy` 文件读取标签图.
    pub fn open_npy<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        Ok(Self::from_raw(read_npy(path)?))
    }
}
