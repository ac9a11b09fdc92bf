//! 分水岭种子生成: 距离变换, 平滑, 局部极大值.

mod edt;
mod peaks;

pub use edt::euclidean_distance;
pub use peaks::peak_local_max;

use crate::config::SegmentParams;
use crate::data::{Connectivity, GrayWindow, LabelMap, MaskSlice, OwnedMask};
use crate::filter::gaussian_filter2d;
use crate::{ImgWriteVis, Idx2d};
use image::ImageResult;
use ndarray::{Array2, ArrayView2};
use std::ops::Index;
use std::path::Path;

/// 前景像素到最近背景像素的欧氏距离, 背景为 0.
#[derive(Clone, Debug)]
pub struct DistanceField {
    data: Array2<f32>,
}

impl DistanceField {
    /// 计算 `mask` 的欧氏距离变换.
    #[inline]
    pub fn from_mask(mask: &MaskSlice) -> Self {
        Self {
            data: euclidean_distance(mask),
        }
    }

    /// 以 `sigma` 做高斯平滑后的副本. `sigma` 不为正时原样复制.
    pub fn smoothed(&self, sigma: f64) -> Self {
        if sigma > 0.0 {
            Self {
                data: gaussian_filter2d(&self.data.view(), sigma),
            }
        } else {
            self.clone()
        }
    }

    /// 底层数据的视图.
    #[inline]
    pub fn array_view(&self) -> ArrayView2<f32> {
        self.data.view()
    }

    /// (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 最大距离. 空图返回 0.
    pub fn max(&self) -> f32 {
        self.data.iter().copied().fold(0.0, f32::max)
    }
}

impl Index<Idx2d> for DistanceField {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

/// 以 `[0, 最大距离]` 窗口映射为灰度图.
impl ImgWriteVis for DistanceField {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let window = GrayWindow::from_max(self.max());
        let (height, width) = self.shape();
        let mut buf = image::GrayImage::new(width as u32, height as u32);
        for ((h, w), &v) in self.data.indexed_iter() {
            let pix = window.eval(v).unwrap_or(crate::consts::gray::WHITE);
            buf.put_pixel(w as u32, h as u32, image::Luma([pix]));
        }
        buf.save(path)
    }
}

/// 分水岭种子. 每个种子可以由多个像素组成, 种子编号从 1 开始连续.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkerSet {
    seeds: Vec<(Idx2d, u32)>,
    count: u32,
}

impl MarkerSet {
    /// 由峰位置构造. 4-连通的峰像素并为同一种子, 编号按行优先顺序分配.
    pub fn from_peaks(shape: Idx2d, peaks: &[Idx2d]) -> Self {
        let mut m = OwnedMask::background(shape);
        m.as_mutable()
            .fill_batch(peaks.iter().copied(), crate::consts::gray::MASK_FOREGROUND);
        let labels = LabelMap::from_mask(&m.as_immut(), Connectivity::Four);
        let seeds = labels
            .indexed_iter()
            .filter_map(|(pos, &l)| (l != 0).then_some((pos, l)))
            .collect();
        Self {
            seeds,
            count: labels.object_count() as u32,
        }
    }

    /// 种子个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.count as usize
    }

    /// 是否没有任何种子?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// 所有种子像素及其编号, 行优先.
    #[inline]
    pub fn seeds(&self) -> &[(Idx2d, u32)] {
        &self.seeds
    }
}

/// 由二值掩码生成距离场与分水岭种子.
///
/// 种子取自平滑后的距离场; 返回的是未平滑的距离场, 供分水岭淹没使用.
pub fn generate_markers(mask: &MaskSlice, params: &SegmentParams) -> (DistanceField, MarkerSet) {
    let field = DistanceField::from_mask(mask);
    let smooth = field.smoothed(params.dist_smooth_sigma);
    let peaks = peak_local_max(
        &smooth.array_view(),
        mask,
        params.min_distance,
        params.exclude_border,
    );
    let markers = MarkerSet::from_peaks(mask.shape(), &peaks);
    log::debug!("{} markers from {} peaks", markers.len(), peaks.len());
    (field, markers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> OwnedMask {
        let mut a = Array2::zeros((40, 60));
        for i in 8..32 {
            for j in 6..26 {
                a[(i, j)] = 255u8;
            }
            for j in 34..54 {
                a[(i, j)] = 255;
            }
        }
        OwnedMask::from_raw(a)
    }

    #[test]
    fn test_markers_of_two_blobs() {
        let m = two_blobs();
        let (field, markers) = generate_markers(&m.as_immut(), &SegmentParams::default());
        assert_eq!(markers.len(), 2);
        for &(pos, id) in markers.seeds() {
            assert!(m.as_immut().is_foreground_at(pos));
            assert!(id == 1 || id == 2);
            assert!(field[pos] > 5.0);
        }
    }

    #[test]
    fn test_empty_mask_has_no_markers() {
        let m = OwnedMask::background((30, 30));
        let (field, markers) = generate_markers(&m.as_immut(), &SegmentParams::default());
        assert!(markers.is_empty());
        assert_eq!(field.max(), 0.0);
    }

    #[test]
    fn test_adjacent_peaks_share_marker() {
        let s = MarkerSet::from_peaks((5, 5), &[(1, 1), (1, 2), (3, 3)]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.seeds(), &[((1, 1), 1), ((1, 2), 1), ((3, 3), 2)]);
    }
}
