//! 单张图像的完整分割流程:
//! 阈值 -> 形态学清理 -> 种子 -> 分水岭 -> 碎片合并 -> 外轮廓填充.

use crate::config::SegmentParams;
use crate::data::{IntensityImage, LabelMap, OwnedMask};
use crate::error::ThresholdResult;
use crate::marker::{generate_markers, DistanceField};
use crate::post_proc::{merge_fragments, MergeOrder};
use crate::threshold::{modal_threshold, ThresholdDecision};
use crate::watershed::watershed_on_distance;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 一张图像的分割结果及中间产物.
#[derive(Clone, Debug)]
pub struct Segmentation {
    /// 最终标签图.
    pub labels: LabelMap,
    /// 清理后的二值掩码.
    pub mask: OwnedMask,
    /// 掩码的 (未平滑) 距离场.
    pub distance: DistanceField,
    /// 阈值决策.
    pub threshold: ThresholdDecision,
    /// 分水岭种子个数.
    pub marker_count: usize,
    /// 碎片合并次数.
    pub merges: usize,
}

/// 细胞核面积统计.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct AreaSummary {
    /// 细胞核个数.
    pub count: usize,
    /// 平均面积. 没有细胞核时为 0.
    pub mean: f64,
    /// 最小面积. 没有细胞核时为 0.
    pub min: usize,
    /// 最大面积. 没有细胞核时为 0.
    pub max: usize,
}

impl Segmentation {
    /// `(标签, 面积)` 列表, 按标签升序.
    #[inline]
    pub fn areas(&self) -> Vec<(u32, usize)> {
        self.labels.label_areas()
    }

    /// 面积统计.
    pub fn summary(&self) -> AreaSummary {
        let areas: Vec<usize> = self.labels.areas().into_values().collect();
        let (Some(&min), Some(&max)) = (areas.iter().min(), areas.iter().max()) else {
            return AreaSummary::default();
        };
        AreaSummary {
            count: areas.len(),
            mean: crate::eval::ratio(areas.iter().sum::<usize>(), areas.len()),
            min,
            max,
        }
    }
}

/// 分割流程. 持有一份参数, 可对多张图像重复使用.
#[derive(Clone, Debug, Default)]
pub struct Segmenter {
    params: SegmentParams,
    order: MergeOrder,
}

impl Segmenter {
    /// 以给定参数创建. 参数不做检查, 需要时请先调用 [`SegmentParams::validate`].
    #[inline]
    pub fn new(params: SegmentParams) -> Self {
        Self {
            params,
            order: MergeOrder::default(),
        }
    }

    /// 设置碎片合并时的遍历顺序.
    #[inline]
    pub fn with_merge_order(mut self, order: MergeOrder) -> Self {
        self.order = order;
        self
    }

    /// 参数.
    #[inline]
    pub fn params(&self) -> &SegmentParams {
        &self.params
    }

    /// 分割一张图像.
    ///
    /// 仅当图像中没有任何有效采样时返回 `Err`. 没有前景或没有种子时得到全背景标签图.
    pub fn run(&self, img: &IntensityImage) -> ThresholdResult<Segmentation> {
        let p = &self.params;
        let threshold = modal_threshold(img, p)?;
        let mut mask = threshold.apply(img);
        mask.as_mutable().clean(p.min_object_area, p.min_hole_area);

        let (distance, markers) = generate_markers(&mask.as_immut(), p);
        let mut labels = watershed_on_distance(&distance, &markers, &mask.as_immut());
        let merges = merge_fragments(&mut labels, p.contact_ratio, p.max_merge_passes, self.order);
        labels.fill_by_contour();

        log::debug!(
            "segmented with {} (threshold {:.2}, {} modes): {} markers, {} merges, {} nuclei",
            threshold.method,
            threshold.value,
            threshold.modes,
            markers.len(),
            merges,
            labels.object_count()
        );
        Ok(Segmentation {
            labels,
            mask,
            distance,
            threshold,
            marker_count: markers.len(),
            merges,
        })
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
    }
}

/// 并发操作部分
#[cfg(feature = "rayon")]
impl Segmenter {
    /// 借助 `rayon`, 并行地分割一批互相独立的图像. 结果与输入一一对应.
    pub fn par_segment_batch(
        &self,
        images: &[IntensityImage],
    ) -> Vec<ThresholdResult<Segmentation>> {
        let failed = AtomicUsize::new(0);
        let ans: Vec<_> = images
            .par_iter()
            .map(|img| {
                let r = self.run(img);
                if r.is_err() {
                    failed.fetch_add(1, Ordering::Relaxed);
                }
                r
            })
            .collect();
        log::debug!(
            "batch of {} images segmented, {} failed",
            images.len(),
            failed.load(Ordering::Relaxed)
        );
        ans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    /// 亮背景上的两个暗圆盘, 其中一个带有亮的小空洞.
    fn synthetic() -> IntensityImage {
        let disk = |(i, j): (usize, usize), (ci, cj): (f32, f32), r: f32| {
            (i as f32 - ci).hypot(j as f32 - cj) <= r
        };
        IntensityImage::from_raw(Array2::from_shape_fn((64, 96), |p| {
            if disk(p, (30.0, 30.0), 2.0) {
                220.0
            } else if disk(p, (30.0, 30.0), 12.0) || disk(p, (32.0, 70.0), 10.0) {
                60.0
            } else {
                220.0
            }
        }))
    }

    #[test]
    fn test_pipeline_on_synthetic_image() {
        let _ = simple_logger::init_with_level(log::Level::Debug);
        let seg = Segmenter::default().run(&synthetic()).unwrap();
        assert_eq!(seg.labels.object_count(), 2);
        // 空洞被填充.
        assert_ne!(seg.labels[(30, 30)], 0);
        assert_ne!(seg.labels[(30, 30)], seg.labels[(32, 70)]);
        assert_eq!(seg.labels[(0, 0)], 0);

        let s = seg.summary();
        assert_eq!(s.count, 2);
        assert!(s.min <= s.max);
        assert_eq!(seg.areas().len(), 2);
    }

    #[test]
    fn test_blank_image_gives_background() {
        let img = IntensityImage::from_raw(Array2::from_elem((40, 40), 200.0));
        let seg = Segmenter::default().run(&img).unwrap();
        assert!(seg.labels.is_background());
        assert_eq!(seg.marker_count, 0);
        assert_eq!(seg.summary(), AreaSummary::default());
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn test_par_segment_batch() {
        let bad = IntensityImage::from_raw(Array2::from_elem((4, 4), f32::NAN));
        let out = Segmenter::default().par_segment_batch(&[synthetic(), bad, synthetic()]);
        assert_eq!(out.len(), 3);
        assert!(matches!(out[1], Err(crate::error::ThresholdError::EmptyImage)));
        let counts: Vec<_> = [&out[0], &out[2]]
            .iter()
            .map(|r| r.as_ref().map(|s| s.labels.object_count()).unwrap_or(0))
            .collect();
        assert_eq!(counts, vec![2, 2]);
    }
}
