use super::{align_to, precision_from_error, ratio};
use crate::config::EvalParams;
use crate::data::{BBox, LabelMap};
use crate::Idx2d;
use std::collections::{BTreeMap, HashSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 一对被接受的 (真值, 预测) 匹配, 即一个真阳性.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct MatchRecord {
    /// 真值标签.
    pub gt_label: u32,
    /// 预测标签.
    pub pred_label: u32,
    /// 交并比.
    pub iou: f64,
    /// 真值面积. 可能来自标注文件而非像素计数.
    pub gt_area: f64,
    /// 预测面积 (像素个数).
    pub pred_area: f64,
    /// 面积相对误差 `|pred - gt| / gt * 100`.
    pub area_error: f64,
}

/// 目标级评估结果. `precision`, `recall`, `f1`, `mean_iou` 为 `[0, 1]` 内的比值,
/// 其余 "精度" 字段为百分比.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectScore {
    /// 真阳性个数.
    pub tp: usize,
    /// 假阳性个数 (未被匹配的预测).
    pub fp: usize,
    /// 假阴性个数 (未被匹配的真值).
    #[cfg_attr(feature = "serde", serde(rename = "fn"))]
    pub fn_: usize,
    /// `TP / (TP + FP)`.
    pub precision: f64,
    /// `TP / (TP + FN)`.
    pub recall: f64,
    /// 精确率与召回率的调和平均.
    pub f1: f64,
    /// 所有真阳性的平均交并比.
    pub mean_iou: f64,
    /// 真值对象个数.
    pub gt_count: usize,
    /// 预测对象个数.
    pub pred_count: usize,
    /// 计数精度 `max(0, 100 - |pred - gt| / gt * 100)`. 真值为空时为 0.
    pub count_precision: f64,
    /// 真阳性的平均面积相对误差 (百分比).
    pub mean_area_error: f64,
    /// `max(0, 100 - mean_area_error)`.
    pub area_precision: f64,
    /// 真值平均面积.
    pub mean_gt_area: f64,
    /// 预测平均面积.
    pub mean_pred_area: f64,
    /// 平均面积的精度 `max(0, 100 - |mean_pred - mean_gt| / mean_gt * 100)`.
    pub mean_area_precision: f64,
    /// 全部真阳性匹配, 按接受顺序排列.
    pub matches: Vec<MatchRecord>,
}

/// 参与匹配的一个对象.
struct Object {
    label: u32,
    pixels: Vec<Idx2d>,
    bbox: BBox,
}

fn objects(labels: &LabelMap) -> Vec<Object> {
    labels
        .pixels_by_label()
        .into_iter()
        .filter_map(|(label, pixels)| {
            let bbox = BBox::from_points(pixels.iter().copied())?;
            Some(Object {
                label,
                pixels,
                bbox,
            })
        })
        .collect()
}

#[inline]
fn mean<I: IntoIterator<Item = f64>>(it: I) -> f64 {
    let (sum, n) = it.into_iter().fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    ratio(sum, n)
}

/// 以交并比贪心匹配真值对象与预测对象.
///
/// 仅对外接矩形相交的 (真值, 预测) 对计算交并比, 保留不低于
/// `params.iou_threshold` 的候选对, 按交并比降序 (相同时保持发现顺序) 依次接受
/// 双方都尚未被占用的对. 这是最大权二分匹配的贪心近似.
///
/// `gt_areas` 按真值标签升序给出每个真值对象的面积 (例如标注文件中的 `Area` 属性);
/// 仅当其长度与真值对象个数一致时才会替代像素计数, 且只影响面积相关指标.
pub fn match_regions(
    gt: &LabelMap,
    pred: &LabelMap,
    params: &EvalParams,
    gt_areas: Option<&[f64]>,
) -> ObjectScore {
    let pred = align_to(pred, gt.shape());
    let gt_objs = objects(gt);
    let pred_objs = objects(&pred);

    let gt_area_of: Vec<f64> = match gt_areas {
        Some(areas) if areas.len() == gt_objs.len() => areas.to_vec(),
        Some(areas) => {
            log::debug!(
                "{} annotated areas for {} ground truth objects, using pixel counts",
                areas.len(),
                gt_objs.len()
            );
            gt_objs.iter().map(|o| o.pixels.len() as f64).collect()
        }
        None => gt_objs.iter().map(|o| o.pixels.len() as f64).collect(),
    };

    // (iou, 真值下标, 预测下标), 按发现顺序.
    let mut candidates: Vec<(f64, usize, usize)> = Vec::new();
    for (gi, g) in gt_objs.iter().enumerate() {
        let mut overlap: Option<BTreeMap<u32, usize>> = None;
        for (pi, p) in pred_objs.iter().enumerate() {
            if !g.bbox.overlaps(&p.bbox) {
                continue;
            }
            let counts = overlap.get_or_insert_with(|| {
                let mut m = BTreeMap::new();
                for pos in g.pixels.iter() {
                    *m.entry(pred[*pos]).or_insert(0usize) += 1;
                }
                m
            });
            let inter = counts.get(&p.label).copied().unwrap_or(0);
            let union = g.pixels.len() + p.pixels.len() - inter;
            let iou = ratio(inter, union);
            if iou >= params.iou_threshold {
                candidates.push((iou, gi, pi));
            }
        }
    }
    candidates.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut gt_claimed = HashSet::new();
    let mut pred_claimed = HashSet::new();
    let mut matches = Vec::new();
    for (iou, gi, pi) in candidates {
        if gt_claimed.contains(&gi) || pred_claimed.contains(&pi) {
            continue;
        }
        gt_claimed.insert(gi);
        pred_claimed.insert(pi);
        let gt_area = gt_area_of[gi];
        let pred_area = pred_objs[pi].pixels.len() as f64;
        matches.push(MatchRecord {
            gt_label: gt_objs[gi].label,
            pred_label: pred_objs[pi].label,
            iou,
            gt_area,
            pred_area,
            area_error: ratio((pred_area - gt_area).abs(), gt_area) * 100.0,
        });
    }

    let (gt_count, pred_count) = (gt_objs.len(), pred_objs.len());
    let tp = matches.len();
    let (fp, fn_) = (pred_count - tp, gt_count - tp);
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = ratio(2.0 * precision * recall, precision + recall);

    let count_precision = if gt_count == 0 {
        0.0
    } else {
        precision_from_error(ratio(gt_count.abs_diff(pred_count), gt_count) * 100.0)
    };
    let mean_area_error = mean(matches.iter().map(|m| m.area_error));
    let mean_gt_area = mean(gt_area_of.iter().copied());
    let mean_pred_area = mean(pred_objs.iter().map(|o| o.pixels.len() as f64));

    ObjectScore {
        tp,
        fp,
        fn_,
        precision,
        recall,
        f1,
        mean_iou: mean(matches.iter().map(|m| m.iou)),
        gt_count,
        pred_count,
        count_precision,
        mean_area_error,
        area_precision: precision_from_error(mean_area_error),
        mean_gt_area,
        mean_pred_area,
        mean_area_precision: precision_from_error(
            ratio((mean_pred_area - mean_gt_area).abs(), mean_gt_area) * 100.0,
        ),
        matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn squares(shape: Idx2d, corners: &[Idx2d], side: usize) -> LabelMap {
        let mut a = Array2::zeros(shape);
        for (k, &(h, w)) in corners.iter().enumerate() {
            for i in h..h + side {
                for j in w..w + side {
                    a[(i, j)] = k as u32 + 1;
                }
            }
        }
        LabelMap::from_raw(a)
    }

    #[test]
    fn test_all_background() {
        let z = LabelMap::background((100, 100));
        let s = match_regions(&z, &z, &EvalParams::default(), None);
        assert_eq!((s.tp, s.fp, s.fn_), (0, 0, 0));
        assert_eq!((s.precision, s.recall, s.f1), (0.0, 0.0, 0.0));
        assert_eq!(s.count_precision, 0.0);
    }

    #[test]
    fn test_identity() {
        let l = squares((50, 50), &[(1, 1), (1, 20), (30, 5), (30, 30)], 8);
        let s = match_regions(&l, &l, &EvalParams::default(), None);
        assert_eq!((s.tp, s.fp, s.fn_), (4, 0, 0));
        assert!(f64_eq(s.mean_iou, 1.0));
        assert!(f64_eq(s.f1, 1.0));
        assert!(f64_eq(s.count_precision, 100.0));
        assert!(f64_eq(s.area_precision, 100.0));
    }

    #[test]
    fn test_one_missing() {
        let gt = squares((40, 40), &[(2, 2), (2, 20), (20, 10)], 10);
        let pred = squares((40, 40), &[(2, 2), (2, 20)], 10);
        let s = match_regions(&gt, &pred, &EvalParams::default(), None);
        assert_eq!((s.tp, s.fn_, s.fp), (2, 1, 0));
        assert!(f64_eq(s.recall, 2.0 / 3.0));
        assert!(f64_eq(s.precision, 1.0));
        assert!(f64_eq(s.count_precision, 100.0 - 100.0 / 3.0));
    }

    #[test]
    fn test_swap_symmetry() {
        let gt = squares((40, 40), &[(2, 2), (2, 20), (20, 10), (30, 30)], 8);
        // 第一个偏移一列, 第二个偏移过多, 第四个缺失, 另有一个多余预测.
        let pred = squares((40, 40), &[(2, 3), (6, 24), (20, 10), (30, 2)], 8);
        let p = EvalParams::default();
        let a = match_regions(&gt, &pred, &p, None);
        let b = match_regions(&pred, &gt, &p, None);
        assert_eq!(a.tp, 2);
        assert_eq!(a.tp, b.tp);
        assert_eq!((a.fp, a.fn_), (b.fn_, b.fp));
        assert!(f64_eq(a.f1, b.f1));
    }

    #[test]
    fn test_area_override_and_resize() {
        let gt = squares((20, 20), &[(0, 0)], 10);
        let pred = squares((40, 40), &[(0, 0)], 20);
        let s = match_regions(&gt, &pred, &EvalParams::default(), Some(&[125.0]));
        assert_eq!(s.tp, 1);
        assert!(f64_eq(s.mean_iou, 1.0));
        // 面积 100 对比标注面积 125.
        assert!(f64_eq(s.matches[0].area_error, 20.0));
        assert!(f64_eq(s.area_precision, 80.0));

        // 个数不一致时忽略标注面积.
        let s = match_regions(&gt, &gt, &EvalParams::default(), Some(&[1.0, 2.0]));
        assert!(f64_eq(s.mean_gt_area, 100.0));
    }
}
