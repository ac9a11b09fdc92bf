//! 过分割碎片合并.
//!
//! 分水岭常把一个细胞核切成几块共享长边界的碎片. 若两块碎片的接触长度
//! 与其中较小周长之比超过阈值, 则将两者合并. 反复扫描直到某一轮没有任何合并,
//! 因此 A-B-C 这样的链式碎片最终会传递地合并为一个对象.
//!
//! 每一轮的全部判定都基于该轮开始时的标签图, 判定完成后再统一合并,
//! 所以最终的划分与遍历顺序无关.

use crate::consts::BACKGROUND_LABEL;
use crate::data::{BBox, Connectivity, LabelMap};
use crate::{Area2d, Idx2d};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound::{Excluded, Unbounded};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 一组碎片合并后保留哪一个标签值. 不影响像素划分.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum MergeOrder {
    /// 保留最小的标签.
    #[default]
    Ascending,

    /// 保留最大的标签.
    Descending,
}

/// 一个仍然存活的标签的几何信息.
#[derive(Clone, Debug)]
struct Fragment {
    pixels: Area2d,
    perimeter: usize,
    bbox: BBox,
}

impl Fragment {
    /// `pixels` 必须非空, 且恰为 `labels` 中标签 `label` 的全部像素.
    fn measure(labels: &LabelMap, label: u32, pixels: Area2d) -> Self {
        let Some(bbox) = BBox::from_points(pixels.iter().copied()) else {
            unreachable!("label {label} has no pixel");
        };
        Self {
            perimeter: crack_perimeter(labels, label, &pixels),
            pixels,
            bbox,
        }
    }
}

/// 裂缝周长: 区域像素与非区域像素 (或图像外部) 之间共享的像素边条数.
pub fn crack_perimeter(labels: &LabelMap, label: u32, pixels: &[Idx2d]) -> usize {
    pixels
        .iter()
        .flat_map(|p| Connectivity::Four.neighbours(*p))
        .filter(|n| labels.get(*n) != Some(&label))
        .count()
}

/// 标签间的 8-邻接关系. 背景不参与.
fn neighbour_graph(labels: &LabelMap) -> BTreeMap<u32, BTreeSet<u32>> {
    let mut graph: BTreeMap<u32, BTreeSet<u32>> = BTreeMap::new();
    for (pos, &l) in labels.indexed_iter() {
        if l == BACKGROUND_LABEL {
            continue;
        }
        for n in Connectivity::Eight.neighbours(pos) {
            match labels.get(n) {
                Some(&m) if m != BACKGROUND_LABEL && m != l => {
                    graph.entry(l).or_default().insert(m);
                }
                _ => {}
            }
        }
    }
    graph
}

/// `target` 中落在标签 `label` 的 3x3 膨胀范围内的像素个数.
fn dilated_overlap(labels: &LabelMap, label: u32, target: &Fragment) -> usize {
    target
        .pixels
        .iter()
        .filter(|p| {
            Connectivity::Eight
                .neighbours(**p)
                .any(|n| labels.get(n) == Some(&label))
        })
        .count()
}

/// 接触长度: 分界线两侧紧贴对方的像素总数. 对 `(i, j)` 对称.
fn contact(labels: &LabelMap, (i, fi): (u32, &Fragment), (j, fj): (u32, &Fragment)) -> usize {
    dilated_overlap(labels, i, fj) + dilated_overlap(labels, j, fi)
}

/// 并查集. 每个分量的根总是其中最小的标签.
#[derive(Debug, Default)]
struct Forest(BTreeMap<u32, u32>);

impl Forest {
    fn find(&mut self, mut x: u32) -> u32 {
        while let Some(&p) = self.0.get(&x) {
            if let Some(&g) = self.0.get(&p) {
                self.0.insert(x, g);
            }
            x = p;
        }
        x
    }

    fn union(&mut self, a: u32, b: u32) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.0.insert(ra.max(rb), ra.min(rb));
        }
    }

    /// 非平凡的分量, 键为根.
    fn groups(mut self) -> BTreeMap<u32, Vec<u32>> {
        let members: Vec<u32> = self.0.keys().copied().collect();
        let mut groups: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
        for m in members {
            let r = self.find(m);
            groups.entry(r).or_insert_with(|| vec![r]).push(m);
        }
        groups
    }
}

/// 就地合并 `labels` 中的过分割碎片, 返回被吸收的标签个数.
///
/// 每一轮重新构建邻接关系, 对每一对相邻的存活标签 `(i, j)` 计算接触长度
/// 与 `min(周长_i, 周长_j)`; 最小周长为 0 时跳过, 比值大于 `ratio` 时记为待合并.
/// 一轮结束后按连通分量统一合并, 每个分量保留 `order` 指定的标签,
/// 并重新计算其面积/周长/外接框. 被吸收的标签值不再出现在标签图中.
///
/// 经过 `max_passes` 轮仍有合并发生时停止, 并输出一条警告.
pub fn merge_fragments(
    labels: &mut LabelMap,
    ratio: f64,
    max_passes: usize,
    order: MergeOrder,
) -> usize {
    let mut live: BTreeMap<u32, Fragment> = labels
        .pixels_by_label()
        .into_iter()
        .map(|(l, pixels)| (l, Fragment::measure(labels, l, pixels)))
        .collect();
    let mut total = 0usize;

    for pass in 0..max_passes {
        let graph = neighbour_graph(labels);
        let mut forest = Forest::default();

        for (&i, neighbours) in graph.iter() {
            for &j in neighbours.range((Excluded(i), Unbounded)) {
                let (Some(fi), Some(fj)) = (live.get(&i), live.get(&j)) else {
                    continue;
                };
                let min_perimeter = fi.perimeter.min(fj.perimeter);
                if min_perimeter == 0 || !fi.bbox.expand(1).overlaps(&fj.bbox) {
                    continue;
                }
                let touching = contact(labels, (i, fi), (j, fj));
                if (touching as f64 / min_perimeter as f64) > ratio {
                    log::trace!("pass {pass}: labels {i} and {j} touch ({touching} of {min_perimeter})");
                    forest.union(i, j);
                }
            }
        }

        let groups = forest.groups();
        if groups.is_empty() {
            log::debug!("fragment merging converged after {} passes, {total} merges", pass + 1);
            return total;
        }

        let mut remap: BTreeMap<u32, u32> = BTreeMap::new();
        for members in groups.values() {
            let keep = match order {
                MergeOrder::Ascending => members.iter().min(),
                MergeOrder::Descending => members.iter().max(),
            };
            let Some(&keep) = keep else {
                continue;
            };
            remap.extend(members.iter().filter(|&&m| m != keep).map(|&m| (m, keep)));
        }
        for l in labels.array_view_mut().iter_mut() {
            if let Some(&k) = remap.get(&*l) {
                *l = k;
            }
        }

        let mut grown: BTreeMap<u32, (Area2d, BBox)> = BTreeMap::new();
        for (&absorbed, &keep) in remap.iter() {
            let Some(f) = live.remove(&absorbed) else {
                unreachable!("label {absorbed} was alive at the start of the pass");
            };
            let entry = grown.entry(keep).or_insert_with(|| (Vec::new(), f.bbox));
            entry.1 = entry.1.union(&f.bbox);
            entry.0.extend(f.pixels);
        }
        for (keep, (pixels, bbox)) in grown {
            let Some(f) = live.get_mut(&keep) else {
                unreachable!("label {keep} was alive at the start of the pass");
            };
            f.pixels.extend(pixels);
            f.bbox = f.bbox.union(&bbox);
            f.perimeter = crack_perimeter(labels, keep, &f.pixels);
        }

        log::trace!("pass {pass}: {} labels absorbed", remap.len());
        total += remap.len();
    }
    if max_passes > 0 {
        log::warn!("fragment merging stopped at the pass cap ({max_passes}) without converging");
    }
    total
}
