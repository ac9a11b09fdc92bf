//! 程序运行函数.

use crate::config::RunConfig;
use crate::profile::Profile;
use crate::result::{BatchReport, ImageRecord};
use anyhow::{ensure, Context};
use he_berry::consts::IMAGE_EXTENSIONS;
use he_berry::dataset::{open_label_image, Annotation};
use he_berry::morphometry::shape_records;
use he_berry::prelude::*;
use rayon::iter::{ParallelBridge, ParallelIterator};
use std::path::{Path, PathBuf};
use std::time::Instant;
use utils::loader;

/// 运行所需的目录.
#[derive(Debug)]
pub struct Dirs {
    /// 待分割图像.
    pub images: PathBuf,
    /// 真值图像 (彩色/灰度标签图).
    pub gt: Option<PathBuf>,
    /// 多边形标注. 同名文件同时存在时优先于 `gt`.
    pub xml: Option<PathBuf>,
    /// 输出.
    pub output: PathBuf,
}

impl Dirs {
    /// 按环境变量或默认位置确定目录. 不存在的真值目录被忽略.
    pub fn from_env_or_home() -> anyhow::Result<Self> {
        let images = loader::image_dir_from_env_or_home().context("cannot locate image directory")?;
        ensure!(images.is_dir(), "{} is not a directory", images.display());
        let output = loader::output_dir_from_env_or_home().context("cannot locate output directory")?;
        let existing = |p: Option<PathBuf>| p.filter(|p| p.is_dir());
        Ok(Self {
            images,
            gt: existing(loader::gt_dir_from_env_or_home()),
            xml: existing(loader::xml_dir_from_env_or_home()),
            output,
        })
    }
}

/// 真值标签图, 以及 (可能存在的) 标注面积.
type GroundTruth = (LabelMap, Option<Vec<f64>>);

fn find_ground_truth(stem: &str, shape: Idx2d, dirs: &Dirs) -> anyhow::Result<Option<GroundTruth>> {
    if let Some(xml_dir) = dirs.xml.as_ref() {
        let p = xml_dir.join(format!("{stem}.xml"));
        if p.is_file() {
            let a = Annotation::open(&p).with_context(|| format!("annotation {}", p.display()))?;
            return Ok(Some((a.to_label_map(shape), a.polygon_areas())));
        }
    }
    if let Some(gt_dir) = dirs.gt.as_ref() {
        for ext in IMAGE_EXTENSIONS {
            let p = gt_dir.join(format!("{stem}.{ext}"));
            if p.is_file() {
                let l = open_label_image(&p).with_context(|| format!("ground truth {}", p.display()))?;
                return Ok(Some((l, None)));
            }
        }
    }
    Ok(None)
}

fn save_outputs(stem: &str, seg: &Segmentation, gt: Option<&LabelMap>, out: &Path) -> anyhow::Result<()> {
    seg.labels.save(out.join(format!("{stem}_labels.png")))?;
    seg.labels.save_raw(out.join(format!("{stem}_labels_raw.png")))?;
    seg.labels.save_npy(out.join(format!("{stem}_labels.npy")))?;
    seg.mask.save(out.join(format!("{stem}_mask.png")))?;
    seg.distance.save(out.join(format!("{stem}_distance.png")))?;
    if let Some(gt) = gt {
        diff_overlay(gt, &seg.labels).save(out.join(format!("{stem}_diff.png")))?;
    }
    Ok(())
}

/// 处理一张图像: 分割, 寻找真值并评估, 按需输出图像.
fn process(
    stem: &str,
    img: IntensityImage,
    segmenter: &Segmenter,
    cfg: &RunConfig,
    dirs: &Dirs,
) -> anyhow::Result<ImageRecord> {
    let seg = segmenter.run(&img)?;
    let gt = find_ground_truth(stem, img.shape(), dirs)?;
    if gt.is_none() {
        log::debug!("{stem}: no ground truth found");
    }

    let (object, pixel) = match gt.as_ref() {
        Some((gt, areas)) => (
            Some(match_regions(gt, &seg.labels, &cfg.eval, areas.as_deref())),
            Some(score_pixels(gt, &seg.labels)),
        ),
        None => (None, None),
    };
    if cfg.save_images {
        save_outputs(stem, &seg, gt.as_ref().map(|(l, _)| l), &dirs.output)?;
    }

    let gt_shapes = gt
        .as_ref()
        .map(|(l, _)| shape_records(l, cfg.segment.min_object_area))
        .unwrap_or_default();
    let record = ImageRecord::new(stem, &seg, object, pixel, gt_shapes);
    log::info!(
        "{stem}: {} nuclei, threshold {:.1} ({})",
        record.summary.count,
        record.threshold.value,
        record.threshold.method
    );
    Ok(record)
}

/// 实际运行.
pub fn run(cfg: &RunConfig, dirs: &Dirs) -> anyhow::Result<BatchReport> {
    let mut profile = Profile::new();
    std::fs::create_dir_all(&dirs.output)
        .with_context(|| format!("creating {}", dirs.output.display()))?;

    let images = loader::image_loader(&dirs.images)?;
    let total = images.len();
    log::info!(
        "segmenting {total} images from {} on {} threads",
        dirs.images.display(),
        utils::cpus()
    );
    if dirs.gt.is_none() && dirs.xml.is_none() {
        log::warn!("no ground truth directory found, evaluation skipped");
    }

    let segmenter = Segmenter::new(cfg.segment.clone()).with_merge_order(cfg.merge_order);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(utils::cpus())
        .build()?;
    let mut outcomes: Vec<_> = pool.install(|| {
        images
            .par_bridge()
            .map(|(stem, img)| {
                let start = Instant::now();
                let r = img
                    .map_err(anyhow::Error::from)
                    .and_then(|img| process(&stem, img, &segmenter, cfg, dirs));
                (stem, r, start.elapsed())
            })
            .collect()
    });
    outcomes.sort_by(|a, b| a.0.cmp(&b.0));

    let mut report = BatchReport::default();
    for (stem, r, d) in outcomes {
        match r {
            Ok(record) => {
                profile.record(&stem, true, record.object.is_some(), d);
                report.records.push(record);
            }
            Err(e) => {
                log::warn!("{stem}: skipped, {e:#}");
                profile.record(&stem, false, false, d);
                report.failures.push((stem, format!("{e:#}")));
            }
        }
    }
    report.profile = profile.finish();
    Ok(report)
}
