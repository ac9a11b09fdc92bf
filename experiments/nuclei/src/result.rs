//! 实验结果.

use crate::profile::Profile;
use he_berry::eval::{ObjectScore, PixelScore};
use he_berry::morphometry::{Morphometry, ShapeRecord, Stats};
use he_berry::pipeline::{AreaSummary, Segmentation};
use he_berry::threshold::ThresholdDecision;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// 一张图像的分割与评估结果.
#[derive(Clone, Debug, Serialize)]
pub struct ImageRecord {
    /// 文件名主干.
    pub stem: String,
    /// 面积统计.
    pub summary: AreaSummary,
    /// 阈值决策.
    pub threshold: ThresholdDecision,
    /// 种子个数.
    pub markers: usize,
    /// 碎片合并次数.
    pub merges: usize,
    /// 目标级评估. 没有真值时为 `None`.
    pub object: Option<ObjectScore>,
    /// 像素级评估. 没有真值时为 `None`.
    pub pixel: Option<PixelScore>,
    /// 真值中各细胞核的形状指标.
    pub gt_shapes: Vec<ShapeRecord>,
}

impl ImageRecord {
    /// 汇总一张图像的结果.
    pub fn new(
        stem: &str,
        seg: &Segmentation,
        object: Option<ObjectScore>,
        pixel: Option<PixelScore>,
        gt_shapes: Vec<ShapeRecord>,
    ) -> Self {
        Self {
            stem: stem.to_owned(),
            summary: seg.summary(),
            threshold: seg.threshold,
            markers: seg.marker_count,
            merges: seg.merges,
            object,
            pixel,
            gt_shapes,
        }
    }
}

/// 按百分比分档的图像个数: `>= 90`, `[70, 90)`, `[50, 70)`, `< 50`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Buckets {
    /// `>= 90`.
    pub excellent: usize,
    /// `[70, 90)`.
    pub good: usize,
    /// `[50, 70)`.
    pub fair: usize,
    /// `< 50`.
    pub poor: usize,
}

impl Buckets {
    /// 统计百分比序列.
    pub fn from_percents<I: IntoIterator<Item = f64>>(it: I) -> Self {
        let mut b = Self::default();
        for v in it {
            match v {
                v if v >= 90.0 => b.excellent += 1,
                v if v >= 70.0 => b.good += 1,
                v if v >= 50.0 => b.fair += 1,
                _ => b.poor += 1,
            }
        }
        b
    }
}

/// 所有已评估图像的平均指标与分布.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BatchSummary {
    /// 成功分割的图像个数.
    pub images: usize,
    /// 失败的图像个数.
    pub failed: usize,
    /// 完成评估的图像个数.
    pub evaluated: usize,
    /// 平均目标级精确率.
    pub precision: f64,
    /// 平均目标级召回率.
    pub recall: f64,
    /// 平均目标级 F1.
    pub f1: f64,
    /// 平均 IoU.
    pub mean_iou: f64,
    /// 平均计数精度 (百分比).
    pub count_precision: f64,
    /// 平均面积精度 (百分比).
    pub area_precision: f64,
    /// 平均 "平均面积" 精度 (百分比).
    pub mean_area_precision: f64,
    /// 平均像素级 F1.
    pub pixel_f1: f64,
    /// 平均像素级 IoU.
    pub pixel_iou: f64,
    /// 目标级 F1 (百分比) 分布.
    pub f1_buckets: Buckets,
    /// 计数精度分布.
    pub count_buckets: Buckets,
    /// F1 最高的图像.
    pub best: Option<(String, f64)>,
    /// F1 最低的图像.
    pub worst: Option<(String, f64)>,
    /// 全部真值细胞核的形态学统计.
    pub gt_morphometry: Option<Morphometry>,
}

fn mean<I: IntoIterator<Item = f64>>(it: I) -> f64 {
    let (sum, n) = it.into_iter().fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    he_berry::eval::ratio(sum, n)
}

/// CSV 字段. 含有分隔符或引号时加引号转义.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_owned()
    }
}

/// 批量运行最终结果.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// 成功分割的图像, 按文件名排序.
    pub records: Vec<ImageRecord>,
    /// 失败的图像及原因.
    pub failures: Vec<(String, String)>,
    /// 计时统计.
    pub profile: Profile,
}

impl BatchReport {
    fn evaluated(&self) -> impl Iterator<Item = (&ImageRecord, &ObjectScore, &PixelScore)> {
        self.records.iter().filter_map(|r| match (&r.object, &r.pixel) {
            (Some(o), Some(p)) => Some((r, o, p)),
            _ => None,
        })
    }

    /// 计算汇总.
    pub fn summary(&self) -> BatchSummary {
        let ev: Vec<_> = self.evaluated().collect();
        BatchSummary {
            images: self.records.len(),
            failed: self.failures.len(),
            evaluated: ev.len(),
            precision: mean(ev.iter().map(|e| e.1.precision)),
            recall: mean(ev.iter().map(|e| e.1.recall)),
            f1: mean(ev.iter().map(|e| e.1.f1)),
            mean_iou: mean(ev.iter().map(|e| e.1.mean_iou)),
            count_precision: mean(ev.iter().map(|e| e.1.count_precision)),
            area_precision: mean(ev.iter().map(|e| e.1.area_precision)),
            mean_area_precision: mean(ev.iter().map(|e| e.1.mean_area_precision)),
            pixel_f1: mean(ev.iter().map(|e| e.2.f1)),
            pixel_iou: mean(ev.iter().map(|e| e.2.iou)),
            f1_buckets: Buckets::from_percents(ev.iter().map(|e| e.1.f1 * 100.0)),
            count_buckets: Buckets::from_percents(ev.iter().map(|e| e.1.count_precision)),
            best: ev
                .iter()
                .max_by(|a, b| a.1.f1.total_cmp(&b.1.f1))
                .map(|e| (e.0.stem.clone(), e.1.f1)),
            worst: ev
                .iter()
                .min_by(|a, b| a.1.f1.total_cmp(&b.1.f1))
                .map(|e| (e.0.stem.clone(), e.1.f1)),
            gt_morphometry: Morphometry::from_records(
                self.records.iter().flat_map(|r| r.gt_shapes.iter()),
            ),
        }
    }

    /// 每张图像一行的分割结果.
    pub fn write_segmentation_csv<W: Write>(&self, mut w: W) -> io::Result<()> {
        writeln!(
            w,
            "image,nuclei,mean_area,min_area,max_area,method,threshold,modes,markers,merges"
        )?;
        for r in self.records.iter() {
            let s = &r.summary;
            writeln!(
                w,
                "{},{},{:.2},{},{},{},{:.2},{},{},{}",
                csv_field(&r.stem),
                s.count,
                s.mean,
                s.min,
                s.max,
                r.threshold.method,
                r.threshold.value,
                r.threshold.modes,
                r.markers,
                r.merges
            )?;
        }
        Ok(())
    }

    /// 每张已评估图像一行的评估结果.
    pub fn write_evaluation_csv<W: Write>(&self, mut w: W) -> io::Result<()> {
        writeln!(
            w,
            "image,tp,fp,fn,precision,recall,f1,mean_iou,gt_count,pred_count,count_precision,\
             mean_gt_area,mean_pred_area,mean_area_precision,area_precision,\
             pixel_precision,pixel_recall,pixel_f1,pixel_iou,pixel_accuracy"
        )?;
        for (r, o, p) in self.evaluated() {
            writeln!(
                w,
                "{},{},{},{},{:.4},{:.4},{:.4},{:.4},{},{},{:.2},{:.2},{:.2},{:.2},{:.2},{:.4},{:.4},{:.4},{:.4},{:.4}",
                csv_field(&r.stem),
                o.tp,
                o.fp,
                o.fn_,
                o.precision,
                o.recall,
                o.f1,
                o.mean_iou,
                o.gt_count,
                o.pred_count,
                o.count_precision,
                o.mean_gt_area,
                o.mean_pred_area,
                o.mean_area_precision,
                o.area_precision,
                p.precision,
                p.recall,
                p.f1,
                p.iou,
                p.accuracy
            )?;
        }
        Ok(())
    }

    /// 每个真值细胞核一行的形状指标.
    pub fn write_gt_regions_csv<W: Write>(&self, mut w: W) -> io::Result<()> {
        writeln!(
            w,
            "image,label,area,perimeter,width,height,circularity,solidity,aspect_ratio,equivalent_diameter"
        )?;
        for r in self.records.iter() {
            for g in r.gt_shapes.iter() {
                writeln!(
                    w,
                    "{},{},{},{},{},{},{:.4},{:.4},{:.4},{:.2}",
                    csv_field(&r.stem),
                    g.label,
                    g.area,
                    g.perimeter,
                    g.width,
                    g.height,
                    g.circularity,
                    g.solidity,
                    g.aspect_ratio,
                    g.equivalent_diameter
                )?;
            }
        }
        Ok(())
    }

    /// 在 `dir` 下写出 `segmentation.csv`, `evaluation.csv`, `gt_regions.csv`, `summary.json`.
    pub fn save_to(&self, dir: &Path) -> anyhow::Result<()> {
        let mut w = BufWriter::new(File::create(dir.join("segmentation.csv"))?);
        self.write_segmentation_csv(&mut w)?;
        w.flush()?;

        let mut w = BufWriter::new(File::create(dir.join("evaluation.csv"))?);
        self.write_evaluation_csv(&mut w)?;
        w.flush()?;

        let mut w = BufWriter::new(File::create(dir.join("gt_regions.csv"))?);
        self.write_gt_regions_csv(&mut w)?;
        w.flush()?;

        let mut w = BufWriter::new(File::create(dir.join("summary.json"))?);
        serde_json::to_writer_pretty(&mut w, &self.summary())?;
        w.flush()?;
        Ok(())
    }

    /// 分析运行结果.
    pub fn analyze(&self) {
        utils::sep();
        let mut buf = Vec::with_capacity(1024);
        if describe_into(self, &mut buf).is_ok() {
            println!("{}", String::from_utf8_lossy(&buf));
        }
        utils::sep();
    }
}

/// 将 `report` 的结果写进 `w` 中.
fn describe_into<W: Write>(report: &BatchReport, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    #[inline]
    fn f64_to_display(f: Option<f64>) -> String {
        match f {
            Some(f) => format!("{f:.3}"),
            None => "/".to_string(),
        }
    }

    let p = &report.profile;
    let s = report.summary();
    writeln!(w, "Batch:")?;
    writeln!(w, "{S4}Segmented images: {}", p.get_segmented())?;
    writeln!(w, "{S4}Failed images: {}", p.get_failed())?;
    for (stem, why) in report.failures.iter() {
        writeln!(w, "{S4}{S4}{stem}: {why}")?;
    }
    writeln!(w, "{S4}Evaluated images: {}", p.get_scored())?;
    writeln!(w, "{S4}Total wall time: {} ms", p.get_wall_ms())?;
    writeln!(
        w,
        "{S4}Average time per image: {} ms",
        f64_to_display(p.get_avg_busy_ms())
    )?;
    if let Some((stem, d)) = p.get_slowest() {
        writeln!(w, "{S4}Slowest image: {stem} ({} ms)", d.as_millis())?;
    }
    if let Some(m) = &s.gt_morphometry {
        utils::sep_to(&mut *w)?;
        describe_morphometry_into(m, w)?;
        writeln!(w)?;
    }
    if s.evaluated == 0 {
        return Ok(());
    }

    utils::sep_to(&mut *w)?;
    writeln!(w, "Objects (IoU matching):")?;
    writeln!(w, "{S4}Precision: {:.2}%", s.precision * 100.0)?;
    writeln!(w, "{S4}Recall: {:.2}%", s.recall * 100.0)?;
    writeln!(w, "{S4}F1-score: {:.2}%", s.f1 * 100.0)?;
    writeln!(w, "{S4}Mean IoU: {:.4}", s.mean_iou)?;
    writeln!(w, "{S4}Count precision: {:.2}%", s.count_precision)?;
    writeln!(w, "{S4}Mean area precision: {:.2}%", s.mean_area_precision)?;
    writeln!(w, "{S4}Per-object area precision: {:.2}%", s.area_precision)?;
    writeln!(w, "Pixels:")?;
    writeln!(w, "{S4}F1 (Dice): {:.2}%", s.pixel_f1 * 100.0)?;
    writeln!(w, "{S4}IoU: {:.2}%", s.pixel_iou * 100.0)?;

    utils::sep_to(&mut *w)?;
    for (name, b) in [("F1", &s.f1_buckets), ("Count", &s.count_buckets)] {
        writeln!(w, "{name} distribution:")?;
        writeln!(w, "{S4}>= 90%: {}", b.excellent)?;
        writeln!(w, "{S4}70-90%: {}", b.good)?;
        writeln!(w, "{S4}50-70%: {}", b.fair)?;
        writeln!(w, "{S4}< 50%: {}", b.poor)?;
    }
    if let (Some(best), Some(worst)) = (&s.best, &s.worst) {
        writeln!(w, "Best image: {} (F1 {:.2}%)", best.0, best.1 * 100.0)?;
        writeln!(w, "Worst image: {} (F1 {:.2}%)", worst.0, worst.1 * 100.0)?;
    }

    Ok(())
}

/// 将真值形态学统计写进 `w` 中.
fn describe_morphometry_into<W: Write>(m: &Morphometry, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    writeln!(w, "Ground truth morphometry ({} nuclei):", m.objects)?;
    writeln!(
        w,
        "{S4}{:<14}{:>9}{:>9}{:>9}{:>9}{:>9}{:>9}",
        "", "mean", "std", "p5", "median", "p95", "max"
    )?;
    let rows: [(&str, &Stats); 5] = [
        ("area", &m.area),
        ("perimeter", &m.perimeter),
        ("circularity", &m.circularity),
        ("solidity", &m.solidity),
        ("aspect ratio", &m.aspect_ratio),
    ];
    for (name, st) in rows {
        writeln!(
            w,
            "{S4}{name:<14}{:>9.3}{:>9.3}{:>9.3}{:>9.3}{:>9.3}{:>9.3}",
            st.mean, st.std, st.p5, st.median, st.p95, st.max
        )?;
    }
    let sg = &m.suggestions;
    writeln!(w, "Suggested parameters:")?;
    writeln!(w, "{S4}Minimum object area: {:.0} px", sg.min_object_area)?;
    writeln!(w, "{S4}Minimum circularity: {:.2}", sg.min_circularity)?;
    writeln!(w, "{S4}Minimum solidity: {:.2}", sg.min_solidity)?;
    writeln!(w, "{S4}Maximum aspect ratio: {:.1}", sg.max_aspect_ratio)?;
    writeln!(
        w,
        "{S4}Expected area range: {:.0} - {:.0} px",
        sg.area_range.0, sg.area_range.1
    )?;
    write!(w, "{S4}Mean diameter: {:.1} px", sg.mean_diameter)
}
