//! 运行配置.

use anyhow::Context;
use he_berry::config::{EvalParams, SegmentParams};
use he_berry::post_proc::MergeOrder;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 一次批量运行的全部可调项. JSON 中缺失的字段取默认值.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// 分割参数.
    pub segment: SegmentParams,

    /// 评估参数.
    pub eval: EvalParams,

    /// 碎片合并遍历顺序.
    pub merge_order: MergeOrder,

    /// 是否为每张图像输出可视化结果与 `.npy` 标签图.
    pub save_images: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            segment: SegmentParams::default(),
            eval: EvalParams::default(),
            merge_order: MergeOrder::default(),
            save_images: true,
        }
    }
}

impl RunConfig {
    /// 从 JSON 文件读取并检查.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        cfg.segment.validate()?;
        cfg.eval.validate()?;
        Ok(cfg)
    }

    /// 若设置了 `$HE_CONFIG`, 读取其指向的文件; 否则使用默认配置.
    pub fn from_env() -> anyhow::Result<Self> {
        match std::env::var("HE_CONFIG") {
            Ok(p) if !p.is_empty() => Self::open(p),
            _ => Ok(Self::default()),
        }
    }
}
