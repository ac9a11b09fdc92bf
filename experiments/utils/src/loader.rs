//! 对 `he-berry::dataset` 的更一层封装. 提供更直接的数据集目录与加载器.
//!
//! 每个目录都先查看对应的环境变量, 未设置时退回 `$HOME/dataset/he/...`.

use he_berry::dataset::{self, ImageLoader};
use std::env;
use std::path::{Path, PathBuf};

fn dir_from_env_or_home(var: &str, rest: &[&str]) -> Option<PathBuf> {
    match env::var(var) {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => dataset::home_dataset_dir_with(["he"].iter().chain(rest)),
    }
}

/// 获取待分割图像目录.
///
/// 1. 若环境变量 `$HE_IMAGE_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/he/images`.
pub fn image_dir_from_env_or_home() -> Option<PathBuf> {
    dir_from_env_or_home("HE_IMAGE_DIR", &["images"])
}

/// 获取真值图像目录 (`$HE_GT_DIR` 或 `$HOME/dataset/he/gt`).
pub fn gt_dir_from_env_or_home() -> Option<PathBuf> {
    dir_from_env_or_home("HE_GT_DIR", &["gt"])
}

/// 获取多边形标注目录 (`$HE_XML_DIR` 或 `$HOME/dataset/he/xml`).
pub fn xml_dir_from_env_or_home() -> Option<PathBuf> {
    dir_from_env_or_home("HE_XML_DIR", &["xml"])
}

/// 获取输出目录 (`$HE_OUTPUT_DIR` 或 `$HOME/dataset/he/output`).
pub fn output_dir_from_env_or_home() -> Option<PathBuf> {
    dir_from_env_or_home("HE_OUTPUT_DIR", &["output"])
}

/// 获取图像加载器.
#[inline]
pub fn image_loader<P: AsRef<Path>>(path: P) -> std::io::Result<ImageLoader> {
    dataset::image_loader(path)
}
