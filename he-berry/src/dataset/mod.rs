//! 数据集操作: 图像目录遍历, 真值图像与多边形标注的读取.

use std::path::{Path, PathBuf};

mod annotation;
mod loader;

pub use annotation::{AnnotatedRegion, Annotation};
pub use loader::{file_stem, image_loader, open_label_image, ImageLoader};

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_dataset_dir()?;
    ans.extend(it);
    Some(ans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_dataset_dir_with() {
        if let (Some(base), Some(full)) = (home_dataset_dir(), home_dataset_dir_with(["he", "images"])) {
            assert!(full.starts_with(&base));
            assert!(full.ends_with("he/images"));
        }
    }
}
