//! 目录级图像加载器.
//!
//! 提供迭代器风格的数据集获取模式.

use crate::consts::{GT_GRAY_THRESHOLD, IMAGE_EXTENSIONS};
use crate::data::{Connectivity, IntensityImage, LabelMap, OwnedMask};
use crate::error::LoadError;
use std::path::{Path, PathBuf};

/// 文件名主干 (去掉扩展名). 无法取得时为空串.
pub fn file_stem<P: AsRef<Path>>(path: P) -> String {
    path.as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}

/// 为目录 `path` 下所有图像文件创建加载器, 按文件名排序.
///
/// # 注意
///
/// `path` 必须是目录, 否则程序 panic.
pub fn image_loader<P: AsRef<Path>>(path: P) -> std::io::Result<ImageLoader> {
    let path = path.as_ref().to_owned();
    assert!(path.is_dir());

    let mut files = Vec::new();
    for entry in std::fs::read_dir(&path)? {
        let entry = entry?;
        if entry.file_type()?.is_file() && is_image(&entry.path()) {
            files.push(entry.file_name());
        }
    }
    files.sort_unstable();
    files.reverse();

    Ok(ImageLoader {
        path,
        data_rev: files.into_iter().map(PathBuf::from).collect(),
    })
}

/// 强度图像加载器. 产出 `(文件名主干, 图像)`.
#[derive(Debug)]
pub struct ImageLoader {
    path: PathBuf,
    data_rev: Vec<PathBuf>,
}

impl Iterator for ImageLoader {
    type Item = (String, Result<IntensityImage, LoadError>);

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.data_rev.pop()?;

        self.path.push(&name);
        let data = IntensityImage::open(self.path.as_path());
        self.path.pop();

        Some((file_stem(&name), data))
    }
}

impl ExactSizeIterator for ImageLoader {
    #[inline]
    fn len(&self) -> usize {
        self.data_rev.len()
    }
}

/// 读取彩色 (或灰度) 真值图像: 亮度大于 [`GT_GRAY_THRESHOLD`] 的像素为前景,
/// 前景的 8-连通区域各自成为一个细胞核.
pub fn open_label_image<P: AsRef<Path>>(path: P) -> Result<LabelMap, LoadError> {
    let img = IntensityImage::open(path)?;
    let threshold = f32::from(GT_GRAY_THRESHOLD);
    let mask = OwnedMask::from_predicate(&img.array_view(), |&v| v > threshold);
    Ok(LabelMap::from_mask(&mask.as_immut(), Connectivity::Eight))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use tempfile::TempDir;

    #[test]
    fn test_image_loader_order() {
        let dir = TempDir::new().unwrap();
        GrayImage::from_pixel(3, 2, Luma([7])).save(dir.path().join("b.png")).unwrap();
        GrayImage::from_pixel(4, 4, Luma([9])).save(dir.path().join("a.png")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "skip").unwrap();
        std::fs::write(dir.path().join("c.png"), "broken").unwrap();

        let loader = image_loader(dir.path()).unwrap();
        assert_eq!(loader.len(), 3);
        let items: Vec<_> = loader.collect();
        let stems: Vec<_> = items.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(stems, vec!["a", "b", "c"]);
        assert_eq!(items[0].1.as_ref().unwrap().shape(), (4, 4));
        assert_eq!(items[1].1.as_ref().unwrap()[(1, 2)], 7.0);
        assert!(items[2].1.is_err());
    }

    #[test]
    fn test_open_label_image() {
        let dir = TempDir::new().unwrap();
        let mut img = RgbImage::new(10, 6);
        // 两个对角相连的像素属于同一对象 (8-连通).
        img.put_pixel(1, 1, Rgb([200, 30, 30]));
        img.put_pixel(2, 2, Rgb([200, 30, 30]));
        img.put_pixel(7, 4, Rgb([30, 200, 30]));
        // 过暗, 视为背景.
        img.put_pixel(5, 0, Rgb([8, 8, 8]));
        let path = dir.path().join("gt.png");
        img.save(&path).unwrap();

        let l = open_label_image(&path).unwrap();
        assert_eq!(l.shape(), (6, 10));
        assert_eq!(l.object_count(), 2);
        assert_eq!(l[(1, 1)], l[(2, 2)]);
        assert_eq!(l[(0, 5)], 0);
        assert_ne!(l[(4, 7)], 0);
    }
}
