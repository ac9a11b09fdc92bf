//! 通用常量.

/// 单通道颜色.
pub mod gray {
    /// 二值掩码中, 背景的像素值.
    pub const MASK_BACKGROUND: u8 = 0;

    /// 二值掩码中, 前景 (候选细胞核物质) 的像素值.
    pub const MASK_FOREGROUND: u8 = 255;

    /// 单通道黑色.
    pub const BLACK: u8 = 0b_0000_0000;

    /// 单通道灰色.
    pub const GRAY: u8 = 0b_1000_0000;

    /// 单通道白色.
    pub const WHITE: u8 = 0b_1111_1111;

    /// 像素是否是背景?
    #[inline]
    pub const fn is_background(p: u8) -> bool {
        matches!(p, MASK_BACKGROUND)
    }

    /// 像素是否是前景? 任何非零像素均视为前景.
    #[inline]
    pub const fn is_foreground(p: u8) -> bool {
        !is_background(p)
    }
}

/// 标签图中背景的标签值.
pub const BACKGROUND_LABEL: u32 = 0;

/// 直方图分箱个数. 覆盖 8-bit 取值范围 `[0, 255]`.
pub const HIST_BINS: usize = 256;

/// 高斯核截断倍数. 核半径为 `(truncate * sigma + 0.5) as usize`.
pub const GAUSSIAN_TRUNCATE: f64 = 4.0;

/// 默认最小细胞核面积 (像素). 更小的前景连通区域视为噪声.
pub const DEFAULT_MIN_OBJECT_AREA: usize = 50;

/// 默认最小空洞面积 (像素). 更小的封闭背景区域会被填充.
pub const DEFAULT_MIN_HOLE_AREA: usize = 50;

/// 默认种子点最小间距 (像素, 切比雪夫距离).
pub const DEFAULT_MIN_DISTANCE: usize = 5;

/// 默认距离场平滑 sigma.
pub const DEFAULT_DIST_SMOOTH_SIGMA: f64 = 1.2;

/// 默认直方图平滑 sigma.
pub const DEFAULT_HIST_SIGMA: f64 = 1.5;

/// 默认直方图峰最小突出度.
pub const DEFAULT_PEAK_PROMINENCE: f64 = 0.001;

/// 默认直方图峰最小间距 (分箱个数).
pub const DEFAULT_PEAK_DISTANCE: usize = 5;

/// 默认碎片接触比阈值.
pub const DEFAULT_CONTACT_RATIO: f64 = 0.2;

/// 默认碎片合并最大轮数.
pub const DEFAULT_MAX_MERGE_PASSES: usize = 64;

/// 默认 IoU 匹配阈值.
pub const DEFAULT_IOU_THRESHOLD: f64 = 0.5;

/// 可视化着色默认随机种子.
pub const DEFAULT_COLOR_SEED: u64 = 42;

/// 彩色真值图像的前景灰度阈值. 亮度大于该值的像素视为细胞核.
pub const GT_GRAY_THRESHOLD: u8 = 10;

/// 图像加载器识别的文件扩展名 (小写).
pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "tif", "tiff", "jpg", "bmp"];
