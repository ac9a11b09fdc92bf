//! 运行时错误.

use std::fmt;

/// 直方图阈值计算错误.
#[derive(Debug, Clone, PartialEq)]
pub enum ThresholdError {
    /// 图像中没有任何落在 `[0, 255]` 内的有效采样.
    EmptyImage,

    /// 有效灰度级过少, 无法划分出所需类别数.
    ///
    /// 第一个参数代表实际存在的灰度级个数, 第二个参数代表所需的最少个数.
    TooFewLevels(usize, usize),
}

impl fmt::Display for ThresholdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyImage => write!(f, "image has no sample within [0, 255]"),
            Self::TooFewLevels(got, need) => {
                write!(f, "only {got} gray levels present, {need} required")
            }
        }
    }
}

impl std::error::Error for ThresholdError {}

/// 阈值计算结果.
pub type ThresholdResult<T> = Result<T, ThresholdError>;

/// 参数校验错误.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamsError {
    /// sigma 必须为有限正数. 参数分别为字段名和实际值.
    InvalidSigma(&'static str, f64),

    /// 比例必须位于 `[0, 1]`. 参数分别为字段名和实际值.
    RatioOutOfRange(&'static str, f64),

    /// 计数/距离必须为正. 参数为字段名.
    ZeroCount(&'static str),

    /// 峰突出度不能为负或非有限值.
    InvalidProminence(f64),
}

impl fmt::Display for ParamsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSigma(name, v) => write!(f, "`{name}` must be positive, got {v}"),
            Self::RatioOutOfRange(name, v) => write!(f, "`{name}` must lie in [0, 1], got {v}"),
            Self::ZeroCount(name) => write!(f, "`{name}` must be non-zero"),
            Self::InvalidProminence(v) => write!(f, "peak prominence must be >= 0, got {v}"),
        }
    }
}

impl std::error::Error for ParamsError {}

/// 载入图像/标签文件错误.
#[derive(Debug)]
pub enum LoadError {
    /// 底层 I/O 错误.
    IoError(std::io::Error),

    /// 图像解码错误.
    ImageError(image::ImageError),

    /// npy 文件读取错误.
    ReadNpyError(ndarray_npy::ReadNpyError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "I/O error: {e}"),
            Self::ImageError(e) => write!(f, "image error: {e}"),
            Self::ReadNpyError(e) => write!(f, "npy error: {e}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IoError(e) => Some(e),
            Self::ImageError(e) => Some(e),
            Self::ReadNpyError(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e)
    }
}

impl From<image::ImageError> for LoadError {
    fn from(e: image::ImageError) -> Self {
        Self::ImageError(e)
    }
}

impl From<ndarray_npy::ReadNpyError> for LoadError {
    fn from(e: ndarray_npy::ReadNpyError) -> Self {
        Self::ReadNpyError(e)
    }
}

/// 真值标注文件解析错误.
#[derive(Debug)]
pub enum AnnotationError {
    /// 底层 I/O 错误.
    IoError(std::io::Error),

    /// XML 语法错误.
    XmlError(quick_xml::Error),

    /// 属性值无法解析为数字. 参数分别为属性名和原始文本.
    BadNumber(&'static str, String),

    /// 顶点缺少坐标属性. 参数为缺失的属性名.
    MissingCoordinate(&'static str),
}

impl fmt::Display for AnnotationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "I/O error: {e}"),
            Self::XmlError(e) => write!(f, "XML error: {e}"),
            Self::BadNumber(attr, raw) => write!(f, "attribute `{attr}` is not a number: {raw:?}"),
            Self::MissingCoordinate(attr) => write!(f, "vertex without `{attr}` attribute"),
        }
    }
}

impl std::error::Error for AnnotationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IoError(e) => Some(e),
            Self::XmlError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AnnotationError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e)
    }
}

impl From<quick_xml::Error> for AnnotationError {
    fn from(e: quick_xml::Error) -> Self {
        Self::XmlError(e)
    }
}

impl From<quick_xml::events::attributes::AttrError> for AnnotationError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Self::XmlError(quick_xml::Error::InvalidAttr(e))
    }
}
