//! 基础数据结构: 强度图像, 二值掩码, 标签图.

mod bbox;
mod intensity;
mod label;
pub mod slice;
mod window;

pub use bbox::BBox;
pub use intensity::IntensityImage;
pub use label::{Connectivity, LabelMap};
pub use slice::{ImgWriteRaw, ImgWriteVis, MaskSlice, MaskSliceMut, OwnedMask};
pub use window::GrayWindow;
