//! 二值掩码切片对象的操作.

mod core;
mod iter;
mod save;

pub use self::core::{MaskSlice, MaskSliceMut, OwnedMask};

pub use save::{ImgWriteRaw, ImgWriteVis};
