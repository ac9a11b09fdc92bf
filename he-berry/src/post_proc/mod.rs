//! 二值掩码与标签图的后处理: 形态学清理, 碎片合并, 外轮廓填充.

mod clean;
mod fill;
mod merge;

pub use merge::{crack_perimeter, merge_fragments, MergeOrder};
