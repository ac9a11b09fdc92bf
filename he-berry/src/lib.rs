#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 提供 H&E 染色组织切片图像的细胞核分割, 以及分割结果与人工真值的比较评估.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 输入约定为 8-bit 取值范围的单通道强度图像; 彩色图像在读取时转换为亮度通道.
//! 2. 细胞核在 H&E 染色下比背景更暗, 因此前景判定为 `强度 < 阈值`.
//! 3. 在非期望情况下, 程序会直接 panic, 而不会导致内存错误. As what Rust promises.
//!
//! # 开发计划
//!
//! ### 直方图众数自适应阈值 ✅
//!
//! 平滑直方图的峰个数不少于 3 时使用三类多级 Otsu 的较低阈值, 否则退回全局 Otsu.
//!
//! 实现位于 `he-berry/src/threshold`.
//!
//! ### 形态学清理 ✅
//!
//! 移除小连通区域, 填充小的封闭空洞.
//!
//! 实现位于 `he-berry/src/post_proc/clean.rs`.
//!
//! ### 距离变换与种子点 ✅
//!
//! 精确欧氏距离变换, 平滑距离场上的局部极大值检测.
//!
//! 实现位于 `he-berry/src/marker`.
//!
//! ### 基于种子的分水岭 ✅
//!
//! 实现位于 `he-berry/src/watershed.rs`.
//!
//! ### 过分割碎片合并 & 外轮廓填充 ✅
//!
//! 1. 接触比 (共享边界 / 较小碎片周长) 超过阈值的相邻碎片被合并, 迭代到不动点. ✅
//! 2. 每个对象的外轮廓被整体填充, 内部空洞与被包围的其它标签一并覆盖. ✅
//!
//! 实现位于 `he-berry/src/post_proc`.
//!
//! ### 真值评估 ✅
//!
//! 目标级 IoU 贪心匹配 (计数/面积精度) 与像素级混淆矩阵两种模式.
//!
//! 实现位于 `he-berry/src/eval`.
//!
//! ### 小功能 ✅
//!
//! 1. XML 多边形标注解析与光栅化. ✅
//! 2. 标签图着色, 差异叠加图. ✅
//! 3. 区域形态学度量 (圆度, 实心度, 等效直径), 真值形态统计与参数建议. ✅
//! 4. Data iterator ✅
//!
//! ### 完善代码文档 ✅
//!
//! 给每个 public API 提供文档, 并视情况给 private
//! API 提供文档.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

type Predicate = fn(u8) -> bool;

type Area2d = Vec<Idx2d>;
type Areas2d = Vec<Area2d>;

/// 强度图像, 二值掩码, 标签图等基础数据结构.
mod data;

pub use data::{
    BBox, Connectivity, GrayWindow, ImgWriteRaw, ImgWriteVis, IntensityImage, LabelMap, MaskSlice,
    MaskSliceMut, OwnedMask,
};

pub mod config;
pub mod consts;
pub mod error;

pub mod eight;
pub mod filter;

pub mod marker;
pub mod post_proc;
pub mod threshold;
pub mod watershed;

pub mod eval;
pub mod pipeline;
pub mod morphometry;
pub mod region;

pub mod dataset;
pub mod prelude;
pub mod vis;
