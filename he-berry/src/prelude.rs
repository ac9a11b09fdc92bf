//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx2d;

pub use crate::data::{
    BBox, Connectivity, GrayWindow, ImgWriteRaw, ImgWriteVis, IntensityImage, LabelMap, MaskSlice,
    MaskSliceMut, OwnedMask,
};

pub use crate::config::{EvalParams, SegmentParams};
pub use crate::error::{AnnotationError, LoadError, ParamsError, ThresholdError, ThresholdResult};

pub use crate::eval::{match_regions, score_pixels, ObjectScore, PixelScore};
pub use crate::pipeline::{AreaSummary, Segmentation, Segmenter};
pub use crate::morphometry::{shape_records, Morphometry, ShapeRecord};
pub use crate::post_proc::MergeOrder;
pub use crate::region::{regions, RegionProps};
pub use crate::threshold::{ThresholdDecision, ThresholdMethod};

pub use crate::dataset::home_dataset_dir_with;
pub use crate::dataset::{self, Annotation};
pub use crate::vis::{colorize_default, diff_overlay};
