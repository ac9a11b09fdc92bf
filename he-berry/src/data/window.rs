/// 灰度显示窗口, 将 `[lower, upper]` 内的实数线性映射到 8-bit 灰度.
///
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GrayWindow {
    lower: f32,
    upper: f32,
}

impl GrayWindow {
    /// 构建窗口.
    ///
    /// `lower` 和 `upper` 必须为有限值且 `lower < upper`, 否则返回 `None`.
    pub fn new(lower: f32, upper: f32) -> Option<GrayWindow> {
        (lower.is_finite() && upper.is_finite() && lower < upper).then_some(Self { lower, upper })
    }

    /// 覆盖 `[0, max]` 的窗口, 适合距离场等非负数据.
    /// `max` 不为正时退化为 `[0, 1]`.
    pub fn from_max(max: f32) -> GrayWindow {
        Self::new(0.0, max).unwrap_or(Self {
            lower: 0.0,
            upper: 1.0,
        })
    }

    /// 窗下限.
    #[inline]
    pub fn lower_bound(&self) -> f32 {
        self.lower
    }

    /// 窗上限.
    #[inline]
    pub fn upper_bound(&self) -> f32 {
        self.upper
    }

    /// 窗宽.
    #[inline]
    pub fn width(&self) -> f32 {
        self.upper - self.lower
    }

    /// 求 `v` 对应的灰度图像素整数值 (0 <= value <= 255).
    ///
    /// 如果 `v` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn eval(&self, v: f32) -> Option<u8> {
        if !v.is_finite() {
            return None;
        }
        if v <= self.lower {
            Some(u8::MIN)
        } else if v >= self.upper {
            Some(u8::MAX)
        } else {
            // 255, not 256.
            Some(((v - self.lower) / self.width() * 255.0) as u8)
        }
    }
}
