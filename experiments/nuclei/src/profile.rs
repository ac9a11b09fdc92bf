//! 批量运行统计.

use std::time::{Duration, Instant};

/// batch 计时与计数.
#[derive(Clone, Debug)]
pub struct Profile {
    /// 成功分割的图像个数.
    segmented: u64,

    /// 读取或分割失败的图像个数.
    failed: u64,

    /// 找到真值并完成评估的图像个数.
    scored: u64,

    /// 各图像处理时间之和 (多线程下可能大于自然时间).
    busy: Duration,

    /// 最耗时的一张图像.
    slowest: Option<(String, Duration)>,

    since: Instant,

    /// 整个任务花费的自然时间. `finish` 之前为 0.
    wall: Duration,
}

impl Profile {
    /// 初始化, 并开始计时.
    #[inline]
    pub fn new() -> Self {
        Self {
            segmented: 0,
            failed: 0,
            scored: 0,
            busy: Duration::ZERO,
            slowest: None,
            since: Instant::now(),
            wall: Duration::ZERO,
        }
    }

    /// 记录一张图像的处理结果与耗时.
    pub fn record(&mut self, stem: &str, ok: bool, scored: bool, d: Duration) {
        if ok {
            self.segmented += 1;
        } else {
            self.failed += 1;
        }
        if scored {
            self.scored += 1;
        }
        self.busy += d;
        if self.slowest.as_ref().map_or(true, |(_, most)| d > *most) {
            self.slowest = Some((stem.to_owned(), d));
        }
    }

    /// 结束全部计时.
    #[inline]
    pub fn finish(mut self) -> Self {
        self.wall = self.since.elapsed();
        self
    }

    /// 成功分割的图像个数.
    #[inline]
    pub fn get_segmented(&self) -> u64 {
        self.segmented
    }

    /// 失败的图像个数.
    #[inline]
    pub fn get_failed(&self) -> u64 {
        self.failed
    }

    /// 完成评估的图像个数.
    #[inline]
    pub fn get_scored(&self) -> u64 {
        self.scored
    }

    /// 以毫秒为单位获得总自然时间.
    #[inline]
    pub fn get_wall_ms(&self) -> u64 {
        self.wall.as_millis() as u64
    }

    /// 以毫秒为单位获得单张图像的平均处理时间.
    pub fn get_avg_busy_ms(&self) -> Option<f64> {
        match self.segmented + self.failed {
            0 => None,
            n => Some(self.busy.as_secs_f64() * 1000.0 / n as f64),
        }
    }

    /// 最耗时的一张图像及其耗时.
    #[inline]
    pub fn get_slowest(&self) -> Option<(&str, Duration)> {
        self.slowest.as_ref().map(|(s, d)| (s.as_str(), *d))
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new()
    }
}
