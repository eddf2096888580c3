//! 轉場鏈的時間軸計算
//!
//! 每張圖片顯示 D 秒、每次轉場 X 秒。轉場與前一段重疊，
//! 所以第一對之後每多一張圖片時間軸只延長 D - X 秒，
//! N 張圖片的總長為 (D - X) * N + X。

/// 轉場鏈建構過程中的累計狀態
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineState {
    pub cumulative_duration_secs: f64,
    pub last_offset_secs: f64,
    display_secs: f64,
    transition_secs: f64,
    frames: usize,
}

impl TimelineState {
    /// 第 0、1 張圖片的第一次轉場
    #[must_use]
    pub fn seed(display_secs: f64, transition_secs: f64) -> Self {
        let step = display_secs - transition_secs;
        Self {
            cumulative_duration_secs: step * 2.0 + transition_secs,
            last_offset_secs: step,
            display_secs,
            transition_secs,
            frames: 2,
        }
    }

    /// 接上下一張圖片，回傳此次轉場的 offset
    pub fn fold(&mut self) -> f64 {
        let offset = self.cumulative_duration_secs - self.transition_secs;
        self.frames += 1;
        self.cumulative_duration_secs =
            (self.display_secs - self.transition_secs) * self.frames as f64 + self.transition_secs;
        self.last_offset_secs = offset;
        offset
    }

    #[must_use]
    pub const fn frames(&self) -> usize {
        self.frames
    }
}

/// 無轉場直接串接
#[must_use]
pub fn concat_duration(frames: usize, display_secs: f64) -> f64 {
    frames as f64 * display_secs
}

/// 轉場鏈總長的封閉式
#[must_use]
pub fn crossfade_duration(frames: usize, display_secs: f64, transition_secs: f64) -> f64 {
    (display_secs - transition_secs) * frames as f64 + transition_secs
}
