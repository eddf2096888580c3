use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum SegmentSource {
    /// 一批圖片合成的片段
    Images { frame_count: usize },
    /// GIF 轉換而成的片段
    Gif { source: PathBuf },
}

/// 待合併的中間影片
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub path: PathBuf,
    /// GIF 片段的長度來自 ffprobe，取得失敗時為 None
    pub duration_seconds: Option<f64>,
    pub order_hint: usize,
    pub source: SegmentSource,
}
