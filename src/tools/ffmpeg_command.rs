use crate::config::EncoderSettings;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// 轉檔工作種類，用於記錄與測試注入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Normalize,
    Compose,
    ConvertGif,
    Merge,
    Transcode,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Normalize => "normalize",
            Self::Compose => "compose",
            Self::ConvertGif => "convert-gif",
            Self::Merge => "merge",
            Self::Transcode => "transcode",
        };
        f.write_str(name)
    }
}

/// 單一輸入描述
#[derive(Debug, Clone, PartialEq)]
pub struct InputSpec {
    pub path: PathBuf,
    pub loop_input: bool,
    pub framerate: Option<u32>,
    pub duration_secs: Option<f64>,
}

impl InputSpec {
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            loop_input: false,
            framerate: None,
            duration_secs: None,
        }
    }

    /// 靜態圖片循環成固定長度的影片串流
    pub fn looped_still(path: impl AsRef<Path>, framerate: u32, duration_secs: f64) -> Self {
        Self {
            loop_input: true,
            framerate: Some(framerate),
            duration_secs: Some(duration_secs),
            ..Self::file(path)
        }
    }

    fn push_args(&self, args: &mut Vec<OsString>) {
        if self.loop_input {
            args.extend([OsString::from("-loop"), OsString::from("1")]);
        }
        if let Some(rate) = self.framerate {
            args.extend([OsString::from("-framerate"), OsString::from(rate.to_string())]);
        }
        if let Some(duration) = self.duration_secs {
            args.extend([OsString::from("-t"), OsString::from(format_seconds(duration))]);
        }
        args.push(OsString::from("-i"));
        args.push(file_arg(&self.path));
    }
}

#[derive(Debug, Clone, PartialEq)]
enum FilterGraph {
    None,
    Simple(String),
    Complex { graph: String, output_label: String },
}

/// ffmpeg 命令的宣告式描述：輸入、濾鏡圖、輸出
#[derive(Debug, Clone, PartialEq)]
pub struct FfmpegCommand {
    kind: JobKind,
    inputs: Vec<InputSpec>,
    filter: FilterGraph,
    output_args: Vec<String>,
    output_path: PathBuf,
}

impl FfmpegCommand {
    pub fn new(kind: JobKind, output_path: impl AsRef<Path>) -> Self {
        Self {
            kind,
            inputs: Vec::new(),
            filter: FilterGraph::None,
            output_args: Vec::new(),
            output_path: output_path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn input(mut self, input: InputSpec) -> Self {
        self.inputs.push(input);
        self
    }

    #[must_use]
    pub fn inputs(mut self, inputs: impl IntoIterator<Item = InputSpec>) -> Self {
        self.inputs.extend(inputs);
        self
    }

    #[must_use]
    pub fn video_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = FilterGraph::Simple(filter.into());
        self
    }

    /// `output_label` 不含中括號
    #[must_use]
    pub fn filter_complex(mut self, graph: impl Into<String>, output_label: impl Into<String>) -> Self {
        self.filter = FilterGraph::Complex {
            graph: graph.into(),
            output_label: output_label.into(),
        };
        self
    }

    #[must_use]
    pub fn encoder(mut self, encoder: &EncoderSettings) -> Self {
        self.output_args.extend(encoder.to_args());
        self
    }

    #[must_use]
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    #[must_use]
    pub fn single_frame(self) -> Self {
        self.output_arg("-frames:v").output_arg("1")
    }

    #[must_use]
    pub const fn kind(&self) -> JobKind {
        self.kind
    }

    #[must_use]
    pub fn inputs_spec(&self) -> &[InputSpec] {
        &self.inputs
    }

    #[must_use]
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// 實際傳給 ffmpeg 的參數，路徑保持原始位元組
    #[must_use]
    pub fn build_os_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "-hide_banner",
            "-nostdin",
            "-loglevel",
            "error",
            "-y",
        ]
        .iter()
        .map(OsString::from)
        .collect();

        for input in &self.inputs {
            input.push_args(&mut args);
        }

        match &self.filter {
            FilterGraph::None => {}
            FilterGraph::Simple(filter) => {
                args.extend([OsString::from("-vf"), OsString::from(filter)]);
            }
            FilterGraph::Complex {
                graph,
                output_label,
            } => {
                args.extend([
                    OsString::from("-filter_complex"),
                    OsString::from(graph),
                    OsString::from("-map"),
                    OsString::from(format!("[{output_label}]")),
                ]);
            }
        }

        args.extend(self.output_args.iter().map(OsString::from));
        args.push(file_arg(&self.output_path));
        args
    }

    /// 供記錄與比對用的文字形式
    #[must_use]
    pub fn build_args(&self) -> Vec<String> {
        self.build_os_args()
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[must_use]
    pub fn build_command(&self, program: &Path) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(self.build_os_args());
        cmd
    }
}

/// `file:` 前綴避免路徑中的冒號被當成協定
fn file_arg(path: &Path) -> OsString {
    let mut arg = OsString::from("file:");
    arg.push(path);
    arg
}

/// 秒數格式化為 ffmpeg 可接受的字串（毫秒精度）
#[must_use]
pub fn format_seconds(seconds: f64) -> String {
    format!("{seconds:.3}")
}
