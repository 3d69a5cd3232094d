//! 视频解码后端
//!
//! 通过 ffprobe / ffmpeg 子进程按帧号读取视频帧。每个视频单元打开一个句柄，
//! 采样结束后随作用域释放。

use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;
use serde::Deserialize;

use crate::core::survey::SurveyError;
use crate::frame_extractor::frame::Frame;

/// 解码能力，按视频单元打开句柄
pub trait VideoBackend: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoHandle>, SurveyError>;
}

/// 单个视频的解码句柄
pub trait VideoHandle {
    fn frame_count(&self) -> usize;

    /// 按位置读取一帧
    fn read_frame(&mut self, index: usize) -> Result<Frame, SurveyError>;
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    /// e.g. "30/1" or "24000/1001"
    r_frame_rate: Option<String>,
    duration: Option<String>,
    nb_frames: Option<String>,
}

/// ffmpeg 命令行后端
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    ffmpeg_bin: String,
    ffprobe_bin: String,
}

impl FfmpegBackend {
    pub fn new(ffmpeg_bin: impl Into<String>, ffprobe_bin: impl Into<String>) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            ffprobe_bin: ffprobe_bin.into(),
        }
    }

    fn probe_frame_count(&self, path: &Path) -> Result<usize, SurveyError> {
        let output = Command::new(&self.ffprobe_bin)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(path)
            .output()?;

        if !output.status.success() {
            return Err(SurveyError::Decoder {
                program: self.ffprobe_bin.clone(),
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let probe: FfprobeOutput = serde_json::from_str(&stdout)
            .map_err(|e| SurveyError::Probe(format!("{e}: {stdout}")))?;

        Ok(probe.streams.first().map(stream_frame_count).unwrap_or(0))
    }
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl VideoBackend for FfmpegBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoHandle>, SurveyError> {
        if !path.exists() {
            return Err(SurveyError::VideoNotFound(path.to_path_buf()));
        }

        let frame_count = self.probe_frame_count(path)?;
        debug!("🎬 Opened {:?}: {} frames", path, frame_count);

        Ok(Box::new(FfmpegHandle {
            path: path.to_path_buf(),
            ffmpeg_bin: self.ffmpeg_bin.clone(),
            frame_count,
        }))
    }
}

struct FfmpegHandle {
    path: PathBuf,
    ffmpeg_bin: String,
    frame_count: usize,
}

impl VideoHandle for FfmpegHandle {
    fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn read_frame(&mut self, index: usize) -> Result<Frame, SurveyError> {
        let select = format!("select=eq(n\\,{index})");
        let output = Command::new(&self.ffmpeg_bin)
            .args(["-v", "error", "-i"])
            .arg(&self.path)
            .args([
                "-vf",
                select.as_str(),
                "-fps_mode",
                "passthrough",
                "-frames:v",
                "1",
                "-f",
                "image2pipe",
                "-vcodec",
                "png",
                "-",
            ])
            .output()?;

        if !output.status.success() || output.stdout.is_empty() {
            return Err(SurveyError::Decoder {
                program: self.ffmpeg_bin.clone(),
                exit_code: output.status.code(),
                stderr: format!(
                    "no frame {} in {:?}: {}",
                    index,
                    self.path,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Frame::decode(&output.stdout)
    }
}

impl Drop for FfmpegHandle {
    fn drop(&mut self) {
        debug!("🗑️ Released decoder for {:?}", self.path);
    }
}

/// nb_frames 缺失时用时长 × 帧率估算
fn stream_frame_count(stream: &FfprobeStream) -> usize {
    if let Some(n) = stream
        .nb_frames
        .as_deref()
        .and_then(|s| s.parse::<usize>().ok())
    {
        return n;
    }

    let duration = stream
        .duration
        .as_deref()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);
    let fps = stream
        .r_frame_rate
        .as_deref()
        .map(parse_frame_rate)
        .unwrap_or(0.0);

    if duration > 0.0 && fps > 0.0 {
        (duration * fps).floor() as usize
    } else {
        0
    }
}

fn parse_frame_rate(rate: &str) -> f64 {
    match rate.split_once('/') {
        Some((num, den)) => {
            let num = num.parse::<f64>().unwrap_or(0.0);
            let den = den.parse::<f64>().unwrap_or(0.0);
            if den > 0.0 {
                num / den
            } else {
                0.0
            }
        }
        None => rate.parse::<f64>().unwrap_or(0.0),
    }
}
