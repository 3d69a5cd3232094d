use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SurveyError {
    #[error("dataset root not found: {0}")]
    DatasetNotFound(PathBuf),
    #[error("dataset root is not a directory: {0}")]
    DatasetNotADirectory(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("video file not found: {0}")]
    VideoNotFound(PathBuf),
    #[error("{program} failed (exit code {exit_code:?}): {stderr}")]
    Decoder {
        program: String,
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("failed to parse ffprobe output: {0}")]
    Probe(String),
    #[error("config error: {0}")]
    Config(#[from] json5::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("pose detector error: {0}")]
    PoseDetector(String),
}

impl SurveyError {
    /// 只有数据集根目录问题会中止整个运行
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SurveyError::DatasetNotFound(_) | SurveyError::DatasetNotADirectory(_)
        )
    }
}
