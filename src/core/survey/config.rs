use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::survey::grouper::{default_category_table, CategoryTable};
use crate::core::survey::SurveyError;

/// 外部姿态检测程序
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PoseCommandConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// 一次运行的全部配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    pub dataset_path: PathBuf,
    pub samples_per_action: usize,
    pub frames_per_unit: usize,
    pub min_votes_threshold: usize,
    pub action_to_category_table: CategoryTable,
    pub output_dir: PathBuf,
    pub seed: Option<u64>,
    pub include_actions: Option<Vec<String>>,
    pub overlay_dir: Option<PathBuf>,
    pub parallel: bool,
    pub threads: usize,
    pub ffmpeg_bin: String,
    pub ffprobe_bin: String,
    pub pose_command: Option<PoseCommandConfig>,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("dataset"),
            samples_per_action: 6,
            frames_per_unit: 1,
            min_votes_threshold: 2,
            action_to_category_table: default_category_table(),
            output_dir: PathBuf::from("."),
            seed: None,
            include_actions: None,
            overlay_dir: None,
            parallel: false,
            threads: num_cpus::get().min(4),
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
            pose_command: None,
        }
    }
}

impl SurveyConfig {
    /// 解析 JSON5 配置，缺省字段取默认值
    pub fn from_json5(text: &str) -> Result<Self, SurveyError> {
        Ok(json5::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, SurveyError> {
        let text = fs::read_to_string(path)?;
        Self::from_json5(&text)
    }

    /// UCF101 类视频数据集
    pub fn for_video_dataset(dataset_path: impl Into<PathBuf>) -> Self {
        Self {
            dataset_path: dataset_path.into(),
            samples_per_action: 6,
            frames_per_unit: 1,
            min_votes_threshold: 2,
            ..Default::default()
        }
    }

    /// HMDB51 类抽帧图片数据集
    pub fn for_frame_dataset(dataset_path: impl Into<PathBuf>) -> Self {
        Self {
            dataset_path: dataset_path.into(),
            samples_per_action: 20,
            frames_per_unit: 1,
            min_votes_threshold: 5,
            ..Default::default()
        }
    }
}
