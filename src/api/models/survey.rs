use serde::{Deserialize, Serialize};

use crate::core::angle::CameraAngle;
use crate::frame_extractor::frame::FrameId;

/// 聚合结果为空时的占位
pub const UNKNOWN_SUMMARY: &str = "Unknown";
/// 分类下无任何票数时的占位
pub const NO_DATA_SUMMARY: &str = "No Data";

/// 单帧有效判定记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngleRecord {
    #[serde(rename = "Action")]
    pub action: String,
    #[serde(rename = "Video")]
    pub video: String,
    #[serde(rename = "Frame")]
    pub frame: FrameId,
    #[serde(rename = "Detected Camera Angle")]
    pub angle: CameraAngle,
    /// 标签的可读说明，只出现在 JSON 报表中
    #[serde(rename = "Camera Angle Description", default)]
    pub description: String,
}

impl AngleRecord {
    /// 非有效标签（MixedUnknown / NoPersonDetected）不生成记录
    pub fn decisive(
        action: impl Into<String>,
        video: impl Into<String>,
        frame: FrameId,
        angle: CameraAngle,
    ) -> Option<Self> {
        angle.is_decisive().then(|| Self {
            action: action.into(),
            video: video.into(),
            frame,
            angle,
            description: angle.description().to_string(),
        })
    }
}

/// 每个动作的机位汇总
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionVoteSummary {
    #[serde(rename = "Action")]
    pub action: String,
    #[serde(rename = "Most Frequent Camera Angles")]
    pub summary: String,
}

/// 每个动作大类的机位汇总
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryVoteSummary {
    #[serde(rename = "Action Category")]
    pub category: String,
    #[serde(rename = "Camera Angles")]
    pub summary: String,
}

/// 一次完整运行的三张表
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurveyReport {
    pub seed: u64,
    pub records: Vec<AngleRecord>,
    pub action_summaries: Vec<ActionVoteSummary>,
    pub category_summaries: Vec<CategoryVoteSummary>,
}
