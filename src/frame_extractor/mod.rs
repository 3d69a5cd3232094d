//! 视频帧提取 - 为机位调查从动作视频中抽帧
//!
//! 核心组成：
//! 1. 帧采样 - 视频按帧号、图片序列按文件名无放回随机抽取
//! 2. 解码后端 - ffprobe 取帧数，ffmpeg 按帧号解码
//! 3. 姿态检测 - 外部能力，返回归一化关键点

pub mod frame;
pub mod pose_detector;
pub mod sampler;
pub mod video_source;

pub use frame::{Frame, FrameId, SampledFrame};
pub use pose_detector::{CommandPoseDetector, Landmark, MockPoseDetector, PoseDetector, PoseEstimate};
pub use sampler::{FrameSampler, VideoUnit};
pub use video_source::{FfmpegBackend, VideoBackend, VideoHandle};
