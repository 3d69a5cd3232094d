use std::fmt;
use std::io::Cursor;

use image::{DynamicImage, ImageOutputFormat, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::core::survey::SurveyError;

/// 帧数据结构
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>, // RGBA 格式
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    pub fn from_image(image: DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            data: rgba.into_raw(),
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SurveyError> {
        let image = image::load_from_memory(bytes)?;
        Ok(Self::from_image(image))
    }

    pub fn to_rgba_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.data.clone())
    }

    /// 编码为 PNG，交给外部姿态检测器或写盘
    pub fn to_png(&self) -> Result<Vec<u8>, SurveyError> {
        let img = self.to_rgba_image().ok_or_else(|| {
            SurveyError::Image(image::ImageError::Parameter(
                image::error::ParameterError::from_kind(
                    image::error::ParameterErrorKind::DimensionMismatch,
                ),
            ))
        })?;

        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img).write_to(&mut buffer, ImageOutputFormat::Png)?;
        Ok(buffer.into_inner())
    }
}

/// 帧标识：视频容器用帧序号，图片序列用文件名
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameId {
    Index(usize),
    Image(String),
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameId::Index(index) => write!(f, "{}", index),
            FrameId::Image(name) => f.write_str(name),
        }
    }
}

/// 采样得到的一帧，用完即丢
#[derive(Debug, Clone)]
pub struct SampledFrame {
    pub action: String,
    pub video_id: String,
    pub frame_id: FrameId,
    pub frame: Frame,
}
