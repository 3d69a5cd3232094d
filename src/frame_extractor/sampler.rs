//! 帧采样器
//!
//! 视频容器：无放回随机抽取帧号，升序读取。
//! 图片序列：按文件名排序后无放回随机抽取。

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

use crate::core::survey::SurveyError;
use crate::frame_extractor::frame::{Frame, FrameId, SampledFrame};
use crate::frame_extractor::video_source::VideoBackend;

pub const VIDEO_EXTENSIONS: &[&str] = &["avi", "mp4", "mov", "mkv", "webm"];
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

/// 一次动作表演：视频文件或图片序列目录
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoUnit {
    Container(PathBuf),
    ImageSequence(PathBuf),
}

impl VideoUnit {
    pub fn path(&self) -> &Path {
        match self {
            VideoUnit::Container(path) | VideoUnit::ImageSequence(path) => path,
        }
    }

    /// 单元标识即文件名或目录名
    pub fn id(&self) -> String {
        self.path()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| extensions.contains(&ext.as_str()))
}

/// 从 `length` 个元素中无放回抽取 `min(count, length)` 个下标
pub fn draw_indices<R: Rng + ?Sized>(rng: &mut R, length: usize, count: usize) -> Vec<usize> {
    let amount = count.min(length);
    if amount == 0 {
        return Vec::new();
    }
    index::sample(rng, length, amount).into_vec()
}

/// FNV-1a，跨版本稳定，用于派生子随机数种子
pub fn stable_hash(parts: &[&str]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET;
    for part in parts {
        for byte in part.bytes().chain(std::iter::once(0xff)) {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(PRIME);
        }
    }
    hash
}

/// 由运行种子和路径片段派生独立 RNG，处理顺序不影响抽样结果
pub fn derived_rng(seed: u64, parts: &[&str]) -> StdRng {
    StdRng::seed_from_u64(seed ^ stable_hash(parts))
}

pub struct FrameSampler<'a> {
    backend: &'a dyn VideoBackend,
}

impl<'a> FrameSampler<'a> {
    pub fn new(backend: &'a dyn VideoBackend) -> Self {
        Self { backend }
    }

    /// 抽取最多 `count` 帧；无可用帧时返回空序列
    pub fn sample<R: Rng + ?Sized>(
        &self,
        action: &str,
        unit: &VideoUnit,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<SampledFrame>, SurveyError> {
        let video_id = unit.id();
        let frames = match unit {
            VideoUnit::Container(path) => self.sample_container(path, count, rng)?,
            VideoUnit::ImageSequence(dir) => sample_image_sequence(dir, count, rng)?,
        };

        Ok(frames
            .into_iter()
            .map(|(frame_id, frame)| SampledFrame {
                action: action.to_string(),
                video_id: video_id.clone(),
                frame_id,
                frame,
            })
            .collect())
    }

    fn sample_container<R: Rng + ?Sized>(
        &self,
        path: &Path,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<(FrameId, Frame)>, SurveyError> {
        let mut handle = self.backend.open(path)?;
        let total = handle.frame_count();
        if total == 0 {
            debug!("Empty video {:?}", path);
            return Ok(Vec::new());
        }

        let mut indices = draw_indices(rng, total, count);
        indices.sort_unstable();

        let mut frames = Vec::with_capacity(indices.len());
        for frame_index in indices {
            match handle.read_frame(frame_index) {
                Ok(frame) => frames.push((FrameId::Index(frame_index), frame)),
                Err(e) => warn!("⚠️ Skipping frame {} of {:?}: {}", frame_index, path, e),
            }
        }
        Ok(frames)
    }
}

/// 列出目录中可识别的图片文件名，按字典序
pub fn list_images(dir: &Path) -> Result<Vec<String>, SurveyError> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, IMAGE_EXTENSIONS) {
            if let Some(name) = path.file_name() {
                names.push(name.to_string_lossy().into_owned());
            }
        }
    }
    names.sort();
    Ok(names)
}

fn sample_image_sequence<R: Rng + ?Sized>(
    dir: &Path,
    count: usize,
    rng: &mut R,
) -> Result<Vec<(FrameId, Frame)>, SurveyError> {
    let names = list_images(dir)?;
    if names.is_empty() {
        debug!("Empty image folder {:?}", dir);
        return Ok(Vec::new());
    }

    let mut frames = Vec::new();
    for i in draw_indices(rng, names.len(), count) {
        let name = &names[i];
        match image::open(dir.join(name)) {
            Ok(img) => frames.push((FrameId::Image(name.clone()), Frame::from_image(img))),
            Err(e) => warn!("⚠️ Skipping image {:?}: {}", dir.join(name), e),
        }
    }
    Ok(frames)
}
