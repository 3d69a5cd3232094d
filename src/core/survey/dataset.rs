//! 数据集目录树：`root/动作名/视频单元`

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::core::survey::SurveyError;
use crate::frame_extractor::sampler::{has_extension, VideoUnit, VIDEO_EXTENSIONS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionEntry {
    pub name: String,
    pub units: Vec<VideoUnit>,
}

#[derive(Debug, Clone)]
pub struct DatasetTree {
    pub root: PathBuf,
    pub actions: Vec<ActionEntry>,
}

impl DatasetTree {
    /// 扫描数据集根目录，动作与单元均按名称排序
    ///
    /// `include_actions` 为空时收录全部动作目录。
    pub fn scan(root: &Path, include_actions: Option<&[String]>) -> Result<Self, SurveyError> {
        if !root.exists() {
            return Err(SurveyError::DatasetNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(SurveyError::DatasetNotADirectory(root.to_path_buf()));
        }

        let mut actions = Vec::new();
        for (name, path) in sorted_entries(root)? {
            if !path.is_dir() {
                continue;
            }
            if let Some(filter) = include_actions {
                if !filter.iter().any(|a| a == &name) {
                    continue;
                }
            }

            let units = scan_units(&path)?;
            debug!("📂 {}: {} units", name, units.len());
            actions.push(ActionEntry { name, units });
        }

        info!("📂 Dataset {:?}: {} actions", root, actions.len());
        Ok(Self {
            root: root.to_path_buf(),
            actions,
        })
    }

    pub fn action_names(&self) -> Vec<String> {
        self.actions.iter().map(|a| a.name.clone()).collect()
    }

    pub fn unit_count(&self) -> usize {
        self.actions.iter().map(|a| a.units.len()).sum()
    }
}

fn scan_units(action_dir: &Path) -> Result<Vec<VideoUnit>, SurveyError> {
    let mut units = Vec::new();
    for (_, path) in sorted_entries(action_dir)? {
        if path.is_dir() {
            units.push(VideoUnit::ImageSequence(path));
        } else if has_extension(&path, VIDEO_EXTENSIONS) {
            units.push(VideoUnit::Container(path));
        }
    }
    Ok(units)
}

fn sorted_entries(dir: &Path) -> Result<Vec<(String, PathBuf)>, SurveyError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        entries.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}
