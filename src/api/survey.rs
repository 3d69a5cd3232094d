//! 机位调查入口

use std::path::PathBuf;

use log::info;

use crate::api::models::survey::SurveyReport;
use crate::core::survey::{
    group, summarize_actions, AngleCollector, CollectorConfig, DatasetTree, ReportWriter,
    SurveyConfig, SurveyError,
};
use crate::frame_extractor::pose_detector::{CommandPoseDetector, PoseDetector};
use crate::frame_extractor::video_source::{FfmpegBackend, VideoBackend};

/// 机位调查 - 采样、判定、汇总、分组
///
/// ```ignore
/// let survey = CameraAngleSurvey::create(SurveyConfig::from_file(path)?)?;
/// let report = survey.run_and_write()?;
/// ```
pub struct CameraAngleSurvey {
    config: SurveyConfig,
    backend: Box<dyn VideoBackend>,
    detector: Box<dyn PoseDetector>,
}

impl CameraAngleSurvey {
    /// 按配置创建 ffmpeg 解码后端和外部姿态检测器
    pub fn create(config: SurveyConfig) -> Result<Self, SurveyError> {
        let pose = config.pose_command.clone().ok_or_else(|| {
            SurveyError::PoseDetector("no pose_command configured".to_string())
        })?;

        let backend = FfmpegBackend::new(config.ffmpeg_bin.clone(), config.ffprobe_bin.clone());
        let detector = CommandPoseDetector::new(pose.program, pose.args);
        Ok(Self::with_components(
            config,
            Box::new(backend),
            Box::new(detector),
        ))
    }

    pub fn with_components(
        config: SurveyConfig,
        backend: Box<dyn VideoBackend>,
        detector: Box<dyn PoseDetector>,
    ) -> Self {
        info!(
            "🎬 CameraAngleSurvey: created for {:?}",
            config.dataset_path
        );
        Self {
            config,
            backend,
            detector,
        }
    }

    pub fn config(&self) -> &SurveyConfig {
        &self.config
    }

    /// 数据集根目录无效时直接失败，其余问题只影响对应单元
    pub fn run(&self) -> Result<SurveyReport, SurveyError> {
        let tree = DatasetTree::scan(
            &self.config.dataset_path,
            self.config.include_actions.as_deref(),
        )?;

        let seed = self.config.seed.unwrap_or_else(rand::random);
        info!(
            "🔄 Surveying {:?}: {} actions / {} units (seed {})",
            tree.root,
            tree.actions.len(),
            tree.unit_count(),
            seed
        );

        let collector = AngleCollector::new(
            self.backend.as_ref(),
            self.detector.as_ref(),
            CollectorConfig {
                samples_per_action: self.config.samples_per_action,
                frames_per_unit: self.config.frames_per_unit,
                seed,
                parallel: self.config.parallel,
                threads: self.config.threads,
                overlay_dir: self.config.overlay_dir.clone(),
            },
        );

        let records = collector.collect(&tree);
        let action_summaries = summarize_actions(
            &tree.action_names(),
            &records,
            self.config.min_votes_threshold,
        );
        let category_summaries = group(&action_summaries, &self.config.action_to_category_table);

        Ok(SurveyReport {
            seed,
            records,
            action_summaries,
            category_summaries,
        })
    }

    /// 清理旧报表、运行并写出新报表
    pub fn run_and_write(&self) -> Result<(SurveyReport, Vec<PathBuf>), SurveyError> {
        let writer = ReportWriter::new(&self.config.output_dir);
        writer.clear_previous()?;

        let report = self.run()?;
        let written = writer.write(&report)?;
        info!(
            "🎯 Survey finished: {} records, {} actions, {} categories",
            report.records.len(),
            report.action_summaries.len(),
            report.category_summaries.len()
        );
        Ok((report, written))
    }
}

impl Drop for CameraAngleSurvey {
    fn drop(&mut self) {
        info!("🗑️ CameraAngleSurvey: released");
    }
}
