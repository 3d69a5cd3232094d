//! 逐动作、逐视频采样并判定机位
//!
//! 每个动作按名称顺序处理；单元抽样和帧抽样都使用由运行种子派生的独立 RNG，
//! 因此顺序执行与并行执行得到同样的记录表。

use std::path::PathBuf;

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::api::models::survey::AngleRecord;
use crate::core::angle::classify;
use crate::core::survey::dataset::{ActionEntry, DatasetTree};
use crate::core::survey::overlay::save_overlay;
use crate::frame_extractor::pose_detector::PoseDetector;
use crate::frame_extractor::sampler::{derived_rng, draw_indices, FrameSampler, VideoUnit};
use crate::frame_extractor::video_source::VideoBackend;

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub samples_per_action: usize,
    pub frames_per_unit: usize,
    pub seed: u64,
    pub parallel: bool,
    pub threads: usize,
    pub overlay_dir: Option<PathBuf>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            samples_per_action: 6,
            frames_per_unit: 1,
            seed: 0,
            parallel: false,
            threads: 1,
            overlay_dir: None,
        }
    }
}

pub struct AngleCollector<'a> {
    sampler: FrameSampler<'a>,
    detector: &'a dyn PoseDetector,
    config: CollectorConfig,
}

impl<'a> AngleCollector<'a> {
    pub fn new(
        backend: &'a dyn VideoBackend,
        detector: &'a dyn PoseDetector,
        config: CollectorConfig,
    ) -> Self {
        Self {
            sampler: FrameSampler::new(backend),
            detector,
            config,
        }
    }

    /// 只返回有效判定的记录
    pub fn collect(&self, tree: &DatasetTree) -> Vec<AngleRecord> {
        let pool = if self.config.parallel {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.threads.max(1))
                .build()
            {
                Ok(pool) => Some(pool),
                Err(e) => {
                    warn!("⚠️ Thread pool unavailable, running sequentially: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let mut records = Vec::new();
        for action in &tree.actions {
            let units = self.select_units(action);
            info!(
                "🎯 {}: sampling {} of {} units",
                action.name,
                units.len(),
                action.units.len()
            );

            let per_unit: Vec<Vec<AngleRecord>> = match &pool {
                Some(pool) => pool.install(|| {
                    units
                        .par_iter()
                        .map(|unit| self.collect_unit(&action.name, unit))
                        .collect()
                }),
                None => units
                    .iter()
                    .map(|unit| self.collect_unit(&action.name, unit))
                    .collect(),
            };

            let before = records.len();
            records.extend(per_unit.into_iter().flatten());
            debug!("{}: {} decisive frames", action.name, records.len() - before);
        }

        info!("✅ Collected {} decisive frames", records.len());
        records
    }

    /// 无放回抽取 `min(samples_per_action, units)` 个单元
    pub fn select_units<'t>(&self, action: &'t ActionEntry) -> Vec<&'t VideoUnit> {
        let mut rng = derived_rng(self.config.seed, &[action.name.as_str()]);
        draw_indices(&mut rng, action.units.len(), self.config.samples_per_action)
            .into_iter()
            .map(|i| &action.units[i])
            .collect()
    }

    /// 单元级错误只记录日志并跳过
    pub fn collect_unit(&self, action: &str, unit: &VideoUnit) -> Vec<AngleRecord> {
        let video_id = unit.id();
        let mut rng = derived_rng(self.config.seed, &[action, video_id.as_str()]);

        let frames = match self
            .sampler
            .sample(action, unit, self.config.frames_per_unit, &mut rng)
        {
            Ok(frames) => frames,
            Err(e) => {
                warn!("⚠️ Skipping unit {:?}: {}", unit.path(), e);
                return Vec::new();
            }
        };

        let mut records = Vec::new();
        for sampled in frames {
            let pose = match self.detector.detect(&sampled.frame) {
                Ok(pose) => pose,
                Err(e) => {
                    warn!(
                        "⚠️ Pose detection failed for {}/{} frame {}: {}",
                        action, video_id, sampled.frame_id, e
                    );
                    continue;
                }
            };

            let angle = classify(pose.as_ref(), sampled.frame.width, sampled.frame.height);
            let Some(record) =
                AngleRecord::decisive(action, &video_id, sampled.frame_id.clone(), angle)
            else {
                continue;
            };

            if let (Some(dir), Some(pose)) = (&self.config.overlay_dir, &pose) {
                if let Err(e) = save_overlay(dir, &sampled, pose, angle) {
                    warn!("⚠️ Overlay not written: {}", e);
                }
            }

            records.push(record);
        }
        records
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::path::PathBuf;

    use super::*;
    use crate::core::angle::CameraAngle;
    use crate::frame_extractor::frame::Frame;
    use crate::frame_extractor::pose_detector::{Landmark, MockPoseDetector, PoseEstimate};
    use crate::frame_extractor::sampler::test_support::SyntheticBackend;

    fn pose(points: &[(f32, f32)]) -> PoseEstimate {
        PoseEstimate::new(points.iter().map(|&(x, y)| Landmark::new(x, y)).collect())
    }

    /// 按帧号奇偶决定姿态：偶数帧上半身，奇数帧 MixedUnknown，帧号 %5==0 无人
    fn parity_detector() -> MockPoseDetector {
        MockPoseDetector::with_pattern(|frame: &Frame| {
            let n = frame.data[0];
            if n % 5 == 0 {
                None
            } else if n % 2 == 0 {
                Some(pose(&[(0.1, 0.3), (0.75, 0.9)]))
            } else {
                Some(pose(&[(0.45, 0.05), (0.55, 0.95)]))
            }
        })
    }

    fn tree(actions: &[(&str, &[&str])]) -> DatasetTree {
        DatasetTree {
            root: PathBuf::from("mem"),
            actions: actions
                .iter()
                .map(|(name, units)| ActionEntry {
                    name: name.to_string(),
                    units: units
                        .iter()
                        .map(|u| VideoUnit::Container(PathBuf::from(u)))
                        .collect(),
                })
                .collect(),
        }
    }

    fn config(samples: usize, frames: usize, seed: u64) -> CollectorConfig {
        CollectorConfig {
            samples_per_action: samples,
            frames_per_unit: frames,
            seed,
            ..Default::default()
        }
    }

    #[test]
    fn test_collect_filters_non_decisive() {
        let backend = SyntheticBackend::new(&[("run/a.avi", 200), ("run/b.avi", 200)]);
        let detector = parity_detector();
        let collector = AngleCollector::new(&backend, &detector, config(2, 30, 11));

        let records = collector.collect(&tree(&[("run", &["run/a.avi", "run/b.avi"])]));

        assert!(!records.is_empty());
        assert!(records.iter().all(|r| r.angle == CameraAngle::UpperBodyShot));
        assert!(records.iter().all(|r| r.angle.is_decisive()));
        assert!(records.len() <= 60);
    }

    #[test]
    fn test_no_person_contributes_nothing() {
        let backend = SyntheticBackend::new(&[("run/a.avi", 10)]);
        let detector = MockPoseDetector::new();
        let collector = AngleCollector::new(&backend, &detector, config(1, 10, 1));

        let records = collector.collect(&tree(&[("run", &["run/a.avi"])]));
        assert!(records.is_empty());
    }

    #[test]
    fn test_unit_selection_bounded_and_distinct() {
        let backend = SyntheticBackend::new(&[]);
        let detector = MockPoseDetector::new();
        let collector = AngleCollector::new(&backend, &detector, config(3, 1, 5));

        let many = tree(&[("jump", &["1.avi", "2.avi", "3.avi", "4.avi", "5.avi"])]);
        let picked = collector.select_units(&many.actions[0]);
        assert_eq!(picked.len(), 3);
        let unique: HashSet<String> = picked.iter().map(|u| u.id()).collect();
        assert_eq!(unique.len(), 3);

        let few = tree(&[("jump", &["1.avi"])]);
        assert_eq!(collector.select_units(&few.actions[0]).len(), 1);
    }

    #[test]
    fn test_missing_unit_is_skipped() {
        let backend = SyntheticBackend::new(&[("kick/ok.avi", 40)]);
        let detector = MockPoseDetector::with_fixed(Some(pose(&[(0.45, 0.1), (0.55, 0.4)])));
        let collector = AngleCollector::new(&backend, &detector, config(2, 3, 2));

        let records = collector.collect(&tree(&[("kick", &["kick/broken.avi", "kick/ok.avi"])]));

        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.video == "ok.avi"));
        assert!(records.iter().all(|r| r.angle == CameraAngle::ThirdPersonFarAway));
    }

    #[test]
    fn test_actions_in_tree_order() {
        let backend = SyntheticBackend::new(&[("a/1.avi", 5), ("b/1.avi", 5)]);
        let detector = MockPoseDetector::with_fixed(Some(pose(&[(0.0, 0.0), (1.0, 1.0)])));
        let collector = AngleCollector::new(&backend, &detector, config(1, 2, 3));

        let records = collector.collect(&tree(&[("a", &["a/1.avi"]), ("b", &["b/1.avi"])]));
        let actions: Vec<&str> = records.iter().map(|r| r.action.as_str()).collect();
        assert_eq!(actions, vec!["a", "a", "b", "b"]);
    }

    #[test]
    fn test_same_seed_same_table() {
        let videos: Vec<(String, usize)> = (0..8).map(|i| (format!("swim/{i}.avi"), 120)).collect();
        let video_refs: Vec<(&str, usize)> = videos.iter().map(|(p, n)| (p.as_str(), *n)).collect();
        let backend = SyntheticBackend::new(&video_refs);
        let detector = parity_detector();
        let unit_names: Vec<&str> = videos.iter().map(|(p, _)| p.as_str()).collect();
        let dataset = tree(&[("swim", unit_names.as_slice())]);

        let sequential = AngleCollector::new(&backend, &detector, config(4, 6, 99)).collect(&dataset);
        let again = AngleCollector::new(&backend, &detector, config(4, 6, 99)).collect(&dataset);
        let parallel = AngleCollector::new(
            &backend,
            &detector,
            CollectorConfig {
                parallel: true,
                threads: 4,
                ..config(4, 6, 99)
            },
        )
        .collect(&dataset);

        assert_eq!(sequential, again);
        assert_eq!(sequential, parallel);
    }
}
