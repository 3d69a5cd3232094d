//! 姿态检测
//!
//! 检测器只关心单帧：输入 RGBA 帧，输出归一化关键点或"无人"。
//! 生产环境通过外部进程完成，测试使用 [`MockPoseDetector`]。

use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::thread;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::core::survey::SurveyError;
use crate::frame_extractor::frame::Frame;

/// 归一化到 [0,1] 的二维关键点
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 单帧姿态估计结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseEstimate {
    pub landmarks: Vec<Landmark>,
}

impl PoseEstimate {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }
}

/// 单帧姿态检测能力，由调用方注入
pub trait PoseDetector: Send + Sync {
    /// `Ok(None)` 表示画面中没有人
    fn detect(&self, frame: &Frame) -> Result<Option<PoseEstimate>, SurveyError>;
}

/// 测试用检测器
pub struct MockPoseDetector {
    pattern: Box<dyn Fn(&Frame) -> Option<PoseEstimate> + Send + Sync>,
}

impl MockPoseDetector {
    /// 从不检测到人
    pub fn new() -> Self {
        Self {
            pattern: Box::new(|_| None),
        }
    }

    pub fn with_pattern<F>(pattern: F) -> Self
    where
        F: Fn(&Frame) -> Option<PoseEstimate> + Send + Sync + 'static,
    {
        Self {
            pattern: Box::new(pattern),
        }
    }

    pub fn with_fixed(estimate: Option<PoseEstimate>) -> Self {
        Self {
            pattern: Box::new(move |_| estimate.clone()),
        }
    }
}

impl Default for MockPoseDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl PoseDetector for MockPoseDetector {
    fn detect(&self, frame: &Frame) -> Result<Option<PoseEstimate>, SurveyError> {
        Ok((self.pattern)(frame))
    }
}

#[derive(Debug, Deserialize)]
struct CommandOutput {
    #[serde(default)]
    landmarks: Option<Vec<Landmark>>,
}

/// 外部进程检测器
///
/// 每帧启动一次配置的程序，stdin 写入 PNG，stdout 读取
/// `{"landmarks": [{"x": 0.5, "y": 0.2}, ...]}`，无人时为 `null` 或空数组。
#[derive(Debug, Clone)]
pub struct CommandPoseDetector {
    program: String,
    args: Vec<String>,
}

impl CommandPoseDetector {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn parse_output(stdout: &str) -> Result<Option<PoseEstimate>, SurveyError> {
        let output: CommandOutput = serde_json::from_str(stdout.trim())?;
        Ok(output
            .landmarks
            .filter(|points| !points.is_empty())
            .map(PoseEstimate::new))
    }
}

impl PoseDetector for CommandPoseDetector {
    fn detect(&self, frame: &Frame) -> Result<Option<PoseEstimate>, SurveyError> {
        let png = frame.to_png()?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SurveyError::PoseDetector(format!("failed to spawn {}: {}", self.program, e)))?;

        // stdin 在独立线程写入，同时读取 stdout/stderr，避免双方都阻塞在管道上
        let stdin = child.stdin.take();
        let (written, output) = thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(&png),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(io::Error::new(io::ErrorKind::Other, "stdin writer panicked")));
            (written, output)
        });

        let output = output?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        if let Err(e) = written {
            return Err(SurveyError::PoseDetector(format!(
                "{} did not accept the frame ({}), exited with {:?}: {}",
                self.program,
                e,
                output.status.code(),
                stderr.trim()
            )));
        }
        if !output.status.success() {
            return Err(SurveyError::PoseDetector(format!(
                "{} exited with {:?}: {}",
                self.program,
                output.status.code(),
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let estimate = Self::parse_output(&stdout)?;
        debug!(
            "🧍 {} landmarks from {}",
            estimate.as_ref().map_or(0, |e| e.landmarks.len()),
            self.program
        );
        Ok(estimate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_frame(fill: u8) -> Frame {
        Frame::new(4, 4, vec![fill; 4 * 4 * 4])
    }

    #[test]
    fn test_mock_default_detects_nobody() {
        let detector = MockPoseDetector::new();
        assert_eq!(detector.detect(&blank_frame(0)).unwrap(), None);
    }

    #[test]
    fn test_mock_pattern_uses_frame() {
        let detector = MockPoseDetector::with_pattern(|frame| {
            (frame.data[0] > 100).then(|| PoseEstimate::new(vec![Landmark::new(0.5, 0.5)]))
        });

        assert!(detector.detect(&blank_frame(200)).unwrap().is_some());
        assert!(detector.detect(&blank_frame(10)).unwrap().is_none());
    }

    #[test]
    fn test_parse_command_output() {
        let parsed = CommandPoseDetector::parse_output(
            r#"{"landmarks": [{"x": 0.1, "y": 0.2}, {"x": 0.3, "y": 0.4}]}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(parsed.landmarks.len(), 2);
        assert_eq!(parsed.landmarks[1], Landmark::new(0.3, 0.4));
    }

    #[test]
    fn test_parse_command_output_without_person() {
        assert_eq!(CommandPoseDetector::parse_output(r#"{"landmarks": null}"#).unwrap(), None);
        assert_eq!(CommandPoseDetector::parse_output(r#"{"landmarks": []}"#).unwrap(), None);
        assert_eq!(CommandPoseDetector::parse_output("{}").unwrap(), None);
    }

    /// 噪声帧编码后的 PNG 远大于管道缓冲区
    #[cfg(unix)]
    fn noisy_frame() -> Frame {
        use rand::{rngs::StdRng, Rng, SeedableRng};

        let mut data = vec![0u8; 256 * 256 * 4];
        StdRng::seed_from_u64(17).fill(&mut data[..]);
        Frame::new(256, 256, data)
    }

    #[cfg(unix)]
    fn shell(script: &str) -> CommandPoseDetector {
        CommandPoseDetector::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[cfg(unix)]
    #[test]
    fn test_command_detector_with_noisy_stderr() {
        let frame = noisy_frame();
        assert!(frame.to_png().unwrap().len() > 200_000);

        let detector =
            shell(r#"head -c 200000 /dev/zero >&2; cat >/dev/null; echo '{"landmarks":null}'"#);
        assert_eq!(detector.detect(&frame).unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_command_detector_reads_landmarks() {
        let detector = shell(r#"cat >/dev/null; echo '{"landmarks":[{"x":0.25,"y":0.5}]}'"#);
        let estimate = detector.detect(&noisy_frame()).unwrap().unwrap();
        assert_eq!(estimate.landmarks, vec![Landmark::new(0.25, 0.5)]);
    }

    #[cfg(unix)]
    #[test]
    fn test_command_detector_ignoring_input() {
        let detector = shell("echo 'model missing' >&2; exit 0");
        match detector.detect(&noisy_frame()) {
            Err(SurveyError::PoseDetector(message)) => assert!(message.contains("model missing")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_command_detector_failure_exit() {
        let detector = shell("cat >/dev/null; echo boom >&2; exit 3");
        match detector.detect(&blank_frame(0)) {
            Err(SurveyError::PoseDetector(message)) => {
                assert!(message.contains("Some(3)"));
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_command_output_garbage() {
        assert!(CommandPoseDetector::parse_output("not json").is_err());
    }

    #[test]
    fn test_missing_program_is_error() {
        let detector = CommandPoseDetector::new("angle-survey-no-such-detector", vec![]);
        assert!(matches!(
            detector.detect(&blank_frame(0)),
            Err(SurveyError::PoseDetector(_))
        ));
    }
}
