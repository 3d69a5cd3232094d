//! 机位分类器
//!
//! 基于姿态关键点包围盒的规则判定，规则按顺序匹配，先命中者生效。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::frame_extractor::pose_detector::PoseEstimate;

/// 机位标签（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraAngle {
    CloseUp,
    FaceOnlyCloseUp,
    UpperBodyShot,
    FirstPersonHandsFocused,
    ThirdPersonFarAway,
    MixedUnknown,
    NoPersonDetected,
}

impl CameraAngle {
    pub const ALL: [CameraAngle; 7] = [
        CameraAngle::CloseUp,
        CameraAngle::FaceOnlyCloseUp,
        CameraAngle::UpperBodyShot,
        CameraAngle::FirstPersonHandsFocused,
        CameraAngle::ThirdPersonFarAway,
        CameraAngle::MixedUnknown,
        CameraAngle::NoPersonDetected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CameraAngle::CloseUp => "CloseUp",
            CameraAngle::FaceOnlyCloseUp => "FaceOnlyCloseUp",
            CameraAngle::UpperBodyShot => "UpperBodyShot",
            CameraAngle::FirstPersonHandsFocused => "FirstPersonHandsFocused",
            CameraAngle::ThirdPersonFarAway => "ThirdPersonFarAway",
            CameraAngle::MixedUnknown => "MixedUnknown",
            CameraAngle::NoPersonDetected => "NoPersonDetected",
        }
    }

    /// 人类可读描述
    pub fn description(&self) -> &'static str {
        match self {
            CameraAngle::CloseUp => "Close-up (face or hands)",
            CameraAngle::FaceOnlyCloseUp => "Face-only close-up",
            CameraAngle::UpperBodyShot => "Upper body shot (partially visible person)",
            CameraAngle::FirstPersonHandsFocused => "1st person (hands-focused)",
            CameraAngle::ThirdPersonFarAway => "3rd person (far away)",
            CameraAngle::MixedUnknown => "Mixed/Unknown",
            CameraAngle::NoPersonDetected => "No person detected",
        }
    }

    /// 除 MixedUnknown / NoPersonDetected 外均为有效票
    pub fn is_decisive(&self) -> bool {
        !matches!(self, CameraAngle::MixedUnknown | CameraAngle::NoPersonDetected)
    }
}

impl fmt::Display for CameraAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 关键点包围盒：宽高为像素，纵向范围保持归一化坐标
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub width: f64,
    pub height: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl BoundingBox {
    pub fn from_pose(pose: &PoseEstimate, frame_width: u32, frame_height: u32) -> Option<Self> {
        let first = pose.landmarks.first()?;
        let (mut xmin, mut xmax) = (f64::from(first.x), f64::from(first.x));
        let (mut ymin, mut ymax) = (f64::from(first.y), f64::from(first.y));

        for point in &pose.landmarks[1..] {
            let (x, y) = (f64::from(point.x), f64::from(point.y));
            xmin = xmin.min(x);
            xmax = xmax.max(x);
            ymin = ymin.min(y);
            ymax = ymax.max(y);
        }

        Some(Self {
            width: (xmax - xmin) * f64::from(frame_width),
            height: (ymax - ymin) * f64::from(frame_height),
            ymin,
            ymax,
        })
    }
}

/// 根据姿态估计判定机位
pub fn classify(pose: Option<&PoseEstimate>, frame_width: u32, frame_height: u32) -> CameraAngle {
    let bbox = match pose.and_then(|p| BoundingBox::from_pose(p, frame_width, frame_height)) {
        Some(bbox) => bbox,
        None => return CameraAngle::NoPersonDetected,
    };

    let w = f64::from(frame_width);
    let h = f64::from(frame_height);

    if bbox.width > 0.7 * w && bbox.height > 0.7 * h {
        CameraAngle::CloseUp
    } else if bbox.width > 0.6 * w && bbox.ymin < 0.2 {
        // 脸部靠近画面顶端
        CameraAngle::FaceOnlyCloseUp
    } else if bbox.width > 0.5 * w && bbox.height > 0.5 * h {
        CameraAngle::UpperBodyShot
    } else if bbox.ymin > 0.3 && bbox.ymax < 0.9 {
        CameraAngle::FirstPersonHandsFocused
    } else if bbox.width < 0.4 * w && bbox.height < 0.5 * h {
        CameraAngle::ThirdPersonFarAway
    } else {
        CameraAngle::MixedUnknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_extractor::pose_detector::Landmark;

    const W: u32 = 640;
    const H: u32 = 480;

    fn pose(points: &[(f32, f32)]) -> PoseEstimate {
        PoseEstimate::new(points.iter().map(|&(x, y)| Landmark::new(x, y)).collect())
    }

    #[test]
    fn test_no_landmarks() {
        assert_eq!(classify(None, W, H), CameraAngle::NoPersonDetected);
        assert_eq!(classify(Some(&PoseEstimate::default()), W, H), CameraAngle::NoPersonDetected);
    }

    #[test]
    fn test_close_up_ignores_vertical_position() {
        // bbox_w = 0.8W, bbox_h = 0.75H
        let p = pose(&[(0.1, 0.2), (0.9, 0.95)]);
        assert_eq!(classify(Some(&p), W, H), CameraAngle::CloseUp);

        let p = pose(&[(0.05, 0.0), (0.85, 0.75)]);
        assert_eq!(classify(Some(&p), W, H), CameraAngle::CloseUp);
    }

    #[test]
    fn test_face_only_close_up() {
        let p = pose(&[(0.1, 0.1), (0.8, 0.5)]);
        assert_eq!(classify(Some(&p), W, H), CameraAngle::FaceOnlyCloseUp);
    }

    #[test]
    fn test_upper_body_shot() {
        // 宽 0.65，但顶部低于 0.2
        let p = pose(&[(0.1, 0.3), (0.75, 0.9)]);
        assert_eq!(classify(Some(&p), W, H), CameraAngle::UpperBodyShot);
    }

    #[test]
    fn test_first_person_hands_focused() {
        let p = pose(&[(0.2, 0.4), (0.6, 0.85)]);
        assert_eq!(classify(Some(&p), W, H), CameraAngle::FirstPersonHandsFocused);
    }

    #[test]
    fn test_third_person_far_away() {
        let p = pose(&[(0.45, 0.1), (0.55, 0.4)]);
        assert_eq!(classify(Some(&p), W, H), CameraAngle::ThirdPersonFarAway);
    }

    #[test]
    fn test_mixed_unknown() {
        // 窄而高，纵贯全画面
        let p = pose(&[(0.45, 0.05), (0.55, 0.95)]);
        assert_eq!(classify(Some(&p), W, H), CameraAngle::MixedUnknown);
    }

    #[test]
    fn test_single_landmark_is_far_away() {
        let p = pose(&[(0.5, 0.1)]);
        assert_eq!(classify(Some(&p), W, H), CameraAngle::ThirdPersonFarAway);
    }

    #[test]
    fn test_rule_order_close_up_before_face() {
        // 同时满足规则 3 和规则 4，先命中 CloseUp
        let p = pose(&[(0.0, 0.0), (1.0, 0.8)]);
        assert_eq!(classify(Some(&p), W, H), CameraAngle::CloseUp);
    }

    #[test]
    fn test_thresholds_are_strict() {
        // 宽度恰好 0.5W、高度 0.6H 不算上半身
        let p = pose(&[(0.25, 0.25), (0.75, 0.85)]);
        assert_ne!(classify(Some(&p), 1000, 1000), CameraAngle::UpperBodyShot);
    }

    #[test]
    fn test_classification_is_total() {
        let steps = [0.0f32, 0.15, 0.25, 0.35, 0.5, 0.65, 0.8, 0.95, 1.0];
        for &x0 in &steps {
            for &x1 in &steps {
                for &y0 in &steps {
                    for &y1 in &steps {
                        let p = pose(&[(x0, y0), (x1, y1)]);
                        let label = classify(Some(&p), W, H);
                        assert!(CameraAngle::ALL.contains(&label));
                        assert_ne!(label, CameraAngle::NoPersonDetected);
                    }
                }
            }
        }
    }

    #[test]
    fn test_decisive_labels() {
        let decisive: Vec<_> = CameraAngle::ALL.iter().filter(|a| a.is_decisive()).collect();
        assert_eq!(decisive.len(), 5);
        assert!(!CameraAngle::MixedUnknown.is_decisive());
        assert!(!CameraAngle::NoPersonDetected.is_decisive());
    }

    #[test]
    fn test_display_and_description() {
        assert_eq!(CameraAngle::FirstPersonHandsFocused.to_string(), "FirstPersonHandsFocused");
        assert_eq!(CameraAngle::CloseUp.description(), "Close-up (face or hands)");
    }
}
