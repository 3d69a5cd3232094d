//! 姿态叠加预览：把关键点画在帧上写成 PNG

use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};

use crate::core::angle::CameraAngle;
use crate::core::survey::SurveyError;
use crate::frame_extractor::frame::SampledFrame;
use crate::frame_extractor::pose_detector::PoseEstimate;

const MARKER_RADIUS: i64 = 3;
const LANDMARK_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);
const BBOX_COLOR: Rgba<u8> = Rgba([255, 64, 64, 255]);

pub fn overlay_path(dir: &Path, sampled: &SampledFrame) -> PathBuf {
    let stem = sampled.frame_id.to_string().replace(['/', '\\', '.'], "_");
    dir.join(&sampled.action)
        .join(format!("{}_{}.png", sampled.video_id.replace('.', "_"), stem))
}

/// 关键点 + 包围盒
pub fn draw_pose(sampled: &SampledFrame, pose: &PoseEstimate) -> Option<RgbaImage> {
    let mut img = sampled.frame.to_rgba_image()?;
    let (w, h) = (img.width() as i64, img.height() as i64);
    if w == 0 || h == 0 || pose.is_empty() {
        return Some(img);
    }

    let to_px = |x: f32, y: f32| ((x as f64 * w as f64) as i64, (y as f64 * h as f64) as i64);

    let (mut x0, mut y0, mut x1, mut y1) = (w, h, 0, 0);
    for point in &pose.landmarks {
        let (px, py) = to_px(point.x, point.y);
        x0 = x0.min(px);
        y0 = y0.min(py);
        x1 = x1.max(px);
        y1 = y1.max(py);
        for dy in -MARKER_RADIUS..=MARKER_RADIUS {
            for dx in -MARKER_RADIUS..=MARKER_RADIUS {
                put(&mut img, px + dx, py + dy, LANDMARK_COLOR);
            }
        }
    }

    for x in x0..=x1 {
        put(&mut img, x, y0, BBOX_COLOR);
        put(&mut img, x, y1, BBOX_COLOR);
    }
    for y in y0..=y1 {
        put(&mut img, x0, y, BBOX_COLOR);
        put(&mut img, x1, y, BBOX_COLOR);
    }

    Some(img)
}

pub fn save_overlay(
    dir: &Path,
    sampled: &SampledFrame,
    pose: &PoseEstimate,
    angle: CameraAngle,
) -> Result<PathBuf, SurveyError> {
    let img = draw_pose(sampled, pose).ok_or_else(|| {
        SurveyError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("frame buffer does not match {}x{}", sampled.frame.width, sampled.frame.height),
        ))
    })?;

    let path = overlay_path(dir, sampled);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::File::create(&path)?;
    DynamicImage::ImageRgba8(img).write_to(&mut file, ImageOutputFormat::Png)?;
    log::debug!("🖼️ {} ({}) → {:?}", angle, angle.description(), path);
    Ok(path)
}

fn put(img: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}
