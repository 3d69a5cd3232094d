//! 报表输出：三张 CSV 表 + 一份 JSON

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::api::models::survey::{
    ActionVoteSummary, AngleRecord, CategoryVoteSummary, SurveyReport,
};
use crate::core::survey::SurveyError;

pub const RESULTS_FILE: &str = "camera_angle_results.csv";
pub const SUMMARY_FILE: &str = "camera_angle_summary.csv";
pub const GROUPED_FILE: &str = "camera_angle_grouped.csv";
pub const REPORT_JSON_FILE: &str = "camera_angle_report.json";

const REPORT_FILES: [&str; 4] = [RESULTS_FILE, SUMMARY_FILE, GROUPED_FILE, REPORT_JSON_FILE];

pub fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn build_csv(header: &[&str], rows: impl Iterator<Item = Vec<String>>) -> String {
    let mut lines = vec![header.iter().map(|h| csv_escape(h)).collect::<Vec<_>>().join(",")];
    for row in rows {
        lines.push(row.iter().map(|v| csv_escape(v)).collect::<Vec<_>>().join(","));
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

pub fn records_csv(records: &[AngleRecord]) -> String {
    build_csv(
        &["Action", "Video", "Frame", "Detected Camera Angle"],
        records.iter().map(|r| {
            vec![
                r.action.clone(),
                r.video.clone(),
                r.frame.to_string(),
                r.angle.to_string(),
            ]
        }),
    )
}

pub fn action_summary_csv(summaries: &[ActionVoteSummary]) -> String {
    build_csv(
        &["Action", "Most Frequent Camera Angles"],
        summaries
            .iter()
            .map(|s| vec![s.action.clone(), s.summary.clone()]),
    )
}

pub fn category_summary_csv(summaries: &[CategoryVoteSummary]) -> String {
    build_csv(
        &["Action Category", "Camera Angles"],
        summaries
            .iter()
            .map(|s| vec![s.category.clone(), s.summary.clone()]),
    )
}

/// 固定位置的报表文件，每次运行整体覆盖
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.output_dir.join(file)
    }

    /// 删除上次运行留下的报表
    pub fn clear_previous(&self) -> Result<(), SurveyError> {
        for file in REPORT_FILES {
            let path = self.path(file);
            if path.exists() {
                fs::remove_file(&path)?;
                info!("🗑️ Deleted existing file: {:?}", path);
            }
        }
        Ok(())
    }

    pub fn write(&self, report: &SurveyReport) -> Result<Vec<PathBuf>, SurveyError> {
        fs::create_dir_all(&self.output_dir)?;

        let outputs = [
            (RESULTS_FILE, records_csv(&report.records)),
            (SUMMARY_FILE, action_summary_csv(&report.action_summaries)),
            (GROUPED_FILE, category_summary_csv(&report.category_summaries)),
            (REPORT_JSON_FILE, serde_json::to_string_pretty(report)?),
        ];

        let mut written = Vec::with_capacity(outputs.len());
        for (file, content) in outputs {
            let path = self.path(file);
            write_file(&path, &content)?;
            info!("💾 Saved {:?}", path);
            written.push(path);
        }
        Ok(written)
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), SurveyError> {
    fs::write(path, content)?;
    Ok(())
}
