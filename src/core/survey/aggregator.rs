//! 投票聚合
//!
//! 统计每个标签的票数，保留达到阈值的标签；全部被过滤时回退到票数最多的前两名。

use indexmap::IndexMap;

use crate::api::models::survey::{ActionVoteSummary, AngleRecord, UNKNOWN_SUMMARY};

/// 回退时保留的标签数
const FALLBACK_TOP_N: usize = 2;

/// 输出中标签的排列方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelOrder {
    /// 按标签名升序（动作级汇总）
    Alphabetical,
    /// 按票数降序，同票按首次出现顺序（大类汇总）
    DescendingCount,
}

/// 保持首次出现顺序的票数表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteTally {
    counts: IndexMap<String, usize>,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a AngleRecord>) -> Self {
        let mut tally = Self::new();
        for record in records {
            tally.add(record.angle.as_str(), 1);
        }
        tally
    }

    pub fn add(&mut self, label: &str, votes: usize) {
        *self.counts.entry(label.to_string()).or_insert(0) += votes;
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// 按票数降序，稳定排序保证同票时先出现者在前
    pub fn ranked(&self) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> = self
            .counts
            .iter()
            .map(|(label, &count)| (label.as_str(), count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }
}

/// 聚合为 `"Label (count), ..."`；无票时返回 `Unknown`
pub fn aggregate_tally(tally: &VoteTally, min_votes_threshold: usize, order: LabelOrder) -> String {
    if tally.is_empty() {
        return UNKNOWN_SUMMARY.to_string();
    }

    let ranked = tally.ranked();
    let mut kept: Vec<(&str, usize)> = ranked
        .iter()
        .copied()
        .filter(|&(_, count)| count >= min_votes_threshold)
        .collect();

    if kept.is_empty() {
        kept = ranked.into_iter().take(FALLBACK_TOP_N).collect();
    }

    if order == LabelOrder::Alphabetical {
        kept.sort_by(|a, b| a.0.cmp(b.0));
    }

    format_votes(&kept)
}

/// 单个动作的记录聚合
pub fn aggregate(records: &[AngleRecord], min_votes_threshold: usize, order: LabelOrder) -> String {
    aggregate_tally(&VoteTally::from_records(records), min_votes_threshold, order)
}

/// 为每个动作生成汇总，没有记录的动作为 `Unknown`
pub fn summarize_actions(
    actions: &[String],
    records: &[AngleRecord],
    min_votes_threshold: usize,
) -> Vec<ActionVoteSummary> {
    actions
        .iter()
        .map(|action| {
            let tally = VoteTally::from_records(records.iter().filter(|r| &r.action == action));
            ActionVoteSummary {
                action: action.clone(),
                summary: aggregate_tally(&tally, min_votes_threshold, LabelOrder::Alphabetical),
            }
        })
        .collect()
}

pub fn format_votes(votes: &[(&str, usize)]) -> String {
    votes
        .iter()
        .map(|(label, count)| format!("{} ({})", label, count))
        .collect::<Vec<_>>()
        .join(", ")
}
