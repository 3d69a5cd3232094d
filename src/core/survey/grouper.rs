//! 动作大类分组
//!
//! 解析动作级汇总字符串中的 `Label (count)`，按分类表把成员动作的票数相加。

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::models::survey::{ActionVoteSummary, CategoryVoteSummary, NO_DATA_SUMMARY};
use crate::core::survey::aggregator::{aggregate_tally, LabelOrder, VoteTally};

/// 大类 → 成员动作，保持声明顺序
pub type CategoryTable = IndexMap<String, Vec<String>>;

static VOTE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([\w\s()/-]+?)\s*\((\d+)\)").expect("valid vote pattern"));

/// 从 `"A (3), B (1)"` 解析出 `(label, count)`
pub fn parse_votes(summary: &str) -> Vec<(String, usize)> {
    VOTE_PATTERN
        .captures_iter(summary)
        .filter_map(|caps| {
            let label = caps.get(1)?.as_str().trim();
            let count = caps.get(2)?.as_str().parse::<usize>().ok()?;
            (!label.is_empty()).then(|| (label.to_string(), count))
        })
        .collect()
}

/// 按分类表重新汇总；分类内无票时为 `No Data`
pub fn group(summaries: &[ActionVoteSummary], table: &CategoryTable) -> Vec<CategoryVoteSummary> {
    table
        .iter()
        .map(|(category, members)| {
            let mut tally = VoteTally::new();
            for summary in summaries.iter().filter(|s| members.contains(&s.action)) {
                for (label, count) in parse_votes(&summary.summary) {
                    tally.add(&label, count);
                }
            }

            let summary = if tally.is_empty() {
                NO_DATA_SUMMARY.to_string()
            } else {
                // 成员汇总已经过阈值筛选，这里保留全部标签
                aggregate_tally(&tally, 1, LabelOrder::DescendingCount)
            };

            CategoryVoteSummary {
                category: category.clone(),
                summary,
            }
        })
        .collect()
}

/// BEDLAM 动作与外部数据集动作的对应关系
pub fn default_category_table() -> CategoryTable {
    let groups: [(&str, &[&str]); 7] = [
        ("bend", &["pick", "situp"]),
        ("kick", &["kick", "kick_ball"]),
        ("run", &["run"]),
        ("stretch", &["handstand", "somersault"]),
        ("take_pick_something_up", &["pick", "pour"]),
        ("turn", &["turn", "somersault"]),
        ("walk", &["walk", "climb_stairs"]),
    ];

    groups
        .iter()
        .map(|(category, members)| {
            (
                category.to_string(),
                members.iter().map(|m| m.to_string()).collect(),
            )
        })
        .collect()
}
