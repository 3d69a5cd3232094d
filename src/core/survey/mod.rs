//! 外部数据集机位调查：采样 → 姿态 → 机位判定 → 投票汇总 → 大类分组

pub mod aggregator;
pub mod collector;
pub mod config;
pub mod dataset;
pub mod error;
pub mod grouper;
pub mod overlay;
pub mod report;

pub use aggregator::{aggregate, aggregate_tally, summarize_actions, LabelOrder, VoteTally};
pub use collector::{AngleCollector, CollectorConfig};
pub use config::{PoseCommandConfig, SurveyConfig};
pub use dataset::{ActionEntry, DatasetTree};
pub use error::SurveyError;
pub use grouper::{default_category_table, group, parse_votes, CategoryTable};
pub use report::ReportWriter;
