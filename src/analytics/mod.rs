//! Click analytics
//!
//! Recording and read-side statistics over the click log. Every query is a
//! single full replay of the log at call time; nothing is cached between calls.

pub mod aggregator;
pub mod ctr;
pub mod recorder;

pub use aggregator::Aggregator;
pub use ctr::{CtrCalculator, parse_impressions};
pub use recorder::{EventRecorder, TrackedClick};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// 单模板点击率
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CtrReport {
    pub template_id: String,
    pub clicks: u64,
    pub impressions: u64,
    pub ctr: f64,
}

/// 模板点击数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateCount {
    pub template_id: String,
    pub clicks: u64,
}

/// 账户点击数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountCount {
    pub account_id: String,
    pub clicks: u64,
}

/// 单次点击明细
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClickDetail {
    pub timestamp: DateTime<Utc>,
    pub account_id: Option<String>,
}

/// 按天统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

/// 仪表盘概览
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DashboardSummary {
    pub total_clicks: u64,
    pub templates: usize,
    pub accounts: usize,
    pub first_click: Option<DateTime<Utc>>,
    pub last_click: Option<DateTime<Utc>>,
    /// 回放时跳过的格式错误记录
    pub skipped_records: usize,
}
