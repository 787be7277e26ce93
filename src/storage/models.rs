use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// 一次被记录的点击
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub timestamp: DateTime<Utc>,
    /// 日志中写下的日历日期，即时间戳的前 10 个字符（带时区偏移的记录可能与 UTC 日期不同）
    pub date: NaiveDate,
    pub template_id: String,
    /// Absent on records written before the `account_id` column existed.
    pub account_id: Option<String>,
    /// Audit only, never aggregated.
    pub source_address: Option<String>,
}

impl ClickEvent {
    /// 以当前 UTC 时间创建点击事件
    pub fn new(template_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            timestamp: now,
            date: now.date_naive(),
            template_id: template_id.into(),
            account_id: None,
            source_address: None,
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self.date = timestamp.date_naive();
        self
    }

    pub fn with_account(mut self, account_id: Option<String>) -> Self {
        self.account_id = account_id;
        self
    }

    pub fn with_source(mut self, source_address: Option<String>) -> Self {
        self.source_address = source_address;
        self
    }

    /// Calendar date bucket, i.e. the `YYYY-MM-DD` prefix of the stored timestamp.
    pub fn day(&self) -> NaiveDate {
        self.date
    }
}

/// 序列化时间戳：RFC 3339，微秒精度，`Z` 后缀（字典序即时间序）
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// 解析时间戳
///
/// 支持 RFC 3339（任意时区，统一转换为 UTC），以及早期版本写入的
/// 无时区 ISO-8601 格式（按 UTC 解释）。
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|naive| naive.and_utc())
        })
}

/// 时间戳原文的日期部分（前 10 个字符）
pub fn stored_date(raw: &str) -> Option<NaiveDate> {
    let prefix = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}
