//! Grouped and time-bucketed views over the click log

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use super::{AccountCount, ClickDetail, DailyCount, DashboardSummary, TemplateCount};
use crate::errors::Result;
use crate::storage::EventStore;

pub struct Aggregator {
    store: Arc<EventStore>,
}

impl Aggregator {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self { store }
    }

    /// 每个模板的点击数，按点击数降序；并列时按首次出现顺序
    pub fn by_template(&self) -> Result<Vec<TemplateCount>> {
        let mut replay = self.store.replay()?;
        let ranked = rank_by_first_seen(replay.by_ref().map(|event| event.template_id));
        replay.finish()?;
        debug!("Aggregator: by_template returned {} templates", ranked.len());

        Ok(ranked
            .into_iter()
            .map(|(template_id, clicks)| TemplateCount {
                template_id,
                clicks,
            })
            .collect())
    }

    /// 单模板的点击明细，保持追加顺序；无记录时返回空列表
    pub fn detail_for_template(&self, template_id: &str) -> Result<Vec<ClickDetail>> {
        let mut replay = self.store.replay()?;
        let details: Vec<ClickDetail> = replay
            .by_ref()
            .filter(|event| event.template_id == template_id)
            .map(|event| ClickDetail {
                timestamp: event.timestamp,
                account_id: event.account_id,
            })
            .collect();
        replay.finish()?;

        debug!(
            "Aggregator: detail_for_template({}) returned {} clicks",
            template_id,
            details.len()
        );
        Ok(details)
    }

    /// 按日志中写下的日期分桶计数，日期升序
    pub fn by_day(&self, template_id: Option<&str>) -> Result<Vec<DailyCount>> {
        let mut replay = self.store.replay()?;
        let mut buckets: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        for event in replay.by_ref() {
            if template_id.is_some_and(|t| t != event.template_id) {
                continue;
            }
            *buckets.entry(event.day()).or_insert(0) += 1;
        }
        replay.finish()?;

        debug!(
            "Aggregator: by_day({:?}) returned {} days",
            template_id,
            buckets.len()
        );
        Ok(buckets
            .into_iter()
            .map(|(date, count)| DailyCount { date, count })
            .collect())
    }

    /// 每个账户的点击数；没有账户的记录不参与排名
    pub fn by_account(&self, template_id: Option<&str>) -> Result<Vec<AccountCount>> {
        let mut replay = self.store.replay()?;
        let accounts = replay
            .by_ref()
            .filter(|event| template_id.is_none_or(|t| t == event.template_id))
            .filter_map(|event| event.account_id);
        let ranked = rank_by_first_seen(accounts);
        replay.finish()?;

        Ok(ranked
            .into_iter()
            .map(|(account_id, clicks)| AccountCount { account_id, clicks })
            .collect())
    }

    /// 仪表盘概览
    pub fn summary(&self) -> Result<DashboardSummary> {
        let mut replay = self.store.replay()?;
        let mut summary = DashboardSummary::default();
        let mut templates = HashSet::new();
        let mut accounts = HashSet::new();

        for event in replay.by_ref() {
            summary.total_clicks += 1;
            summary.first_click = Some(match summary.first_click {
                Some(first) => first.min(event.timestamp),
                None => event.timestamp,
            });
            summary.last_click = Some(match summary.last_click {
                Some(last) => last.max(event.timestamp),
                None => event.timestamp,
            });
            if let Some(account) = event.account_id {
                accounts.insert(account);
            }
            templates.insert(event.template_id);
        }

        summary.templates = templates.len();
        summary.accounts = accounts.len();
        summary.skipped_records = replay.finish()?;
        Ok(summary)
    }
}

/// 计数并按降序排列，稳定排序保证并列项按首次出现顺序
fn rank_by_first_seen<I>(keys: I) -> Vec<(String, u64)>
where
    I: IntoIterator<Item = String>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, u64)> = Vec::new();

    for key in keys {
        match index.get(&key) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(key.clone(), counts.len());
                counts.push((key, 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
