use std::sync::Arc;

use tracing::debug;

use super::CtrReport;
use crate::errors::{Result, SmartlinkerError};
use crate::storage::EventStore;

/// 将原始 impressions 参数解析为非负整数
pub fn parse_impressions(raw: Option<&str>) -> Result<u64> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SmartlinkerError::validation("Missing 'impressions' parameter"))?;

    if raw.starts_with('-') {
        return Err(SmartlinkerError::validation(format!(
            "'impressions' must not be negative, got '{}'",
            raw
        )));
    }

    raw.parse::<u64>().map_err(|_| {
        SmartlinkerError::validation(format!(
            "'impressions' must be a non-negative integer, got '{}'",
            raw
        ))
    })
}

/// clicks / impressions 保留 4 位小数；impressions 为 0 时为 0
pub fn click_through_rate(clicks: u64, impressions: u64) -> f64 {
    if impressions == 0 {
        return 0.0;
    }
    round_half_even(clicks as f64 / impressions as f64, 10_000)
}

/// 按 f64 的精确二进制值舍入到 `1 / scale`，恰好居中时取偶数
///
/// `x * scale` 在浮点下会再舍入一次，可能把略偏离中点的值变成中点，
/// 因此在整数上完成比较。
fn round_half_even(x: f64, scale: u64) -> f64 {
    if x.is_nan() || x <= 0.0 {
        return 0.0;
    }

    let bits = x.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i64;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exponent) = if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased - 1075)
    };

    // x * scale = mantissa * scale * 2^exponent
    let scaled = mantissa as u128 * scale as u128;
    if exponent >= 0 {
        return x;
    }

    let shift = (-exponent) as u32;
    if shift >= 128 {
        return 0.0;
    }
    let quotient = scaled >> shift;
    let remainder = scaled - (quotient << shift);
    let half = 1u128 << (shift - 1);

    let rounded = if remainder > half || (remainder == half && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    };
    rounded as f64 / scale as f64
}

pub struct CtrCalculator {
    store: Arc<EventStore>,
}

impl CtrCalculator {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self { store }
    }

    /// 统计与 template_id 完全相等（区分大小写）的点击数并计算点击率
    pub fn compute_ctr(&self, template_id: &str, impressions: u64) -> Result<CtrReport> {
        if template_id.trim().is_empty() {
            return Err(SmartlinkerError::validation("Missing 'template_id' parameter"));
        }

        let mut replay = self.store.replay()?;
        let clicks = replay
            .by_ref()
            .filter(|event| event.template_id == template_id)
            .count() as u64;
        replay.finish()?;

        let ctr = click_through_rate(clicks, impressions);
        debug!(
            "CTR for {}: {} clicks / {} impressions = {}",
            template_id, clicks, impressions, ctr
        );

        Ok(CtrReport {
            template_id: template_id.to_string(),
            clicks,
            impressions,
            ctr,
        })
    }
}
