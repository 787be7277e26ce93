//! 点击分析集成测试
//!
//! 记录 -> 回放 -> CTR / 分组统计的端到端场景。

use std::fs;
use std::io::Write;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use smartlinker::analytics::{Aggregator, CtrCalculator, EventRecorder, TrackedClick};
use smartlinker::config::RecorderConfig;
use smartlinker::errors::SmartlinkerError;
use smartlinker::storage::{ClickEvent, EventStore, SchemaVersion};

struct Fixture {
    _dir: TempDir,
    store: Arc<EventStore>,
}

impl Fixture {
    fn new(schema: SchemaVersion) -> Self {
        let dir = TempDir::new().expect("创建临时目录失败");
        let store = Arc::new(EventStore::new(dir.path().join("click_log.csv"), schema));
        store.initialize().unwrap();
        Self { _dir: dir, store }
    }

    fn click(&self, template: &str, account: &str, day: u32, hour: u32) {
        let ts = Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap();
        self.store
            .append(
                &ClickEvent::new(template)
                    .at(ts)
                    .with_account(Some(account.to_string())),
            )
            .unwrap();
    }

    fn recorder(&self, require_account: bool) -> EventRecorder {
        EventRecorder::new(
            self.store.clone(),
            RecorderConfig {
                require_account,
                validate_destination: true,
            },
        )
        .unwrap()
    }

    fn log_len(&self) -> u64 {
        fs::metadata(self.store.path()).unwrap().len()
    }
}

/// tmplA 两次（1 月 1 日），tmplB 一次（1 月 2 日）
fn sample() -> Fixture {
    let fx = Fixture::new(SchemaVersion::V2);
    fx.click("tmplA", "acct1", 1, 10);
    fx.click("tmplA", "acct2", 1, 11);
    fx.click("tmplB", "acct1", 2, 9);
    fx
}

#[test]
fn test_ctr_for_sample_log() {
    let fx = sample();
    let ctr = CtrCalculator::new(fx.store.clone());

    let report = ctr.compute_ctr("tmplA", 4).unwrap();
    assert_eq!(report.clicks, 2);
    assert_eq!(report.impressions, 4);
    assert_eq!(report.ctr, 0.5);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["template_id"], "tmplA");
    assert_eq!(json["clicks"], 2);
    assert_eq!(json["ctr"], 0.5);
}

#[test]
fn test_ctr_edge_cases() {
    let fx = sample();
    let ctr = CtrCalculator::new(fx.store.clone());

    assert_eq!(ctr.compute_ctr("tmplA", 0).unwrap().ctr, 0.0);
    assert_eq!(ctr.compute_ctr("tmplB", 3).unwrap().ctr, 0.3333);
    // 点击数可以超过曝光数
    assert_eq!(ctr.compute_ctr("tmplA", 1).unwrap().ctr, 2.0);
    // 区分大小写
    assert_eq!(ctr.compute_ctr("TMPLA", 10).unwrap().clicks, 0);
    assert_eq!(ctr.compute_ctr("unknown", 10).unwrap().ctr, 0.0);
}

#[test]
fn test_by_template_orders_by_clicks_then_first_seen() {
    let fx = sample();
    let rows = Aggregator::new(fx.store.clone()).by_template().unwrap();
    let pairs: Vec<(&str, u64)> = rows
        .iter()
        .map(|r| (r.template_id.as_str(), r.clicks))
        .collect();
    assert_eq!(pairs, vec![("tmplA", 2), ("tmplB", 1)]);
}

#[test]
fn test_by_template_ties_keep_first_seen_order() {
    let fx = Fixture::new(SchemaVersion::V2);
    fx.click("zeta", "a", 1, 1);
    fx.click("alpha", "a", 1, 2);
    fx.click("mid", "a", 1, 3);
    fx.click("alpha", "a", 1, 4);
    fx.click("zeta", "a", 1, 5);

    let ids: Vec<String> = Aggregator::new(fx.store.clone())
        .by_template()
        .unwrap()
        .into_iter()
        .map(|r| r.template_id)
        .collect();
    assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
}

#[test]
fn test_by_day_for_template() {
    let fx = sample();
    let rows = Aggregator::new(fx.store.clone())
        .by_day(Some("tmplA"))
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date.to_string(), "2024-01-01");
    assert_eq!(rows[0].count, 2);
}

#[test]
fn test_by_day_sorted_ascending_across_days() {
    let fx = Fixture::new(SchemaVersion::V2);
    fx.click("t", "a", 3, 0);
    fx.click("t", "a", 1, 23);
    fx.click("t", "a", 3, 12);
    fx.click("u", "a", 2, 12);

    let agg = Aggregator::new(fx.store.clone());
    let all: Vec<(String, u64)> = agg
        .by_day(None)
        .unwrap()
        .into_iter()
        .map(|d| (d.date.to_string(), d.count))
        .collect();
    assert_eq!(
        all,
        vec![
            ("2024-01-01".to_string(), 1),
            ("2024-01-02".to_string(), 1),
            ("2024-01-03".to_string(), 2)
        ]
    );

    assert!(agg.by_day(Some("missing")).unwrap().is_empty());
}

#[test]
fn test_by_day_uses_date_as_written() {
    let fx = Fixture::new(SchemaVersion::V2);
    {
        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(fx.store.path())
            .unwrap();
        // UTC 为 2024-01-01T23:30:00Z，日志中写的是 1 月 2 日
        file.write_all(b"2024-01-02T01:30:00+02:00,tmplA,acct1,\n")
            .unwrap();
    }
    fx.click("tmplA", "acct2", 2, 12);

    let days = Aggregator::new(fx.store.clone())
        .by_day(Some("tmplA"))
        .unwrap();
    assert_eq!(days.len(), 1);
    assert_eq!(days[0].date.to_string(), "2024-01-02");
    assert_eq!(days[0].count, 2);
}

#[test]
fn test_reports_skip_damaged_row_without_losing_later_clicks() {
    let fx = Fixture::new(SchemaVersion::V2);
    fx.click("tmplA", "acct1", 1, 9);
    {
        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(fx.store.path())
            .unwrap();
        file.write_all(b"2024-01-01T11:00:00Z,\"tmplB,acct1,1.1.1.1\n")
            .unwrap();
    }
    fx.click("tmplA", "acct2", 1, 12);
    fx.click("tmplA", "acct3", 1, 13);

    let agg = Aggregator::new(fx.store.clone());
    let rows = agg.by_template().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].template_id, "tmplA");
    assert_eq!(rows[0].clicks, 3);
    assert_eq!(agg.summary().unwrap().skipped_records, 1);

    let report = CtrCalculator::new(fx.store.clone())
        .compute_ctr("tmplA", 6)
        .unwrap();
    assert_eq!(report.clicks, 3);
    assert_eq!(report.ctr, 0.5);
}

#[test]
fn test_counts_are_consistent() {
    let fx = sample();
    fx.click("tmplC", "acct3", 2, 8);
    let agg = Aggregator::new(fx.store.clone());

    let total = fx.store.replay().unwrap().count() as u64;
    let by_template: u64 = agg.by_template().unwrap().iter().map(|r| r.clicks).sum();
    let by_day: u64 = agg.by_day(None).unwrap().iter().map(|r| r.count).sum();
    assert_eq!(by_template, total);
    assert_eq!(by_day, total);

    let summary = agg.summary().unwrap();
    assert_eq!(summary.total_clicks, total);
    assert_eq!(summary.templates, 3);
    assert_eq!(summary.accounts, 3);
    assert_eq!(summary.skipped_records, 0);
    assert!(summary.first_click <= summary.last_click);
}

#[test]
fn test_detail_for_template_keeps_append_order() {
    let fx = sample();
    let details = Aggregator::new(fx.store.clone())
        .detail_for_template("tmplA")
        .unwrap();
    let accounts: Vec<Option<&str>> = details.iter().map(|d| d.account_id.as_deref()).collect();
    assert_eq!(accounts, vec![Some("acct1"), Some("acct2")]);
    assert!(details[0].timestamp < details[1].timestamp);

    assert!(
        Aggregator::new(fx.store.clone())
            .detail_for_template("nope")
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_by_account_with_filter() {
    let fx = sample();
    let agg = Aggregator::new(fx.store.clone());

    let all: Vec<(String, u64)> = agg
        .by_account(None)
        .unwrap()
        .into_iter()
        .map(|r| (r.account_id, r.clicks))
        .collect();
    assert_eq!(
        all,
        vec![("acct1".to_string(), 2), ("acct2".to_string(), 1)]
    );

    let only_b = agg.by_account(Some("tmplB")).unwrap();
    assert_eq!(only_b.len(), 1);
    assert_eq!(only_b[0].account_id, "acct1");
}

#[test]
fn test_empty_log_reports() {
    let fx = Fixture::new(SchemaVersion::V2);
    let agg = Aggregator::new(fx.store.clone());
    assert!(agg.by_template().unwrap().is_empty());
    assert!(agg.by_day(None).unwrap().is_empty());
    assert_eq!(agg.summary().unwrap().total_clicks, 0);
    assert_eq!(
        CtrCalculator::new(fx.store.clone())
            .compute_ctr("tmplA", 10)
            .unwrap()
            .clicks,
        0
    );
}

#[test]
fn test_recorder_appends_and_returns_destination() {
    let fx = Fixture::new(SchemaVersion::V2);
    let recorder = fx.recorder(true);

    let dest = recorder
        .record(
            TrackedClick::new("tmplA", "https://example.com/landing?x=1")
                .with_account("acct1")
                .with_source(Some("198.51.100.4".into())),
        )
        .unwrap();
    assert_eq!(dest, "https://example.com/landing?x=1");

    let events: Vec<ClickEvent> = fx.store.replay().unwrap().collect();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].template_id, "tmplA");
    assert_eq!(events[0].account_id.as_deref(), Some("acct1"));
    assert_eq!(events[0].source_address.as_deref(), Some("198.51.100.4"));
}

#[test]
fn test_recorded_timestamp_within_call_window() {
    let fx = Fixture::new(SchemaVersion::V2);
    let before = Utc::now();
    fx.recorder(true)
        .record(TrackedClick::new("tmplA", "http://x").with_account("acct1"))
        .unwrap();
    let after = Utc::now();

    let event = fx.store.replay().unwrap().next().unwrap();
    // 落盘精度为微秒
    assert!(event.timestamp >= before - chrono::Duration::microseconds(1));
    assert!(event.timestamp <= after);
}

#[test]
fn test_recorder_validation_leaves_log_untouched() {
    let fx = Fixture::new(SchemaVersion::V2);
    let recorder = fx.recorder(true);
    let before = fx.log_len();

    let cases = [
        TrackedClick {
            dest: Some("https://example.com".into()),
            account_id: Some("a".into()),
            ..TrackedClick::default()
        },
        TrackedClick {
            template_id: Some("tmplA".into()),
            account_id: Some("a".into()),
            ..TrackedClick::default()
        },
        TrackedClick::new("tmplA", "https://example.com"),
        TrackedClick::new("tmplA", "https://example.com").with_account("   "),
        TrackedClick::new("   ", "https://example.com").with_account("a"),
        TrackedClick::new("tmpl\nA", "https://example.com").with_account("a"),
        TrackedClick::new("tmplA", "javascript:alert(1)").with_account("a"),
    ];

    for click in cases {
        let err = recorder.record(click).unwrap_err();
        assert!(err.is_validation(), "unexpected error: {}", err);
    }
    assert_eq!(fx.log_len(), before);
}

#[test]
fn test_recorder_reports_first_missing_parameter() {
    let fx = Fixture::new(SchemaVersion::V2);
    let err = fx
        .recorder(true)
        .record(TrackedClick::default())
        .unwrap_err();
    assert!(err.message().contains("template_id"));

    let err = fx
        .recorder(true)
        .record(TrackedClick {
            template_id: Some("t".into()),
            ..TrackedClick::default()
        })
        .unwrap_err();
    assert!(err.message().contains("dest"));
}

#[test]
fn test_recorder_optional_account() {
    let fx = Fixture::new(SchemaVersion::V2);
    fx.recorder(false)
        .record(TrackedClick::new("tmplA", "https://example.com"))
        .unwrap();

    let events: Vec<ClickEvent> = fx.store.replay().unwrap().collect();
    assert_eq!(events[0].account_id, None);
}

#[test]
fn test_recorder_requires_account_column() {
    let fx = Fixture::new(SchemaVersion::V1);
    let err = EventRecorder::new(fx.store.clone(), RecorderConfig::default())
        .err()
        .unwrap();
    assert!(matches!(err, SmartlinkerError::Config(_)));

    // 不要求账户时可以继续写入旧格式日志
    let recorder = fx.recorder(false);
    recorder
        .record(TrackedClick::new("tmplA", "https://example.com").with_account("acct"))
        .unwrap();
    let events: Vec<ClickEvent> = fx.store.replay().unwrap().collect();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].account_id, None);
}

#[test]
fn test_destination_check_can_be_disabled() {
    let fx = Fixture::new(SchemaVersion::V2);
    let recorder = EventRecorder::new(
        fx.store.clone(),
        RecorderConfig {
            require_account: false,
            validate_destination: false,
        },
    )
    .unwrap();

    assert_eq!(
        recorder
            .record(TrackedClick::new("tmplA", "/relative/path"))
            .unwrap(),
        "/relative/path"
    );
}

#[test]
fn test_recorded_clicks_show_up_in_reports() {
    let fx = Fixture::new(SchemaVersion::V2);
    let recorder = fx.recorder(true);
    for (template, account) in [("tmplA", "a1"), ("tmplB", "a2"), ("tmplA", "a3")] {
        recorder
            .record(TrackedClick::new(template, "https://example.com").with_account(account))
            .unwrap();
    }

    let report = CtrCalculator::new(fx.store.clone())
        .compute_ctr("tmplA", 4)
        .unwrap();
    assert_eq!(report.clicks, 2);
    assert_eq!(report.ctr, 0.5);

    let today = Utc::now().date_naive();
    let days = Aggregator::new(fx.store.clone()).by_day(Some("tmplA")).unwrap();
    // 跨零点运行时可能分成两天
    assert_eq!(days.iter().map(|d| d.count).sum::<u64>(), 2);
    assert!(days.iter().all(|d| d.date <= today));
}
