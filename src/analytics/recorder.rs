use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};

use crate::config::RecorderConfig;
use crate::errors::{Result, SmartlinkerError};
use crate::storage::{ClickEvent, EventStore};
use crate::utils::{has_control_chars, validate_destination};

/// 一次被跟踪的点击请求（字段可直接从查询字符串反序列化）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackedClick {
    pub template_id: Option<String>,
    pub account_id: Option<String>,
    pub dest: Option<String>,
    /// 由调用方从连接信息填入，不接受查询参数
    #[serde(skip)]
    pub source_address: Option<String>,
}

impl TrackedClick {
    pub fn new(template_id: &str, dest: &str) -> Self {
        Self {
            template_id: Some(template_id.to_string()),
            dest: Some(dest.to_string()),
            ..Self::default()
        }
    }

    pub fn with_account(mut self, account_id: &str) -> Self {
        self.account_id = Some(account_id.to_string());
        self
    }

    pub fn with_source(mut self, source_address: Option<String>) -> Self {
        self.source_address = source_address;
        self
    }
}

/// 校验并记录点击
pub struct EventRecorder {
    store: Arc<EventStore>,
    config: RecorderConfig,
}

impl EventRecorder {
    /// 要求账户时，日志文件头必须包含 account_id 列
    pub fn new(store: Arc<EventStore>, config: RecorderConfig) -> Result<Self> {
        if config.require_account {
            let layout = store.layout()?;
            if !layout.has_account() {
                return Err(SmartlinkerError::config(format!(
                    "recorder.require_account is enabled but click log {} has no account_id column; \
                     disable require_account or start a new log with schema v2",
                    store.path().display()
                )));
            }
        }

        info!(
            "EventRecorder ready (require_account={}, validate_destination={})",
            config.require_account, config.validate_destination
        );
        Ok(Self { store, config })
    }

    pub fn requires_account(&self) -> bool {
        self.config.require_account
    }

    /// 校验通过后追加一条点击并返回重定向目标
    ///
    /// 校验失败时不写入任何记录。
    pub fn record(&self, click: TrackedClick) -> Result<String> {
        let template_id = required(click.template_id, "template_id")?;
        let dest = required(click.dest, "dest")?;

        let account_id = match click.account_id.filter(|a| !a.trim().is_empty()) {
            Some(account) => Some(account),
            None if self.config.require_account => {
                return Err(SmartlinkerError::validation(
                    "Missing 'account_id' parameter",
                ));
            }
            None => None,
        };

        let identifiers = [
            ("template_id", Some(&template_id)),
            ("account_id", account_id.as_ref()),
        ];
        for (name, value) in identifiers {
            if let Some(value) = value
                && has_control_chars(value)
            {
                return Err(SmartlinkerError::validation(format!(
                    "'{}' must not contain control characters",
                    name
                )));
            }
        }

        if self.config.validate_destination {
            validate_destination(&dest)?;
        }

        let event = ClickEvent::new(template_id)
            .with_account(account_id)
            .with_source(click.source_address);
        self.store.append(&event)?;

        debug!(
            "Recorded click for template {} (account {:?})",
            event.template_id, event.account_id
        );
        Ok(dest)
    }
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| SmartlinkerError::validation(format!("Missing '{}' parameter", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_blank() {
        assert!(required(None, "dest").is_err());
        assert!(required(Some("   ".into()), "dest").is_err());
        let err = required(Some(String::new()), "template_id").unwrap_err();
        assert_eq!(err.message(), "Missing 'template_id' parameter");
        assert_eq!(required(Some("x".into()), "dest").unwrap(), "x");
    }

    #[test]
    fn test_tracked_click_from_query() {
        let click: TrackedClick = serde_json::from_str(
            r#"{"template_id":"t","dest":"http://x","source_address":"1.1.1.1"}"#,
        )
        .unwrap();
        assert_eq!(click.template_id.as_deref(), Some("t"));
        assert!(click.account_id.is_none());
        assert!(click.source_address.is_none());
    }
}
