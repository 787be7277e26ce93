//! Click log header layout
//!
//! The first line of the log names its columns. Records are always decoded by
//! column name, so columns added by later schema versions stay readable in
//! logs created by earlier ones.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::models::{ClickEvent, format_timestamp};
use crate::errors::{Result, SmartlinkerError};

pub const COL_TIMESTAMP: &str = "timestamp";
pub const COL_TEMPLATE_ID: &str = "template_id";
pub const COL_ACCOUNT_ID: &str = "account_id";
pub const COL_IP_ADDRESS: &str = "ip_address";

/// 新建日志时使用的 schema 版本
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SchemaVersion {
    /// `timestamp,template_id,ip_address`
    V1,
    /// `timestamp,template_id,account_id,ip_address`
    #[default]
    V2,
}

impl SchemaVersion {
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            SchemaVersion::V1 => &[COL_TIMESTAMP, COL_TEMPLATE_ID, COL_IP_ADDRESS],
            SchemaVersion::V2 => &[COL_TIMESTAMP, COL_TEMPLATE_ID, COL_ACCOUNT_ID, COL_IP_ADDRESS],
        }
    }
}

/// 日志文件头描述的列布局
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLayout {
    columns: Vec<String>,
}

impl LogLayout {
    pub fn for_schema(schema: SchemaVersion) -> Self {
        Self {
            columns: schema.columns().iter().map(|c| c.to_string()).collect(),
        }
    }

    /// 从文件头构建布局，缺少必需列时返回 ReadFailure
    pub fn from_header<'a, I>(header: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let columns: Vec<String> = header.into_iter().map(|c| c.trim().to_string()).collect();
        for required in [COL_TIMESTAMP, COL_TEMPLATE_ID] {
            if !columns.iter().any(|c| c == required) {
                return Err(SmartlinkerError::read_failure(format!(
                    "Click log header is missing required column '{}' (found: {})",
                    required,
                    columns.join(",")
                )));
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn has_account(&self) -> bool {
        self.has_column(COL_ACCOUNT_ID)
    }

    /// 按本布局的列顺序编码一条记录；未知列写空值
    pub fn encode<'a>(&self, event: &'a ClickEvent) -> Vec<std::borrow::Cow<'a, str>> {
        use std::borrow::Cow;

        self.columns
            .iter()
            .map(|column| match column.as_str() {
                COL_TIMESTAMP => Cow::Owned(format_timestamp(&event.timestamp)),
                COL_TEMPLATE_ID => Cow::Borrowed(event.template_id.as_str()),
                COL_ACCOUNT_ID => Cow::Borrowed(event.account_id.as_deref().unwrap_or("")),
                COL_IP_ADDRESS => Cow::Borrowed(event.source_address.as_deref().unwrap_or("")),
                _ => Cow::Borrowed(""),
            })
            .collect()
    }
}
