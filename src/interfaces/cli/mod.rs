//! CLI interface module
//!
//! Offline reports over the configured click log. These read the log
//! directly and never create it.

pub mod commands;

use std::sync::Arc;

use crate::config::{Command, StaticConfig};
use crate::errors::Result;
use crate::storage::EventStore;

/// 执行一个非服务器子命令
pub fn run_cli(command: &Command, config: &StaticConfig) -> Result<()> {
    let store = Arc::new(EventStore::from_config(&config.store));

    match command {
        Command::Serve => Ok(()),
        Command::Templates => commands::templates(store),
        Command::Daily { template } => commands::daily(store, template.as_deref()),
        Command::Detail { template_id } => commands::detail(store, template_id),
        Command::Accounts { template } => commands::accounts(store, template.as_deref()),
        Command::Ctr {
            template_id,
            impressions,
        } => commands::ctr(store, template_id, impressions),
        Command::ConfigGen { path } => commands::config_gen(path),
    }
}
