use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::analytics::{Aggregator, CtrCalculator, EventRecorder};
use crate::config::StaticConfig;
use crate::storage::EventStore;

/// 服务启动上下文：一个 EventStore 实例，注入到所有分析组件
#[derive(Clone)]
pub struct StartupContext {
    pub store: Arc<EventStore>,
    pub recorder: Arc<EventRecorder>,
    pub ctr: Arc<CtrCalculator>,
    pub aggregator: Arc<Aggregator>,
}

/// 初始化点击日志并构建分析组件
pub fn prepare_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let store = Arc::new(EventStore::from_config(&config.store));
    store
        .initialize()
        .with_context(|| format!("Failed to initialize click log {}", config.store.path))?;

    let recorder = EventRecorder::new(store.clone(), config.recorder.clone())
        .context("Failed to create event recorder")?;

    let context = StartupContext {
        recorder: Arc::new(recorder),
        ctr: Arc::new(CtrCalculator::new(store.clone())),
        aggregator: Arc::new(Aggregator::new(store.clone())),
        store,
    };

    info!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );
    Ok(context)
}
