use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;
use crate::errors::Result;

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// Get the global configuration instance
///
/// Falls back to defaults when `init_config` was never called, so library
/// consumers that wire components by hand are not forced through it.
pub fn get_config() -> Arc<StaticConfig> {
    CONFIG
        .get_or_init(|| ArcSwap::from_pointee(StaticConfig::default()))
        .load_full()
}

/// Initialize the global configuration
///
/// Loads `path` (or "config.toml") plus `SL__*` environment overrides.
/// A second call replaces the previous configuration.
pub fn init_config(path: Option<&str>) -> Result<Arc<StaticConfig>> {
    let loaded = Arc::new(StaticConfig::load(path)?);
    match CONFIG.get() {
        Some(current) => current.store(loaded.clone()),
        None => {
            let _ = CONFIG.set(ArcSwap::new(loaded.clone()));
        }
    }
    Ok(get_config())
}
