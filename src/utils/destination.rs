//! Redirect destination checks

use url::Url;

use crate::errors::{Result, SmartlinkerError};

/// Schemes that must never be used as a redirect target
const BLOCKED_SCHEMES: &[&str] = &["javascript", "data", "file", "vbscript", "about", "blob"];

/// 校验重定向目标：必须是 http(s) 绝对 URL
pub fn validate_destination(dest: &str) -> Result<()> {
    let dest = dest.trim();
    if dest.is_empty() {
        return Err(SmartlinkerError::validation("Missing 'dest' parameter"));
    }

    let url = Url::parse(dest).map_err(|e| {
        SmartlinkerError::validation(format!("Invalid destination URL '{}': {}", dest, e))
    })?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme if BLOCKED_SCHEMES.contains(&scheme) => Err(SmartlinkerError::validation(format!(
            "Destination scheme '{}:' is not allowed",
            scheme
        ))),
        scheme => Err(SmartlinkerError::validation(format!(
            "Destination must use http:// or https://, got '{}:'",
            scheme
        ))),
    }
}
