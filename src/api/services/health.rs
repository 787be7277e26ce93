use actix_web::{HttpResponse, web};
use serde::Serialize;
use tracing::{error, trace};

use super::run_blocking;
use crate::storage::EventStore;

// 应用启动时间结构体
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub uptime: u64,
    pub click_log: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health Service
///
/// 只检查点击日志能否打开并读到有效文件头，不做全量扫描。
pub struct HealthService;

impl HealthService {
    pub async fn health_check(
        store: web::Data<EventStore>,
        app_start_time: web::Data<AppStartTime>,
    ) -> HttpResponse {
        trace!("Received health check request");

        let click_log = store.path().display().to_string();
        let store = store.into_inner();
        let readable = run_blocking(move || store.replay().map(|_| ())).await;

        let now = chrono::Utc::now();
        let uptime = (now - app_start_time.start_datetime).num_seconds().max(0) as u64;

        let (status, error) = match readable {
            Ok(()) => ("healthy", None),
            Err(e) => {
                error!("Health check failed: {}", e);
                ("unhealthy", Some(e.message().to_string()))
            }
        };

        let body = HealthResponse {
            status,
            timestamp: now.to_rfc3339(),
            uptime,
            click_log,
            error,
        };

        if body.error.is_none() {
            HttpResponse::Ok().json(body)
        } else {
            HttpResponse::ServiceUnavailable().json(body)
        }
    }
}
