pub mod dashboard;
pub mod health;
pub mod redirect;
pub mod stats;

pub use dashboard::DashboardService;
pub use health::{AppStartTime, HealthService};
pub use redirect::RedirectService;
pub use stats::StatsService;

use actix_web::{HttpResponse, web};
use tracing::error;

use crate::errors::{Result, SmartlinkerError};

/// 在阻塞线程池上执行一次日志读写
pub(crate) async fn run_blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    web::block(task)
        .await
        .map_err(|e| SmartlinkerError::server(format!("Blocking task failed: {}", e)))?
}

/// 校验错误返回 400 及原因；其余错误只记录日志，返回通用 500
pub(crate) fn error_response(err: &SmartlinkerError) -> HttpResponse {
    if err.is_validation() {
        return HttpResponse::BadRequest()
            .content_type("text/plain; charset=utf-8")
            .body(err.message().to_string());
    }

    error!("{}", err.format_simple());
    HttpResponse::InternalServerError()
        .content_type("text/plain; charset=utf-8")
        .body("Internal Server Error")
}

/// 空白的可选过滤参数视为未提供
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
