//! HTTP surface
//!
//! Thin actix-web glue over the analytics components. Blocking log scans run
//! on the blocking thread pool via `web::block`.

pub mod services;

use actix_web::web;

use crate::config::ApiConfig;
use crate::runtime::lifetime::startup::StartupContext;
use services::{AppStartTime, DashboardService, HealthService, RedirectService, StatsService};

/// 注册共享状态与全部路由
pub fn configure(
    context: StartupContext,
    api: ApiConfig,
    started: AppStartTime,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::from(context.recorder))
            .app_data(web::Data::from(context.ctr))
            .app_data(web::Data::from(context.aggregator))
            .app_data(web::Data::from(context.store))
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(started))
            .route("/redirect", web::get().to(RedirectService::handle_redirect))
            .route("/redirect", web::head().to(RedirectService::handle_redirect))
            .route("/ctr", web::get().to(StatsService::ctr))
            .route("/dashboard", web::get().to(DashboardService::index))
            .route(
                "/dashboard/{template_id}",
                web::get().to(DashboardService::template_detail),
            )
            .service(
                web::scope("/api")
                    .route("/templates", web::get().to(StatsService::templates))
                    .route("/daily", web::get().to(StatsService::daily))
                    .route("/accounts", web::get().to(StatsService::accounts))
                    .route("/summary", web::get().to(StatsService::summary)),
            )
            .route("/health", web::get().to(HealthService::health_check))
            .route("/health", web::head().to(HealthService::health_check));
    }
}
