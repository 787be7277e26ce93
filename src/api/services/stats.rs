use actix_web::{HttpResponse, web};
use serde::Deserialize;

use super::{error_response, non_blank, run_blocking};
use crate::analytics::{Aggregator, CtrCalculator, parse_impressions};

#[derive(Debug, Deserialize)]
pub struct CtrQuery {
    pub template_id: Option<String>,
    pub impressions: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TemplateFilter {
    pub template_id: Option<String>,
}

/// JSON 统计接口
pub struct StatsService;

impl StatsService {
    pub async fn ctr(query: web::Query<CtrQuery>, ctr: web::Data<CtrCalculator>) -> HttpResponse {
        let CtrQuery {
            template_id,
            impressions,
        } = query.into_inner();

        let impressions = match parse_impressions(impressions.as_deref()) {
            Ok(n) => n,
            Err(e) => return error_response(&e),
        };
        let template_id = template_id.unwrap_or_default();

        let ctr = ctr.into_inner();
        match run_blocking(move || ctr.compute_ctr(&template_id, impressions)).await {
            Ok(report) => HttpResponse::Ok().json(report),
            Err(e) => error_response(&e),
        }
    }

    pub async fn templates(aggregator: web::Data<Aggregator>) -> HttpResponse {
        let aggregator = aggregator.into_inner();
        match run_blocking(move || aggregator.by_template()).await {
            Ok(rows) => HttpResponse::Ok().json(rows),
            Err(e) => error_response(&e),
        }
    }

    pub async fn daily(
        query: web::Query<TemplateFilter>,
        aggregator: web::Data<Aggregator>,
    ) -> HttpResponse {
        let template_id = non_blank(query.into_inner().template_id);
        let aggregator = aggregator.into_inner();
        match run_blocking(move || aggregator.by_day(template_id.as_deref())).await {
            Ok(rows) => HttpResponse::Ok().json(rows),
            Err(e) => error_response(&e),
        }
    }

    pub async fn accounts(
        query: web::Query<TemplateFilter>,
        aggregator: web::Data<Aggregator>,
    ) -> HttpResponse {
        let template_id = non_blank(query.into_inner().template_id);
        let aggregator = aggregator.into_inner();
        match run_blocking(move || aggregator.by_account(template_id.as_deref())).await {
            Ok(rows) => HttpResponse::Ok().json(rows),
            Err(e) => error_response(&e),
        }
    }

    pub async fn summary(aggregator: web::Data<Aggregator>) -> HttpResponse {
        let aggregator = aggregator.into_inner();
        match run_blocking(move || aggregator.summary()).await {
            Ok(summary) => HttpResponse::Ok().json(summary),
            Err(e) => error_response(&e),
        }
    }
}
