//! HTML dashboard
//!
//! Every dynamic value goes through `escape_html` before it is interpolated.

use std::fmt::Write as _;

use actix_web::{HttpResponse, web};

use super::{error_response, run_blocking};
use crate::analytics::{Aggregator, ClickDetail, DailyCount, DashboardSummary, TemplateCount};
use crate::errors::Result;
use crate::storage::format_timestamp;
use crate::utils::escape_html;

pub struct DashboardService;

impl DashboardService {
    pub async fn index(aggregator: web::Data<Aggregator>) -> HttpResponse {
        let aggregator = aggregator.into_inner();
        let result = run_blocking(move || -> Result<_> {
            Ok((aggregator.summary()?, aggregator.by_template()?))
        })
        .await;

        match result {
            Ok((summary, templates)) => html(render_index(&summary, &templates)),
            Err(e) => error_response(&e),
        }
    }

    pub async fn template_detail(
        path: web::Path<String>,
        aggregator: web::Data<Aggregator>,
    ) -> HttpResponse {
        let template_id = path.into_inner();
        let aggregator = aggregator.into_inner();
        let id = template_id.clone();
        let result = run_blocking(move || -> Result<_> {
            Ok((
                aggregator.detail_for_template(&id)?,
                aggregator.by_day(Some(&id))?,
            ))
        })
        .await;

        match result {
            Ok((details, daily)) => html(render_detail(&template_id, &details, &daily)),
            Err(e) => error_response(&e),
        }
    }
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n<h1>{}</h1>\n{}</body></html>\n",
        escape_html(title),
        escape_html(title),
        body
    )
}

fn format_optional(ts: Option<chrono::DateTime<chrono::Utc>>) -> String {
    ts.map(|t| format_timestamp(&t)).unwrap_or_else(|| "-".to_string())
}

pub(crate) fn render_index(summary: &DashboardSummary, templates: &[TemplateCount]) -> String {
    let mut body = String::new();
    let _ = writeln!(
        body,
        "<p>Total clicks: {} &middot; Templates: {} &middot; Accounts: {}</p>",
        summary.total_clicks, summary.templates, summary.accounts
    );
    let _ = writeln!(
        body,
        "<p>First click: {} &middot; Last click: {}</p>",
        format_optional(summary.first_click),
        format_optional(summary.last_click)
    );
    if summary.skipped_records > 0 {
        let _ = writeln!(
            body,
            "<p>{} malformed records were skipped.</p>",
            summary.skipped_records
        );
    }

    if templates.is_empty() {
        body.push_str("<p>No clicks recorded yet.</p>\n");
        return page("Click Dashboard", &body);
    }

    body.push_str("<table>\n<tr><th>Template</th><th>Clicks</th></tr>\n");
    for row in templates {
        let _ = writeln!(
            body,
            "<tr><td><a href=\"/dashboard/{}\">{}</a></td><td>{}</td></tr>",
            escape_html(&urlencoding::encode(&row.template_id)),
            escape_html(&row.template_id),
            row.clicks
        );
    }
    body.push_str("</table>\n");
    page("Click Dashboard", &body)
}

pub(crate) fn render_detail(
    template_id: &str,
    details: &[ClickDetail],
    daily: &[DailyCount],
) -> String {
    let title = format!("Template {}", template_id);
    let mut body = String::from("<p><a href=\"/dashboard\">Back to dashboard</a></p>\n");

    if details.is_empty() {
        let _ = writeln!(
            body,
            "<p>No clicks recorded for template {}.</p>",
            escape_html(template_id)
        );
        return page(&title, &body);
    }

    let _ = writeln!(body, "<p>Total clicks: {}</p>", details.len());

    body.push_str("<h2>Clicks per day</h2>\n<table>\n<tr><th>Date</th><th>Clicks</th></tr>\n");
    for day in daily {
        let _ = writeln!(body, "<tr><td>{}</td><td>{}</td></tr>", day.date, day.count);
    }
    body.push_str("</table>\n");

    body.push_str("<h2>Clicks</h2>\n<table>\n<tr><th>Timestamp</th><th>Account</th></tr>\n");
    for click in details {
        let _ = writeln!(
            body,
            "<tr><td>{}</td><td>{}</td></tr>",
            format_timestamp(&click.timestamp),
            escape_html(click.account_id.as_deref().unwrap_or("-"))
        );
    }
    body.push_str("</table>\n");
    page(&title, &body)
}
