use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use tracing::trace;

use super::{error_response, run_blocking};
use crate::analytics::{EventRecorder, TrackedClick};
use crate::config::ApiConfig;
use crate::utils::client_address;

pub struct RedirectService;

impl RedirectService {
    /// 记录点击后 302 跳转到 dest；记录失败时不跳转
    pub async fn handle_redirect(
        req: HttpRequest,
        query: web::Query<TrackedClick>,
        recorder: web::Data<EventRecorder>,
        api: web::Data<ApiConfig>,
    ) -> HttpResponse {
        let click = query
            .into_inner()
            .with_source(client_address(&req, &api.trusted_proxies));
        trace!("Tracked redirect request: {:?}", click);

        let recorder = recorder.into_inner();
        match run_blocking(move || recorder.record(click)).await {
            Ok(dest) => HttpResponse::Found()
                .insert_header((header::LOCATION, dest))
                .insert_header((header::CACHE_CONTROL, "no-store"))
                .finish(),
            Err(e) => error_response(&e),
        }
    }
}
