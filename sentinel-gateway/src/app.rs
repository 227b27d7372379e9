//! Router assembly: a small builder over `axum::Router`, mirroring the
//! request-id + trace-layer defaults of an `AxumApp`, but wired to the
//! fixed concrete handlers in [`crate::handlers`] instead of a generic
//! service-to-REST mapping.

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::handlers::{admin, cases, jobs, stream, upload};
use crate::state::GatewayState;

async fn ensure_request_id(req: Request<Body>, next: Next) -> Response {
    let header_name = HeaderName::from_static("x-request-id");
    let mut req = req;
    let request_id = req
        .headers()
        .get(&header_name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    if req.headers().get(&header_name).is_none() {
        if let Ok(v) = HeaderValue::from_str(&request_id) {
            req.headers_mut().insert(header_name.clone(), v);
        }
    }

    let mut res = next.run(req).await;
    if res.headers().get(&header_name).is_none() {
        if let Ok(v) = HeaderValue::from_str(&request_id) {
            res.headers_mut().insert(header_name, v);
        }
    }
    res
}

pub struct GatewayApp {
    router: Router<()>,
}

impl GatewayApp {
    pub fn new(state: GatewayState) -> Self {
        let router = Router::new()
            .route("/upload", post(upload::upload))
            .route("/jobs", get(jobs::list_jobs))
            .route("/jobs/{job_id}", get(jobs::get_job))
            .route("/jobs/{job_id}/results", get(jobs::get_results))
            .route("/jobs/{job_id}/status/stream", get(stream::stream_status))
            .route("/cases", get(cases::list_cases))
            .route("/cases/{case_name}/jobs", get(cases::case_jobs))
            .route("/admin/dlq/{queue}", get(admin::list_dlq))
            .route("/admin/dlq/{queue}/requeue", post(admin::requeue))
            .with_state(state)
            .layer(middleware::from_fn(ensure_request_id))
            .layer(TraceLayer::new_for_http());

        Self { router }
    }

    pub fn into_router(self) -> Router<()> {
        self.router
    }

    pub async fn listen<A: ToSocketAddrs>(self, addr: A) -> anyhow::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}
