//! Orchestrator probes.
//!
//! `/health/live` answers as long as the worker threads do. `/health/ready`
//! stays 503 until the server has run migrations, built its services, and
//! bound the listener.

use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::http::header::{CacheControl, CacheDirective};
use actix_web::{HttpResponse, HttpResponseBuilder, get, http::StatusCode, web};

/// Readiness flag shared by the server and the probe handlers.
#[derive(Debug, Default)]
pub struct HealthState {
    accepting: AtomicBool,
}

impl HealthState {
    /// Not ready until [`HealthState::mark_ready`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip readiness on; called once the listener is bound.
    pub fn mark_ready(&self) {
        self.accepting.store(true, Ordering::Release);
    }

    /// Whether startup has finished.
    pub fn is_ready(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }
}

fn uncached(status: StatusCode) -> HttpResponse {
    HttpResponseBuilder::new(status)
        .insert_header(CacheControl(vec![CacheDirective::NoStore]))
        .finish()
}

/// Readiness probe.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Accepting traffic"),
        (status = 503, description = "Still starting up")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    if state.is_ready() {
        uncached(StatusCode::OK)
    } else {
        uncached(StatusCode::SERVICE_UNAVAILABLE)
    }
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    security([]),
    responses((status = 200, description = "Process is serving requests"))
)]
#[get("/health/live")]
pub async fn live() -> HttpResponse {
    uncached(StatusCode::OK)
}
