//! Lightweight service health endpoint used for readiness checks and tests.

use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;
use serde::{Deserialize, Serialize};

use crate::mailer::BulkDispatcher;

/// Basic response payload describing API health.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
    /// Static status string reporting application readiness.
    pub status: String,
    /// Whether sender credentials are present. Reachability is not probed here.
    #[serde(rename = "transportConfigured")]
    pub transport_configured: bool,
}

/// Health check endpoint reporting readiness and credential presence.
#[openapi(tag = "Health")]
#[get("/health")]
pub fn health_check(dispatcher: &State<BulkDispatcher>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        transport_configured: dispatcher.config().has_credentials(),
    })
}
