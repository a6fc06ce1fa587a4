//! Bulk dispatch endpoint.

use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::{Request, State, post};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::Responses;
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;
use rocket_okapi::response::OpenApiResponderInner;
use rocket_okapi::util::add_schema_response;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, json_response};
use crate::mailer::{BulkDispatcher, DeliveryOutcome, DeliveryReport, MailerError};
use crate::recipients::split_manual_entry;

/// Compose-once request. Fields are optional on the wire so that absent
/// fields are answered with a 400 rather than a deserialization failure.
#[derive(Debug, Default, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SendRequest {
    /// Recipients separated by commas, semicolons, whitespace or newlines.
    #[serde(default)]
    pub emails: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    /// Plain-text body; line breaks become `<br>` in the HTML part.
    #[serde(default)]
    pub message: Option<String>,
}

/// Dispatch result. Sent with 200 when at least one recipient succeeded and
/// 500 when every recipient failed.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SendResponse {
    pub success: bool,
    pub message: String,
    /// One entry per recipient, in request order.
    pub results: Vec<DeliveryOutcome>,
    #[serde(rename = "successCount")]
    pub success_count: usize,
    #[serde(rename = "failureCount")]
    pub failure_count: usize,
}

impl SendResponse {
    pub fn from_report(report: DeliveryReport) -> Self {
        let success = !report.is_total_failure();
        let message = report.summary();
        let success_count = report.success_count();
        let failure_count = report.failure_count();

        Self {
            success,
            message,
            results: report.into_outcomes(),
            success_count,
            failure_count,
        }
    }

    pub fn status(&self) -> Status {
        if self.success {
            Status::Ok
        } else {
            Status::InternalServerError
        }
    }
}

impl<'r> Responder<'r, 'static> for SendResponse {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        json_response(self.status(), &self)
    }
}

impl OpenApiResponderInner for SendResponse {
    fn responses(generator: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        let mut responses = Responses::default();
        let schema = generator.json_schema::<SendResponse>();
        add_schema_response(&mut responses, 200, "application/json", schema.clone())?;
        add_schema_response(&mut responses, 500, "application/json", schema)?;
        Ok(responses)
    }
}

fn provided(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Send one message to every listed recipient and report each outcome.
#[openapi(tag = "Mail")]
#[post("/send", data = "<request>")]
pub async fn send(
    request: Json<SendRequest>,
    dispatcher: &State<BulkDispatcher>,
) -> Result<SendResponse, ApiError> {
    let SendRequest {
        emails,
        subject,
        message,
    } = request.into_inner();

    let (Some(emails), Some(subject), Some(message)) =
        (provided(emails), provided(subject), provided(message))
    else {
        return Err(MailerError::MissingFields.into());
    };

    let candidates = split_manual_entry(&emails);
    let report = dispatcher.dispatch(&candidates, &subject, &message).await?;
    if report.is_total_failure() {
        let failed: Vec<&str> = report.failures().map(|o| o.address.as_str()).collect();
        log::error!("{}: {}", report.summary(), failed.join(", "));
    }

    Ok(SendResponse::from_report(report))
}
