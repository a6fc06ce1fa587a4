use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder};
use rocket::{Request, Response};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::Responses;
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::response::OpenApiResponderInner;
use rocket_okapi::util::add_schema_response;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use crate::mailer::MailerError;
use crate::recipients::RecipientError;

#[derive(Debug)]
pub enum ApiError {
    Recipients(RecipientError),
    Mailer(MailerError),
    BadRequest(String),
    InternalError(String),
    /// Rejected by request parsing with the framework's own status.
    Rejected(Status),
}

/// JSON body returned for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// Machine-readable error kind.
    pub error: String,
    /// Human-readable description.
    pub message: String,
    /// Rejected addresses, present only for invalid-address errors.
    #[serde(
        rename = "invalidEmails",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub invalid_emails: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            message: message.into(),
            invalid_emails: None,
        }
    }
}

impl ErrorResponse {
    /// Body for a framework-level rejection, keyed by the status reason.
    pub fn for_status(status: Status) -> Self {
        let message = match status.code {
            400 => "Malformed request".to_string(),
            404 => "Resource not found".to_string(),
            413 => "Uploaded payload is too large".to_string(),
            422 => "Request body could not be parsed".to_string(),
            _ => status.reason_lossy().to_string(),
        };
        Self::new(status.reason_lossy().replace(' ', ""), message)
    }
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::Recipients(err) => err.status(),
            ApiError::Mailer(err) => err.status(),
            ApiError::BadRequest(_) => Status::BadRequest,
            ApiError::InternalError(_) => Status::InternalServerError,
            ApiError::Rejected(status) => *status,
        }
    }

    fn into_body(self) -> ErrorResponse {
        match self {
            ApiError::Recipients(err) => ErrorResponse::new(err.kind(), err.to_string()),
            ApiError::Mailer(err) => {
                let mut body = ErrorResponse::new(err.kind(), err.to_string());
                if let MailerError::InvalidAddresses(invalid) = err {
                    body.invalid_emails = Some(invalid);
                }
                body
            }
            ApiError::BadRequest(msg) => ErrorResponse::new("BadRequest", msg),
            ApiError::InternalError(msg) => ErrorResponse::new("InternalError", msg),
            ApiError::Rejected(status) => ErrorResponse::for_status(status),
        }
    }

    fn log(&self) {
        match self {
            ApiError::Recipients(err @ RecipientError::Parse { .. }) => {
                log::error!("extraction failed: {}", err);
            }
            ApiError::Recipients(err) => log::debug!("rejected upload: {}", err),
            ApiError::Mailer(MailerError::TransportUnavailable { detail }) => {
                log::error!("SMTP server unavailable: {}", detail);
            }
            ApiError::Mailer(
                err @ (MailerError::MisconfiguredCredentials(_)
                | MailerError::MisconfiguredSender { .. }),
            ) => {
                log::error!("{}", err);
            }
            ApiError::Mailer(err) => log::debug!("rejected dispatch: {}", err),
            ApiError::BadRequest(msg) => log::debug!("bad request: {}", msg),
            ApiError::InternalError(msg) => log::error!("internal error: {}", msg),
            ApiError::Rejected(status) => log::debug!("request rejected with {}", status.code),
        }
    }
}

/// Serialize `body` and attach it to a response with `status`.
pub(crate) fn json_response<T: Serialize>(
    status: Status,
    body: &T,
) -> response::Result<'static> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| {
        r#"{"success":false,"error":"SerializationError","message":"Failed to serialize response"}"#
            .to_string()
    });

    Response::build()
        .status(status)
        .header(ContentType::JSON)
        .sized_body(json.len(), Cursor::new(json))
        .ok()
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        self.log();
        let status = self.status();
        json_response(status, &self.into_body())
    }
}

impl OpenApiResponderInner for ApiError {
    fn responses(generator: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        let mut responses = Responses::default();
        let schema = generator.json_schema::<ErrorResponse>();
        add_schema_response(&mut responses, 400, "application/json", schema.clone())?;
        add_schema_response(&mut responses, 500, "application/json", schema)?;
        Ok(responses)
    }
}

impl From<RecipientError> for ApiError {
    fn from(err: RecipientError) -> Self {
        ApiError::Recipients(err)
    }
}

impl From<MailerError> for ApiError {
    fn from(err: MailerError) -> Self {
        ApiError::Mailer(err)
    }
}
