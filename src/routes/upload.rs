//! Recipient extraction from uploaded CSV and spreadsheet files.

use rocket::form::error::ErrorKind;
use rocket::form::{self, Form};
use rocket::fs::TempFile;
use rocket::serde::json::Json;
use rocket::{FromForm, post};
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;

use crate::error::ApiError;
use crate::recipients::extract_addresses;

/// Multipart form carrying the uploaded file.
#[derive(FromForm)]
pub struct UploadForm<'r> {
    /// A missing field is a 400; other field errors keep their own status.
    pub file: form::Result<'r, TempFile<'r>>,
}

/// Addresses found in an uploaded file.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ExtractResponse {
    pub success: bool,
    pub message: String,
    /// Unique addresses in first-seen order.
    pub emails: Vec<String>,
}

/// Original client-side file name, unsanitized, used only to pick a parser.
fn client_file_name(file: &TempFile<'_>) -> String {
    file.raw_name()
        .map(|name| name.dangerous_unsafe_unsanitized_raw().as_str().to_string())
        .unwrap_or_default()
}

async fn read_upload(file: &TempFile<'_>) -> std::io::Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(file.len() as usize);
    let reader = file.open().await?;
    tokio::pin!(reader);
    reader.read_to_end(&mut bytes).await?;
    Ok(bytes)
}

/// Extract every email address contained in an uploaded `.csv`, `.xlsx` or
/// `.xls` file.
#[openapi(skip)]
#[post("/upload", data = "<form>")]
pub async fn upload(form: Form<UploadForm<'_>>) -> Result<Json<ExtractResponse>, ApiError> {
    let file = match form.into_inner().file {
        Ok(file) => file,
        Err(errors) if errors.iter().all(|e| matches!(e.kind, ErrorKind::Missing)) => {
            return Err(ApiError::BadRequest("No file uploaded".to_string()));
        }
        Err(errors) => {
            log::debug!("upload field rejected: {}", errors);
            return Err(ApiError::Rejected(errors.status()));
        }
    };

    let file_name = client_file_name(&file);
    let bytes = read_upload(&file)
        .await
        .map_err(|e| ApiError::InternalError(format!("Failed to read uploaded file: {e}")))?;

    log::debug!("received upload '{}' ({} bytes)", file_name, bytes.len());

    let addresses = tokio::task::spawn_blocking(move || extract_addresses(&bytes, &file_name))
        .await
        .map_err(|e| ApiError::InternalError(format!("Extraction task failed: {e}")))??;

    Ok(Json(ExtractResponse {
        success: true,
        message: format!("Extracted {} email address(es)", addresses.len()),
        emails: addresses.to_strings(),
    }))
}
