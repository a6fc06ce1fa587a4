use rocket::http::Status;
use thiserror::Error;

pub type RecipientResult<T> = Result<T, RecipientError>;

/// Errors raised while turning uploaded files or raw tokens into addresses.
#[derive(Debug, Error)]
pub enum RecipientError {
    #[error("Invalid file type '{0}', please upload a CSV or Excel file")]
    UnsupportedFormat(String),
    #[error("Uploaded file is empty")]
    EmptyFile,
    #[error("failed to parse {format} file: {detail}")]
    Parse { format: &'static str, detail: String },
    #[error("invalid email address: {0}")]
    InvalidAddress(String),
}

impl RecipientError {
    pub fn parse(format: &'static str, detail: impl ToString) -> Self {
        RecipientError::Parse {
            format,
            detail: detail.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RecipientError::UnsupportedFormat(_) => "UnsupportedFormat",
            RecipientError::EmptyFile => "EmptyFile",
            RecipientError::Parse { .. } => "ParseError",
            RecipientError::InvalidAddress(_) => "InvalidAddress",
        }
    }

    pub fn status(&self) -> Status {
        match self {
            RecipientError::UnsupportedFormat(_)
            | RecipientError::EmptyFile
            | RecipientError::InvalidAddress(_) => Status::BadRequest,
            RecipientError::Parse { .. } => Status::InternalServerError,
        }
    }
}
