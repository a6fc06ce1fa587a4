//! Recipient ingestion: address validation, manual entry normalization, and
//! extraction from CSV and spreadsheet uploads.

pub mod address;
pub mod error;
pub mod normalize;
pub mod tabular;

pub use address::{AddressSet, EmailAddress, recognize_embedded};
pub use error::{RecipientError, RecipientResult};
pub use normalize::{Validation, normalize_manual_entry, split_manual_entry, validate_exact};
pub use tabular::{SourceFormat, TabularRecord, extract_addresses};
