//! Checks a picked receipt before it may be submitted.

use super::{FileInput, UploadCandidate};
use crate::page::Page;

/// Largest receipt the form accepts (10 MiB).
pub const MAX_RECEIPT_BYTES: u64 = 10 * 1024 * 1024;

pub const ALLOWED_MIME_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "application/pdf"];

/// Why a picked file was refused. `Display` is the text shown to the user.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    #[error("Invalid file type. Please upload an image (JPEG, PNG, GIF) or PDF file.")]
    UnsupportedType(String),

    #[error("File is too large. Maximum file size is 10MB.")]
    TooLarge(u64),
}

/// Type first, then size.
pub fn check_candidate(candidate: &UploadCandidate) -> Result<(), Rejection> {
    if !ALLOWED_MIME_TYPES.contains(&candidate.mime_type.as_str()) {
        return Err(Rejection::UnsupportedType(candidate.mime_type.clone()));
    }
    if candidate.size_bytes > MAX_RECEIPT_BYTES {
        return Err(Rejection::TooLarge(candidate.size_bytes));
    }
    Ok(())
}

/// Validate the first file in `input` against the page.
///
/// A rejected file is cleared from the input and the user is alerted. An
/// accepted file enables the page's submit button, if it has one. Returns
/// `false` when nothing is selected.
pub fn validate_file_input(input: &mut FileInput, page: &mut dyn Page) -> bool {
    let Some(candidate) = input.first() else {
        return false;
    };

    if let Err(rejection) = check_candidate(candidate) {
        tracing::info!(file = %candidate.file_name, reason = ?rejection, "Receipt rejected");
        page.alert(&rejection.to_string());
        input.clear();
        return false;
    }

    tracing::debug!(file = %candidate.file_name, size = candidate.size_bytes, "Receipt accepted");
    if let Some(button) = page.submit_button() {
        button.disabled = false;
    }
    true
}
