use std::path::{Path, PathBuf};

use crate::error::ClientError;

/// A file the user picked, described the way the upload form sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadCandidate {
    pub path: PathBuf,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

impl UploadCandidate {
    pub fn new(path: impl Into<PathBuf>, mime_type: impl Into<String>, size_bytes: u64) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        Self {
            path,
            file_name,
            mime_type: mime_type.into(),
            size_bytes,
        }
    }

    /// Describe a file on disk; the MIME type comes from its extension.
    pub fn from_path(path: &Path) -> Result<Self, ClientError> {
        let metadata = std::fs::metadata(path)?;
        Ok(Self::new(path, mime_type_for(path), metadata.len()))
    }

    /// Human readable size, e.g. `1.50 MB`.
    pub fn display_size(&self) -> String {
        const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
        let mut size = self.size_bytes as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", self.size_bytes, UNITS[0])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}

fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" | "jpe" | "jfif" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "txt" => "text/plain",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

/// The receipt file-input control: whatever the user last picked.
#[derive(Debug, Clone, Default)]
pub struct FileInput {
    files: Vec<UploadCandidate>,
}

impl FileInput {
    pub fn select(&mut self, files: Vec<UploadCandidate>) {
        self.files = files;
    }

    pub fn first(&self) -> Option<&UploadCandidate> {
        self.files.first()
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
