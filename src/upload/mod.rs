mod guard;
mod types;

pub use guard::validate_file_input;
pub use types::{FileInput, UploadCandidate};
