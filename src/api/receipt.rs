use super::HttpTransport;
use crate::error::ClientError;
use crate::upload::UploadCandidate;

const UPLOAD_PATH: &str = "/upload";
const RECEIPT_FIELD: &str = "receipt";

/// Upload an accepted receipt and return the id of the OCR job it queued.
///
/// The server redirects to `/processing/{job_id}`, or straight to
/// `/ocr/{job_id}` when the job is already done.
pub async fn upload_receipt(
    transport: &dyn HttpTransport,
    candidate: &UploadCandidate,
) -> Result<String, ClientError> {
    let contents = tokio::fs::read(&candidate.path).await?;
    tracing::info!(
        file = %candidate.file_name,
        mime = %candidate.mime_type,
        bytes = contents.len(),
        "Uploading receipt"
    );

    let landed = transport
        .post_file(UPLOAD_PATH, RECEIPT_FIELD, candidate, contents)
        .await?;

    match job_id_from_path(&landed) {
        Some(job_id) => {
            tracing::info!(%job_id, "Receipt queued for OCR");
            Ok(job_id)
        }
        None => Err(ClientError::MissingJobId(landed)),
    }
}

/// Pull the job id out of a `/processing/{id}` or `/ocr/{id}` path.
pub fn job_id_from_path(path: &str) -> Option<String> {
    ["/processing/", "/ocr/"].iter().find_map(|marker| {
        let start = path.find(marker)? + marker.len();
        let id = path[start..].split('/').next()?;
        (!id.is_empty()).then(|| id.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{Recorded, ScriptedTransport};
    use assert_matches::assert_matches;
    use std::path::PathBuf;

    fn temp_receipt(name: &str, bytes: &[u8]) -> UploadCandidate {
        let path: PathBuf = std::env::temp_dir().join(name);
        std::fs::write(&path, bytes).unwrap();
        UploadCandidate::from_path(&path).unwrap()
    }

    #[test]
    fn job_id_from_processing_redirect() {
        assert_eq!(
            job_id_from_path("/processing/0b9e6a3c-77d1"),
            Some("0b9e6a3c-77d1".into())
        );
    }

    #[test]
    fn job_id_from_ocr_redirect_under_prefix() {
        assert_eq!(
            job_id_from_path("/receipts/ocr/abc123/"),
            Some("abc123".into())
        );
    }

    #[test]
    fn no_job_id_on_index() {
        assert_eq!(job_id_from_path("/"), None);
        assert_eq!(job_id_from_path("/processing/"), None);
    }

    #[tokio::test]
    async fn upload_posts_receipt_field() {
        let candidate = temp_receipt("receipt_uploader_upload_test.png", b"\x89PNG....");
        let transport = ScriptedTransport::landing_on("/processing/job-77");

        let job_id = upload_receipt(&transport, &candidate).await.unwrap();

        assert_eq!(job_id, "job-77");
        assert_eq!(
            transport.requests(),
            vec![Recorded::File {
                path: "/upload".into(),
                field: "receipt".into(),
                file_name: "receipt_uploader_upload_test.png".into(),
                bytes: 8,
            }]
        );
    }

    #[tokio::test]
    async fn upload_landing_on_index_is_an_error() {
        let candidate = temp_receipt("receipt_uploader_index_test.pdf", b"%PDF-1.4");
        let transport = ScriptedTransport::landing_on("/");

        let result = upload_receipt(&transport, &candidate).await;

        assert_matches!(result, Err(ClientError::MissingJobId(path)) if path == "/");
    }
}
