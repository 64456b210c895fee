use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ClientError;
use crate::upload::UploadCandidate;

/// The HTTP operations the client needs from the receipt server.
///
/// Paths are server-relative (`/job-status/abc`); implementations own the
/// base URL. Bodies are decoded as JSON whatever the status code, because
/// the server reports validation problems as `400 {"error": ...}`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get_json(&self, path: &str) -> Result<Value, ClientError>;

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ClientError>;

    /// Send `contents` as a multipart form field and follow the redirect
    /// the server answers with. Returns the path of the page landed on.
    async fn post_file(
        &self,
        path: &str,
        field: &str,
        file: &UploadCandidate,
        contents: Vec<u8>,
    ) -> Result<String, ClientError>;
}

/// [`HttpTransport`] backed by a pooled [`reqwest::Client`].
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode(response: reqwest::Response) -> Result<Value, ClientError> {
        let status = response.status();
        let url = response.url().to_string();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "Server answered with non-success status");
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_json(&self, path: &str) -> Result<Value, ClientError> {
        tracing::debug!(path, "GET");
        let response = self.client.get(self.url(path)).send().await?;
        Self::decode(response).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        tracing::debug!(path, "POST");
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn post_file(
        &self,
        path: &str,
        field: &str,
        file: &UploadCandidate,
        contents: Vec<u8>,
    ) -> Result<String, ClientError> {
        tracing::debug!(path, file = %file.file_name, bytes = contents.len(), "POST multipart");
        let part = reqwest::multipart::Part::bytes(contents)
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)?;
        let form = reqwest::multipart::Form::new().part(field.to_string(), part);

        let response = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.url().path().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answer one connection per canned response and hand back the raw
    /// requests, lowercased.
    async fn serve(responses: Vec<String>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                requests.push(read_request(&mut socket).await);
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
            requests
        });

        (base_url, handle)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf).to_lowercase();
            if let Some(end) = text.find("\r\n\r\n") {
                if text[..end].contains("transfer-encoding: chunked") {
                    if text.ends_with("\r\n0\r\n\r\n") {
                        break;
                    }
                    continue;
                }
                let length = text[..end]
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_lowercase()
    }

    fn response(status: &str, extra_headers: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\n{}content-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            extra_headers,
            body.len(),
            body
        )
    }

    fn transport(base_url: &str) -> ReqwestTransport {
        ReqwestTransport::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let transport = ReqwestTransport::with_client(reqwest::Client::new(), "http://host:8080/");
        assert_eq!(transport.base_url(), "http://host:8080");
        assert_eq!(transport.url("/job-status/7"), "http://host:8080/job-status/7");
    }

    #[tokio::test]
    async fn post_json_sends_json_and_decodes_error_status() {
        let (base_url, server) = serve(vec![response(
            "400 Bad Request",
            "content-type: application/json\r\n",
            r#"{"error":"duplicate"}"#,
        )])
        .await;

        let body = transport(&base_url)
            .post_json("/create-product", &json!({"name": "Milk"}))
            .await
            .unwrap();

        assert_eq!(body, json!({"error": "duplicate"}));
        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("post /create-product http/1.1"));
        assert!(requests[0].contains("content-type: application/json"));
        assert!(requests[0].ends_with(r#"{"name":"milk"}"#));
    }

    #[tokio::test]
    async fn get_json_rejects_html() {
        let (base_url, server) = serve(vec![response(
            "200 OK",
            "content-type: text/html\r\n",
            "<html>oops</html>",
        )])
        .await;

        let result = transport(&base_url).get_json("/job-status/abc").await;

        assert!(matches!(result, Err(ClientError::Decode(_))));
        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("get /job-status/abc http/1.1"));
    }

    #[tokio::test]
    async fn post_file_sends_receipt_part_and_follows_redirect() {
        let (base_url, server) = serve(vec![
            response("302 Found", "location: /processing/job-9\r\n", ""),
            response("200 OK", "content-type: text/html\r\n", "<html>processing</html>"),
        ])
        .await;
        let file = UploadCandidate::new("/tmp/r.png", "image/png", 4);

        let landed = transport(&base_url)
            .post_file("/upload", "receipt", &file, b"\x89PNG".to_vec())
            .await
            .unwrap();

        assert_eq!(landed, "/processing/job-9");
        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("post /upload http/1.1"));
        assert!(requests[0].contains("content-type: multipart/form-data; boundary="));
        assert!(requests[0].contains(r#"name="receipt"; filename="r.png""#));
        assert!(requests[0].contains("content-type: image/png"));
        assert!(requests[1].starts_with("get /processing/job-9 http/1.1"));
    }

    #[tokio::test]
    async fn post_file_error_status_is_an_error() {
        let (base_url, _server) = serve(vec![response(
            "413 Payload Too Large",
            "",
            "",
        )])
        .await;
        let file = UploadCandidate::new("/tmp/big.pdf", "application/pdf", 4);

        let result = transport(&base_url)
            .post_file("/upload", "receipt", &file, b"%PDF".to_vec())
            .await;

        assert!(matches!(result, Err(ClientError::Request(_))));
    }
}
