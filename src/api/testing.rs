//! In-memory transport for exercising the client without a server.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::HttpTransport;
use crate::error::ClientError;
use crate::upload::UploadCandidate;

/// A request the transport has served, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Get(String),
    Post(String, Value),
    File { path: String, field: String, file_name: String, bytes: usize },
}

/// Answers each call with the next scripted reply.
///
/// Running out of replies is reported as a decode error so a test that
/// over-polls fails loudly instead of hanging.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<Value, ClientError>>>,
    landing: Mutex<Option<String>>,
    requests: Mutex<Vec<Recorded>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Value>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(Ok).collect()),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        let transport = Self::default();
        transport.push_error();
        transport
    }

    pub fn push_error(&self) {
        let err = serde_json::from_str::<Value>("<html>502 Bad Gateway</html>").unwrap_err();
        self.replies.lock().unwrap().push_back(Err(err.into()));
    }

    pub fn landing_on(path: &str) -> Self {
        let transport = Self::default();
        *transport.landing.lock().unwrap() = Some(path.to_string());
        transport
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    fn next_reply(&self) -> Result<Value, ClientError> {
        self.replies.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(serde_json::from_str::<Value>("").unwrap_err().into())
        })
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get_json(&self, path: &str) -> Result<Value, ClientError> {
        self.requests.lock().unwrap().push(Recorded::Get(path.to_string()));
        self.next_reply()
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        self.requests
            .lock()
            .unwrap()
            .push(Recorded::Post(path.to_string(), body.clone()));
        self.next_reply()
    }

    async fn post_file(
        &self,
        path: &str,
        field: &str,
        file: &UploadCandidate,
        contents: Vec<u8>,
    ) -> Result<String, ClientError> {
        self.requests.lock().unwrap().push(Recorded::File {
            path: path.to_string(),
            field: field.to_string(),
            file_name: file.file_name.clone(),
            bytes: contents.len(),
        });
        match self.landing.lock().unwrap().clone() {
            Some(landing) => Ok(landing),
            None => self.next_reply().map(|_| path.to_string()),
        }
    }
}
