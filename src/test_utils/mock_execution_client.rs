use crate::engine_api::client::ExecutionEngineClient;
use crate::engine_api::http::METHOD_NOT_FOUND_CODE;
use crate::engine_api::Error;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    pub params: Value,
    pub timeout: Duration,
}

#[derive(Clone)]
enum Reply {
    Result(Value),
    Error { code: i64, message: String },
}

/// An `ExecutionEngineClient` that answers from canned replies and records every request.
///
/// Methods without a canned reply fail the way execution engines report unknown methods.
#[derive(Default)]
pub struct MockExecutionClient {
    replies: RwLock<HashMap<String, Reply>>,
    requests: RwLock<Vec<RecordedRequest>>,
}

impl MockExecutionClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, method: &str, result: Value) -> Self {
        self.set_response(method, result);
        self
    }

    pub fn with_error(self, method: &str, code: i64, message: &str) -> Self {
        self.replies.write().insert(
            method.to_string(),
            Reply::Error {
                code,
                message: message.to_string(),
            },
        );
        self
    }

    pub fn set_response(&self, method: &str, result: Value) {
        self.replies
            .write()
            .insert(method.to_string(), Reply::Result(result));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.read().clone()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.read().last().cloned()
    }

    pub fn request_count(&self) -> usize {
        self.requests.read().len()
    }

    /// Wire names of every request sent so far, in order.
    pub fn methods_called(&self) -> Vec<String> {
        self.requests
            .read()
            .iter()
            .map(|request| request.method.clone())
            .collect()
    }
}

#[async_trait]
impl ExecutionEngineClient for MockExecutionClient {
    async fn rpc_request(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value, Error> {
        self.requests.write().push(RecordedRequest {
            method: method.to_string(),
            params,
            timeout,
        });

        let reply = self.replies.read().get(method).cloned();
        match reply {
            Some(Reply::Result(result)) => Ok(result),
            Some(Reply::Error { code, message }) => Err(Error::ServerMessage { code, message }),
            None => Err(Error::ServerMessage {
                code: METHOD_NOT_FOUND_CODE,
                message: format!("the method {} does not exist/is not available", method),
            }),
        }
    }
}
