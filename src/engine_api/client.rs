use crate::engine_api::Error;
use async_trait::async_trait;
use std::time::Duration;

/// The transport that carries a single JSON-RPC call to the execution engine.
///
/// Method implementations are bound to a client when the catalog is built. Retries, if any,
/// belong to the client.
#[async_trait]
pub trait ExecutionEngineClient: Send + Sync {
    /// Sends `method` with positional `params` and returns the raw `result` member.
    async fn rpc_request(
        &self,
        method: &str,
        params: serde_json::Value,
        timeout: Duration,
    ) -> Result<serde_json::Value, Error>;
}
