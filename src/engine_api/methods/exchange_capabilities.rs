use super::{EngineApiMethod, EngineJsonRpcMethod, JsonRpcRequestParams, ResponseType};
use crate::engine_api::http::{ENGINE_EXCHANGE_CAPABILITIES, ENGINE_EXCHANGE_CAPABILITIES_TIMEOUT};
use crate::engine_api::Error;
use async_trait::async_trait;
use serde_json::{json, Value};

bound_method!(
    /// Sends the versioned method names the consensus client supports and returns the ones the
    /// execution engine supports.
    EngineExchangeCapabilities
);

#[async_trait]
impl EngineJsonRpcMethod for EngineExchangeCapabilities {
    fn method(&self) -> EngineApiMethod {
        EngineApiMethod::EngineExchangeCapabilities
    }

    fn version(&self) -> u8 {
        0
    }

    fn response_type(&self) -> ResponseType {
        ResponseType::of::<Vec<String>>()
    }

    async fn execute(&self, params: &JsonRpcRequestParams) -> Result<Value, Error> {
        let capabilities: Vec<String> = params.required(0)?;

        self.client
            .rpc_request(
                ENGINE_EXCHANGE_CAPABILITIES,
                json!([capabilities]),
                ENGINE_EXCHANGE_CAPABILITIES_TIMEOUT,
            )
            .await
    }
}
