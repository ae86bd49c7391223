use super::{EngineApiMethod, EngineJsonRpcMethod, JsonRpcRequestParams, ResponseType};
use crate::engine_api::http::{
    ETH_GET_BLOCK_BY_HASH, ETH_GET_BLOCK_BY_HASH_TIMEOUT, ETH_GET_BLOCK_BY_NUMBER,
    ETH_GET_BLOCK_BY_NUMBER_TIMEOUT, RETURN_FULL_TRANSACTION_OBJECTS,
};
use crate::engine_api::json_structures::{BlockByNumberQuery, ExecutionBlock, ExecutionBlockHash};
use crate::engine_api::Error;
use async_trait::async_trait;
use serde_json::{json, Value};

bound_method!(EthGetBlockByHash);
bound_method!(EthGetBlockByNumber);

#[async_trait]
impl EngineJsonRpcMethod for EthGetBlockByHash {
    fn method(&self) -> EngineApiMethod {
        EngineApiMethod::EthGetBlockByHash
    }

    fn version(&self) -> u8 {
        0
    }

    fn response_type(&self) -> ResponseType {
        ResponseType::of::<Option<ExecutionBlock>>()
    }

    async fn execute(&self, params: &JsonRpcRequestParams) -> Result<Value, Error> {
        let block_hash: ExecutionBlockHash = params.required(0)?;

        self.client
            .rpc_request(
                ETH_GET_BLOCK_BY_HASH,
                json!([block_hash, RETURN_FULL_TRANSACTION_OBJECTS]),
                ETH_GET_BLOCK_BY_HASH_TIMEOUT,
            )
            .await
    }
}

#[async_trait]
impl EngineJsonRpcMethod for EthGetBlockByNumber {
    fn method(&self) -> EngineApiMethod {
        EngineApiMethod::EthGetBlockByNumber
    }

    fn version(&self) -> u8 {
        0
    }

    fn response_type(&self) -> ResponseType {
        ResponseType::of::<Option<ExecutionBlock>>()
    }

    async fn execute(&self, params: &JsonRpcRequestParams) -> Result<Value, Error> {
        let query: BlockByNumberQuery = params.required(0)?;

        self.client
            .rpc_request(
                ETH_GET_BLOCK_BY_NUMBER,
                json!([query, RETURN_FULL_TRANSACTION_OBJECTS]),
                ETH_GET_BLOCK_BY_NUMBER_TIMEOUT,
            )
            .await
    }
}
