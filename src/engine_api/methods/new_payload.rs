use super::{EngineApiMethod, EngineJsonRpcMethod, JsonRpcRequestParams, ResponseType};
use crate::engine_api::execution_payload::{
    ExecutionPayload, ExecutionPayloadV1, ExecutionPayloadV3,
};
use crate::engine_api::http::{
    ENGINE_NEW_PAYLOAD_TIMEOUT, ENGINE_NEW_PAYLOAD_V1, ENGINE_NEW_PAYLOAD_V2,
    ENGINE_NEW_PAYLOAD_V3,
};
use crate::engine_api::json_structures::PayloadStatusV1;
use crate::engine_api::Error;
use async_trait::async_trait;
use ethereum_types::H256;
use serde_json::{json, Value};

bound_method!(
    /// `engine_newPayloadV1`: a Bellatrix payload.
    EngineNewPayloadV1
);

bound_method!(
    /// `engine_newPayloadV2`: a Bellatrix or Capella payload.
    EngineNewPayloadV2
);

bound_method!(
    /// `engine_newPayloadV3`: a Deneb payload with its blob versioned hashes and the parent
    /// beacon block root.
    EngineNewPayloadV3
);

#[async_trait]
impl EngineJsonRpcMethod for EngineNewPayloadV1 {
    fn method(&self) -> EngineApiMethod {
        EngineApiMethod::EngineNewPayload
    }

    fn version(&self) -> u8 {
        1
    }

    fn response_type(&self) -> ResponseType {
        ResponseType::of::<PayloadStatusV1>()
    }

    async fn execute(&self, params: &JsonRpcRequestParams) -> Result<Value, Error> {
        let execution_payload: ExecutionPayloadV1 = params.required(0)?;

        self.client
            .rpc_request(
                ENGINE_NEW_PAYLOAD_V1,
                json!([execution_payload]),
                ENGINE_NEW_PAYLOAD_TIMEOUT,
            )
            .await
    }
}

#[async_trait]
impl EngineJsonRpcMethod for EngineNewPayloadV2 {
    fn method(&self) -> EngineApiMethod {
        EngineApiMethod::EngineNewPayload
    }

    fn version(&self) -> u8 {
        2
    }

    fn response_type(&self) -> ResponseType {
        ResponseType::of::<PayloadStatusV1>()
    }

    async fn execute(&self, params: &JsonRpcRequestParams) -> Result<Value, Error> {
        let execution_payload: ExecutionPayload = params.required(0)?;
        if let ExecutionPayload::V3(_) = execution_payload {
            return Err(Error::IncorrectPayloadVersion);
        }

        self.client
            .rpc_request(
                ENGINE_NEW_PAYLOAD_V2,
                json!([execution_payload]),
                ENGINE_NEW_PAYLOAD_TIMEOUT,
            )
            .await
    }
}

#[async_trait]
impl EngineJsonRpcMethod for EngineNewPayloadV3 {
    fn method(&self) -> EngineApiMethod {
        EngineApiMethod::EngineNewPayload
    }

    fn version(&self) -> u8 {
        3
    }

    fn response_type(&self) -> ResponseType {
        ResponseType::of::<PayloadStatusV1>()
    }

    async fn execute(&self, params: &JsonRpcRequestParams) -> Result<Value, Error> {
        let execution_payload: ExecutionPayloadV3 = params.required(0)?;
        let versioned_hashes: Vec<H256> = params.required(1)?;
        let parent_beacon_block_root: H256 = params.required(2)?;

        self.client
            .rpc_request(
                ENGINE_NEW_PAYLOAD_V3,
                json!([execution_payload, versioned_hashes, parent_beacon_block_root]),
                ENGINE_NEW_PAYLOAD_TIMEOUT,
            )
            .await
    }
}
