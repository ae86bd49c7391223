use super::{EngineApiMethod, EngineJsonRpcMethod, JsonRpcRequestParams, ResponseType};
use crate::engine_api::execution_payload::ExecutionPayloadV1;
use crate::engine_api::http::{
    ENGINE_GET_PAYLOAD_TIMEOUT, ENGINE_GET_PAYLOAD_V1, ENGINE_GET_PAYLOAD_V2,
    ENGINE_GET_PAYLOAD_V3,
};
use crate::engine_api::json_structures::{GetPayloadV2Response, GetPayloadV3Response, PayloadId};
use crate::engine_api::Error;
use async_trait::async_trait;
use serde_json::{json, Value};

bound_method!(EngineGetPayloadV1);
bound_method!(EngineGetPayloadV2);
bound_method!(EngineGetPayloadV3);

#[async_trait]
impl EngineJsonRpcMethod for EngineGetPayloadV1 {
    fn method(&self) -> EngineApiMethod {
        EngineApiMethod::EngineGetPayload
    }

    fn version(&self) -> u8 {
        1
    }

    fn response_type(&self) -> ResponseType {
        ResponseType::of::<ExecutionPayloadV1>()
    }

    async fn execute(&self, params: &JsonRpcRequestParams) -> Result<Value, Error> {
        let payload_id: PayloadId = params.required(0)?;

        self.client
            .rpc_request(
                ENGINE_GET_PAYLOAD_V1,
                json!([payload_id]),
                ENGINE_GET_PAYLOAD_TIMEOUT,
            )
            .await
    }
}

#[async_trait]
impl EngineJsonRpcMethod for EngineGetPayloadV2 {
    fn method(&self) -> EngineApiMethod {
        EngineApiMethod::EngineGetPayload
    }

    fn version(&self) -> u8 {
        2
    }

    fn response_type(&self) -> ResponseType {
        ResponseType::of::<GetPayloadV2Response>()
    }

    async fn execute(&self, params: &JsonRpcRequestParams) -> Result<Value, Error> {
        let payload_id: PayloadId = params.required(0)?;

        self.client
            .rpc_request(
                ENGINE_GET_PAYLOAD_V2,
                json!([payload_id]),
                ENGINE_GET_PAYLOAD_TIMEOUT,
            )
            .await
    }
}

#[async_trait]
impl EngineJsonRpcMethod for EngineGetPayloadV3 {
    fn method(&self) -> EngineApiMethod {
        EngineApiMethod::EngineGetPayload
    }

    fn version(&self) -> u8 {
        3
    }

    fn response_type(&self) -> ResponseType {
        ResponseType::of::<GetPayloadV3Response>()
    }

    async fn execute(&self, params: &JsonRpcRequestParams) -> Result<Value, Error> {
        let payload_id: PayloadId = params.required(0)?;

        self.client
            .rpc_request(
                ENGINE_GET_PAYLOAD_V3,
                json!([payload_id]),
                ENGINE_GET_PAYLOAD_TIMEOUT,
            )
            .await
    }
}
