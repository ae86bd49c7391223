use super::{EngineApiMethod, EngineJsonRpcMethod, JsonRpcRequestParams, ResponseType};
use crate::engine_api::http::{
    ENGINE_FORKCHOICE_UPDATED_TIMEOUT, ENGINE_FORKCHOICE_UPDATED_V1,
    ENGINE_FORKCHOICE_UPDATED_V2,
};
use crate::engine_api::json_structures::{
    ForkchoiceState, ForkchoiceUpdatedResult, PayloadAttributes, PayloadAttributesV1,
};
use crate::engine_api::Error;
use async_trait::async_trait;
use serde_json::{json, Value};

bound_method!(EngineForkChoiceUpdatedV1);
bound_method!(
    /// Accepts V1 or V2 payload attributes. Deneb keeps using this version.
    EngineForkChoiceUpdatedV2
);

#[async_trait]
impl EngineJsonRpcMethod for EngineForkChoiceUpdatedV1 {
    fn method(&self) -> EngineApiMethod {
        EngineApiMethod::EngineForkChoiceUpdated
    }

    fn version(&self) -> u8 {
        1
    }

    fn response_type(&self) -> ResponseType {
        ResponseType::of::<ForkchoiceUpdatedResult>()
    }

    async fn execute(&self, params: &JsonRpcRequestParams) -> Result<Value, Error> {
        let forkchoice_state: ForkchoiceState = params.required(0)?;
        let payload_attributes: Option<PayloadAttributesV1> = params.optional(1)?;

        self.client
            .rpc_request(
                ENGINE_FORKCHOICE_UPDATED_V1,
                json!([forkchoice_state, payload_attributes]),
                ENGINE_FORKCHOICE_UPDATED_TIMEOUT,
            )
            .await
    }
}

#[async_trait]
impl EngineJsonRpcMethod for EngineForkChoiceUpdatedV2 {
    fn method(&self) -> EngineApiMethod {
        EngineApiMethod::EngineForkChoiceUpdated
    }

    fn version(&self) -> u8 {
        2
    }

    fn response_type(&self) -> ResponseType {
        ResponseType::of::<ForkchoiceUpdatedResult>()
    }

    async fn execute(&self, params: &JsonRpcRequestParams) -> Result<Value, Error> {
        let forkchoice_state: ForkchoiceState = params.required(0)?;
        let payload_attributes: Option<PayloadAttributes> = params.optional(1)?;
        if let Some(PayloadAttributes::V3(_)) = payload_attributes {
            return Err(Error::IncorrectPayloadVersion);
        }

        self.client
            .rpc_request(
                ENGINE_FORKCHOICE_UPDATED_V2,
                json!([forkchoice_state, payload_attributes]),
                ENGINE_FORKCHOICE_UPDATED_TIMEOUT,
            )
            .await
    }
}
