use super::{EngineApiMethod, EngineJsonRpcMethod, JsonRpcRequestParams, ResponseType};
use crate::engine_api::http::{
    ENGINE_EXCHANGE_TRANSITION_CONFIGURATION_V1,
    ENGINE_EXCHANGE_TRANSITION_CONFIGURATION_V1_TIMEOUT,
};
use crate::engine_api::json_structures::TransitionConfigurationV1;
use crate::engine_api::Error;
use async_trait::async_trait;
use serde_json::{json, Value};

bound_method!(EngineExchangeTransitionConfigurationV1);

#[async_trait]
impl EngineJsonRpcMethod for EngineExchangeTransitionConfigurationV1 {
    fn method(&self) -> EngineApiMethod {
        EngineApiMethod::EngineExchangeTransitionConfiguration
    }

    fn version(&self) -> u8 {
        1
    }

    fn response_type(&self) -> ResponseType {
        ResponseType::of::<TransitionConfigurationV1>()
    }

    async fn execute(&self, params: &JsonRpcRequestParams) -> Result<Value, Error> {
        let transition_configuration: TransitionConfigurationV1 = params.required(0)?;

        self.client
            .rpc_request(
                ENGINE_EXCHANGE_TRANSITION_CONFIGURATION_V1,
                json!([transition_configuration]),
                ENGINE_EXCHANGE_TRANSITION_CONFIGURATION_V1_TIMEOUT,
            )
            .await
    }
}
