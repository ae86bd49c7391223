//! Issues Engine API calls using the method version that matches the milestone of each call.

use crate::engine_api::catalog::MethodCatalog;
use crate::engine_api::client::ExecutionEngineClient;
use crate::engine_api::execution_payload::{ExecutionPayload, ExecutionPayloadV1};
use crate::engine_api::fork_schedule::{MilestoneProvider, Slot};
use crate::engine_api::http::{
    ENGINE_EXCHANGE_TRANSITION_CONFIGURATION_V1, ENGINE_FORKCHOICE_UPDATED_V1,
    ENGINE_GET_PAYLOAD_V1, ENGINE_NEW_PAYLOAD_V1, METHOD_NOT_FOUND_CODE,
};
use crate::engine_api::json_structures::{
    BlockByNumberQuery, ExecutionBlock, ExecutionBlockHash, ForkchoiceState,
    ForkchoiceUpdatedResult, GetPayloadResponse, GetPayloadV2Response, GetPayloadV3Response,
    PayloadAttributes, PayloadId, PayloadStatusV1, TransitionConfigurationV1,
};
use crate::engine_api::methods::{EngineApiMethod, JsonRpcRequestParams};
use crate::engine_api::milestone::SpecMilestone;
use crate::engine_api::resolver::{EngineMethodHandle, MilestoneBasedMethodsResolver};
use crate::engine_api::{Error, Hash256};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Assumed when the execution engine predates `engine_exchangeCapabilities`.
pub const PRE_CAPELLA_ENGINE_CAPABILITIES: &[&str] = &[
    ENGINE_NEW_PAYLOAD_V1,
    ENGINE_GET_PAYLOAD_V1,
    ENGINE_FORKCHOICE_UPDATED_V1,
    ENGINE_EXCHANGE_TRANSITION_CONFIGURATION_V1,
];

/// The versioned method names an execution engine reported it supports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineCapabilities {
    methods: BTreeSet<String>,
}

impl EngineCapabilities {
    pub fn supports(&self, versioned_name: &str) -> bool {
        self.methods.contains(versioned_name)
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for EngineCapabilities {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            methods: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CapabilitiesCacheEntry {
    engine_capabilities: EngineCapabilities,
    fetch_time: Instant,
}

impl CapabilitiesCacheEntry {
    pub fn new(engine_capabilities: EngineCapabilities) -> Self {
        Self {
            engine_capabilities,
            fetch_time: Instant::now(),
        }
    }

    pub fn engine_capabilities(&self) -> &EngineCapabilities {
        &self.engine_capabilities
    }

    pub fn age(&self) -> Duration {
        Instant::now().duration_since(self.fetch_time)
    }

    /// returns `true` if the entry's age is >= age_limit
    pub fn older_than(&self, age_limit: Option<Duration>) -> bool {
        age_limit.map_or(false, |limit| self.age() >= limit)
    }
}

/// Front door for Engine API calls made on behalf of a beacon node.
///
/// Every slot-bound call resolves its method against the milestone active at that slot, so a
/// node crossing a fork switches wire versions without any caller involvement. A call whose
/// method cannot be resolved fails before anything is sent to the execution engine.
pub struct ExecutionClientHandler {
    resolver: MilestoneBasedMethodsResolver,
    milestones: Arc<dyn MilestoneProvider>,
    engine_capabilities_cache: Mutex<Option<CapabilitiesCacheEntry>>,
}

impl ExecutionClientHandler {
    pub fn new(
        client: Arc<dyn ExecutionEngineClient>,
        milestones: Arc<dyn MilestoneProvider>,
    ) -> Result<Self, Error> {
        Self::with_catalog(&MethodCatalog::new(client), milestones)
    }

    pub fn with_catalog(
        catalog: &MethodCatalog,
        milestones: Arc<dyn MilestoneProvider>,
    ) -> Result<Self, Error> {
        let resolver = MilestoneBasedMethodsResolver::new(catalog, milestones.as_ref())?;
        Ok(Self {
            resolver,
            milestones,
            engine_capabilities_cache: Mutex::new(None),
        })
    }

    pub fn resolver(&self) -> &MilestoneBasedMethodsResolver {
        &self.resolver
    }

    pub fn milestone_at_slot(&self, slot: Slot) -> SpecMilestone {
        self.milestones.milestone_at_slot(slot)
    }

    fn method_at_slot<R: 'static>(
        &self,
        method: EngineApiMethod,
        slot: Slot,
    ) -> Result<EngineMethodHandle<R>, Error> {
        let handle = self
            .resolver
            .get_milestone_method(method, || self.milestones.milestone_at_slot(slot))?;
        debug!(slot, method = %handle.versioned_name(), "Resolved Engine API method");
        Ok(handle)
    }

    pub async fn engine_new_payload(
        &self,
        slot: Slot,
        execution_payload: ExecutionPayload,
        versioned_hashes: Vec<Hash256>,
        parent_beacon_block_root: Option<Hash256>,
    ) -> Result<PayloadStatusV1, Error> {
        let method = self.method_at_slot::<PayloadStatusV1>(EngineApiMethod::EngineNewPayload, slot)?;
        let params = JsonRpcRequestParams::new()
            .add(execution_payload)?
            .add(versioned_hashes)?
            .add_optional(parent_beacon_block_root)?;
        method.execute(&params).await
    }

    pub async fn engine_get_payload(
        &self,
        slot: Slot,
        payload_id: PayloadId,
    ) -> Result<GetPayloadResponse, Error> {
        // Each version returns a differently shaped result, decoded below by version.
        let method = self.method_at_slot::<Value>(EngineApiMethod::EngineGetPayload, slot)?;
        let params = JsonRpcRequestParams::new().add(payload_id)?;
        let result = method.execute(&params).await?;

        let response: GetPayloadResponse = match method.version() {
            1 => serde_json::from_value::<ExecutionPayloadV1>(result)?.into(),
            2 => serde_json::from_value::<GetPayloadV2Response>(result)?.into(),
            _ => serde_json::from_value::<GetPayloadV3Response>(result)?.into(),
        };
        Ok(response)
    }

    pub async fn engine_forkchoice_updated(
        &self,
        slot: Slot,
        forkchoice_state: ForkchoiceState,
        payload_attributes: Option<PayloadAttributes>,
    ) -> Result<ForkchoiceUpdatedResult, Error> {
        let method = self
            .method_at_slot::<ForkchoiceUpdatedResult>(EngineApiMethod::EngineForkChoiceUpdated, slot)?;
        let params = JsonRpcRequestParams::new()
            .add(forkchoice_state)?
            .add_optional(payload_attributes)?;
        method.execute(&params).await
    }

    pub async fn engine_exchange_transition_configuration(
        &self,
        transition_configuration: TransitionConfigurationV1,
    ) -> Result<TransitionConfigurationV1, Error> {
        let method = self.resolver.get_method::<TransitionConfigurationV1>(
            EngineApiMethod::EngineExchangeTransitionConfiguration,
        )?;
        let params = JsonRpcRequestParams::new().add(transition_configuration)?;
        method.execute(&params).await
    }

    /// Advertises this node's capabilities and returns those of the execution engine.
    pub async fn engine_exchange_capabilities(&self) -> Result<EngineCapabilities, Error> {
        let method = self
            .resolver
            .get_method::<Vec<String>>(EngineApiMethod::EngineExchangeCapabilities)?;
        let params = JsonRpcRequestParams::new().add(self.resolver.capabilities())?;

        match method.execute(&params).await {
            Ok(capabilities) => Ok(capabilities.into_iter().collect()),
            Err(Error::ServerMessage { code, .. }) if code == METHOD_NOT_FOUND_CODE => {
                warn!("Execution engine does not support engine_exchangeCapabilities");
                Ok(PRE_CAPELLA_ENGINE_CAPABILITIES.iter().copied().collect())
            }
            Err(error) => Err(error),
        }
    }

    pub async fn clear_exchange_capabilities_cache(&self) {
        *self.engine_capabilities_cache.lock().await = None;
    }

    /// Returns the execution engine capabilities resulting from a call to
    /// engine_exchangeCapabilities. If the cache is empty, or holds a result of age >=
    /// `age_limit`, the capabilities are fetched from the execution engine and cached.
    ///
    /// Set `age_limit` to `None` to always return the cached result
    /// Set `age_limit` to `Some(Duration::ZERO)` to force fetching from EE
    pub async fn get_engine_capabilities(
        &self,
        age_limit: Option<Duration>,
    ) -> Result<EngineCapabilities, Error> {
        let mut lock = self.engine_capabilities_cache.lock().await;

        if let Some(entry) = lock.as_ref().filter(|entry| !entry.older_than(age_limit)) {
            Ok(entry.engine_capabilities().clone())
        } else {
            let engine_capabilities = self.engine_exchange_capabilities().await?;
            *lock = Some(CapabilitiesCacheEntry::new(engine_capabilities.clone()));
            Ok(engine_capabilities)
        }
    }

    pub async fn eth_get_block_by_hash(
        &self,
        block_hash: ExecutionBlockHash,
    ) -> Result<Option<ExecutionBlock>, Error> {
        let method = self
            .resolver
            .get_method::<Option<ExecutionBlock>>(EngineApiMethod::EthGetBlockByHash)?;
        let params = JsonRpcRequestParams::new().add(block_hash)?;
        method.execute(&params).await
    }

    pub async fn eth_get_block_by_number(
        &self,
        query: BlockByNumberQuery,
    ) -> Result<Option<ExecutionBlock>, Error> {
        let method = self
            .resolver
            .get_method::<Option<ExecutionBlock>>(EngineApiMethod::EthGetBlockByNumber)?;
        let params = JsonRpcRequestParams::new().add(query)?;
        method.execute(&params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_api::fork_schedule::ForkSchedule;
    use crate::test_utils::MockExecutionClient;
    use serde_json::json;

    fn handler(client: &Arc<MockExecutionClient>, schedule: ForkSchedule) -> ExecutionClientHandler {
        ExecutionClientHandler::new(client.clone(), Arc::new(schedule)).unwrap()
    }

    #[test]
    fn cache_entry_age() {
        let entry = CapabilitiesCacheEntry::new(EngineCapabilities::default());
        assert!(!entry.older_than(None));
        assert!(entry.older_than(Some(Duration::ZERO)));
        assert!(!entry.older_than(Some(Duration::from_secs(3600))));
    }

    #[tokio::test]
    async fn capabilities_are_cached() {
        let client = Arc::new(
            MockExecutionClient::new()
                .with_response("engine_exchangeCapabilities", json!(["engine_newPayloadV2"])),
        );
        let handler = handler(&client, ForkSchedule::minimal_capella());

        let first = handler.get_engine_capabilities(None).await.unwrap();
        let second = handler.get_engine_capabilities(None).await.unwrap();
        assert!(first.supports("engine_newPayloadV2"));
        assert_eq!(first, second);
        assert_eq!(client.request_count(), 1);

        handler
            .get_engine_capabilities(Some(Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(client.request_count(), 2);

        handler.clear_exchange_capabilities_cache().await;
        handler.get_engine_capabilities(None).await.unwrap();
        assert_eq!(client.request_count(), 3);
    }

    #[tokio::test]
    async fn exchange_capabilities_advertises_resolver_capabilities() {
        let client = Arc::new(
            MockExecutionClient::new().with_response("engine_exchangeCapabilities", json!([])),
        );
        let handler = handler(&client, ForkSchedule::minimal_capella());

        handler.engine_exchange_capabilities().await.unwrap();

        let request = client.last_request().unwrap();
        assert_eq!(request.method, "engine_exchangeCapabilities");
        assert_eq!(request.params, json!([handler.resolver().capabilities()]));
    }

    #[tokio::test]
    async fn missing_exchange_capabilities_falls_back_to_pre_capella() {
        let client = Arc::new(MockExecutionClient::new());
        let handler = handler(&client, ForkSchedule::minimal_bellatrix());

        let capabilities = handler.engine_exchange_capabilities().await.unwrap();
        for method in PRE_CAPELLA_ENGINE_CAPABILITIES {
            assert!(capabilities.supports(method));
        }
        assert!(!capabilities.supports("engine_newPayloadV2"));
    }

    #[tokio::test]
    async fn other_exchange_capabilities_errors_are_propagated() {
        let client = Arc::new(MockExecutionClient::new().with_error(
            "engine_exchangeCapabilities",
            -32000,
            "internal error",
        ));
        let handler = handler(&client, ForkSchedule::minimal_capella());

        assert!(matches!(
            handler.get_engine_capabilities(None).await,
            Err(Error::ServerMessage { code: -32000, .. })
        ));
    }

    #[tokio::test]
    async fn unresolvable_call_sends_nothing() {
        let client = Arc::new(MockExecutionClient::new());
        let handler = handler(&client, ForkSchedule::minimal_phase0());

        let error = handler
            .engine_get_payload(0, PayloadId::zero())
            .await
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "Can't find method with name engine_getPayload for milestone PHASE0"
        );
        assert_eq!(client.request_count(), 0);
    }
}
