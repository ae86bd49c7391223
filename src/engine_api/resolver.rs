//! Resolves logical Engine API methods to the implementation that matches a milestone.

use crate::engine_api::catalog::{MethodCatalog, MethodEntries, MethodVersion};
use crate::engine_api::fork_schedule::MilestoneProvider;
use crate::engine_api::methods::{
    EngineApiMethod, EngineJsonRpcMethod, JsonRpcRequestParams, ResponseType,
};
use crate::engine_api::milestone::SpecMilestone;
use crate::engine_api::Error;
use serde::de::DeserializeOwned;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// A resolved implementation, typed with the response its caller expects.
pub struct EngineMethodHandle<R> {
    implementation: Arc<dyn EngineJsonRpcMethod>,
    _response: PhantomData<fn() -> R>,
}

impl<R> Clone for EngineMethodHandle<R> {
    fn clone(&self) -> Self {
        Self {
            implementation: self.implementation.clone(),
            _response: PhantomData,
        }
    }
}

impl<R> fmt::Debug for EngineMethodHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineMethodHandle")
            .field("method", &self.versioned_name())
            .finish()
    }
}

impl<R> EngineMethodHandle<R> {
    pub fn method(&self) -> EngineApiMethod {
        self.implementation.method()
    }

    pub fn version(&self) -> u8 {
        self.implementation.version()
    }

    pub fn versioned_name(&self) -> String {
        self.implementation.versioned_name()
    }

    /// `true` if both handles point at the same implementation instance.
    pub fn is_same_implementation<S>(&self, other: &EngineMethodHandle<S>) -> bool {
        Arc::as_ptr(&self.implementation) as *const () == Arc::as_ptr(&other.implementation) as *const ()
    }
}

impl<R: DeserializeOwned> EngineMethodHandle<R> {
    pub async fn execute(&self, params: &JsonRpcRequestParams) -> Result<R, Error> {
        let result = self.implementation.execute(params).await?;
        serde_json::from_value(result).map_err(Into::into)
    }
}

/// The catalog narrowed to the milestones a network configuration supports.
///
/// Immutable once built; a configuration that gains milestones needs a new table.
pub struct MilestoneMethodTable {
    supported_milestones: Vec<SpecMilestone>,
    methods: HashMap<EngineApiMethod, MethodEntries>,
}

impl MilestoneMethodTable {
    pub fn new(catalog: &MethodCatalog, supported_milestones: Vec<SpecMilestone>) -> Result<Self, Error> {
        let mut supported_milestones = supported_milestones;
        supported_milestones.sort();
        supported_milestones.dedup();

        let highest = *supported_milestones.last().ok_or_else(|| {
            Error::InvalidForkSchedule("no supported milestones".to_string())
        })?;

        let methods = catalog
            .iter()
            .map(|(method, entries)| {
                let entries = match entries {
                    MethodEntries::ForkInvariant(implementation) => {
                        MethodEntries::ForkInvariant(implementation.clone())
                    }
                    MethodEntries::Versioned(versions) => MethodEntries::Versioned(
                        versions
                            .iter()
                            .filter(|version| version.milestone <= highest)
                            .cloned()
                            .collect(),
                    ),
                };
                (*method, entries)
            })
            .collect();

        Ok(Self {
            supported_milestones,
            methods,
        })
    }

    pub fn supported_milestones(&self) -> &[SpecMilestone] {
        &self.supported_milestones
    }

    pub fn highest_supported_milestone(&self) -> SpecMilestone {
        // Construction rejects an empty milestone list.
        self.supported_milestones[self.supported_milestones.len() - 1]
    }

    pub fn supports(&self, milestone: SpecMilestone) -> bool {
        self.supported_milestones.binary_search(&milestone).is_ok()
    }

    /// The implementation of `method` in effect at `milestone`, if any.
    pub fn lookup(
        &self,
        method: EngineApiMethod,
        milestone: SpecMilestone,
    ) -> Option<&Arc<dyn EngineJsonRpcMethod>> {
        match self.methods.get(&method)? {
            MethodEntries::ForkInvariant(implementation) => Some(implementation),
            MethodEntries::Versioned(versions) => {
                if !self.supports(milestone) {
                    return None;
                }
                versions
                    .iter()
                    .rev()
                    .find(|version| version.milestone <= milestone)
                    .map(|version| &version.implementation)
            }
        }
    }

    pub fn versions(&self, method: EngineApiMethod) -> Option<&[MethodVersion]> {
        match self.methods.get(&method)? {
            MethodEntries::Versioned(versions) => Some(versions),
            MethodEntries::ForkInvariant(_) => None,
        }
    }

    fn implementations(&self) -> Vec<&Arc<dyn EngineJsonRpcMethod>> {
        let mut implementations = Vec::new();
        for entries in self.methods.values() {
            match entries {
                MethodEntries::ForkInvariant(implementation) => implementations.push(implementation),
                MethodEntries::Versioned(versions) => {
                    implementations.extend(versions.iter().map(|version| &version.implementation))
                }
            }
        }
        implementations
    }
}

/// Picks the wire version of an Engine API method that matches the milestone of a call.
///
/// The table is built once from the network's supported milestones and never mutated, so a
/// resolver can be shared across tasks without locking.
pub struct MilestoneBasedMethodsResolver {
    table: MilestoneMethodTable,
}

impl MilestoneBasedMethodsResolver {
    pub fn new<P: MilestoneProvider + ?Sized>(
        catalog: &MethodCatalog,
        milestones: &P,
    ) -> Result<Self, Error> {
        let table = MilestoneMethodTable::new(catalog, milestones.supported_milestones())?;

        debug!(
            highest_milestone = %table.highest_supported_milestone(),
            milestones = table.supported_milestones().len(),
            "Built milestone method table"
        );

        Ok(Self { table })
    }

    pub fn table(&self) -> &MilestoneMethodTable {
        &self.table
    }

    pub fn supported_milestones(&self) -> &[SpecMilestone] {
        self.table.supported_milestones()
    }

    pub fn highest_supported_milestone(&self) -> SpecMilestone {
        self.table.highest_supported_milestone()
    }

    /// Resolves `method` at the highest milestone the network supports.
    pub fn get_method<R: 'static>(
        &self,
        method: EngineApiMethod,
    ) -> Result<EngineMethodHandle<R>, Error> {
        let highest = self.highest_supported_milestone();
        self.get_milestone_method(method, || highest)
    }

    /// Resolves `method` at the milestone returned by `milestone_supplier`, which is invoked
    /// exactly once. Fork-invariant methods resolve regardless of the milestone.
    pub fn get_milestone_method<R: 'static>(
        &self,
        method: EngineApiMethod,
        milestone_supplier: impl FnOnce() -> SpecMilestone,
    ) -> Result<EngineMethodHandle<R>, Error> {
        let milestone = milestone_supplier();

        let implementation = self.table.lookup(method, milestone).ok_or_else(|| {
            debug!(
                method = method.name(),
                %milestone,
                "No Engine API method implementation for milestone"
            );
            Error::UnsupportedForMilestone {
                method: method.name(),
                milestone,
            }
        })?;

        let declared = implementation.response_type();
        let expected = ResponseType::of::<R>();
        if !declared.is_assignable_to(&expected) {
            return Err(Error::ResponseTypeMismatch {
                method: implementation.versioned_name(),
                declared: declared.name(),
                expected: expected.name(),
            });
        }

        Ok(EngineMethodHandle {
            implementation: implementation.clone(),
            _response: PhantomData,
        })
    }

    /// The versioned `engine_*` method names this resolver can issue, sorted. These are what
    /// the client advertises through `engine_exchangeCapabilities`, which is itself excluded.
    pub fn capabilities(&self) -> Vec<String> {
        self.table
            .implementations()
            .into_iter()
            .filter(|implementation| {
                let method = implementation.method();
                method.name().starts_with("engine_")
                    && method != EngineApiMethod::EngineExchangeCapabilities
            })
            .map(|implementation| implementation.versioned_name())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_api::fork_schedule::ForkSchedule;
    use crate::engine_api::json_structures::{ExecutionBlock, PayloadStatusV1};
    use crate::test_utils::MockExecutionClient;
    use serde_json::Value;
    use std::cell::Cell;
    use strum::IntoEnumIterator;

    fn catalog() -> MethodCatalog {
        MethodCatalog::new(Arc::new(MockExecutionClient::new()))
    }

    fn resolver(catalog: &MethodCatalog, schedule: ForkSchedule) -> MilestoneBasedMethodsResolver {
        MilestoneBasedMethodsResolver::new(catalog, &schedule).unwrap()
    }

    fn resolve_at(
        resolver: &MilestoneBasedMethodsResolver,
        method: EngineApiMethod,
        milestone: SpecMilestone,
    ) -> Result<String, Error> {
        resolver
            .get_milestone_method::<Value>(method, || milestone)
            .map(|handle| handle.versioned_name())
    }

    #[test]
    fn provides_expected_non_milestone_methods() {
        let catalog = catalog();
        let resolver = resolver(&catalog, ForkSchedule::minimal_phase0());

        for (method, expected) in [
            (EngineApiMethod::EthGetBlockByHash, "eth_getBlockByHash"),
            (EngineApiMethod::EthGetBlockByNumber, "eth_getBlockByNumber"),
            (
                EngineApiMethod::EngineExchangeTransitionConfiguration,
                "engine_exchangeTransitionConfigurationV1",
            ),
        ] {
            let handle = resolver.get_method::<Value>(method).unwrap();
            assert_eq!(handle.versioned_name(), expected);
        }
    }

    #[test]
    fn provides_expected_bellatrix_methods() {
        let catalog = catalog();
        let resolver = resolver(&catalog, ForkSchedule::minimal_bellatrix());

        for (method, expected) in [
            (EngineApiMethod::EngineNewPayload, "engine_newPayloadV1"),
            (EngineApiMethod::EngineGetPayload, "engine_getPayloadV1"),
            (
                EngineApiMethod::EngineForkChoiceUpdated,
                "engine_forkchoiceUpdatedV1",
            ),
        ] {
            assert_eq!(
                resolve_at(&resolver, method, SpecMilestone::Bellatrix).unwrap(),
                expected
            );
        }
    }

    #[test]
    fn capella_milestone_method_is_not_supported_in_bellatrix() {
        let catalog = catalog();
        let resolver = resolver(&catalog, ForkSchedule::minimal_bellatrix());

        let error = resolve_at(
            &resolver,
            EngineApiMethod::EngineGetPayload,
            SpecMilestone::Capella,
        )
        .unwrap_err();
        assert!(matches!(error, Error::UnsupportedForMilestone { .. }));
        assert_eq!(
            error.to_string(),
            "Can't find method with name engine_getPayload for milestone CAPELLA"
        );
    }

    #[test]
    fn provides_expected_capella_methods() {
        let catalog = catalog();
        let resolver = resolver(&catalog, ForkSchedule::minimal_capella());

        for (method, expected) in [
            (EngineApiMethod::EngineNewPayload, "engine_newPayloadV2"),
            (EngineApiMethod::EngineGetPayload, "engine_getPayloadV2"),
            (
                EngineApiMethod::EngineForkChoiceUpdated,
                "engine_forkchoiceUpdatedV2",
            ),
        ] {
            assert_eq!(
                resolve_at(&resolver, method, SpecMilestone::Capella).unwrap(),
                expected
            );
        }
    }

    #[test]
    fn deneb_milestone_method_is_not_supported_in_capella() {
        let catalog = catalog();
        let resolver = resolver(&catalog, ForkSchedule::minimal_capella());

        let error = resolve_at(
            &resolver,
            EngineApiMethod::EngineGetPayload,
            SpecMilestone::Deneb,
        )
        .unwrap_err();
        assert_eq!(
            error.to_string(),
            "Can't find method with name engine_getPayload for milestone DENEB"
        );
    }

    #[test]
    fn provides_expected_deneb_methods() {
        let catalog = catalog();
        let resolver = resolver(&catalog, ForkSchedule::minimal_deneb());

        for (method, expected) in [
            (EngineApiMethod::EngineNewPayload, "engine_newPayloadV3"),
            (EngineApiMethod::EngineGetPayload, "engine_getPayloadV3"),
            (
                EngineApiMethod::EngineForkChoiceUpdated,
                "engine_forkchoiceUpdatedV2",
            ),
        ] {
            assert_eq!(
                resolve_at(&resolver, method, SpecMilestone::Deneb).unwrap(),
                expected
            );
        }
    }

    #[test]
    fn unchanged_method_inherits_previous_version() {
        let catalog = catalog();
        let resolver = resolver(&catalog, ForkSchedule::minimal_deneb());

        let at_capella = resolver
            .get_milestone_method::<Value>(EngineApiMethod::EngineForkChoiceUpdated, || {
                SpecMilestone::Capella
            })
            .unwrap();
        let at_deneb = resolver
            .get_milestone_method::<Value>(EngineApiMethod::EngineForkChoiceUpdated, || {
                SpecMilestone::Deneb
            })
            .unwrap();
        assert!(at_capella.is_same_implementation(&at_deneb));

        let new_payload_capella = resolver
            .get_milestone_method::<Value>(EngineApiMethod::EngineNewPayload, || {
                SpecMilestone::Capella
            })
            .unwrap();
        let new_payload_deneb = resolver
            .get_milestone_method::<Value>(EngineApiMethod::EngineNewPayload, || {
                SpecMilestone::Deneb
            })
            .unwrap();
        assert!(!new_payload_capella.is_same_implementation(&new_payload_deneb));
    }

    #[test]
    fn method_before_its_introduction_is_unsupported() {
        let catalog = catalog();
        let resolver = resolver(&catalog, ForkSchedule::minimal_deneb());

        for milestone in [SpecMilestone::Phase0, SpecMilestone::Altair] {
            let error = resolve_at(&resolver, EngineApiMethod::EngineNewPayload, milestone)
                .unwrap_err();
            let message = error.to_string();
            assert!(message.contains("engine_newPayload"));
            assert!(message.contains(&milestone.to_string()));
        }
    }

    #[test]
    fn versioned_method_on_pre_merge_network_is_unsupported() {
        let catalog = catalog();
        let resolver = resolver(&catalog, ForkSchedule::minimal_phase0());

        assert!(matches!(
            resolver.get_method::<Value>(EngineApiMethod::EngineGetPayload),
            Err(Error::UnsupportedForMilestone {
                method: "engine_getPayload",
                milestone: SpecMilestone::Phase0,
            })
        ));
    }

    #[test]
    fn fork_invariant_methods_ignore_milestone() {
        let catalog = catalog();
        let resolver = resolver(&catalog, ForkSchedule::minimal_bellatrix());

        let reference = resolver
            .get_method::<Value>(EngineApiMethod::EthGetBlockByHash)
            .unwrap();
        for milestone in SpecMilestone::all() {
            let handle = resolver
                .get_milestone_method::<Value>(EngineApiMethod::EthGetBlockByHash, || milestone)
                .unwrap();
            assert!(handle.is_same_implementation(&reference));
        }
    }

    #[test]
    fn fork_invariant_identity_is_shared_across_configurations() {
        let catalog = catalog();
        let handles: Vec<_> = [
            ForkSchedule::minimal_phase0(),
            ForkSchedule::minimal_bellatrix(),
            ForkSchedule::minimal_capella(),
            ForkSchedule::minimal_deneb(),
            ForkSchedule::mainnet(),
        ]
        .into_iter()
        .map(|schedule| {
            resolver(&catalog, schedule)
                .get_method::<Value>(EngineApiMethod::EthGetBlockByHash)
                .unwrap()
        })
        .collect();

        for handle in &handles {
            assert!(handle.is_same_implementation(&handles[0]));
        }
    }

    #[test]
    fn get_method_matches_highest_supported_milestone() {
        let catalog = catalog();
        for schedule in [
            ForkSchedule::minimal_bellatrix(),
            ForkSchedule::minimal_capella(),
            ForkSchedule::minimal_deneb(),
        ] {
            let resolver = resolver(&catalog, schedule);
            let highest = resolver.highest_supported_milestone();
            for method in EngineApiMethod::iter() {
                let implicit = resolver.get_method::<Value>(method).unwrap();
                let explicit = resolver
                    .get_milestone_method::<Value>(method, || highest)
                    .unwrap();
                assert!(implicit.is_same_implementation(&explicit));
            }
        }
    }

    #[test]
    fn resolution_is_idempotent() {
        let catalog = catalog();
        let resolver = resolver(&catalog, ForkSchedule::minimal_deneb());

        for method in EngineApiMethod::iter() {
            for milestone in resolver.supported_milestones().to_vec() {
                let first = resolver.get_milestone_method::<Value>(method, || milestone);
                let second = resolver.get_milestone_method::<Value>(method, || milestone);
                match (first, second) {
                    (Ok(first), Ok(second)) => assert!(first.is_same_implementation(&second)),
                    (Err(first), Err(second)) => assert_eq!(first.to_string(), second.to_string()),
                    _ => panic!("{} resolved inconsistently at {}", method, milestone),
                }
            }
        }
    }

    #[test]
    fn milestone_supplier_is_invoked_once() {
        let catalog = catalog();
        let resolver = resolver(&catalog, ForkSchedule::minimal_deneb());
        let calls = Cell::new(0);

        resolver
            .get_milestone_method::<Value>(EngineApiMethod::EngineNewPayload, || {
                calls.set(calls.get() + 1);
                SpecMilestone::Deneb
            })
            .unwrap();
        assert_eq!(calls.get(), 1);

        resolver
            .get_milestone_method::<Value>(EngineApiMethod::EthGetBlockByNumber, || {
                calls.set(calls.get() + 1);
                SpecMilestone::Deneb
            })
            .unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn typed_resolution_checks_response_type() {
        let catalog = catalog();
        let resolver = resolver(&catalog, ForkSchedule::minimal_capella());

        assert!(resolver
            .get_method::<PayloadStatusV1>(EngineApiMethod::EngineNewPayload)
            .is_ok());
        assert!(resolver
            .get_method::<Option<ExecutionBlock>>(EngineApiMethod::EthGetBlockByHash)
            .is_ok());

        match resolver.get_method::<PayloadStatusV1>(EngineApiMethod::EngineGetPayload) {
            Err(Error::ResponseTypeMismatch { method, .. }) => {
                assert_eq!(method, "engine_getPayloadV2")
            }
            other => panic!("unexpected resolution: {:?}", other),
        }
    }

    #[test]
    fn table_only_contains_supported_versions() {
        let catalog = catalog();
        let resolver = resolver(&catalog, ForkSchedule::minimal_capella());

        let milestones: Vec<_> = resolver
            .table()
            .versions(EngineApiMethod::EngineGetPayload)
            .unwrap()
            .iter()
            .map(|version| version.milestone)
            .collect();
        assert_eq!(
            milestones,
            vec![SpecMilestone::Bellatrix, SpecMilestone::Capella]
        );
        assert!(resolver
            .table()
            .versions(EngineApiMethod::EthGetBlockByHash)
            .is_none());
    }

    #[test]
    fn unsorted_milestones_are_normalised() {
        let catalog = catalog();
        let table = MilestoneMethodTable::new(
            &catalog,
            vec![
                SpecMilestone::Capella,
                SpecMilestone::Bellatrix,
                SpecMilestone::Capella,
            ],
        )
        .unwrap();
        assert_eq!(
            table.supported_milestones(),
            &[SpecMilestone::Bellatrix, SpecMilestone::Capella]
        );
        assert_eq!(table.highest_supported_milestone(), SpecMilestone::Capella);
    }

    #[test]
    fn empty_milestones_are_rejected() {
        let catalog = catalog();
        assert!(matches!(
            MilestoneMethodTable::new(&catalog, vec![]),
            Err(Error::InvalidForkSchedule(_))
        ));
    }

    #[test]
    fn capabilities_follow_network_configuration() {
        let catalog = catalog();

        assert_eq!(
            resolver(&catalog, ForkSchedule::minimal_bellatrix()).capabilities(),
            vec![
                "engine_exchangeTransitionConfigurationV1",
                "engine_forkchoiceUpdatedV1",
                "engine_getPayloadV1",
                "engine_newPayloadV1",
            ]
        );

        let deneb = resolver(&catalog, ForkSchedule::minimal_deneb()).capabilities();
        assert!(deneb.contains(&"engine_newPayloadV3".to_string()));
        assert!(deneb.contains(&"engine_forkchoiceUpdatedV2".to_string()));
        assert!(!deneb.contains(&"engine_exchangeCapabilities".to_string()));
        assert!(!deneb.iter().any(|name| name.starts_with("eth_")));
    }

    #[test]
    fn resolver_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MilestoneBasedMethodsResolver>();
        assert_send_sync::<EngineMethodHandle<PayloadStatusV1>>();
    }
}
