//! The catalog of every Engine API method implementation and the milestone that introduced it.

use crate::engine_api::client::ExecutionEngineClient;
use crate::engine_api::methods;
use crate::engine_api::methods::*;
use crate::engine_api::milestone::SpecMilestone;
use lazy_static::lazy_static;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tracing::debug;

/// Declares that `method` resolves to the implementation built by `factory`, either for every
/// milestone (`introduced_at == None`) or from `introduced_at` onwards until a later
/// declaration for the same method takes over.
#[derive(Clone, Copy)]
pub struct MethodDeclaration {
    pub method: EngineApiMethod,
    pub introduced_at: Option<SpecMilestone>,
    pub factory: MethodFactory,
}

impl MethodDeclaration {
    pub fn fork_invariant(method: EngineApiMethod, factory: MethodFactory) -> Self {
        Self {
            method,
            introduced_at: None,
            factory,
        }
    }

    pub fn versioned(
        method: EngineApiMethod,
        introduced_at: SpecMilestone,
        factory: MethodFactory,
    ) -> Self {
        Self {
            method,
            introduced_at: Some(introduced_at),
            factory,
        }
    }
}

lazy_static! {
    /// Every implementation this client ships, with the milestone each wire version belongs to.
    pub static ref METHOD_DECLARATIONS: Vec<MethodDeclaration> = {
        use EngineApiMethod::*;
        use SpecMilestone::*;

        vec![
            MethodDeclaration::fork_invariant(
                EthGetBlockByHash,
                instantiate::<methods::EthGetBlockByHash>,
            ),
            MethodDeclaration::fork_invariant(
                EthGetBlockByNumber,
                instantiate::<methods::EthGetBlockByNumber>,
            ),
            MethodDeclaration::fork_invariant(
                EngineExchangeTransitionConfiguration,
                instantiate::<EngineExchangeTransitionConfigurationV1>,
            ),
            MethodDeclaration::fork_invariant(
                EngineExchangeCapabilities,
                instantiate::<methods::EngineExchangeCapabilities>,
            ),
            MethodDeclaration::versioned(
                EngineNewPayload,
                Bellatrix,
                instantiate::<EngineNewPayloadV1>,
            ),
            MethodDeclaration::versioned(
                EngineNewPayload,
                Capella,
                instantiate::<EngineNewPayloadV2>,
            ),
            MethodDeclaration::versioned(
                EngineNewPayload,
                Deneb,
                instantiate::<EngineNewPayloadV3>,
            ),
            MethodDeclaration::versioned(
                EngineGetPayload,
                Bellatrix,
                instantiate::<EngineGetPayloadV1>,
            ),
            MethodDeclaration::versioned(
                EngineGetPayload,
                Capella,
                instantiate::<EngineGetPayloadV2>,
            ),
            MethodDeclaration::versioned(
                EngineGetPayload,
                Deneb,
                instantiate::<EngineGetPayloadV3>,
            ),
            MethodDeclaration::versioned(
                EngineForkChoiceUpdated,
                Bellatrix,
                instantiate::<EngineForkChoiceUpdatedV1>,
            ),
            MethodDeclaration::versioned(
                EngineForkChoiceUpdated,
                Capella,
                instantiate::<EngineForkChoiceUpdatedV2>,
            ),
        ]
    };
}

/// The implementation a versioned method resolves to from `milestone` onwards.
#[derive(Clone)]
pub struct MethodVersion {
    pub milestone: SpecMilestone,
    pub implementation: Arc<dyn EngineJsonRpcMethod>,
}

#[derive(Clone)]
pub enum MethodEntries {
    ForkInvariant(Arc<dyn EngineJsonRpcMethod>),
    /// Strictly ascending by milestone.
    Versioned(Vec<MethodVersion>),
}

/// Every declared implementation, instantiated once against a single transport.
///
/// Resolvers share a catalog by `Arc`, so the same logical method at the same milestone yields
/// the same implementation instance regardless of which resolver was asked.
pub struct MethodCatalog {
    methods: HashMap<EngineApiMethod, MethodEntries>,
}

impl MethodCatalog {
    pub fn new(client: Arc<dyn ExecutionEngineClient>) -> Self {
        Self::from_declarations(client, &METHOD_DECLARATIONS)
    }

    /// Builds a catalog from `declarations`.
    ///
    /// # Panics
    ///
    /// If a milestone is declared twice for one method, if a method is declared both
    /// fork-invariant and versioned, if a fork-invariant method is declared twice, if a
    /// factory builds an implementation of a different method, or if any logical method is
    /// left undeclared.
    pub fn from_declarations(
        client: Arc<dyn ExecutionEngineClient>,
        declarations: &[MethodDeclaration],
    ) -> Self {
        let mut methods: HashMap<EngineApiMethod, MethodEntries> = HashMap::new();

        for declaration in declarations {
            let implementation = (declaration.factory)(client.clone());
            assert_eq!(
                implementation.method(),
                declaration.method,
                "{} declared with an implementation of another method",
                declaration.method
            );

            match (declaration.introduced_at, methods.entry(declaration.method)) {
                (None, Entry::Vacant(entry)) => {
                    entry.insert(MethodEntries::ForkInvariant(implementation));
                }
                (None, Entry::Occupied(entry)) => match entry.get() {
                    MethodEntries::ForkInvariant(_) => {
                        panic!("{} declared fork-invariant twice", declaration.method)
                    }
                    MethodEntries::Versioned(_) => panic!(
                        "{} declared both fork-invariant and versioned",
                        declaration.method
                    ),
                },
                (Some(milestone), Entry::Vacant(entry)) => {
                    entry.insert(MethodEntries::Versioned(vec![MethodVersion {
                        milestone,
                        implementation,
                    }]));
                }
                (Some(milestone), Entry::Occupied(mut entry)) => match entry.get_mut() {
                    MethodEntries::ForkInvariant(_) => panic!(
                        "{} declared both fork-invariant and versioned",
                        declaration.method
                    ),
                    MethodEntries::Versioned(versions) => {
                        assert!(
                            versions.iter().all(|version| version.milestone != milestone),
                            "{} declared twice for milestone {}",
                            declaration.method,
                            milestone
                        );
                        versions.push(MethodVersion {
                            milestone,
                            implementation,
                        });
                        versions.sort_by_key(|version| version.milestone);
                    }
                },
            }
        }

        for method in EngineApiMethod::iter() {
            assert!(
                methods.contains_key(&method),
                "{} has no declared implementation",
                method
            );
        }

        debug!(
            methods = methods.len(),
            implementations = declarations.len(),
            "Built Engine API method catalog"
        );

        Self { methods }
    }

    pub fn entries(&self, method: EngineApiMethod) -> Option<&MethodEntries> {
        self.methods.get(&method)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EngineApiMethod, &MethodEntries)> {
        self.methods.iter()
    }
}
