//! Logical Engine API methods and the versioned implementations that put them on the wire.

use crate::engine_api::client::ExecutionEngineClient;
use crate::engine_api::Error;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::{type_name, TypeId};
use std::fmt;
use std::sync::Arc;
use strum::{Display, EnumIter, IntoStaticStr};

/// Declares an implementation struct holding only its transport handle.
macro_rules! bound_method {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(derivative::Derivative)]
        #[derivative(Debug)]
        pub struct $name {
            #[derivative(Debug = "ignore")]
            client: std::sync::Arc<dyn $crate::engine_api::client::ExecutionEngineClient>,
        }

        impl $crate::engine_api::methods::BoundToClient for $name {
            fn new(
                client: std::sync::Arc<dyn $crate::engine_api::client::ExecutionEngineClient>,
            ) -> Self {
                Self { client }
            }
        }
    };
}

mod exchange_capabilities;
mod exchange_transition_configuration;
mod forkchoice_updated;
mod get_block;
mod get_payload;
mod new_payload;

pub use exchange_capabilities::EngineExchangeCapabilities;
pub use exchange_transition_configuration::EngineExchangeTransitionConfigurationV1;
pub use forkchoice_updated::{EngineForkChoiceUpdatedV1, EngineForkChoiceUpdatedV2};
pub use get_block::{EthGetBlockByHash, EthGetBlockByNumber};
pub use get_payload::{EngineGetPayloadV1, EngineGetPayloadV2, EngineGetPayloadV3};
pub use new_payload::{EngineNewPayloadV1, EngineNewPayloadV2, EngineNewPayloadV3};

/// An Engine API operation, independent of the wire version that carries it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, IntoStaticStr,
)]
pub enum EngineApiMethod {
    #[strum(serialize = "engine_newPayload")]
    EngineNewPayload,
    #[strum(serialize = "engine_getPayload")]
    EngineGetPayload,
    #[strum(serialize = "engine_forkchoiceUpdated")]
    EngineForkChoiceUpdated,
    #[strum(serialize = "engine_exchangeTransitionConfiguration")]
    EngineExchangeTransitionConfiguration,
    #[strum(serialize = "engine_exchangeCapabilities")]
    EngineExchangeCapabilities,
    #[strum(serialize = "eth_getBlockByHash")]
    EthGetBlockByHash,
    #[strum(serialize = "eth_getBlockByNumber")]
    EthGetBlockByNumber,
}

impl EngineApiMethod {
    /// The wire name without a version suffix, e.g. `engine_getPayload`.
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// The wire name of `version` of this method. Version `0` means the method is unversioned.
    pub fn versioned_name(&self, version: u8) -> String {
        if version == 0 {
            self.name().to_string()
        } else {
            format!("{}V{}", self.name(), version)
        }
    }
}

/// The Rust type a method implementation decodes its result into.
#[derive(Clone, Copy)]
pub struct ResponseType {
    id: TypeId,
    name: &'static str,
}

impl ResponseType {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// A declared response type can be handed to a caller expecting the same type, or to one
    /// expecting untyped JSON.
    pub fn is_assignable_to(&self, expected: &ResponseType) -> bool {
        self.id == expected.id || expected.id == TypeId::of::<serde_json::Value>()
    }
}

impl PartialEq for ResponseType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ResponseType {}

impl fmt::Debug for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Positional parameters handed to a method implementation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonRpcRequestParams {
    params: Vec<serde_json::Value>,
}

impl JsonRpcRequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<T: Serialize>(mut self, param: T) -> Result<Self, Error> {
        self.params.push(serde_json::to_value(param)?);
        Ok(self)
    }

    pub fn add_optional<T: Serialize>(self, param: Option<T>) -> Result<Self, Error> {
        match param {
            Some(param) => self.add(param),
            None => self.add(serde_json::Value::Null),
        }
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn required<T: DeserializeOwned>(&self, index: usize) -> Result<T, Error> {
        match self.params.get(index) {
            Some(serde_json::Value::Null) | None => Err(Error::MissingParameter { index }),
            Some(value) => serde_json::from_value(value.clone()).map_err(Into::into),
        }
    }

    pub fn optional<T: DeserializeOwned>(&self, index: usize) -> Result<Option<T>, Error> {
        match self.params.get(index) {
            Some(serde_json::Value::Null) | None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(Into::into),
        }
    }
}

/// One wire version of a logical method, bound to the transport it calls through.
#[async_trait]
pub trait EngineJsonRpcMethod: Send + Sync {
    fn method(&self) -> EngineApiMethod;

    /// `0` for methods without a version suffix.
    fn version(&self) -> u8;

    fn response_type(&self) -> ResponseType;

    /// Encodes `params` for this version, sends the request and returns the raw result.
    async fn execute(&self, params: &JsonRpcRequestParams) -> Result<serde_json::Value, Error>;

    fn versioned_name(&self) -> String {
        self.method().versioned_name(self.version())
    }
}

/// Implementations that can be constructed from a transport handle.
pub trait BoundToClient: EngineJsonRpcMethod + Sized + 'static {
    fn new(client: Arc<dyn ExecutionEngineClient>) -> Self;
}

pub type MethodFactory = fn(Arc<dyn ExecutionEngineClient>) -> Arc<dyn EngineJsonRpcMethod>;

/// A `MethodFactory` for the implementation `M`.
pub fn instantiate<M: BoundToClient>(
    client: Arc<dyn ExecutionEngineClient>,
) -> Arc<dyn EngineJsonRpcMethod> {
    Arc::new(M::new(client))
}
