use std::fmt;

pub mod auth;
pub mod catalog;
pub mod client;
pub mod execution_payload;
pub mod fork_schedule;
pub mod handler;
pub mod http;
pub mod json_structures;
pub mod methods;
pub mod milestone;
pub mod resolver;
pub mod sensitive_url;
pub mod withdrawal;

pub use catalog::{MethodCatalog, MethodDeclaration, MethodEntries, MethodVersion};
pub use client::ExecutionEngineClient;
pub use ethereum_types::{Address, H256 as Hash256, H64, U256 as Uint256};
pub use execution_payload::{
    ExecutionPayload, ExecutionPayloadV1, ExecutionPayloadV2, ExecutionPayloadV3,
};
pub use fork_schedule::{ForkSchedule, ForkScheduleConfig, MilestoneProvider, Slot};
pub use handler::ExecutionClientHandler;
pub use json_structures::*;
pub use methods::{EngineApiMethod, EngineJsonRpcMethod, JsonRpcRequestParams, ResponseType};
pub use milestone::SpecMilestone;
pub use resolver::{EngineMethodHandle, MilestoneBasedMethodsResolver, MilestoneMethodTable};

pub const LATEST_TAG: &str = "latest";

#[derive(Debug)]
pub enum Error {
    Reqwest(reqwest::Error),
    Auth(auth::Error),
    Json(serde_json::Error),
    ServerMessage { code: i64, message: String },
    Eip155Failure,
    IsSyncing,
    MissingParameter { index: usize },
    IncorrectPayloadVersion,
    InvalidForkSchedule(String),
    /// No implementation of the method applies at the milestone, either because the method
    /// was introduced later or because the resolver's network does not reach the milestone.
    UnsupportedForMilestone {
        method: &'static str,
        milestone: SpecMilestone,
    },
    ResponseTypeMismatch {
        method: String,
        declared: &'static str,
        expected: &'static str,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Reqwest(e) => write!(f, "Request failed: {}", e),
            Error::Auth(e) => write!(f, "Authentication failed: {:?}", e),
            Error::Json(e) => write!(f, "Malformed JSON: {}", e),
            Error::ServerMessage { code, message } => {
                write!(f, "Server error {}: {}", code, message)
            }
            Error::Eip155Failure => write!(f, "Not synced past EIP-155"),
            Error::IsSyncing => write!(f, "Execution engine is syncing"),
            Error::MissingParameter { index } => {
                write!(f, "Missing required parameter at index {}", index)
            }
            Error::IncorrectPayloadVersion => write!(f, "Incorrect payload version"),
            Error::InvalidForkSchedule(reason) => write!(f, "Invalid fork schedule: {}", reason),
            Error::UnsupportedForMilestone { method, milestone } => write!(
                f,
                "Can't find method with name {} for milestone {}",
                method, milestone
            ),
            Error::ResponseTypeMismatch {
                method,
                declared,
                expected,
            } => write!(
                f,
                "Method {} returns {} which is not assignable to {}",
                method, declared, expected
            ),
        }
    }
}

impl std::error::Error for Error {}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Reqwest(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl From<auth::Error> for Error {
    fn from(e: auth::Error) -> Self {
        Error::Auth(e)
    }
}
