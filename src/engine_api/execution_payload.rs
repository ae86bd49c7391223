use crate::engine_api::json_structures::ExecutionBlockHash;
use crate::engine_api::milestone::SpecMilestone;
use crate::engine_api::withdrawal::Withdrawal;
use crate::engine_api::Error;
use crate::serde_utils;
use ethereum_types::Address;
pub use ethereum_types::H256 as Hash256;
pub use ethereum_types::U256 as Uint256;
use serde_derive::{Deserialize, Serialize};
use superstruct::superstruct;

pub type Transaction = Vec<u8>;

/// The execution payload in the shape each Engine API version exchanges it.
///
/// `V1` is the Bellatrix payload, `V2` adds Capella withdrawals and `V3` adds the Deneb blob
/// gas fields. Untagged deserialization picks the first variant whose fields match exactly.
#[superstruct(
    variants(V1, V2, V3),
    variant_attributes(
        derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize),
        serde(rename_all = "camelCase", deny_unknown_fields),
    ),
    cast_error(ty = "Error", expr = "Error::IncorrectPayloadVersion"),
    partial_getter_error(ty = "Error", expr = "Error::IncorrectPayloadVersion")
)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub struct ExecutionPayload {
    #[superstruct(getter(copy))]
    pub parent_hash: ExecutionBlockHash,
    #[superstruct(getter(copy))]
    pub fee_recipient: Address,
    #[superstruct(getter(copy))]
    pub state_root: Hash256,
    #[superstruct(getter(copy))]
    pub receipts_root: Hash256,
    #[serde(with = "serde_utils::hex_bytes")]
    pub logs_bloom: Vec<u8>,
    #[superstruct(getter(copy))]
    pub prev_randao: Hash256,
    #[serde(with = "serde_utils::u64_hex_be")]
    #[superstruct(getter(copy))]
    pub block_number: u64,
    #[serde(with = "serde_utils::u64_hex_be")]
    #[superstruct(getter(copy))]
    pub gas_limit: u64,
    #[serde(with = "serde_utils::u64_hex_be")]
    #[superstruct(getter(copy))]
    pub gas_used: u64,
    #[serde(with = "serde_utils::u64_hex_be")]
    #[superstruct(getter(copy))]
    pub timestamp: u64,
    #[serde(with = "serde_utils::hex_bytes")]
    pub extra_data: Vec<u8>,
    #[superstruct(getter(copy))]
    pub base_fee_per_gas: Uint256,
    #[superstruct(getter(copy))]
    pub block_hash: ExecutionBlockHash,
    #[serde(with = "serde_utils::list_of_hex_bytes")]
    pub transactions: Vec<Transaction>,
    #[superstruct(only(V2, V3))]
    pub withdrawals: Vec<Withdrawal>,
    #[superstruct(only(V3), partial_getter(copy))]
    #[serde(with = "serde_utils::u64_hex_be")]
    pub blob_gas_used: u64,
    #[superstruct(only(V3), partial_getter(copy))]
    #[serde(with = "serde_utils::u64_hex_be")]
    pub excess_blob_gas: u64,
}

impl ExecutionPayload {
    /// The milestone whose Engine API methods introduced this payload shape.
    pub fn milestone(&self) -> SpecMilestone {
        match self {
            ExecutionPayload::V1(_) => SpecMilestone::Bellatrix,
            ExecutionPayload::V2(_) => SpecMilestone::Capella,
            ExecutionPayload::V3(_) => SpecMilestone::Deneb,
        }
    }
}
