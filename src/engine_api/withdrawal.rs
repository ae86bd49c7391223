use crate::serde_utils;
use ethereum_types::Address;
use serde_derive::{Deserialize, Serialize};

/// A validator withdrawal processed by the execution layer, as carried in Capella payloads.
#[derive(Debug, Default, PartialEq, Eq, Hash, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    #[serde(with = "serde_utils::u64_hex_be")]
    pub index: u64,
    #[serde(with = "serde_utils::u64_hex_be")]
    pub validator_index: u64,
    pub address: Address,
    /// Gwei.
    #[serde(with = "serde_utils::u64_hex_be")]
    pub amount: u64,
}
