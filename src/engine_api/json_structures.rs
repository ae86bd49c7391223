use crate::engine_api::execution_payload::{ExecutionPayload, ExecutionPayloadV3};
use crate::engine_api::withdrawal::Withdrawal;
use crate::engine_api::Error;
use crate::serde_utils;
use ethereum_types::{Address, H256, H64, U256};
use serde_derive::{Deserialize, Serialize};
use superstruct::superstruct;

pub type ExecutionBlockHash = H256;
pub type PayloadId = H64;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonRequestBody<'a> {
    pub jsonrpc: &'a str,
    pub method: &'a str,
    pub params: serde_json::Value,
    pub id: serde_json::Value,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonResponseBody {
    pub jsonrpc: String,
    #[serde(default)]
    pub error: Option<JsonError>,
    #[serde(default)]
    pub result: serde_json::Value,
    pub id: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkchoiceState {
    pub head_block_hash: ExecutionBlockHash,
    pub safe_block_hash: ExecutionBlockHash,
    pub finalized_block_hash: ExecutionBlockHash,
}

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
pub struct PayloadAttributes {
    #[serde(with = "serde_utils::u64_hex_be")]
    #[superstruct(getter(copy))]
    pub timestamp: u64,
    #[superstruct(getter(copy))]
    pub prev_randao: H256,
    #[superstruct(getter(copy))]
    pub suggested_fee_recipient: Address,
    #[superstruct(only(V2, V3))]
    pub withdrawals: Vec<Withdrawal>,
    #[superstruct(only(V3), partial_getter(copy))]
    pub parent_beacon_block_root: H256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayloadStatusV1Status {
    Valid,
    Invalid,
    Syncing,
    Accepted,
    InvalidBlockHash,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadStatusV1 {
    pub status: PayloadStatusV1Status,
    pub latest_valid_hash: Option<ExecutionBlockHash>,
    pub validation_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkchoiceUpdatedResult {
    pub payload_status: PayloadStatusV1,
    pub payload_id: Option<PayloadId>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobsBundleV1 {
    #[serde(with = "serde_utils::list_of_hex_bytes")]
    pub commitments: Vec<Vec<u8>>,
    #[serde(with = "serde_utils::list_of_hex_bytes")]
    pub proofs: Vec<Vec<u8>>,
    #[serde(with = "serde_utils::list_of_hex_bytes")]
    pub blobs: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPayloadV2Response {
    pub execution_payload: ExecutionPayload,
    pub block_value: U256,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPayloadV3Response {
    pub execution_payload: ExecutionPayloadV3,
    pub block_value: U256,
    pub blobs_bundle: BlobsBundleV1,
    #[serde(default)]
    pub should_override_builder: bool,
}

/// A `engine_getPayload` result normalised across versions.
#[derive(Debug, Clone, PartialEq)]
pub struct GetPayloadResponse {
    pub execution_payload: ExecutionPayload,
    pub block_value: U256,
    pub blobs_bundle: Option<BlobsBundleV1>,
    pub should_override_builder: bool,
}

impl From<crate::engine_api::ExecutionPayloadV1> for GetPayloadResponse {
    fn from(payload: crate::engine_api::ExecutionPayloadV1) -> Self {
        Self {
            execution_payload: ExecutionPayload::V1(payload),
            // V1 engines report no block value, so treat it as zero.
            block_value: U256::zero(),
            blobs_bundle: None,
            should_override_builder: false,
        }
    }
}

impl From<GetPayloadV2Response> for GetPayloadResponse {
    fn from(response: GetPayloadV2Response) -> Self {
        Self {
            execution_payload: response.execution_payload,
            block_value: response.block_value,
            blobs_bundle: None,
            should_override_builder: false,
        }
    }
}

impl From<GetPayloadV3Response> for GetPayloadResponse {
    fn from(response: GetPayloadV3Response) -> Self {
        Self {
            execution_payload: ExecutionPayload::V3(response.execution_payload),
            block_value: response.block_value,
            blobs_bundle: Some(response.blobs_bundle),
            should_override_builder: response.should_override_builder,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionConfigurationV1 {
    pub terminal_total_difficulty: U256,
    pub terminal_block_hash: ExecutionBlockHash,
    #[serde(with = "serde_utils::u64_hex_be")]
    pub terminal_block_number: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionBlock {
    #[serde(rename = "hash")]
    pub block_hash: ExecutionBlockHash,
    #[serde(rename = "number", with = "serde_utils::u64_hex_be")]
    pub block_number: u64,
    pub parent_hash: ExecutionBlockHash,
    pub total_difficulty: U256,
    #[serde(with = "serde_utils::u64_hex_be")]
    pub timestamp: u64,
}

/// Used to identify a block when querying `eth_getBlockByNumber`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockByNumberQuery {
    Number(#[serde(with = "serde_utils::u64_hex_be")] u64),
    Tag(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_status_uses_screaming_snake_case() {
        let status: PayloadStatusV1 = serde_json::from_value(json!({
            "status": "INVALID_BLOCK_HASH",
            "latestValidHash": null,
            "validationError": "bad hash"
        }))
        .unwrap();
        assert_eq!(status.status, PayloadStatusV1Status::InvalidBlockHash);
        assert_eq!(status.validation_error.as_deref(), Some("bad hash"));
    }

    #[test]
    fn payload_attributes_pick_variant_from_fields() {
        let v1 = json!({
            "timestamp": "0x5",
            "prevRandao": format!("{:?}", H256::zero()),
            "suggestedFeeRecipient": format!("{:?}", Address::zero()),
        });
        let attributes: PayloadAttributes = serde_json::from_value(v1.clone()).unwrap();
        assert!(matches!(attributes, PayloadAttributes::V1(_)));
        assert_eq!(attributes.timestamp(), 5);

        let mut v3 = v1;
        v3["withdrawals"] = json!([]);
        v3["parentBeaconBlockRoot"] = json!(format!("{:?}", H256::repeat_byte(9)));
        let attributes: PayloadAttributes = serde_json::from_value(v3).unwrap();
        assert_eq!(
            attributes.parent_beacon_block_root().unwrap(),
            H256::repeat_byte(9)
        );
    }

    #[test]
    fn block_query_serializes_number_as_quantity() {
        assert_eq!(
            serde_json::to_value(BlockByNumberQuery::Number(255)).unwrap(),
            json!("0xff")
        );
        assert_eq!(
            serde_json::to_value(BlockByNumberQuery::Tag("latest".to_string())).unwrap(),
            json!("latest")
        );
    }

    #[test]
    fn execution_block_ignores_extra_fields() {
        let block: ExecutionBlock = serde_json::from_value(json!({
            "hash": format!("{:?}", H256::repeat_byte(1)),
            "number": "0x2a",
            "parentHash": format!("{:?}", H256::zero()),
            "totalDifficulty": "0x0",
            "timestamp": "0x10",
            "miner": format!("{:?}", Address::zero()),
        }))
        .unwrap();
        assert_eq!(block.block_number, 42);
        assert_eq!(block.block_hash, H256::repeat_byte(1));
    }
}
