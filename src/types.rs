// src/types.rs
use ethers::types::{Address, Bytes, H256, U256};
use ethers::utils::to_checksum;
use serde::{Deserialize, Serialize};

/// Simplified (v0.6-shaped) user operation as accepted by the signing and
/// submission paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
    #[serde(serialize_with = "as_checksum_addr")]
    pub sender: Address,
    #[serde(default)]
    pub nonce: U256,
    #[serde(default)]
    pub init_code: Bytes,
    #[serde(default)]
    pub call_data: Bytes,
    #[serde(default)]
    pub call_gas_limit: U256,
    #[serde(default)]
    pub verification_gas_limit: U256,
    #[serde(default)]
    pub pre_verification_gas: U256,
    #[serde(default)]
    pub max_fee_per_gas: U256,
    #[serde(default)]
    pub max_priority_fee_per_gas: U256,
    #[serde(default)]
    pub paymaster_and_data: Bytes,
    #[serde(default)]
    pub signature: Bytes,
}

/// Output of the paymaster signer, returned as-is from `/api/paymaster/sign`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymasterApproval {
    pub paymaster_and_data: Bytes,
    #[serde(serialize_with = "as_checksum_addr")]
    pub paymaster: Address,
    pub valid_until: u64,
    pub valid_after: u64,
    pub signature: Bytes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymasterResponse {
    pub paymaster_and_data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SponsorshipDecision {
    pub eligible: bool,
    pub reason: String,
    #[serde(serialize_with = "as_checksum_addr_opt")]
    pub paymaster: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReceipt {
    pub success: bool,
    pub block_number: u64,
    pub transaction_hash: H256,
}

/// Converts address to checksum address
pub fn as_checksum_addr<S>(val: &Address, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_str(&to_checksum(val, None))
}

pub fn as_checksum_addr_opt<S>(val: &Option<Address>, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match val {
        Some(addr) => s.serialize_str(&to_checksum(addr, None)),
        None => s.serialize_none(),
    }
}

/// Serializes U256 as a base-10 string
pub fn as_decimal<S>(val: &U256, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_str(&val.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_operation_rpc_shape() {
        let op: UserOperation = serde_json::from_str(
            r#"{
                "sender": "0x9c5754De1443984659E1b3a8d1931D83475ba29C",
                "nonce": "0x1",
                "callData": "0xdeadbeef",
                "maxFeePerGas": "0x3b9aca00"
            }"#,
        )
        .unwrap();

        assert_eq!(op.nonce, U256::one());
        assert_eq!(op.call_data.as_ref(), &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(op.max_fee_per_gas, U256::from(1_000_000_000u64));
        assert!(op.init_code.is_empty());

        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value["sender"], "0x9c5754De1443984659E1b3a8d1931D83475ba29C");
    }

    #[test]
    fn sponsorship_without_paymaster_serializes_null() {
        let decision = SponsorshipDecision {
            eligible: true,
            reason: "ok".to_string(),
            paymaster: None,
        };
        let value = serde_json::to_value(decision).unwrap();
        assert!(value["paymaster"].is_null());
    }
}
