// src/hash.rs
//! Canonical hashes over user operations.
//!
//! Two different hashes live here and must not be mixed up:
//! [`paymaster_hash`] is what the verifying paymaster signs and checks
//! on-chain, while [`submission_hash`] is only the local identifier handed
//! back by the submission endpoint.

use ethers::abi::{encode, Token};
use ethers::types::{Address, Bytes, H256, U256};
use ethers::utils::keccak256;

use crate::paymaster::ValidityWindow;
use crate::types::UserOperation;

/// Hash signed by the paymaster. Field order matches the verifying
/// paymaster contract's `getHash`:
/// `(sender, nonce, keccak(initCode), keccak(callData), callGasLimit,
/// verificationGasLimit, preVerificationGas, maxFeePerGas,
/// maxPriorityFeePerGas, chainId, paymaster, validUntil, validAfter)`.
pub fn paymaster_hash(
    user_op: &UserOperation,
    chain_id: u64,
    paymaster: Address,
    window: ValidityWindow,
) -> H256 {
    let tokens = [
        Token::Address(user_op.sender),
        Token::Uint(user_op.nonce),
        Token::FixedBytes(keccak256(&user_op.init_code).to_vec()),
        Token::FixedBytes(keccak256(&user_op.call_data).to_vec()),
        Token::Uint(user_op.call_gas_limit),
        Token::Uint(user_op.verification_gas_limit),
        Token::Uint(user_op.pre_verification_gas),
        Token::Uint(user_op.max_fee_per_gas),
        Token::Uint(user_op.max_priority_fee_per_gas),
        Token::Uint(U256::from(chain_id)),
        Token::Address(paymaster),
        // uint48 values are still padded to a full word by abi.encode
        Token::Uint(U256::from(window.valid_until)),
        Token::Uint(U256::from(window.valid_after)),
    ];

    H256::from(keccak256(encode(&tokens)))
}

/// `keccak256(abi.encode(sender, nonce, callData))`, the identifier returned
/// for locally accepted operations.
pub fn submission_hash(sender: Address, nonce: U256, call_data: &Bytes) -> H256 {
    let tokens = [
        Token::Address(sender),
        Token::Uint(nonce),
        Token::Bytes(call_data.to_vec()),
    ];

    H256::from(keccak256(encode(&tokens)))
}
