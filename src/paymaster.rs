// src/paymaster.rs
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use ethers::abi::{encode, Token};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Bytes, U256};
use tracing::{debug, info};

use crate::error::PaymasterError;
use crate::hash::paymaster_hash;
use crate::types::{PaymasterApproval, SponsorshipDecision, UserOperation};

/// Default validity window length in seconds.
pub const DEFAULT_VALID_DURATION: u64 = 600;

const MAX_UINT48: u64 = (1 << 48) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityWindow {
    pub valid_until: u64,
    pub valid_after: u64,
}

impl ValidityWindow {
    /// Applies caller overrides on top of the default `[now, now + duration]`
    /// window. Both bounds must fit in a uint48 and `valid_until` must be
    /// strictly greater than `valid_after`.
    pub fn resolve(
        now: u64,
        duration: u64,
        valid_until: Option<u64>,
        valid_after: Option<u64>,
    ) -> Result<Self, PaymasterError> {
        let valid_after = valid_after.unwrap_or(now);
        let valid_until = valid_until.unwrap_or_else(|| now.saturating_add(duration));

        if valid_until > MAX_UINT48 {
            return Err(PaymasterError::InvalidValidityWindow {
                field: "validUntil",
                reason: "validUntil must fit in 48 bits".to_string(),
            });
        }
        if valid_after > MAX_UINT48 {
            return Err(PaymasterError::InvalidValidityWindow {
                field: "validAfter",
                reason: "validAfter must fit in 48 bits".to_string(),
            });
        }
        if valid_until <= valid_after {
            return Err(PaymasterError::InvalidValidityWindow {
                field: "validUntil",
                reason: format!(
                    "validUntil ({valid_until}) must be greater than validAfter ({valid_after})"
                ),
            });
        }

        Ok(Self {
            valid_until,
            valid_after,
        })
    }
}

pub fn unix_now() -> Result<u64, PaymasterError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| PaymasterError::Clock(e.to_string()))
}

/// Off-chain signer for the verifying paymaster. Built once at startup and
/// shared by reference; the key never changes afterwards.
pub struct Paymaster {
    wallet: LocalWallet,
    paymaster_address: Option<Address>,
    chain_id: u64,
    valid_duration: u64,
}

impl Paymaster {
    pub fn new(
        private_key: &str,
        chain_id: u64,
        paymaster_address: Option<Address>,
    ) -> Result<Self> {
        let wallet = private_key.parse::<LocalWallet>()?.with_chain_id(chain_id);

        info!("Initialized paymaster signer with address: {:?}", wallet.address());
        match paymaster_address {
            Some(address) => info!("Paymaster contract: {:?}", address),
            None => info!("No paymaster contract configured, signing is disabled"),
        }

        Ok(Self {
            wallet,
            paymaster_address,
            chain_id,
            valid_duration: DEFAULT_VALID_DURATION,
        })
    }

    pub fn signer_address(&self) -> Address {
        self.wallet.address()
    }

    pub fn paymaster_address(&self) -> Option<Address> {
        self.paymaster_address
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Resolves the validity window for a request against the current time.
    pub fn window(
        &self,
        valid_until: Option<u64>,
        valid_after: Option<u64>,
    ) -> Result<ValidityWindow, PaymasterError> {
        ValidityWindow::resolve(unix_now()?, self.valid_duration, valid_until, valid_after)
    }

    /// Signs a user operation for sponsorship within `window`.
    pub async fn sign_user_operation(
        &self,
        user_op: &UserOperation,
        window: ValidityWindow,
    ) -> Result<PaymasterApproval, PaymasterError> {
        let paymaster = self
            .paymaster_address
            .ok_or(PaymasterError::PaymasterNotConfigured)?;

        let hash = paymaster_hash(user_op, self.chain_id, paymaster, window);
        debug!("Paymaster hash for sender {:?}: {:?}", user_op.sender, hash);

        // EIP-191 personal message over the raw 32-byte hash
        let signature = self
            .wallet
            .sign_message(hash.as_bytes())
            .await
            .map_err(|e| PaymasterError::SigningFailed(e.to_string()))?;
        let signature = Bytes::from(signature.to_vec());

        let paymaster_and_data = encode_paymaster_and_data(paymaster, window, &signature);

        info!("Signed paymaster data for sender {:?}", user_op.sender);

        Ok(PaymasterApproval {
            paymaster_and_data,
            paymaster,
            valid_until: window.valid_until,
            valid_after: window.valid_after,
            signature,
        })
    }

    /// Sponsorship policy. Every operation is currently eligible.
    pub fn sponsorship(&self, user_op: &UserOperation) -> SponsorshipDecision {
        debug!("Sponsorship check for sender {:?}", user_op.sender);
        SponsorshipDecision {
            eligible: true,
            reason: "Operation approved for sponsorship".to_string(),
            paymaster: self.paymaster_address,
        }
    }
}

/// `abi.encode(address paymaster, uint48 validUntil, uint48 validAfter, bytes signature)`
pub fn encode_paymaster_and_data(
    paymaster: Address,
    window: ValidityWindow,
    signature: &Bytes,
) -> Bytes {
    Bytes::from(encode(&[
        Token::Address(paymaster),
        Token::Uint(U256::from(window.valid_until)),
        Token::Uint(U256::from(window.valid_after)),
        Token::Bytes(signature.to_vec()),
    ]))
}
