// src/gas.rs
use std::sync::Arc;

use ethers::types::U256;
use serde::Serialize;

use crate::chain::ChainClient;
use crate::error::ChainError;
use crate::types::as_decimal;

// Placeholder limits. Nothing here simulates execution; a real deployment
// should ask the bundler (eth_estimateUserOperationGas) instead.
pub const CALL_GAS_LIMIT: u64 = 100_000;
pub const VERIFICATION_GAS_LIMIT: u64 = 150_000;
pub const PRE_VERIFICATION_GAS: u64 = 21_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GasEstimate {
    #[serde(serialize_with = "as_decimal")]
    pub call_gas_limit: U256,
    #[serde(serialize_with = "as_decimal")]
    pub verification_gas_limit: U256,
    #[serde(serialize_with = "as_decimal")]
    pub pre_verification_gas: U256,
    #[serde(serialize_with = "as_decimal")]
    pub max_fee_per_gas: U256,
    #[serde(serialize_with = "as_decimal")]
    pub max_priority_fee_per_gas: U256,
}

impl GasEstimate {
    /// Fixed limits, fees priced off the current gas price with the priority
    /// fee at one tenth of it.
    pub fn from_gas_price(gas_price: U256) -> Self {
        Self {
            call_gas_limit: U256::from(CALL_GAS_LIMIT),
            verification_gas_limit: U256::from(VERIFICATION_GAS_LIMIT),
            pre_verification_gas: U256::from(PRE_VERIFICATION_GAS),
            max_fee_per_gas: gas_price,
            max_priority_fee_per_gas: gas_price / 10,
        }
    }

    pub fn total_gas(&self) -> U256 {
        self.call_gas_limit + self.verification_gas_limit + self.pre_verification_gas
    }
}

pub struct GasEstimator {
    chain: Arc<dyn ChainClient>,
}

impl GasEstimator {
    pub fn new(chain: Arc<dyn ChainClient>) -> Self {
        Self { chain }
    }

    pub async fn estimate(&self) -> Result<GasEstimate, ChainError> {
        let gas_price = self.chain.gas_price().await?;
        Ok(GasEstimate::from_gas_price(gas_price))
    }
}
