// src/account.rs
use std::sync::Arc;

use ethers::abi::{encode, Token};
use ethers::types::{Address, U256};
use ethers::utils::keccak256;
use tracing::info;

use crate::chain::ChainClient;
use crate::error::ChainError;

/// Where counterfactual account addresses come from. Chosen once from
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressSource {
    OnChainFactory(Address),
    /// Demo mode: no factory is deployed, addresses are simulated.
    DeterministicFallback,
}

impl AddressSource {
    /// An absent or zero factory address selects the fallback.
    pub fn from_factory(factory: Option<Address>) -> Self {
        match factory {
            Some(factory) if !factory.is_zero() => AddressSource::OnChainFactory(factory),
            _ => AddressSource::DeterministicFallback,
        }
    }

    pub fn factory(&self) -> Option<Address> {
        match self {
            AddressSource::OnChainFactory(factory) => Some(*factory),
            AddressSource::DeterministicFallback => None,
        }
    }

    pub fn is_demo(&self) -> bool {
        matches!(self, AddressSource::DeterministicFallback)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedAddress {
    pub address: Address,
    pub demo_mode: bool,
}

/// Last 20 bytes of `keccak256(abi.encode(owner, salt))`.
pub fn demo_address(owner: Address, salt: U256) -> Address {
    let hash = keccak256(encode(&[Token::Address(owner), Token::Uint(salt)]));
    Address::from_slice(&hash[12..])
}

pub struct AccountResolver {
    chain: Arc<dyn ChainClient>,
    source: AddressSource,
}

impl AccountResolver {
    pub fn new(chain: Arc<dyn ChainClient>, source: AddressSource) -> Self {
        Self { chain, source }
    }

    pub fn source(&self) -> AddressSource {
        self.source
    }

    pub async fn derive(&self, owner: Address, salt: U256) -> Result<DerivedAddress, ChainError> {
        match self.source {
            AddressSource::OnChainFactory(factory) => {
                let address = self.chain.factory_address(factory, owner, salt).await?;
                info!(
                    "Computed counterfactual address for owner {:?}, salt {}: {:?}",
                    owner, salt, address
                );
                Ok(DerivedAddress {
                    address,
                    demo_mode: false,
                })
            }
            AddressSource::DeterministicFallback => {
                let address = demo_address(owner, salt);
                info!(
                    "[DEMO MODE] Computed counterfactual address for owner {:?}, salt {}: {:?}",
                    owner, salt, address
                );
                Ok(DerivedAddress {
                    address,
                    demo_mode: true,
                })
            }
        }
    }

    /// Empty bytecode means the account has not been deployed yet.
    pub async fn is_deployed(&self, address: Address) -> Result<bool, ChainError> {
        let code = self.chain.get_code(address).await?;
        Ok(!code.is_empty())
    }

    pub async fn balance(&self, address: Address) -> Result<U256, ChainError> {
        self.chain.get_balance(address).await
    }
}

/// Formats a wei amount as ether rounded to six decimals, e.g. `"1.500000 ETH"`.
pub fn format_balance(wei: U256) -> String {
    let micro_unit = U256::exp10(12);
    let micro = (wei + micro_unit / 2) / micro_unit;
    let million = U256::from(1_000_000u64);
    format!("{}.{:06} ETH", micro / million, (micro % million).as_u64())
}
