// src/chain.rs
use std::sync::Arc;

use async_trait::async_trait;
use ethers::prelude::*;
use tracing::debug;

use crate::error::ChainError;

abigen!(
    SimpleAccountFactory,
    r#"[
        function getAddress(address owner, uint256 salt) view returns (address)
    ]"#
);

/// Read-only view of the chain the service needs. Implemented over an
/// ethers provider in production and mocked in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainClient: Send + Sync + 'static {
    async fn get_code(&self, address: Address) -> Result<Bytes, ChainError>;

    async fn get_balance(&self, address: Address) -> Result<U256, ChainError>;

    async fn gas_price(&self) -> Result<U256, ChainError>;

    async fn block_number(&self) -> Result<u64, ChainError>;

    /// Calls `getAddress(owner, salt)` on the account factory.
    async fn factory_address(
        &self,
        factory: Address,
        owner: Address,
        salt: U256,
    ) -> Result<Address, ChainError>;
}

pub struct EthersChainClient {
    client: Arc<Provider<Http>>,
}

impl EthersChainClient {
    pub fn new(eth_rpc_url: &str) -> anyhow::Result<Self> {
        let provider = Provider::<Http>::try_from(eth_rpc_url)?;
        Ok(Self {
            client: Arc::new(provider),
        })
    }
}

fn provider_err(e: ProviderError) -> ChainError {
    ChainError::Provider(e.to_string())
}

#[async_trait]
impl ChainClient for EthersChainClient {
    async fn get_code(&self, address: Address) -> Result<Bytes, ChainError> {
        self.client.get_code(address, None).await.map_err(provider_err)
    }

    async fn get_balance(&self, address: Address) -> Result<U256, ChainError> {
        self.client.get_balance(address, None).await.map_err(provider_err)
    }

    async fn gas_price(&self) -> Result<U256, ChainError> {
        self.client.get_gas_price().await.map_err(provider_err)
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        let number = self.client.get_block_number().await.map_err(provider_err)?;
        Ok(number.as_u64())
    }

    async fn factory_address(
        &self,
        factory: Address,
        owner: Address,
        salt: U256,
    ) -> Result<Address, ChainError> {
        debug!("Calling getAddress({:?}, {}) on factory {:?}", owner, salt, factory);
        SimpleAccountFactory::new(factory, self.client.clone())
            .get_address(owner, salt)
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))
    }
}
