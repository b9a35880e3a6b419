// src/userop.rs
//! Local-mode submission. Operations are hashed, logged and reported as
//! included straight away; nothing is relayed to a bundler.

use std::sync::Arc;

use ethers::types::H256;
use serde::Serialize;
use tracing::{debug, info};

use crate::chain::ChainClient;
use crate::error::ChainError;
use crate::hash::submission_hash;
use crate::types::{ExecutionReceipt, UserOperation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserOperationStatus {
    Submitted,
    Included,
}

impl UserOperationStatus {
    /// The only transition local mode knows: `submitted -> included`.
    /// `included` is terminal.
    pub fn advance(self) -> Self {
        match self {
            UserOperationStatus::Submitted | UserOperationStatus::Included => {
                UserOperationStatus::Included
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub user_op_hash: H256,
    pub status: UserOperationStatus,
    pub message: String,
    /// Mock: same value as `user_op_hash`.
    pub transaction_hash: H256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationReceipt {
    pub user_op_hash: H256,
    pub status: UserOperationStatus,
    pub message: String,
    pub receipt: ExecutionReceipt,
}

pub struct LocalSubmitter {
    chain: Arc<dyn ChainClient>,
}

impl LocalSubmitter {
    pub fn new(chain: Arc<dyn ChainClient>) -> Self {
        Self { chain }
    }

    pub fn submit(&self, user_op: &UserOperation) -> SubmissionReceipt {
        let user_op_hash = submission_hash(user_op.sender, user_op.nonce, &user_op.call_data);

        info!("UserOp submitted: {:?}", user_op_hash);
        debug!("UserOp details: {:?}", user_op);

        SubmissionReceipt {
            user_op_hash,
            status: UserOperationStatus::Submitted.advance(),
            message: "UserOperation accepted (local mode)".to_string(),
            transaction_hash: user_op_hash,
        }
    }

    /// Synthetic receipt stamped with the current block number.
    pub async fn receipt(&self, user_op_hash: H256) -> Result<OperationReceipt, ChainError> {
        info!("Checking UserOp receipt for hash: {:?}", user_op_hash);
        let block_number = self.chain.block_number().await?;

        Ok(OperationReceipt {
            user_op_hash,
            status: UserOperationStatus::Included,
            message: "UserOperation executed successfully (local mode)".to_string(),
            receipt: ExecutionReceipt {
                success: true,
                block_number,
                transaction_hash: user_op_hash,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockChainClient;
    use ethers::types::U256;

    fn user_op() -> UserOperation {
        UserOperation {
            sender: "0x1111111111111111111111111111111111111111".parse().unwrap(),
            nonce: U256::from(3),
            call_data: "0xdeadbeef".parse().unwrap(),
            signature: "0x01".parse().unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn status_moves_to_included_and_stays() {
        let included = UserOperationStatus::Submitted.advance();
        assert_eq!(included, UserOperationStatus::Included);
        assert_eq!(included.advance(), UserOperationStatus::Included);
        assert_eq!(serde_json::to_value(included).unwrap(), "included");
    }

    #[test]
    fn submission_is_included_immediately() {
        let submitter = LocalSubmitter::new(Arc::new(MockChainClient::new()));
        let receipt = submitter.submit(&user_op());

        assert_eq!(receipt.status, UserOperationStatus::Included);
        assert_eq!(receipt.transaction_hash, receipt.user_op_hash);
        assert_eq!(
            receipt.user_op_hash,
            submission_hash(user_op().sender, user_op().nonce, &user_op().call_data)
        );
    }

    #[tokio::test]
    async fn receipt_uses_current_block() {
        let mut chain = MockChainClient::new();
        chain.expect_block_number().times(1).returning(|| Ok(4_242));

        let hash = H256::repeat_byte(0xab);
        let receipt = LocalSubmitter::new(Arc::new(chain)).receipt(hash).await.unwrap();

        assert_eq!(receipt.receipt.block_number, 4_242);
        assert!(receipt.receipt.success);
        assert_eq!(receipt.user_op_hash, hash);

        let value = serde_json::to_value(&receipt).unwrap();
        assert_eq!(value["status"], "included");
        assert_eq!(value["receipt"]["blockNumber"], 4_242);
    }
}
