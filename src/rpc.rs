// src/rpc.rs
use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::{ServerBuilder, ServerHandle};
use jsonrpsee::types::error::{ErrorObject, ErrorObjectOwned, INVALID_PARAMS_CODE};
use tracing::{debug, error, info};

use crate::error::PaymasterError;
use crate::paymaster::Paymaster;
use crate::types::{PaymasterResponse, UserOperation};

const PAYMASTER_ERROR_CODE: i32 = -32000;

#[rpc(server, namespace = "pm")]
pub trait PaymasterRpc {
    /// Signs `user_op` for sponsorship. The validity window defaults to
    /// `[now, now + 600]`; either bound may be overridden.
    #[method(name = "sponsorUserOperation")]
    async fn sponsor(
        &self,
        user_op: UserOperation,
        valid_until: Option<u64>,
        valid_after: Option<u64>,
    ) -> RpcResult<PaymasterResponse>;
}

pub struct PaymasterRpcImpl {
    paymaster: Arc<Paymaster>,
}

impl PaymasterRpcImpl {
    pub fn new(paymaster: Arc<Paymaster>) -> Self {
        Self { paymaster }
    }
}

fn rpc_err(err: PaymasterError) -> ErrorObjectOwned {
    let code = match err {
        PaymasterError::InvalidValidityWindow { .. } => INVALID_PARAMS_CODE,
        _ => PAYMASTER_ERROR_CODE,
    };
    ErrorObject::owned(code, format!("Paymaster error: {}", err), None::<()>)
}

#[async_trait]
impl PaymasterRpcServer for PaymasterRpcImpl {
    async fn sponsor(
        &self,
        user_op: UserOperation,
        valid_until: Option<u64>,
        valid_after: Option<u64>,
    ) -> RpcResult<PaymasterResponse> {
        debug!("Received sponsor request for sender: {:?}", user_op.sender);

        let window = self
            .paymaster
            .window(valid_until, valid_after)
            .map_err(rpc_err)?;
        match self.paymaster.sign_user_operation(&user_op, window).await {
            Ok(approval) => {
                info!("Successfully sponsored operation for {:?}", user_op.sender);
                Ok(PaymasterResponse {
                    paymaster_and_data: approval.paymaster_and_data,
                })
            }
            Err(e) => {
                error!("Failed to sponsor operation: {}", e);
                Err(rpc_err(e))
            }
        }
    }
}

pub async fn start_server(
    server_addr: SocketAddr,
    paymaster: Arc<Paymaster>,
) -> anyhow::Result<ServerHandle> {
    let server = ServerBuilder::default().build(server_addr).await?;
    let server_handle = server.start(PaymasterRpcImpl::new(paymaster).into_rpc());

    info!("Paymaster JSON-RPC server listening on {}", server_addr);
    Ok(server_handle)
}
