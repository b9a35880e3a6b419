// src/config.rs
use std::net::SocketAddr;

use anyhow::anyhow;
use clap::Parser;
use ethers::types::Address;
use tracing::Level;

use crate::account::AddressSource;

/// Every option can also come from the environment (or a `.env` file).
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    #[clap(long, env = "HTTP_ADDR", default_value = "127.0.0.1:3001")]
    pub http_addr: SocketAddr,

    /// Serve `pm_sponsorUserOperation` over JSON-RPC on this address.
    #[clap(long, env = "RPC_SERVER_ADDR")]
    pub rpc_server_addr: Option<SocketAddr>,

    #[clap(long, env = "CHAIN_ID", default_value_t = 11_155_111)]
    pub chain_id: u64,

    #[clap(long, env = "RPC_URL")]
    pub eth_rpc_url: String,

    #[clap(long, env = "BUNDLER_URL")]
    pub bundler_url: Option<String>,

    /// Leave unset (or zero) to run in demo mode.
    #[clap(long, env = "FACTORY_ADDRESS")]
    pub factory_address: Option<Address>,

    #[clap(long, env = "PAYMASTER_ADDRESS")]
    pub paymaster_address: Option<Address>,

    #[clap(long, env = "PAYMASTER_SIGNER_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    #[clap(long, env = "CORS_ORIGIN", default_value = "http://localhost:3000")]
    pub cors_origin: String,

    #[clap(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: Level,
}

impl Args {
    pub fn address_source(&self) -> AddressSource {
        AddressSource::from_factory(self.factory_address)
    }

    /// The signer key is mandatory; the process refuses to start without it.
    pub fn signer_key(&self) -> anyhow::Result<&str> {
        self.private_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow!("PAYMASTER_SIGNER_PRIVATE_KEY not set"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["paymaster-signer", "--eth-rpc-url", "http://localhost:8545"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn zero_factory_means_demo_mode() {
        let args = parse(&[
            "--factory-address",
            "0x0000000000000000000000000000000000000000",
        ]);
        assert!(args.address_source().is_demo());

        let args = parse(&[
            "--factory-address",
            "0x9406Cc6185a346906296840746125a0E44976454",
        ]);
        assert!(!args.address_source().is_demo());
    }

    #[test]
    fn empty_signer_key_is_rejected() {
        let args = parse(&["--private-key", ""]);
        assert!(args.signer_key().is_err());

        let args = parse(&["--private-key", "0xabc"]);
        assert_eq!(args.signer_key().unwrap(), "0xabc");
    }

    #[test]
    fn parses_log_level_and_addresses() {
        let args = parse(&["--log-level", "debug", "--http-addr", "0.0.0.0:8080"]);
        assert_eq!(args.log_level, Level::DEBUG);
        assert_eq!(args.http_addr.port(), 8080);
    }
}
