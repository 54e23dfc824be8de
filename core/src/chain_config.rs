use std::convert::TryFrom;
use std::path::Path;
use std::time::Duration;

use ergo_lib::ergo_chain_types::Digest32;
use ergo_lib::ergotree_ir::chain::address::AddressEncoderError;
use ergo_lib::ergotree_ir::chain::address::NetworkAddress;
use ergo_lib::ergotree_ir::chain::ergo_box::box_value::BoxValue;
use ergo_lib::ergotree_ir::chain::token::Token;
use ergo_lib::ergotree_ir::chain::token::TokenAmount;
use ergo_lib::ergotree_ir::chain::token::TokenId;
use log::LevelFilter;
use reqwest::Url;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::chain_planner::ChainParameters;
use crate::chain_types::HopCount;
use crate::chain_types::Network;
use crate::explorer_api::explorer_url::default_explorer_api_url;
use crate::explorer_api::explorer_url::default_explorer_url;
use crate::serde::ChainConfigSerde;
use crate::transfer::TransferTarget;
use crate::transfer::TransferTargetError;

pub const DEFAULT_CHAIN_CONFIG_FILE_NAME: &str = "chain_config.yaml";

/// Takes precedence over `wallet_mnemonic` from the config file
pub const MNEMONIC_ENV_VAR: &str = "TX_CHAIN_MNEMONIC";

const REDACTED: &str = "<redacted>";

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Network of the node, explorer and both addresses: Mainnet or Testnet
network: Testnet
node_url: http://127.0.0.1:9052/
# Defaults to the public explorer API of the network
explorer_url: null
# Leave empty and set the TX_CHAIN_MNEMONIC env var instead to keep it out of this file
wallet_mnemonic: ""
wallet_mnemonic_password: ""
wallet_address_index: 0
recipient_address: 3Wy3BaCjGDWE3bjjZkNo3aWaMz3cYrePMFhchcKovY9uG9vhpAuW
token_id: 0000000000000000000000000000000000000000000000000000000000000000
nano_ergs_per_hop: 1000000000
tokens_per_hop: 1
hop_count: 3
genesis_fee: 1100000
hop_fee: 1100000
settle_interval_ms: 10000
log_level: ~
"#;

#[derive(Debug, Error)]
pub enum ChainConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("address error: {0}")]
    AddressEncoder(#[from] AddressEncoderError),
    #[error("address {address} does not belong to {expected:?}")]
    NetworkMismatch { address: String, expected: Network },
    #[error("invalid token id {0}")]
    InvalidTokenId(String),
    #[error("`{0}` must be greater than zero")]
    Zero(&'static str),
    #[error("`{0}` is out of range")]
    OutOfRange(&'static str),
    #[error("wallet mnemonic is not set, use `wallet_mnemonic` or the {MNEMONIC_ENV_VAR} env var")]
    MissingMnemonic,
    #[error("invalid per-hop transfer: {0}")]
    TransferTarget(#[from] TransferTargetError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ChainConfigSerde", into = "ChainConfigSerde")]
pub struct ChainConfig {
    pub network: Network,
    pub node_url: Url,
    pub explorer_url: Option<Url>,
    pub wallet_mnemonic: String,
    pub wallet_mnemonic_password: String,
    pub wallet_address_index: u32,
    pub recipient_address: NetworkAddress,
    pub token_id: TokenId,
    pub nano_ergs_per_hop: BoxValue,
    pub tokens_per_hop: TokenAmount,
    pub hop_count: HopCount,
    pub genesis_fee: BoxValue,
    pub hop_fee: BoxValue,
    pub settle_interval: Duration,
    pub log_level: Option<LevelFilter>,
}

impl ChainConfig {
    /// Read the config file, apply the mnemonic env override and check a mnemonic is present
    pub fn load(path: &Path) -> Result<Self, ChainConfigError> {
        let config = Self::load_from_str(&std::fs::read_to_string(path)?)?
            .with_mnemonic_override(std::env::var(MNEMONIC_ENV_VAR).ok());
        if config.wallet_mnemonic.trim().is_empty() {
            return Err(ChainConfigError::MissingMnemonic);
        }
        Ok(config)
    }

    pub fn load_from_str(config_str: &str) -> Result<Self, ChainConfigError> {
        Ok(serde_yaml::from_str(config_str)?)
    }

    pub fn with_mnemonic_override(self, mnemonic: Option<String>) -> Self {
        match mnemonic {
            Some(wallet_mnemonic) if !wallet_mnemonic.trim().is_empty() => ChainConfig {
                wallet_mnemonic,
                ..self
            },
            Some(_) | None => self,
        }
    }

    pub fn write_default_config_file(path: &Path) -> Result<(), ChainConfigError> {
        std::fs::write(path, DEFAULT_CONFIG_TEMPLATE)?;
        Ok(())
    }

    pub fn explorer_api_url(&self) -> Url {
        self.explorer_url
            .clone()
            .unwrap_or_else(|| default_explorer_api_url(self.network.into()))
    }

    pub fn explorer_web_url(&self) -> Url {
        default_explorer_url(self.network.into())
    }

    pub fn per_hop_target(&self) -> Result<TransferTarget, TransferTargetError> {
        TransferTarget::new(
            self.nano_ergs_per_hop,
            vec![Token {
                token_id: self.token_id.clone(),
                amount: self.tokens_per_hop,
            }],
        )
    }

    pub fn chain_parameters(&self) -> Result<ChainParameters, ChainConfigError> {
        Ok(ChainParameters {
            recipient: self.recipient_address.address(),
            per_hop: self.per_hop_target()?,
            hop_count: self.hop_count,
            genesis_fee: self.genesis_fee,
            hop_fee: self.hop_fee,
            settle_interval: self.settle_interval,
        })
    }

    /// Copy with the wallet secrets replaced, safe to print
    pub fn redacted(&self) -> Self {
        ChainConfig {
            wallet_mnemonic: REDACTED.to_owned(),
            wallet_mnemonic_password: if self.wallet_mnemonic_password.is_empty() {
                String::new()
            } else {
                REDACTED.to_owned()
            },
            ..self.clone()
        }
    }
}

pub(crate) fn parse_token_id(token_id: &str) -> Result<TokenId, ChainConfigError> {
    Digest32::try_from(token_id.to_owned())
        .map(TokenId::from)
        .map_err(|_| ChainConfigError::InvalidTokenId(token_id.to_owned()))
}
