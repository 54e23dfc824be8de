//! Types to allow chain configuration to (de)serialize with serde.
use std::convert::TryFrom;
use std::time::Duration;

use ergo_lib::ergotree_ir::chain::address::AddressEncoder;
use ergo_lib::ergotree_ir::chain::address::NetworkPrefix;
use ergo_lib::ergotree_ir::chain::ergo_box::box_value::BoxValue;
use ergo_lib::ergotree_ir::chain::token::TokenAmount;
use log::LevelFilter;
use reqwest::Url;
use serde::Deserialize;
use serde::Serialize;

use crate::chain_config::parse_token_id;
use crate::chain_config::ChainConfig;
use crate::chain_config::ChainConfigError;
use crate::chain_types::HopCount;
use crate::chain_types::Network;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ChainConfigSerde {
    network: Network,
    node_url: Url,
    #[serde(default)]
    explorer_url: Option<Url>,
    #[serde(default)]
    wallet_mnemonic: String,
    #[serde(default)]
    wallet_mnemonic_password: String,
    #[serde(default)]
    wallet_address_index: u32,
    recipient_address: String,
    token_id: String,
    nano_ergs_per_hop: u64,
    tokens_per_hop: u64,
    hop_count: u32,
    genesis_fee: u64,
    hop_fee: u64,
    settle_interval_ms: u64,
    #[serde(default)]
    log_level: Option<LevelFilter>,
}

fn box_value(value: u64, key: &'static str) -> Result<BoxValue, ChainConfigError> {
    if value == 0 {
        return Err(ChainConfigError::Zero(key));
    }
    BoxValue::try_from(value).map_err(|_| ChainConfigError::OutOfRange(key))
}

/// Endpoints are joined onto these URLs, so a path without a trailing slash would lose its last
/// segment
fn base_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

impl TryFrom<ChainConfigSerde> for ChainConfig {
    type Error = ChainConfigError;

    fn try_from(c: ChainConfigSerde) -> Result<Self, Self::Error> {
        let prefix = NetworkPrefix::from(c.network);
        let recipient_address =
            AddressEncoder::unchecked_parse_network_address_from_str(&c.recipient_address)?;
        if recipient_address.network() != prefix {
            return Err(ChainConfigError::NetworkMismatch {
                address: c.recipient_address,
                expected: c.network,
            });
        }
        if c.tokens_per_hop == 0 {
            return Err(ChainConfigError::Zero("tokens_per_hop"));
        }
        if c.hop_count == 0 {
            return Err(ChainConfigError::Zero("hop_count"));
        }
        Ok(ChainConfig {
            network: c.network,
            node_url: base_url(c.node_url),
            explorer_url: c.explorer_url.map(base_url),
            wallet_mnemonic: c.wallet_mnemonic,
            wallet_mnemonic_password: c.wallet_mnemonic_password,
            wallet_address_index: c.wallet_address_index,
            recipient_address,
            token_id: parse_token_id(&c.token_id)?,
            nano_ergs_per_hop: box_value(c.nano_ergs_per_hop, "nano_ergs_per_hop")?,
            tokens_per_hop: TokenAmount::try_from(c.tokens_per_hop)
                .map_err(|_| ChainConfigError::OutOfRange("tokens_per_hop"))?,
            hop_count: HopCount(c.hop_count),
            genesis_fee: box_value(c.genesis_fee, "genesis_fee")?,
            hop_fee: box_value(c.hop_fee, "hop_fee")?,
            settle_interval: Duration::from_millis(c.settle_interval_ms),
            log_level: c.log_level,
        })
    }
}

impl From<ChainConfig> for ChainConfigSerde {
    fn from(c: ChainConfig) -> Self {
        ChainConfigSerde {
            network: c.network,
            node_url: c.node_url,
            explorer_url: c.explorer_url,
            wallet_mnemonic: c.wallet_mnemonic,
            wallet_mnemonic_password: c.wallet_mnemonic_password,
            wallet_address_index: c.wallet_address_index,
            recipient_address: c.recipient_address.to_base58(),
            token_id: String::from(c.token_id),
            nano_ergs_per_hop: *c.nano_ergs_per_hop.as_u64(),
            tokens_per_hop: *c.tokens_per_hop.as_u64(),
            hop_count: c.hop_count.0,
            genesis_fee: *c.genesis_fee.as_u64(),
            hop_fee: *c.hop_fee.as_u64(),
            settle_interval_ms: c.settle_interval.as_millis() as u64,
            log_level: c.log_level,
        }
    }
}
