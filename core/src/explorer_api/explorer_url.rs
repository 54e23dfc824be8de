use ergo_lib::ergotree_ir::chain::address::NetworkPrefix;
use reqwest::Url;

pub const MAINNET_EXPLORER_API_URL: &str = "https://api.ergoplatform.com/";
pub const TESTNET_EXPLORER_API_URL: &str = "https://api-testnet.ergoplatform.com/";

pub const MAINNET_EXPLORER_URL: &str = "https://explorer.ergoplatform.com/";
pub const TESTNET_EXPLORER_URL: &str = "https://testnet.ergoplatform.com/";

fn parse_const(url_str: &'static str) -> Url {
    Url::parse(url_str).unwrap()
}

pub fn default_explorer_api_url(network_prefix: NetworkPrefix) -> Url {
    parse_const(match network_prefix {
        NetworkPrefix::Mainnet => MAINNET_EXPLORER_API_URL,
        NetworkPrefix::Testnet => TESTNET_EXPLORER_API_URL,
    })
}

pub fn default_explorer_url(network_prefix: NetworkPrefix) -> Url {
    parse_const(match network_prefix {
        NetworkPrefix::Mainnet => MAINNET_EXPLORER_URL,
        NetworkPrefix::Testnet => TESTNET_EXPLORER_URL,
    })
}
