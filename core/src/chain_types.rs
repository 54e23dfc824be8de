use serde::Deserialize;
use serde::Serialize;

#[derive(PartialEq, PartialOrd, Eq, Ord, Debug, Serialize, Deserialize, Copy, Clone)]
#[serde(transparent)]
pub struct BlockHeight(pub u32);

impl std::fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Number of hop transactions that follow the genesis transaction.
#[derive(PartialEq, PartialOrd, Eq, Ord, Debug, Serialize, Deserialize, Copy, Clone)]
#[serde(transparent)]
pub struct HopCount(pub u32);

impl HopCount {
    pub fn last_hop(&self) -> Option<HopIndex> {
        self.0.checked_sub(1).map(HopIndex)
    }
}

/// Zero-based position of a hop within the chain.
#[derive(PartialEq, PartialOrd, Eq, Ord, Debug, Serialize, Deserialize, Copy, Clone)]
#[serde(transparent)]
pub struct HopIndex(pub u32);

impl HopIndex {
    pub fn next(self) -> HopIndex {
        HopIndex(self.0 + 1)
    }

    pub fn is_last(&self, hop_count: HopCount) -> bool {
        hop_count.last_hop() == Some(*self)
    }
}

impl std::fmt::Display for HopIndex {
    // Hops are 1-based in logs
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0 + 1)
    }
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
}

impl From<Network> for ergo_lib::ergotree_ir::chain::address::NetworkPrefix {
    fn from(n: Network) -> Self {
        match n {
            Network::Mainnet => ergo_lib::ergotree_ir::chain::address::NetworkPrefix::Mainnet,
            Network::Testnet => ergo_lib::ergotree_ir::chain::address::NetworkPrefix::Testnet,
        }
    }
}
