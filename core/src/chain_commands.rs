use derive_more::From;
use ergo_lib::chain::transaction::Transaction;
use ergo_lib::ergotree_ir::chain::ergo_box::ErgoBox;
use ergo_lib::ergotree_ir::ergo_tree::ErgoTree;
use ergo_lib::ergotree_ir::serialization::SigmaParsingError;
use thiserror::Error;

use crate::box_selector::BoxSelectionError;
use crate::chain_types::HopIndex;
use crate::network_state::NetworkStateError;
use crate::node_interface::SignTransactionError;
use crate::node_interface::SubmissionError;
use crate::output_builder::OutputBuilderError;
use crate::transfer::TransferTargetError;
use crate::tx_plan::PlanError;
use crate::wallet::WalletDataError;

pub mod genesis;
pub mod hop;
#[cfg(test)]
pub(crate) mod test_utils;

#[derive(Debug, From, Error)]
pub enum ChainError {
    #[error("insufficient funds: {0}")]
    InsufficientFunds(BoxSelectionError),
    #[error("missing network state: {0}")]
    MissingNetworkState(NetworkStateError),
    #[error("submission failed: {0}")]
    Submission(SubmissionError),
    #[error("chain broken: hop {hop} has no wallet-owned input at output position {index} of the previous transaction")]
    ChainBroken { hop: HopIndex, index: usize },
    #[error("transfer amount error: {0}")]
    TransferTarget(TransferTargetError),
    #[error("output builder error: {0}")]
    OutputBuilder(OutputBuilderError),
    #[error("transaction plan error: {0}")]
    Plan(PlanError),
    #[error("signing error: {0}")]
    Sign(SignTransactionError),
    #[error("wallet error: {0}")]
    WalletData(WalletDataError),
    #[error("Sigma parsing error: {0}")]
    SigmaParse(SigmaParsingError),
}

/// Output `index` of a signed transaction, if it exists and is spendable by the wallet
pub fn wallet_output(tx: &Transaction, index: usize, wallet_tree: &ErgoTree) -> Option<ErgoBox> {
    tx.outputs
        .iter()
        .nth(index)
        .filter(|b| b.ergo_tree == *wallet_tree)
        .cloned()
}
