use ergo_lib::chain::transaction::Transaction;
use ergo_lib::ergotree_ir::chain::address::Address;
use ergo_lib::ergotree_ir::chain::ergo_box::box_value::BoxValue;
use ergo_lib::ergotree_ir::chain::ergo_box::ErgoBox;
use ergo_lib::ergotree_ir::ergo_tree::ErgoTree;

use crate::box_selector::ChainBoxSelector;
use crate::chain_types::BlockHeight;
use crate::chain_types::HopIndex;
use crate::output_builder::build_transfer_outputs;
use crate::transfer::TransferTarget;
use crate::tx_plan::TransactionPlan;

use super::wallet_output;
use super::ChainError;

/// Plan one hop: spend `input` (the previous transaction's designated output), pay `per_hop` to
/// `recipient`, keep the rest as change for the next hop.
pub fn build_hop_plan(
    input: ErgoBox,
    per_hop: &TransferTarget,
    hop_fee: BoxValue,
    recipient: &Address,
    height: BlockHeight,
    selector: &ChainBoxSelector,
) -> Result<TransactionPlan, ChainError> {
    let target = per_hop.plus_nano_ergs(hop_fee)?;
    let selection = selector.select(vec![input], &target)?;
    let outputs = build_transfer_outputs(per_hop, recipient, height)?;
    Ok(TransactionPlan::new(selection, outputs, hop_fee, height)?)
}

/// The input of hop `next_hop`: the change output of the previous hop's signed transaction.
pub fn linkage_output(
    prev_tx: &Transaction,
    change_index: usize,
    wallet_tree: &ErgoTree,
    next_hop: HopIndex,
) -> Result<ErgoBox, ChainError> {
    wallet_output(prev_tx, change_index, wallet_tree).ok_or(ChainError::ChainBroken {
        hop: next_hop,
        index: change_index,
    })
}
