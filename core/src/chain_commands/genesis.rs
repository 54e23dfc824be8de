use ergo_lib::chain::transaction::Transaction;
use ergo_lib::ergotree_ir::chain::address::Address;
use ergo_lib::ergotree_ir::chain::ergo_box::box_value::BoxValue;
use ergo_lib::ergotree_ir::chain::ergo_box::ErgoBox;
use ergo_lib::ergotree_ir::ergo_tree::ErgoTree;

use crate::box_selector::ChainBoxSelector;
use crate::chain_types::BlockHeight;
use crate::chain_types::HopIndex;
use crate::output_builder::build_transfer_outputs;
use crate::transfer::ChainTotals;
use crate::tx_plan::TransactionPlan;

use super::wallet_output;
use super::ChainError;

/// Position of the seed output in the genesis transaction
pub const SEED_OUTPUT_INDEX: usize = 0;

/// Plan the genesis transaction: pool the whole chain's value, tokens and hop fees into one seed
/// output owned by the wallet.
pub fn build_genesis_plan(
    wallet_boxes: Vec<ErgoBox>,
    totals: &ChainTotals,
    genesis_fee: BoxValue,
    wallet_address: &Address,
    height: BlockHeight,
    selector: &ChainBoxSelector,
) -> Result<TransactionPlan, ChainError> {
    let target = totals.seed.plus_nano_ergs(genesis_fee)?;
    log::debug!(
        "Selecting genesis inputs for {} nanoErgs and {} token kind(s) out of {} wallet boxes",
        target.nano_ergs.as_u64(),
        target.tokens.len(),
        wallet_boxes.len()
    );
    let selection = selector.select(wallet_boxes, &target)?;
    let outputs = build_transfer_outputs(&totals.seed, wallet_address, height)?;
    Ok(TransactionPlan::new(selection, outputs, genesis_fee, height)?)
}

/// The seed output of a signed genesis transaction, which hop 1 spends
pub fn seed_output(genesis_tx: &Transaction, wallet_tree: &ErgoTree) -> Result<ErgoBox, ChainError> {
    wallet_output(genesis_tx, SEED_OUTPUT_INDEX, wallet_tree).ok_or(ChainError::ChainBroken {
        hop: HopIndex(0),
        index: SEED_OUTPUT_INDEX,
    })
}

#[cfg(test)]
mod tests {
    use std::convert::TryInto;

    use ergo_lib::ergotree_ir::chain::token::TokenId;
    use pretty_assertions::assert_eq;
    use sigma_test_util::force_any_val;

    use super::*;
    use crate::box_selector::BoxSelectionError;
    use crate::chain_commands::test_utils::make_box;
    use crate::chain_commands::test_utils::token;
    use crate::chain_commands::test_utils::test_wallet;
    use crate::chain_types::HopCount;
    use crate::transfer::TransferTarget;

    fn totals(token_x: &TokenId) -> ChainTotals {
        let per_hop = TransferTarget::new(
            1_000_000_000u64.try_into().unwrap(),
            vec![token(token_x, 5)],
        )
        .unwrap();
        ChainTotals::new(&per_hop, HopCount(3), 1_000_000u64.try_into().unwrap()).unwrap()
    }

    #[test]
    fn seed_output_pools_the_chain() {
        let wallet_address = test_wallet().address().address();
        let token_x = force_any_val::<TokenId>();
        let wallet_boxes = vec![
            make_box(&wallet_address, 2_000_000_000, vec![token(&token_x, 10)]),
            make_box(&wallet_address, 2_000_000_000, vec![token(&token_x, 10)]),
        ];
        let totals = totals(&token_x);
        let plan = build_genesis_plan(
            wallet_boxes,
            &totals,
            1_000_000u64.try_into().unwrap(),
            &wallet_address,
            BlockHeight(500),
            &ChainBoxSelector::new(),
        )
        .unwrap();
        assert_eq!(plan.inputs().len(), 2);
        assert_eq!(plan.outputs().len(), 1);
        let seed = &plan.outputs()[0];
        assert_eq!(*seed.value.as_u64(), 3_003_000_000);
        assert_eq!(seed.ergo_tree, wallet_address.script().unwrap());
        let seed_tokens: Vec<_> = seed.tokens.as_ref().unwrap().iter().cloned().collect();
        assert_eq!(seed_tokens, vec![token(&token_x, 15)]);
        // 4 ERG in, 3.003 ERG seed, 0.001 ERG fee
        assert_eq!(plan.total_change_value(), 996_000_000);
    }

    #[test]
    fn wallet_without_tokens_fails_on_tokens() {
        let wallet_address = test_wallet().address().address();
        let token_x = force_any_val::<TokenId>();
        let wallet_boxes = vec![make_box(&wallet_address, 50_000_000_000, vec![])];
        let res = build_genesis_plan(
            wallet_boxes,
            &totals(&token_x),
            1_000_000u64.try_into().unwrap(),
            &wallet_address,
            BlockHeight(500),
            &ChainBoxSelector::new(),
        );
        assert!(matches!(
            res,
            Err(ChainError::InsufficientFunds(
                BoxSelectionError::NotEnoughTokens {
                    required: 15,
                    found: 0,
                    ..
                }
            ))
        ));
    }
}
