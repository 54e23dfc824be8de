//! A transaction before signing: inputs, payment outputs, change and fee, with the balance
//! invariant checked on construction.
use std::convert::TryInto;

use ergo_lib::chain::transaction::unsigned::UnsignedTransaction;
use ergo_lib::chain::transaction::TxIoVec;
use ergo_lib::ergotree_ir::chain::address::Address;
use ergo_lib::ergotree_ir::chain::ergo_box::box_value::BoxValue;
use ergo_lib::ergotree_ir::chain::ergo_box::ErgoBox;
use ergo_lib::ergotree_ir::chain::ergo_box::ErgoBoxCandidate;
use ergo_lib::ergotree_ir::chain::token::TokenId;
use ergo_lib::wallet::box_selector::BoxSelection;
use ergo_lib::wallet::box_selector::ErgoBoxAssetsData;
use ergo_lib::wallet::tx_builder::TxBuilder;
use ergo_lib::wallet::tx_builder::TxBuilderError;
use thiserror::Error;

use crate::box_selector::Balance;
use crate::chain_types::BlockHeight;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error(
        "unbalanced plan: inputs hold {inputs} nanoErgs, outputs {outputs}, change {change}, fee {fee}"
    )]
    UnbalancedValue {
        inputs: u64,
        outputs: u64,
        change: u64,
        fee: u64,
    },
    #[error("unbalanced token {token_id:?}: inputs hold {inputs}, outputs and change {spent}")]
    UnbalancedToken {
        token_id: TokenId,
        inputs: u64,
        spent: u64,
    },
    #[error("tx builder error: {0}")]
    TxBuilder(#[from] TxBuilderError),
    #[error("invalid number of inputs: {0}")]
    InvalidInputs(usize),
}

#[derive(Debug, Clone)]
pub struct TransactionPlan {
    inputs: Vec<ErgoBox>,
    outputs: Vec<ErgoBoxCandidate>,
    change: Vec<ErgoBoxAssetsData>,
    fee: BoxValue,
    height: BlockHeight,
}

impl TransactionPlan {
    /// Combine a box selection with payment outputs. Fails unless
    /// `inputs == outputs + change + fee` in nanoErgs, and `inputs == outputs + change` for every
    /// token.
    pub fn new(
        selection: BoxSelection<ErgoBox>,
        outputs: Vec<ErgoBoxCandidate>,
        fee: BoxValue,
        height: BlockHeight,
    ) -> Result<Self, PlanError> {
        let plan = TransactionPlan {
            inputs: selection.boxes.iter().cloned().collect(),
            outputs,
            change: selection.change_boxes,
            fee,
            height,
        };
        plan.check_balance()?;
        Ok(plan)
    }

    pub fn inputs(&self) -> &[ErgoBox] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[ErgoBoxCandidate] {
        &self.outputs
    }

    pub fn change(&self) -> &[ErgoBoxAssetsData] {
        &self.change
    }

    pub fn fee(&self) -> BoxValue {
        self.fee
    }

    /// Position the first change box takes in the built transaction: the tx builder appends change
    /// right after the payment outputs, and the miner fee box last.
    pub fn change_output_index(&self) -> usize {
        self.outputs.len()
    }

    pub fn total_input_value(&self) -> u64 {
        self.inputs.iter().map(|b| *b.value.as_u64()).sum()
    }

    pub fn total_output_value(&self) -> u64 {
        self.outputs.iter().map(|b| *b.value.as_u64()).sum()
    }

    pub fn total_change_value(&self) -> u64 {
        self.change.iter().map(|b| *b.value.as_u64()).sum()
    }

    fn check_balance(&self) -> Result<(), PlanError> {
        let inputs = self.total_input_value();
        let outputs = self.total_output_value();
        let change = self.total_change_value();
        let fee = *self.fee.as_u64();
        if outputs.checked_add(change).and_then(|v| v.checked_add(fee)) != Some(inputs) {
            return Err(PlanError::UnbalancedValue {
                inputs,
                outputs,
                change,
                fee,
            });
        }
        let in_balance = Balance::of_boxes(&self.inputs);
        let mut spent = Balance::default();
        let spent_tokens = self
            .outputs
            .iter()
            .filter_map(|b| b.tokens.as_ref())
            .chain(self.change.iter().filter_map(|c| c.tokens.as_ref()))
            .flat_map(|tokens| tokens.iter());
        for token in spent_tokens {
            spent.add_token(&token.token_id, *token.amount.as_u64());
        }
        for (token_id, _) in in_balance.tokens.iter().chain(spent.tokens.iter()) {
            let inputs = in_balance.token_amount(token_id);
            let spent = spent.token_amount(token_id);
            if inputs != spent {
                return Err(PlanError::UnbalancedToken {
                    token_id: token_id.clone(),
                    inputs,
                    spent,
                });
            }
        }
        Ok(())
    }

    pub fn inputs_io_vec(&self) -> Result<TxIoVec<ErgoBox>, PlanError> {
        self.inputs
            .clone()
            .try_into()
            .map_err(|_| PlanError::InvalidInputs(self.inputs.len()))
    }

    /// Build the unsigned transaction; change boxes are guarded by `change_address`.
    pub fn build_unsigned_tx(
        &self,
        change_address: &Address,
    ) -> Result<UnsignedTransaction, PlanError> {
        let box_selection = BoxSelection {
            boxes: self.inputs_io_vec()?,
            change_boxes: self.change.clone(),
        };
        let tx_builder = TxBuilder::new(
            box_selection,
            self.outputs.clone(),
            self.height.0,
            self.fee,
            change_address.clone(),
        );
        let tx = tx_builder.build()?;
        log::trace!("Built unsigned transaction: {:?}", tx);
        Ok(tx)
    }
}
