use ergo_lib::chain::transaction::Transaction;
use ergo_lib::chain::transaction::TxId;
use ergo_lib::ergotree_ir::chain::ergo_box::box_value::BoxValue;
use ergo_lib::ergotree_ir::chain::ergo_box::BoxId;
use ergo_lib::ergotree_ir::chain::ergo_box::BoxTokens;
use ergo_lib::ergotree_ir::chain::ergo_box::ErgoBox;
use ergo_lib::ergotree_ir::chain::ergo_box::NonMandatoryRegisters;
use ergo_lib::ergotree_ir::chain::token::TokenId;
use ergo_lib::ergotree_ir::ergo_tree::ErgoTree;
use thiserror::Error;

use crate::Block;

#[derive(Debug, Error)]
pub enum ChainSimError {
    #[error("input box {0:?} is not in the UTXO set (unknown or already spent)")]
    InputNotUnspent(BoxId),
    #[error("tx {tx_id} does not preserve value: inputs {inputs}, outputs {outputs}")]
    ValueNotPreserved {
        tx_id: TxId,
        inputs: u64,
        outputs: u64,
    },
    #[error("tx {tx_id} creates token {token_id:?} out of thin air")]
    TokenNotPreserved { tx_id: TxId, token_id: TokenId },
    #[error("invalid box: {0}")]
    InvalidBox(String),
}

/// Ergo blockchain(UTXO) simulation
pub struct ChainSim {
    blocks: Vec<Block>,
    all_boxes: Vec<ErgoBox>,
    unspent_boxes: Vec<ErgoBox>,

    /// Current height
    pub height: u32,
}

impl Default for ChainSim {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainSim {
    pub fn new() -> Self {
        ChainSim {
            blocks: Vec::new(),
            all_boxes: Vec::new(),
            unspent_boxes: Vec::new(),
            height: 0,
        }
    }

    /// Put a box straight into the UTXO set, as if it was created by an earlier (unknown) tx
    pub fn generate_unspent_box(
        &mut self,
        ergo_tree: ErgoTree,
        value: BoxValue,
        tokens: Option<BoxTokens>,
    ) -> Result<ErgoBox, ChainSimError> {
        let b = ErgoBox::new(
            value,
            ergo_tree,
            tokens,
            NonMandatoryRegisters::empty(),
            self.height,
            TxId::zero(),
            self.all_boxes.len() as u16,
        )
        .map_err(|e| ChainSimError::InvalidBox(e.to_string()))?;
        self.all_boxes.push(b.clone());
        self.unspent_boxes.push(b.clone());
        Ok(b)
    }

    /// Unspent boxes guarded by the given tree, in creation order
    pub fn get_unspent_boxes(&self, ergo_tree: &ErgoTree) -> Vec<ErgoBox> {
        self.unspent_boxes
            .iter()
            .filter(|b| b.ergo_tree == *ergo_tree)
            .cloned()
            .collect()
    }

    pub fn is_unspent(&self, box_id: &BoxId) -> bool {
        self.unspent_boxes.iter().any(|b| b.box_id() == *box_id)
    }

    pub fn get_box(&self, box_id: &BoxId) -> Option<ErgoBox> {
        self.all_boxes.iter().find(|b| b.box_id() == *box_id).cloned()
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    fn apply_tx(unspent_boxes: &mut Vec<ErgoBox>, tx: &Transaction) -> Result<(), ChainSimError> {
        let mut boxes_to_spend = Vec::new();
        for input in tx.inputs.iter() {
            let b = unspent_boxes
                .iter()
                .find(|b| b.box_id() == input.box_id)
                .cloned()
                .ok_or_else(|| ChainSimError::InputNotUnspent(input.box_id.clone()))?;
            boxes_to_spend.push(b);
        }
        // TODO: verify tx signatures
        let outputs: Vec<ErgoBox> = tx.outputs.iter().cloned().collect();
        let inputs_value: u64 = boxes_to_spend.iter().map(|b| *b.value.as_u64()).sum();
        let outputs_value: u64 = outputs.iter().map(|b| *b.value.as_u64()).sum();
        if inputs_value != outputs_value {
            return Err(ChainSimError::ValueNotPreserved {
                tx_id: tx.id(),
                inputs: inputs_value,
                outputs: outputs_value,
            });
        }
        // The only token a tx may create is the one minted with the id of its first input
        let minted_token_id: Option<TokenId> =
            boxes_to_spend.first().map(|b| b.box_id().into());
        for (token_id, out_amount) in token_totals(&outputs) {
            if Some(&token_id) == minted_token_id.as_ref() {
                continue;
            }
            let in_amount = token_totals(&boxes_to_spend)
                .into_iter()
                .find(|(id, _)| *id == token_id)
                .map(|(_, amount)| amount)
                .unwrap_or(0);
            if out_amount > in_amount {
                return Err(ChainSimError::TokenNotPreserved {
                    tx_id: tx.id(),
                    token_id,
                });
            }
        }
        unspent_boxes.retain(|b| !boxes_to_spend.contains(b));
        unspent_boxes.extend(outputs);
        Ok(())
    }

    /// Add a new block to the chain (head/latest). The block is rejected as a whole if any of its
    /// transactions spends a box outside the UTXO set or breaks value/token preservation.
    pub fn add_block(&mut self, block: Block) -> Result<(), ChainSimError> {
        let mut unspent_boxes = self.unspent_boxes.clone();
        for tx in block.txs.iter() {
            Self::apply_tx(&mut unspent_boxes, tx)?;
        }
        for tx in block.txs.iter() {
            self.all_boxes.extend(tx.outputs.iter().cloned());
        }
        self.unspent_boxes = unspent_boxes;
        self.blocks.push(block);
        self.height += 1;
        Ok(())
    }
}

fn token_totals(boxes: &[ErgoBox]) -> Vec<(TokenId, u64)> {
    let mut totals: Vec<(TokenId, u64)> = Vec::new();
    for token in boxes.iter().filter_map(|b| b.tokens.as_ref()).flat_map(|t| t.iter()) {
        match totals.iter_mut().find(|(id, _)| *id == token.token_id) {
            Some((_, amount)) => *amount += *token.amount.as_u64(),
            None => totals.push((token.token_id.clone(), *token.amount.as_u64())),
        }
    }
    totals
}
