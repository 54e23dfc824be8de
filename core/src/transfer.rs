//! Value and token amounts a transaction output must carry, and the totals derived from them for
//! a whole chain of hops.
use std::convert::TryFrom;

use ergo_lib::ergotree_ir::chain::ergo_box::box_value::BoxValue;
use ergo_lib::ergotree_ir::chain::ergo_box::box_value::BoxValueError;
use ergo_lib::ergotree_ir::chain::token::Token;
use ergo_lib::ergotree_ir::chain::token::TokenAmount;
use ergo_lib::ergotree_ir::chain::token::TokenId;
use thiserror::Error;

use crate::chain_types::HopCount;

#[derive(Debug, Error)]
pub enum TransferTargetError {
    #[error("nanoErg amount overflows: {0} x {1}")]
    ValueOverflow(u64, u64),
    #[error("amount of token {0:?} overflows")]
    TokenAmountOverflow(TokenId),
    #[error("a chain must contain at least one hop")]
    EmptyChain,
    #[error("box value error: {0}")]
    BoxValue(BoxValueError),
}

/// nanoErgs and tokens that a single output (or a selection of inputs) has to carry. Each token id
/// appears at most once.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferTarget {
    pub nano_ergs: BoxValue,
    pub tokens: Vec<Token>,
}

impl TransferTarget {
    /// Create a target, merging tokens that share an id.
    pub fn new(nano_ergs: BoxValue, tokens: Vec<Token>) -> Result<Self, TransferTargetError> {
        let mut merged: Vec<Token> = Vec::with_capacity(tokens.len());
        for token in tokens {
            match merged.iter_mut().find(|t| t.token_id == token.token_id) {
                Some(existing) => {
                    let sum = existing
                        .amount
                        .as_u64()
                        .checked_add(*token.amount.as_u64())
                        .ok_or_else(|| {
                            TransferTargetError::TokenAmountOverflow(token.token_id.clone())
                        })?;
                    existing.amount = token_amount(&token.token_id, sum)?;
                }
                None => merged.push(token),
            }
        }
        Ok(TransferTarget {
            nano_ergs,
            tokens: merged,
        })
    }

    #[cfg(test)]
    pub fn nano_ergs_only(nano_ergs: BoxValue) -> Self {
        TransferTarget {
            nano_ergs,
            tokens: Vec::new(),
        }
    }

    pub fn token_amount(&self, token_id: &TokenId) -> u64 {
        self.tokens
            .iter()
            .filter(|t| t.token_id == *token_id)
            .map(|t| *t.amount.as_u64())
            .sum()
    }

    /// Exact integer multiplication of every amount by `factor`.
    pub fn scaled(&self, factor: u32) -> Result<TransferTarget, TransferTargetError> {
        if factor == 0 {
            return Err(TransferTargetError::EmptyChain);
        }
        let nano_ergs = checked_mul_value(*self.nano_ergs.as_u64(), factor as u64)?;
        let tokens = self
            .tokens
            .iter()
            .map(|t| {
                let amount = t
                    .amount
                    .as_u64()
                    .checked_mul(factor as u64)
                    .ok_or_else(|| TransferTargetError::TokenAmountOverflow(t.token_id.clone()))?;
                Ok(Token {
                    token_id: t.token_id.clone(),
                    amount: token_amount(&t.token_id, amount)?,
                })
            })
            .collect::<Result<Vec<Token>, TransferTargetError>>()?;
        Ok(TransferTarget { nano_ergs, tokens })
    }

    pub fn plus_nano_ergs(&self, extra: BoxValue) -> Result<TransferTarget, TransferTargetError> {
        let nano_ergs = self
            .nano_ergs
            .as_u64()
            .checked_add(*extra.as_u64())
            .ok_or(TransferTargetError::ValueOverflow(
                *self.nano_ergs.as_u64(),
                *extra.as_u64(),
            ))?;
        Ok(TransferTarget {
            nano_ergs: BoxValue::try_from(nano_ergs).map_err(TransferTargetError::BoxValue)?,
            tokens: self.tokens.clone(),
        })
    }
}

fn checked_mul_value(value: u64, factor: u64) -> Result<BoxValue, TransferTargetError> {
    let total = value
        .checked_mul(factor)
        .ok_or(TransferTargetError::ValueOverflow(value, factor))?;
    BoxValue::try_from(total).map_err(TransferTargetError::BoxValue)
}

fn token_amount(token_id: &TokenId, amount: u64) -> Result<TokenAmount, TransferTargetError> {
    TokenAmount::try_from(amount)
        .map_err(|_| TransferTargetError::TokenAmountOverflow(token_id.clone()))
}

/// Totals of a chain of `hop_count` hops, each paying `per_hop` and a fee of `hop_fee`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainTotals {
    /// What the recipient receives over the whole chain: `per_hop x hop_count`
    pub transfer_total: TransferTarget,
    /// Fees of all hops: `hop_fee x hop_count`
    pub fee_reserve: BoxValue,
    /// Content of the genesis seed output: `transfer_total` plus `fee_reserve` in nanoErgs
    pub seed: TransferTarget,
}

impl ChainTotals {
    pub fn new(
        per_hop: &TransferTarget,
        hop_count: HopCount,
        hop_fee: BoxValue,
    ) -> Result<Self, TransferTargetError> {
        let transfer_total = per_hop.scaled(hop_count.0)?;
        let fee_reserve = checked_mul_value(*hop_fee.as_u64(), hop_count.0 as u64)?;
        let seed = transfer_total.plus_nano_ergs(fee_reserve)?;
        Ok(ChainTotals {
            transfer_total,
            fee_reserve,
            seed,
        })
    }
}
