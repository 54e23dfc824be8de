//! Deterministic coin selection over a pool of boxes.
//!
//! Boxes are accumulated greedily in the order they were received. A box is only taken while it
//! contributes to a requirement that is still unmet (nanoErgs, or one of the target tokens). Once
//! the target is covered the leftover value and tokens become change; if that change cannot form a
//! valid box, further boxes are taken in order until it can.
use std::convert::TryFrom;
use std::convert::TryInto;

use ergo_lib::ergotree_ir::chain::ergo_box::box_value::BoxValue;
use ergo_lib::ergotree_ir::chain::ergo_box::BoxTokens;
use ergo_lib::ergotree_ir::chain::ergo_box::ErgoBox;
use ergo_lib::ergotree_ir::chain::token::Token;
use ergo_lib::ergotree_ir::chain::token::TokenAmount;
use ergo_lib::ergotree_ir::chain::token::TokenId;
use ergo_lib::wallet::box_selector::BoxSelection;
use ergo_lib::wallet::box_selector::ErgoBoxAssetsData;
use thiserror::Error;

use crate::transfer::TransferTarget;

#[derive(Debug, Error)]
pub enum BoxSelectionError {
    #[error("not enough coins: required {required} nanoErgs, found {found}")]
    NotEnoughCoins { required: u64, found: u64 },
    #[error("not enough tokens of {token_id:?}: required {required}, found {found}")]
    NotEnoughTokens {
        token_id: TokenId,
        required: u64,
        found: u64,
    },
    #[error("not enough coins for change box: change of {change} nanoErgs is below {min_change}")]
    NotEnoughCoinsForChangeBox { change: u64, min_change: u64 },
    #[error("change cannot be represented as a box: {0}")]
    InvalidChange(String),
}

/// Running sum of nanoErgs and tokens over a set of boxes, in first-seen token order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Balance {
    pub nano_ergs: u64,
    pub tokens: Vec<(TokenId, u64)>,
}

impl Balance {
    pub fn of_boxes<'a>(boxes: impl IntoIterator<Item = &'a ErgoBox>) -> Balance {
        let mut balance = Balance::default();
        boxes.into_iter().for_each(|b| balance.add_box(b));
        balance
    }

    pub fn add_box(&mut self, b: &ErgoBox) {
        self.nano_ergs = self.nano_ergs.saturating_add(*b.value.as_u64());
        if let Some(tokens) = &b.tokens {
            for token in tokens.iter() {
                self.add_token(&token.token_id, *token.amount.as_u64());
            }
        }
    }

    pub fn add_token(&mut self, token_id: &TokenId, amount: u64) {
        match self.tokens.iter_mut().find(|(id, _)| id == token_id) {
            Some((_, total)) => *total = total.saturating_add(amount),
            None => self.tokens.push((token_id.clone(), amount)),
        }
    }

    pub fn token_amount(&self, token_id: &TokenId) -> u64 {
        self.tokens
            .iter()
            .find(|(id, _)| id == token_id)
            .map(|(_, amount)| *amount)
            .unwrap_or(0)
    }

    fn covers(&self, target: &TransferTarget) -> bool {
        self.nano_ergs >= *target.nano_ergs.as_u64()
            && target
                .tokens
                .iter()
                .all(|t| self.token_amount(&t.token_id) >= *t.amount.as_u64())
    }

    /// Whether adding `b` moves this balance closer to `target`
    fn needs(&self, b: &ErgoBox, target: &TransferTarget) -> bool {
        if self.nano_ergs < *target.nano_ergs.as_u64() {
            return true;
        }
        let box_tokens = match &b.tokens {
            Some(tokens) => tokens,
            None => return false,
        };
        target.tokens.iter().any(|t| {
            self.token_amount(&t.token_id) < *t.amount.as_u64()
                && box_tokens.iter().any(|bt| bt.token_id == t.token_id)
        })
    }

    /// What is left over once `target` is paid out of this balance. Tokens that end up with a
    /// zero amount are dropped.
    fn minus(&self, target: &TransferTarget) -> Balance {
        let tokens = self
            .tokens
            .iter()
            .map(|(id, amount)| (id.clone(), amount - target.token_amount(id).min(*amount)))
            .filter(|(_, amount)| *amount > 0)
            .collect();
        Balance {
            nano_ergs: self.nano_ergs - (*target.nano_ergs.as_u64()).min(self.nano_ergs),
            tokens,
        }
    }

    fn is_empty(&self) -> bool {
        self.nano_ergs == 0 && self.tokens.is_empty()
    }
}

/// Selects boxes covering a [`TransferTarget`] and computes the change box for the selection.
#[derive(Debug, Clone)]
pub struct ChainBoxSelector {
    min_change_value: BoxValue,
}

impl Default for ChainBoxSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainBoxSelector {
    pub fn new() -> Self {
        ChainBoxSelector {
            min_change_value: BoxValue::SAFE_USER_MIN,
        }
    }

    #[cfg(test)]
    pub fn with_min_change_value(min_change_value: BoxValue) -> Self {
        ChainBoxSelector { min_change_value }
    }

    pub fn select(
        &self,
        boxes: Vec<ErgoBox>,
        target: &TransferTarget,
    ) -> Result<BoxSelection<ErgoBox>, BoxSelectionError> {
        let mut balance = Balance::default();
        let mut selected = vec![false; boxes.len()];
        for (idx, b) in boxes.iter().enumerate() {
            if balance.covers(target) {
                break;
            }
            if balance.needs(b, target) {
                balance.add_box(b);
                selected[idx] = true;
            }
        }
        check_covered(&balance, target)?;

        // Covered, but the change may still be too small to live in its own box
        let mut change = balance.minus(target);
        let mut next_unselected = 0;
        while !self.change_is_valid(&change) {
            match (next_unselected..boxes.len()).find(|idx| !selected[*idx]) {
                Some(idx) => {
                    balance.add_box(&boxes[idx]);
                    selected[idx] = true;
                    next_unselected = idx + 1;
                    change = balance.minus(target);
                }
                None => {
                    return Err(BoxSelectionError::NotEnoughCoinsForChangeBox {
                        change: change.nano_ergs,
                        min_change: *self.min_change_value.as_u64(),
                    })
                }
            }
        }

        let selected_boxes: Vec<ErgoBox> = boxes
            .into_iter()
            .zip(selected)
            .filter_map(|(b, is_selected)| if is_selected { Some(b) } else { None })
            .collect();
        let change_boxes = if change.is_empty() {
            vec![]
        } else {
            vec![change_box(&change)?]
        };
        Ok(BoxSelection {
            boxes: selected_boxes
                .try_into()
                .map_err(|_| BoxSelectionError::InvalidChange("empty selection".into()))?,
            change_boxes,
        })
    }

    fn change_is_valid(&self, change: &Balance) -> bool {
        change.is_empty() || change.nano_ergs >= *self.min_change_value.as_u64()
    }
}

fn check_covered(balance: &Balance, target: &TransferTarget) -> Result<(), BoxSelectionError> {
    if balance.nano_ergs < *target.nano_ergs.as_u64() {
        return Err(BoxSelectionError::NotEnoughCoins {
            required: *target.nano_ergs.as_u64(),
            found: balance.nano_ergs,
        });
    }
    for t in &target.tokens {
        let found = balance.token_amount(&t.token_id);
        if found < *t.amount.as_u64() {
            return Err(BoxSelectionError::NotEnoughTokens {
                token_id: t.token_id.clone(),
                required: *t.amount.as_u64(),
                found,
            });
        }
    }
    Ok(())
}

fn change_box(change: &Balance) -> Result<ErgoBoxAssetsData, BoxSelectionError> {
    let value = BoxValue::try_from(change.nano_ergs)
        .map_err(|e| BoxSelectionError::InvalidChange(e.to_string()))?;
    let tokens: Vec<Token> = change
        .tokens
        .iter()
        .map(|(token_id, amount)| {
            TokenAmount::try_from(*amount)
                .map(|amount| Token {
                    token_id: token_id.clone(),
                    amount,
                })
                .map_err(|e| BoxSelectionError::InvalidChange(e.to_string()))
        })
        .collect::<Result<_, _>>()?;
    let tokens = if tokens.is_empty() {
        None
    } else {
        Some(BoxTokens::try_from(tokens).map_err(|_| {
            BoxSelectionError::InvalidChange("too many distinct tokens for one box".into())
        })?)
    };
    Ok(ErgoBoxAssetsData { value, tokens })
}

#[cfg(test)]
mod tests {
    use ergo_lib::ergotree_interpreter::sigma_protocol::private_input::DlogProverInput;
    use ergo_lib::ergotree_ir::chain::address::Address;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use sigma_test_util::force_any_val;

    use super::*;
    use crate::chain_commands::test_utils::make_box;
    use crate::chain_commands::test_utils::token;

    fn owner() -> Address {
        Address::P2Pk(force_any_val::<DlogProverInput>().public_image())
    }

    fn ids(selection: &BoxSelection<ErgoBox>) -> Vec<ErgoBox> {
        selection.boxes.iter().cloned().collect()
    }

    #[test]
    fn takes_boxes_in_received_order_until_covered() {
        let owner = owner();
        let boxes = vec![
            make_box(&owner, 2_000_000, vec![]),
            make_box(&owner, 3_000_000, vec![]),
            make_box(&owner, 5_000_000, vec![]),
        ];
        let target = TransferTarget::nano_ergs_only(4_000_000u64.try_into().unwrap());
        let selection = ChainBoxSelector::new().select(boxes.clone(), &target).unwrap();
        assert_eq!(ids(&selection), boxes[0..2].to_vec());
        assert_eq!(selection.change_boxes.len(), 1);
        assert_eq!(*selection.change_boxes[0].value.as_u64(), 1_000_000);
    }

    #[test]
    fn skips_boxes_that_do_not_carry_missing_tokens() {
        let owner = owner();
        let token_x = force_any_val::<TokenId>();
        let boxes = vec![
            make_box(&owner, 10_000_000, vec![]),
            make_box(&owner, 10_000_000, vec![]),
            make_box(&owner, 10_000_000, vec![token(&token_x, 7)]),
        ];
        let target = TransferTarget::new(
            5_000_000u64.try_into().unwrap(),
            vec![token(&token_x, 5)],
        )
        .unwrap();
        let selection = ChainBoxSelector::new().select(boxes.clone(), &target).unwrap();
        assert_eq!(ids(&selection), vec![boxes[0].clone(), boxes[2].clone()]);
        let change = &selection.change_boxes[0];
        assert_eq!(*change.value.as_u64(), 15_000_000);
        let change_tokens: Vec<Token> = change.tokens.as_ref().unwrap().iter().cloned().collect();
        assert_eq!(change_tokens, vec![token(&token_x, 2)]);
    }

    #[test]
    fn exact_match_has_no_change() {
        let owner = owner();
        let token_x = force_any_val::<TokenId>();
        let boxes = vec![make_box(&owner, 5_000_000, vec![token(&token_x, 5)])];
        let target = TransferTarget::new(
            5_000_000u64.try_into().unwrap(),
            vec![token(&token_x, 5)],
        )
        .unwrap();
        let selection = ChainBoxSelector::new().select(boxes, &target).unwrap();
        assert!(selection.change_boxes.is_empty());
    }

    #[test]
    fn value_shortage_is_reported_as_coins() {
        let owner = owner();
        let boxes = vec![make_box(&owner, 2_000_000, vec![])];
        let target = TransferTarget::nano_ergs_only(4_000_000u64.try_into().unwrap());
        assert!(matches!(
            ChainBoxSelector::new().select(boxes, &target),
            Err(BoxSelectionError::NotEnoughCoins {
                required: 4_000_000,
                found: 2_000_000
            })
        ));
    }

    #[test]
    fn token_shortage_with_enough_value_is_reported_as_tokens() {
        let owner = owner();
        let token_x = force_any_val::<TokenId>();
        let boxes = vec![
            make_box(&owner, 1_000_000_000, vec![token(&token_x, 3)]),
            make_box(&owner, 1_000_000_000, vec![]),
        ];
        let target = TransferTarget::new(
            1_000_000u64.try_into().unwrap(),
            vec![token(&token_x, 15)],
        )
        .unwrap();
        match ChainBoxSelector::new().select(boxes, &target) {
            Err(BoxSelectionError::NotEnoughTokens {
                token_id,
                required,
                found,
            }) => {
                assert_eq!(token_id, token_x);
                assert_eq!(required, 15);
                assert_eq!(found, 3);
            }
            other => panic!("expected NotEnoughTokens, got {:?}", other),
        }
    }

    #[test]
    fn small_change_pulls_in_the_next_box() {
        let owner = owner();
        let boxes = vec![
            make_box(&owner, 4_000_100, vec![]),
            make_box(&owner, 2_000_000, vec![]),
        ];
        let target = TransferTarget::nano_ergs_only(4_000_000u64.try_into().unwrap());
        let selection = ChainBoxSelector::new().select(boxes.clone(), &target).unwrap();
        assert_eq!(ids(&selection), boxes);
        assert_eq!(*selection.change_boxes[0].value.as_u64(), 2_000_100);
    }

    // The pool covers the target, yet the 100 nanoErg leftover cannot stand as its own box,
    // so a covering pool is not always a sufficient one
    #[test]
    fn small_change_without_more_boxes_fails() {
        let owner = owner();
        let boxes = vec![make_box(&owner, 4_000_100, vec![])];
        let target = TransferTarget::nano_ergs_only(4_000_000u64.try_into().unwrap());
        assert!(matches!(
            ChainBoxSelector::new().select(boxes, &target),
            Err(BoxSelectionError::NotEnoughCoinsForChangeBox { change: 100, .. })
        ));
    }

    #[test]
    fn leftover_of_the_smallest_box_value_forms_change() {
        let owner = owner();
        let boxes = vec![make_box(&owner, 4_000_000 + BoxValue::MIN_RAW, vec![])];
        let target = TransferTarget::nano_ergs_only(4_000_000u64.try_into().unwrap());
        let selection = ChainBoxSelector::with_min_change_value(BoxValue::MIN)
            .select(boxes, &target)
            .unwrap();
        assert_eq!(selection.change_boxes.len(), 1);
        assert_eq!(*selection.change_boxes[0].value.as_u64(), BoxValue::MIN_RAW);
    }

    #[test]
    fn selection_is_deterministic() {
        let owner = owner();
        let boxes: Vec<ErgoBox> = (1..=10)
            .map(|i| make_box(&owner, i * 1_000_000, vec![]))
            .collect();
        let target = TransferTarget::nano_ergs_only(20_000_000u64.try_into().unwrap());
        let selector = ChainBoxSelector::new();
        let first = selector.select(boxes.clone(), &target).unwrap();
        let second = selector.select(boxes, &target).unwrap();
        assert_eq!(ids(&first), ids(&second));
        let change_values = |s: &BoxSelection<ErgoBox>| -> Vec<u64> {
            s.change_boxes.iter().map(|c| *c.value.as_u64()).collect()
        };
        assert_eq!(change_values(&first), change_values(&second));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn sufficient_pool_yields_covering_subset(
            pool in prop::collection::vec((1_000_000u64..100_000_000, 0u64..20), 1..12),
            target_value in 1_000_000u64..50_000_000,
            target_tokens in 1u64..40,
        ) {
            let owner = owner();
            let token_x = force_any_val::<TokenId>();
            let boxes: Vec<ErgoBox> = pool
                .iter()
                .map(|(value, amount)| {
                    let tokens = if *amount > 0 { vec![token(&token_x, *amount)] } else { vec![] };
                    make_box(&owner, *value, tokens)
                })
                .collect();
            let pool_balance = Balance::of_boxes(&boxes);
            let target = TransferTarget::new(
                target_value.try_into().unwrap(),
                vec![token(&token_x, target_tokens)],
            )
            .unwrap();
            let res = ChainBoxSelector::with_min_change_value(BoxValue::MIN)
                .select(boxes.clone(), &target);
            // A leftover below BoxValue::MIN cannot form a change box, so "sufficient" here
            // means covering the target plus room for the smallest change box
            if pool_balance.nano_ergs >= target_value + BoxValue::MIN_RAW
                && pool_balance.token_amount(&token_x) >= target_tokens
            {
                let selection = res.unwrap();
                let selected: Vec<ErgoBox> = selection.boxes.iter().cloned().collect();
                prop_assert!(selected.iter().all(|b| boxes.contains(b)));
                let selected_balance = Balance::of_boxes(&selected);
                prop_assert!(selected_balance.nano_ergs >= target_value);
                prop_assert!(selected_balance.token_amount(&token_x) >= target_tokens);
                let change_value: u64 = selection
                    .change_boxes
                    .iter()
                    .map(|c| *c.value.as_u64())
                    .sum();
                prop_assert_eq!(selected_balance.nano_ergs, target_value + change_value);
            } else if pool_balance.nano_ergs < target_value {
                let is_not_enough_coins =
                    matches!(res, Err(BoxSelectionError::NotEnoughCoins { .. }));
                prop_assert!(is_not_enough_coins);
            } else if pool_balance.token_amount(&token_x) < target_tokens {
                let is_not_enough_tokens =
                    matches!(res, Err(BoxSelectionError::NotEnoughTokens { .. }));
                prop_assert!(is_not_enough_tokens);
            }
        }
    }
}
