use ergo_lib::chain::ergo_box::box_builder::ErgoBoxCandidateBuilder;
use ergo_lib::chain::ergo_box::box_builder::ErgoBoxCandidateBuilderError;
use ergo_lib::ergotree_ir::chain::address::Address;
use ergo_lib::ergotree_ir::chain::ergo_box::ErgoBoxCandidate;
use ergo_lib::ergotree_ir::serialization::SigmaParsingError;
use thiserror::Error;

use crate::chain_types::BlockHeight;
use crate::transfer::TransferTarget;

#[derive(Debug, Error)]
pub enum OutputBuilderError {
    #[error("box builder error: {0}")]
    ErgoBoxCandidateBuilder(#[from] ErgoBoxCandidateBuilderError),
    #[error("Sigma parsing error: {0}")]
    SigmaParse(#[from] SigmaParsingError),
}

/// Payment outputs paying `target` to `recipient`. Always exactly one candidate; change is left to
/// the tx builder, which appends it after these outputs.
pub fn build_transfer_outputs(
    target: &TransferTarget,
    recipient: &Address,
    height: BlockHeight,
) -> Result<Vec<ErgoBoxCandidate>, OutputBuilderError> {
    let mut builder = ErgoBoxCandidateBuilder::new(target.nano_ergs, recipient.script()?, height.0);
    for token in &target.tokens {
        builder.add_token(token.clone());
    }
    Ok(vec![builder.build()?])
}

#[cfg(test)]
mod tests {
    use ergo_lib::ergotree_interpreter::sigma_protocol::private_input::DlogProverInput;
    use ergo_lib::ergotree_ir::chain::token::Token;
    use ergo_lib::ergotree_ir::chain::token::TokenId;
    use pretty_assertions::assert_eq;
    use sigma_test_util::force_any_val;

    use super::*;
    use crate::chain_commands::test_utils::token;

    #[test]
    fn single_payment_output_to_recipient() {
        let recipient = Address::P2Pk(force_any_val::<DlogProverInput>().public_image());
        let token_x = force_any_val::<TokenId>();
        let target = TransferTarget::new(
            1_000_000_000u64.try_into().unwrap(),
            vec![token(&token_x, 5)],
        )
        .unwrap();
        let outputs = build_transfer_outputs(&target, &recipient, BlockHeight(1000)).unwrap();
        assert_eq!(outputs.len(), 1);
        let payment = &outputs[0];
        assert_eq!(payment.value, target.nano_ergs);
        assert_eq!(payment.ergo_tree, recipient.script().unwrap());
        assert_eq!(payment.creation_height, 1000);
        let tokens: Vec<Token> = payment.tokens.as_ref().unwrap().iter().cloned().collect();
        assert_eq!(tokens, target.tokens);
    }
}
