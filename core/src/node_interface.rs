//! Signing and submission seams. The chain planner only talks to these traits; the node HTTP
//! client, the local wallet and the dry-run submitter implement them.
use ergo_lib::chain::ergo_state_context::ErgoStateContext;
use ergo_lib::chain::transaction::unsigned::UnsignedTransaction;
use ergo_lib::chain::transaction::Transaction;
use ergo_lib::chain::transaction::TxId;
use ergo_lib::chain::transaction::TxIoVec;
use ergo_lib::ergotree_ir::chain::ergo_box::ErgoBox;
use thiserror::Error;

pub mod node_api;

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("node is unreachable: {0}")]
    Transport(String),
    #[error("node rejected transaction {tx_id}: {reason}")]
    Rejected { tx_id: TxId, reason: String },
}

#[derive(Debug, Error)]
pub enum SignTransactionError {
    #[error("invalid transaction context: {0}")]
    TxContext(String),
    #[error("wallet failed to sign: {0}")]
    Wallet(String),
}

pub trait SubmitTransaction {
    fn submit_transaction(&self, tx: &Transaction) -> Result<TxId, SubmissionError>;
}

pub trait SignTransaction {
    fn sign_transaction_with_inputs(
        &self,
        unsigned_tx: &UnsignedTransaction,
        inputs: TxIoVec<ErgoBox>,
        data_boxes: Option<TxIoVec<ErgoBox>>,
        state_context: &ErgoStateContext,
    ) -> Result<Transaction, SignTransactionError>;
}

/// Accepts every transaction without talking to a node. The returned id is computed locally, so
/// the chain can still be linked hop by hop.
pub struct DryRunSubmit;

impl SubmitTransaction for DryRunSubmit {
    fn submit_transaction(&self, tx: &Transaction) -> Result<TxId, SubmissionError> {
        log::info!("Dry run, not submitting transaction {}", tx.id());
        log::debug!(
            "Dry run transaction: {}",
            serde_json::to_string_pretty(tx).unwrap_or_else(|e| e.to_string())
        );
        Ok(tx.id())
    }
}
