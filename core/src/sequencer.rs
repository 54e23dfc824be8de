use std::time::Duration;

use ergo_lib::chain::transaction::Transaction;
use ergo_lib::chain::transaction::TxId;

use crate::node_interface::SubmissionError;
use crate::node_interface::SubmitTransaction;

/// Submits transactions one at a time and waits between them so each can propagate before the
/// next one spends its outputs. Nothing is retried.
pub struct SubmissionSequencer<'a> {
    submit_tx: &'a dyn SubmitTransaction,
    settle_interval: Duration,
}

impl<'a> SubmissionSequencer<'a> {
    pub fn new(submit_tx: &'a dyn SubmitTransaction, settle_interval: Duration) -> Self {
        SubmissionSequencer {
            submit_tx,
            settle_interval,
        }
    }

    pub fn submit(&self, tx: &Transaction) -> Result<TxId, SubmissionError> {
        log::debug!("Submitting transaction {}", tx.id());
        let tx_id = self.submit_tx.submit_transaction(tx)?;
        log::info!("Transaction {} accepted", tx_id);
        Ok(tx_id)
    }

    /// Block for the settling interval
    pub fn settle(&self) {
        if self.settle_interval.is_zero() {
            return;
        }
        log::info!(
            "Waiting {} ms for the transaction to settle",
            self.settle_interval.as_millis()
        );
        std::thread::sleep(self.settle_interval);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::node_interface::DryRunSubmit;

    #[test]
    fn settle_waits_for_the_interval() {
        let sequencer = SubmissionSequencer::new(&DryRunSubmit, Duration::from_millis(20));
        let start = Instant::now();
        sequencer.settle();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
