use ergo_lib::chain::transaction::TxId;

/// Transaction ids submitted by a chain run, in submission order. Also describes how far a failed
/// run got.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainReport {
    pub genesis_tx_id: Option<TxId>,
    pub hop_tx_ids: Vec<TxId>,
}

impl ChainReport {
    pub fn hops_submitted(&self) -> usize {
        self.hop_tx_ids.len()
    }

    /// Id of the last submitted transaction
    pub fn final_tx_id(&self) -> Option<&TxId> {
        self.hop_tx_ids.last().or(self.genesis_tx_id.as_ref())
    }

    pub fn all_tx_ids(&self) -> Vec<TxId> {
        self.genesis_tx_id
            .iter()
            .chain(self.hop_tx_ids.iter())
            .cloned()
            .collect()
    }
}

impl std::fmt::Display for ChainReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.genesis_tx_id {
            Some(id) => write!(f, "genesis {}", id)?,
            None => write!(f, "nothing submitted")?,
        }
        write!(f, ", {} hop(s)", self.hops_submitted())?;
        if let Some(id) = self.hop_tx_ids.last() {
            write!(f, ", final {}", id)?;
        }
        Ok(())
    }
}
