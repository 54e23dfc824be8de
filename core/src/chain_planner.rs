//! Drives a chain run as an explicit state machine:
//!
//! `Init -> GenesisBuilt -> GenesisSubmitted -> HopPending(0) -> HopSubmitted(0) -> HopPending(1)
//! -> ... -> HopSubmitted(n-1) -> Complete`
//!
//! Each call to [`ChainPlanner::advance`] performs exactly one transition. Any error ends the run;
//! the returned [`ChainRunError`] names the stage that failed and what was submitted before it.
use std::time::Duration;

use ergo_lib::chain::transaction::Transaction;
use ergo_lib::ergotree_ir::chain::address::Address;
use ergo_lib::ergotree_ir::chain::ergo_box::box_value::BoxValue;
use ergo_lib::ergotree_ir::chain::ergo_box::ErgoBox;
use log::debug;
use log::info;
use thiserror::Error;

use crate::box_selector::ChainBoxSelector;
use crate::chain_commands::genesis::build_genesis_plan;
use crate::chain_commands::genesis::seed_output;
use crate::chain_commands::hop::build_hop_plan;
use crate::chain_commands::hop::linkage_output;
use crate::chain_commands::wallet_output;
use crate::chain_commands::ChainError;
use crate::chain_report::ChainReport;
use crate::chain_types::HopCount;
use crate::chain_types::HopIndex;
use crate::network_state::NetworkSnapshot;
use crate::network_state::NetworkStateSource;
use crate::node_interface::SignTransaction;
use crate::node_interface::SubmitTransaction;
use crate::sequencer::SubmissionSequencer;
use crate::transfer::ChainTotals;
use crate::transfer::TransferTarget;
use crate::tx_plan::TransactionPlan;
use crate::wallet::WalletDataSource;

#[derive(Debug, Clone)]
pub struct ChainParameters {
    pub recipient: Address,
    pub per_hop: TransferTarget,
    pub hop_count: HopCount,
    pub genesis_fee: BoxValue,
    pub hop_fee: BoxValue,
    pub settle_interval: Duration,
}

pub struct ChainInput<'a> {
    pub params: ChainParameters,
    pub wallet: &'a dyn WalletDataSource,
    pub network: &'a dyn NetworkStateSource,
    pub tx_signer: &'a dyn SignTransaction,
    pub submit_tx: &'a dyn SubmitTransaction,
}

#[derive(Debug)]
pub enum ChainStage {
    Init,
    GenesisBuilt {
        signed_tx: Transaction,
    },
    GenesisSubmitted {
        signed_tx: Transaction,
    },
    HopPending {
        hop: HopIndex,
        input: ErgoBox,
    },
    HopSubmitted {
        hop: HopIndex,
        signed_tx: Transaction,
        /// Output position the next hop's input is expected at
        change_index: usize,
    },
    Complete,
}

impl std::fmt::Display for ChainStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainStage::Init => write!(f, "init"),
            ChainStage::GenesisBuilt { .. } => write!(f, "genesis built"),
            ChainStage::GenesisSubmitted { .. } => write!(f, "genesis submitted"),
            ChainStage::HopPending { hop, .. } => write!(f, "hop {} pending", hop),
            ChainStage::HopSubmitted { hop, .. } => write!(f, "hop {} submitted", hop),
            ChainStage::Complete => write!(f, "complete"),
        }
    }
}

/// Runtime state of one chain run. Never persisted.
#[derive(Debug)]
pub struct ChainState {
    pub stage: ChainStage,
    /// Height and signing context shared by every transaction of the run
    pub snapshot: NetworkSnapshot,
    pub wallet_address: Address,
    pub report: ChainReport,
}

#[derive(Debug, Error)]
#[error("chain run failed at stage `{stage}` ({progress}): {source}")]
pub struct ChainRunError {
    pub stage: String,
    pub progress: ChainReport,
    #[source]
    pub source: ChainError,
}

pub struct ChainPlanner<'a> {
    params: ChainParameters,
    totals: ChainTotals,
    selector: ChainBoxSelector,
    wallet: &'a dyn WalletDataSource,
    network: &'a dyn NetworkStateSource,
    tx_signer: &'a dyn SignTransaction,
    sequencer: SubmissionSequencer<'a>,
}

impl<'a> ChainPlanner<'a> {
    pub fn new(input: ChainInput<'a>) -> Result<Self, ChainError> {
        let totals = ChainTotals::new(
            &input.params.per_hop,
            input.params.hop_count,
            input.params.hop_fee,
        )?;
        Ok(ChainPlanner {
            sequencer: SubmissionSequencer::new(input.submit_tx, input.params.settle_interval),
            params: input.params,
            totals,
            selector: ChainBoxSelector::new(),
            wallet: input.wallet,
            network: input.network,
            tx_signer: input.tx_signer,
        })
    }

    pub fn totals(&self) -> &ChainTotals {
        &self.totals
    }

    /// Snapshot the network and the wallet address, yielding the `Init` state
    pub fn start(&self) -> Result<ChainState, ChainRunError> {
        let init = || -> Result<(NetworkSnapshot, Address), ChainError> {
            let snapshot = NetworkSnapshot::take(self.network)?;
            let wallet_address = self.wallet.get_change_address()?.address();
            Ok((snapshot, wallet_address))
        };
        match init() {
            Ok((snapshot, wallet_address)) => {
                info!(
                    "Starting chain of {} hops at height {}",
                    self.params.hop_count.0, snapshot.height
                );
                Ok(ChainState {
                    stage: ChainStage::Init,
                    snapshot,
                    wallet_address,
                    report: ChainReport::default(),
                })
            }
            Err(source) => Err(ChainRunError {
                stage: ChainStage::Init.to_string(),
                progress: ChainReport::default(),
                source,
            }),
        }
    }

    /// Perform one transition
    pub fn advance(&self, state: ChainState) -> Result<ChainState, ChainRunError> {
        let ChainState {
            stage,
            snapshot,
            wallet_address,
            mut report,
        } = state;
        let stage_name = stage.to_string();
        match self.step(stage, &snapshot, &wallet_address, &mut report) {
            Ok(next) => {
                debug!("Chain stage: {} -> {}", stage_name, next);
                Ok(ChainState {
                    stage: next,
                    snapshot,
                    wallet_address,
                    report,
                })
            }
            Err(source) => Err(ChainRunError {
                stage: stage_name,
                progress: report,
                source,
            }),
        }
    }

    /// Run the chain to completion
    pub fn run(&self) -> Result<ChainReport, ChainRunError> {
        let mut state = self.start()?;
        while !matches!(state.stage, ChainStage::Complete) {
            state = self.advance(state)?;
        }
        info!("Chain complete: {}", state.report);
        Ok(state.report)
    }

    fn step(
        &self,
        stage: ChainStage,
        snapshot: &NetworkSnapshot,
        wallet_address: &Address,
        report: &mut ChainReport,
    ) -> Result<ChainStage, ChainError> {
        match stage {
            ChainStage::Init => {
                let wallet_boxes = self.wallet.get_unspent_wallet_boxes()?;
                let plan = build_genesis_plan(
                    wallet_boxes,
                    &self.totals,
                    self.params.genesis_fee,
                    wallet_address,
                    snapshot.height,
                    &self.selector,
                )?;
                let signed_tx = self.sign(&plan, wallet_address, snapshot)?;
                info!(
                    "Genesis transaction {} built, seed output holds {} nanoErgs",
                    signed_tx.id(),
                    self.totals.seed.nano_ergs.as_u64()
                );
                Ok(ChainStage::GenesisBuilt { signed_tx })
            }
            ChainStage::GenesisBuilt { signed_tx } => {
                report.genesis_tx_id = Some(self.sequencer.submit(&signed_tx)?);
                Ok(ChainStage::GenesisSubmitted { signed_tx })
            }
            ChainStage::GenesisSubmitted { signed_tx } => {
                self.sequencer.settle();
                let input = seed_output(&signed_tx, &wallet_address.script()?)?;
                Ok(ChainStage::HopPending {
                    hop: HopIndex(0),
                    input,
                })
            }
            ChainStage::HopPending { hop, input } => {
                let plan = build_hop_plan(
                    input,
                    &self.params.per_hop,
                    self.params.hop_fee,
                    &self.params.recipient,
                    snapshot.height,
                    &self.selector,
                )?;
                let signed_tx = self.sign(&plan, wallet_address, snapshot)?;
                let tx_id = self.sequencer.submit(&signed_tx)?;
                info!(
                    "Hop {}/{} submitted: {}",
                    hop, self.params.hop_count.0, tx_id
                );
                report.hop_tx_ids.push(tx_id);
                Ok(ChainStage::HopSubmitted {
                    hop,
                    signed_tx,
                    change_index: plan.change_output_index(),
                })
            }
            ChainStage::HopSubmitted {
                hop,
                signed_tx,
                change_index,
            } => {
                let wallet_tree = wallet_address.script()?;
                if hop.is_last(self.params.hop_count) {
                    // Nothing spends the last hop's change, so its absence is fine
                    if wallet_output(&signed_tx, change_index, &wallet_tree).is_none() {
                        debug!("Final hop left no change");
                    }
                    return Ok(ChainStage::Complete);
                }
                self.sequencer.settle();
                let next_hop = hop.next();
                let input = linkage_output(&signed_tx, change_index, &wallet_tree, next_hop)?;
                Ok(ChainStage::HopPending {
                    hop: next_hop,
                    input,
                })
            }
            ChainStage::Complete => Ok(ChainStage::Complete),
        }
    }

    fn sign(
        &self,
        plan: &TransactionPlan,
        change_address: &Address,
        snapshot: &NetworkSnapshot,
    ) -> Result<Transaction, ChainError> {
        let unsigned_tx = plan.build_unsigned_tx(change_address)?;
        debug!(
            "Signing transaction with {} input(s), {} payment output(s), {} change box(es), fee {}",
            plan.inputs().len(),
            plan.outputs().len(),
            plan.change().len(),
            plan.fee().as_u64()
        );
        Ok(self.tx_signer.sign_transaction_with_inputs(
            &unsigned_tx,
            plan.inputs_io_vec()?,
            None,
            &snapshot.state_context,
        )?)
    }
}
