//! Common code used for testing chain construction
use std::cell::Cell;
use std::cell::RefCell;
use std::convert::TryInto;

use ergo_chain_sim::Block;
use ergo_chain_sim::ChainSim;
use ergo_lib::chain::ergo_state_context::ErgoStateContext;
use ergo_lib::chain::transaction::unsigned::UnsignedTransaction;
use ergo_lib::chain::transaction::Transaction;
use ergo_lib::chain::transaction::TxId;
use ergo_lib::chain::transaction::TxIoVec;
use ergo_lib::ergotree_ir::chain::address::Address;
use ergo_lib::ergotree_ir::chain::address::NetworkAddress;
use ergo_lib::ergotree_ir::chain::address::NetworkPrefix;
use ergo_lib::ergotree_ir::chain::ergo_box::BoxTokens;
use ergo_lib::ergotree_ir::chain::ergo_box::ErgoBox;
use ergo_lib::ergotree_ir::chain::ergo_box::NonMandatoryRegisters;
use ergo_lib::ergotree_ir::chain::token::Token;
use ergo_lib::ergotree_ir::chain::token::TokenId;
use sigma_test_util::force_any_val;

use crate::chain_types::BlockHeight;
use crate::network_state::NetworkStateError;
use crate::network_state::NetworkStateSource;
use crate::node_interface::SignTransaction;
use crate::node_interface::SignTransactionError;
use crate::node_interface::SubmissionError;
use crate::node_interface::SubmitTransaction;
use crate::wallet::LocalWallet;
use crate::wallet::WalletDataError;
use crate::wallet::WalletDataSource;

pub(crate) const TEST_MNEMONIC: &str =
    "change me do not use me change me do not use me change me do not use me";

pub(crate) fn test_wallet() -> LocalWallet {
    LocalWallet::from_mnemonic(TEST_MNEMONIC, "", 0, NetworkPrefix::Testnet).unwrap()
}

pub(crate) fn token(token_id: &TokenId, amount: u64) -> Token {
    Token {
        token_id: token_id.clone(),
        amount: amount.try_into().unwrap(),
    }
}

pub(crate) fn make_box(address: &Address, value: u64, tokens: Vec<Token>) -> ErgoBox {
    let tokens: Option<BoxTokens> = if tokens.is_empty() {
        None
    } else {
        Some(tokens.try_into().unwrap())
    };
    ErgoBox::new(
        value.try_into().unwrap(),
        address.script().unwrap(),
        tokens,
        NonMandatoryRegisters::empty(),
        1,
        force_any_val::<TxId>(),
        0,
    )
    .unwrap()
}

#[derive(Clone)]
pub(crate) struct WalletDataMock {
    pub unspent_boxes: Vec<ErgoBox>,
    pub change_address: NetworkAddress,
}

impl WalletDataSource for WalletDataMock {
    fn get_unspent_wallet_boxes(&self) -> Result<Vec<ErgoBox>, WalletDataError> {
        Ok(self.unspent_boxes.clone())
    }

    fn get_change_address(&self) -> Result<NetworkAddress, WalletDataError> {
        Ok(self.change_address.clone())
    }
}

/// Network tip at a fixed height. Without a state context it behaves like an explorer that
/// returned no block headers.
pub(crate) struct NetworkStateMock {
    pub height: BlockHeight,
    pub state_context: Option<ErgoStateContext>,
}

impl NetworkStateMock {
    pub fn at_height(height: u32) -> Self {
        NetworkStateMock {
            height: BlockHeight(height),
            state_context: Some(force_any_val::<ErgoStateContext>()),
        }
    }

    pub fn without_headers(height: u32) -> Self {
        NetworkStateMock {
            height: BlockHeight(height),
            state_context: None,
        }
    }
}

impl NetworkStateSource for NetworkStateMock {
    fn current_height(&self) -> Result<BlockHeight, NetworkStateError> {
        Ok(self.height)
    }

    fn state_context(&self) -> Result<ErgoStateContext, NetworkStateError> {
        self.state_context
            .clone()
            .ok_or(NetworkStateError::NotEnoughHeaders(0))
    }
}

/// Counts how many transactions went through signing
pub(crate) struct CountingSigner<'a> {
    pub inner: &'a dyn SignTransaction,
    pub calls: Cell<usize>,
}

impl<'a> CountingSigner<'a> {
    pub fn new(inner: &'a dyn SignTransaction) -> Self {
        CountingSigner {
            inner,
            calls: Cell::new(0),
        }
    }
}

impl<'a> SignTransaction for CountingSigner<'a> {
    fn sign_transaction_with_inputs(
        &self,
        unsigned_tx: &UnsignedTransaction,
        inputs: TxIoVec<ErgoBox>,
        data_boxes: Option<TxIoVec<ErgoBox>>,
        state_context: &ErgoStateContext,
    ) -> Result<Transaction, SignTransactionError> {
        self.calls.set(self.calls.get() + 1);
        self.inner
            .sign_transaction_with_inputs(unsigned_tx, inputs, data_boxes, state_context)
    }
}

/// Submits every transaction as its own block of a simulated chain. Optionally rejects the n-th
/// submission (1-based) the way an unreachable node would.
pub(crate) struct ChainSubmitTx {
    pub chain: RefCell<ChainSim>,
    pub submitted: RefCell<Vec<Transaction>>,
    pub fail_on_call: Option<usize>,
    calls: Cell<usize>,
}

impl ChainSubmitTx {
    pub fn new(chain: ChainSim) -> Self {
        ChainSubmitTx {
            chain: RefCell::new(chain),
            submitted: RefCell::new(Vec::new()),
            fail_on_call: None,
            calls: Cell::new(0),
        }
    }

    pub fn failing_on_call(chain: ChainSim, call: usize) -> Self {
        ChainSubmitTx {
            fail_on_call: Some(call),
            ..ChainSubmitTx::new(chain)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl SubmitTransaction for ChainSubmitTx {
    fn submit_transaction(&self, tx: &Transaction) -> Result<TxId, SubmissionError> {
        let call = self.calls.get() + 1;
        self.calls.set(call);
        if self.fail_on_call == Some(call) {
            return Err(SubmissionError::Transport("connection refused".to_string()));
        }
        self.chain
            .borrow_mut()
            .add_block(Block::new(vec![tx.clone()]))
            .map_err(|e| SubmissionError::Rejected {
                tx_id: tx.id(),
                reason: e.to_string(),
            })?;
        self.submitted.borrow_mut().push(tx.clone());
        Ok(tx.id())
    }
}

pub fn init_log_tests() {
    // set log level via RUST_LOG=info env var
    let _ = env_logger::builder().is_test(true).try_init();
}
