//! Where the chain's funds come from: the wallet's unspent boxes, its address, and the key that
//! signs every transaction of the chain.
use ergo_lib::chain::ergo_state_context::ErgoStateContext;
use ergo_lib::chain::transaction::unsigned::UnsignedTransaction;
use ergo_lib::chain::transaction::Transaction;
use ergo_lib::chain::transaction::TxIoVec;
use ergo_lib::ergotree_ir::chain::address::NetworkAddress;
use ergo_lib::ergotree_ir::chain::address::NetworkPrefix;
use ergo_lib::ergotree_ir::chain::ergo_box::ErgoBox;
use ergo_lib::wallet::derivation_path::ChildIndexHardened;
use ergo_lib::wallet::derivation_path::ChildIndexNormal;
use ergo_lib::wallet::derivation_path::DerivationPath;
use ergo_lib::wallet::ext_secret_key::ExtSecretKey;
use ergo_lib::wallet::mnemonic::Mnemonic;
use ergo_lib::wallet::signing::TransactionContext;
use ergo_lib::wallet::Wallet;
use thiserror::Error;

use crate::explorer_api::ExplorerApi;
use crate::explorer_api::ExplorerApiError;
use crate::node_interface::SignTransaction;
use crate::node_interface::SignTransactionError;

#[derive(Debug, Error)]
pub enum WalletDataError {
    #[error("explorer api error: {0}")]
    ExplorerApi(#[from] ExplorerApiError),
    #[error("cannot derive wallet key: {0}")]
    KeyDerivation(String),
}

pub trait WalletDataSource {
    fn get_unspent_wallet_boxes(&self) -> Result<Vec<ErgoBox>, WalletDataError>;
    fn get_change_address(&self) -> Result<NetworkAddress, WalletDataError>;
}

/// Wallet boxes as seen by the explorer.
pub struct ExplorerWalletData<'a> {
    explorer: &'a ExplorerApi,
    address: NetworkAddress,
}

impl<'a> ExplorerWalletData<'a> {
    pub fn new(explorer: &'a ExplorerApi, address: NetworkAddress) -> Self {
        ExplorerWalletData { explorer, address }
    }
}

impl<'a> WalletDataSource for ExplorerWalletData<'a> {
    fn get_unspent_wallet_boxes(&self) -> Result<Vec<ErgoBox>, WalletDataError> {
        Ok(self.explorer.get_unspent_boxes_by_address(&self.address)?)
    }

    fn get_change_address(&self) -> Result<NetworkAddress, WalletDataError> {
        Ok(self.address.clone())
    }
}

/// A single EIP-3 key derived from a mnemonic, at `m/44'/429'/0'/0/{address_index}`.
pub struct LocalWallet {
    wallet: Wallet,
    address: NetworkAddress,
}

impl LocalWallet {
    pub fn from_mnemonic(
        mnemonic: &str,
        mnemonic_password: &str,
        address_index: u32,
        network_prefix: NetworkPrefix,
    ) -> Result<Self, WalletDataError> {
        let seed = Mnemonic::to_seed(mnemonic, mnemonic_password);
        let master_key = ExtSecretKey::derive_master(seed).map_err(key_derivation_error)?;
        let account = ChildIndexHardened::from_31_bit(0).map_err(key_derivation_error)?;
        let index = ChildIndexNormal::normal(address_index).map_err(key_derivation_error)?;
        let path = DerivationPath::new(account, vec![index]);
        let secret_key = master_key
            .derive(path)
            .map_err(key_derivation_error)?
            .secret_key();
        let address = NetworkAddress::new(
            network_prefix,
            &secret_key.get_address_from_public_image(),
        );
        log::debug!("Derived wallet address {}", address.to_base58());
        Ok(LocalWallet {
            wallet: Wallet::from_secrets(vec![secret_key]),
            address,
        })
    }

    pub fn address(&self) -> &NetworkAddress {
        &self.address
    }
}

fn key_derivation_error<E: std::fmt::Debug>(e: E) -> WalletDataError {
    WalletDataError::KeyDerivation(format!("{e:?}"))
}

impl SignTransaction for LocalWallet {
    fn sign_transaction_with_inputs(
        &self,
        unsigned_tx: &UnsignedTransaction,
        inputs: TxIoVec<ErgoBox>,
        data_boxes: Option<TxIoVec<ErgoBox>>,
        state_context: &ErgoStateContext,
    ) -> Result<Transaction, SignTransactionError> {
        let tx_context = TransactionContext::new(
            unsigned_tx.clone(),
            inputs.as_vec().clone(),
            data_boxes.map(|bs| bs.as_vec().clone()).unwrap_or_default(),
        )
        .map_err(|e| SignTransactionError::TxContext(e.to_string()))?;
        self.wallet
            .sign_transaction(tx_context, state_context, None)
            .map_err(|e| SignTransactionError::Wallet(e.to_string()))
    }
}
