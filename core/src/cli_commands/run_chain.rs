use ergo_lib::ergotree_ir::chain::address::NetworkPrefix;
use log::info;

use crate::chain_config::ChainConfig;
use crate::chain_planner::ChainInput;
use crate::chain_planner::ChainPlanner;
use crate::chain_report::ChainReport;
use crate::explorer_api::ergo_explorer_transaction_link;
use crate::explorer_api::ExplorerApi;
use crate::node_interface::node_api::NodeApi;
use crate::node_interface::DryRunSubmit;
use crate::node_interface::SubmitTransaction;
use crate::wallet::ExplorerWalletData;
use crate::wallet::LocalWallet;

/// Build, sign and submit the whole chain described by `config`. With `dry_run` every
/// transaction is built and signed but nothing is submitted and nothing waits.
pub fn run_chain(config: &ChainConfig, dry_run: bool) -> Result<ChainReport, anyhow::Error> {
    let network_prefix = NetworkPrefix::from(config.network);
    let wallet = LocalWallet::from_mnemonic(
        &config.wallet_mnemonic,
        &config.wallet_mnemonic_password,
        config.wallet_address_index,
        network_prefix,
    )?;
    info!("Wallet address: {}", wallet.address().to_base58());
    info!(
        "Recipient: {}, per hop: {} nanoErgs and {} of token {}",
        config.recipient_address.to_base58(),
        config.nano_ergs_per_hop.as_u64(),
        config.tokens_per_hop.as_u64(),
        String::from(config.token_id.clone())
    );

    let explorer = ExplorerApi::new(config.explorer_api_url());
    let wallet_data = ExplorerWalletData::new(&explorer, wallet.address().clone());
    let node = NodeApi::new(config.node_url.clone());
    let mut params = config.chain_parameters()?;
    let submit_tx: &dyn SubmitTransaction = if dry_run {
        info!("Dry run: transactions are signed but not submitted");
        params.settle_interval = std::time::Duration::ZERO;
        &DryRunSubmit
    } else {
        &node
    };

    let planner = ChainPlanner::new(ChainInput {
        params,
        wallet: &wallet_data,
        network: &explorer,
        tx_signer: &wallet,
        submit_tx,
    })?;
    info!(
        "Seed output: {} nanoErgs incl. {} nanoErgs of hop fees",
        planner.totals().seed.nano_ergs.as_u64(),
        planner.totals().fee_reserve.as_u64()
    );
    let report = planner.run()?;
    log::debug!("Submitted transactions: {:?}", report.all_tx_ids());
    if let Some(final_tx_id) = report.final_tx_id() {
        info!(
            "Final transaction: {}",
            ergo_explorer_transaction_link(&config.explorer_web_url(), final_tx_id.clone())
        );
    }
    Ok(report)
}
