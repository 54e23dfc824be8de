use derive_more::From;
use ergo_lib::chain::ergo_state_context::ErgoStateContext;
use ergo_lib::chain::transaction::TxId;
use ergo_lib::ergo_chain_types::Header;
use ergo_lib::ergotree_ir::chain::address::NetworkAddress;
use ergo_lib::ergotree_ir::chain::ergo_box::ErgoBox;
use reqwest::blocking::RequestBuilder;
use reqwest::blocking::Response;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use url::ParseError;

use crate::chain_types::BlockHeight;
use crate::network_state::state_context_from_headers;
use crate::network_state::NetworkStateError;
use crate::network_state::NetworkStateSource;
use crate::network_state::STATE_CONTEXT_HEADERS;

pub mod explorer_url;

/// Page size for paginated explorer endpoints
const PAGE_LIMIT: usize = 100;

#[derive(Debug, From, Error)]
pub enum ExplorerApiError {
    #[error("reqwest error: {0}")]
    RequestError(reqwest::Error),
    #[error("serde error: {0}")]
    SerdeError(serde_json::Error),
    #[error("invalid explorer url: {0}")]
    InvalidExplorerUrl(ParseError),
}

#[derive(Debug, Deserialize)]
pub struct NetworkState {
    pub height: u32,
}

#[derive(Debug, Deserialize)]
struct Items<T> {
    items: Vec<T>,
}

pub struct ExplorerApi {
    pub url: url::Url,
}

impl ExplorerApi {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    /// Sets required headers for a request
    fn set_req_headers(&self, rb: RequestBuilder) -> RequestBuilder {
        rb.header("accept", "application/json")
            .header(CONTENT_TYPE, "application/json")
    }

    /// Sends a GET request to the explorer
    fn send_get_req(&self, endpoint: &str) -> Result<Response, ExplorerApiError> {
        let url = self.url.join(endpoint)?;
        log::trace!("GET {}", url);
        let client = reqwest::blocking::Client::new().get(url);
        let response = self.set_req_headers(client).send()?;
        Ok(response.error_for_status()?)
    }

    fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ExplorerApiError> {
        let text = self.send_get_req(endpoint)?.text()?;
        log::trace!("{} response: {}", endpoint, text);
        Ok(serde_json::from_str(&text)?)
    }

    /// GET /api/v1/networkState
    pub fn get_network_state(&self) -> Result<NetworkState, ExplorerApiError> {
        self.get_json("api/v1/networkState")
    }

    /// GET /api/v1/blocks/headers
    pub fn get_block_headers(&self, limit: usize) -> Result<Vec<Header>, ExplorerApiError> {
        let endpoint = format!("api/v1/blocks/headers?offset=0&limit={limit}");
        let page: Items<Header> = self.get_json(&endpoint)?;
        Ok(page.items)
    }

    /// GET /api/v1/boxes/unspent/byAddress/{address}, following pages until one comes back short
    pub fn get_unspent_boxes_by_address(
        &self,
        address: &NetworkAddress,
    ) -> Result<Vec<ErgoBox>, ExplorerApiError> {
        let address_str = address.to_base58();
        let mut boxes = Vec::new();
        let mut offset = 0;
        loop {
            let endpoint = format!(
                "api/v1/boxes/unspent/byAddress/{address_str}?offset={offset}&limit={PAGE_LIMIT}"
            );
            let page: Items<ErgoBox> = self.get_json(&endpoint)?;
            let page_len = page.items.len();
            boxes.extend(page.items);
            if page_len < PAGE_LIMIT {
                break;
            }
            offset += page_len;
        }
        log::debug!("Found {} unspent boxes for {}", boxes.len(), address_str);
        Ok(boxes)
    }
}

impl NetworkStateSource for ExplorerApi {
    fn current_height(&self) -> Result<BlockHeight, NetworkStateError> {
        Ok(BlockHeight(self.get_network_state()?.height))
    }

    fn state_context(&self) -> Result<ErgoStateContext, NetworkStateError> {
        let headers = self.get_block_headers(STATE_CONTEXT_HEADERS)?;
        state_context_from_headers(headers)
    }
}

pub(crate) fn ergo_explorer_transaction_link(explorer_url: &Url, tx_id: TxId) -> String {
    let tx_id_str = String::from(tx_id);
    explorer_url
        .join("en/transactions/")
        .and_then(|url| url.join(&tx_id_str))
        .map(|url| url.to_string())
        .unwrap_or(tx_id_str)
}
