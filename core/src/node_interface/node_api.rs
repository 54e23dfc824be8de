use ergo_lib::chain::transaction::Transaction;
use ergo_lib::chain::transaction::TxId;
use reqwest::blocking::RequestBuilder;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;

use super::SubmissionError;
use super::SubmitTransaction;

/// Client for the node's transaction endpoint.
pub struct NodeApi {
    pub url: Url,
}

impl NodeApi {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    fn set_req_headers(&self, rb: RequestBuilder) -> RequestBuilder {
        rb.header("accept", "application/json")
            .header(CONTENT_TYPE, "application/json")
    }
}

impl SubmitTransaction for NodeApi {
    /// POST /transactions
    fn submit_transaction(&self, tx: &Transaction) -> Result<TxId, SubmissionError> {
        let tx_id = tx.id();
        let url = self
            .url
            .join("transactions")
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;
        let body = serde_json::to_string(tx).map_err(|e| SubmissionError::Rejected {
            tx_id: tx.id(),
            reason: format!("cannot encode transaction: {e}"),
        })?;
        let request = reqwest::blocking::Client::new().post(url).body(body);
        let response = self
            .set_req_headers(request)
            .send()
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(SubmissionError::Rejected {
                tx_id,
                reason: format!("{status}: {text}"),
            });
        }
        // The node answers with the id as a JSON string
        let node_tx_id: String =
            serde_json::from_str(&text).unwrap_or_else(|_| text.trim().to_string());
        if node_tx_id != tx_id.to_string() {
            log::warn!(
                "Node returned tx id {} for submitted transaction {}",
                node_tx_id,
                tx_id
            );
        }
        Ok(tx_id)
    }
}
