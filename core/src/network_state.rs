//! Snapshot of the chain tip that every transaction of a run is built and signed against.
use std::convert::TryInto;

use ergo_lib::chain::ergo_state_context::ErgoStateContext;
use ergo_lib::ergo_chain_types::Header;
use ergo_lib::ergo_chain_types::PreHeader;
use thiserror::Error;

use crate::chain_types::BlockHeight;
use crate::explorer_api::ExplorerApiError;

/// Number of last block headers the signing context needs
pub const STATE_CONTEXT_HEADERS: usize = 10;

#[derive(Debug, Error)]
pub enum NetworkStateError {
    #[error("explorer api error: {0}")]
    ExplorerApi(#[from] ExplorerApiError),
    #[error("expected {STATE_CONTEXT_HEADERS} block headers, got {0}")]
    NotEnoughHeaders(usize),
}

pub trait NetworkStateSource {
    fn current_height(&self) -> Result<BlockHeight, NetworkStateError>;
    fn state_context(&self) -> Result<ErgoStateContext, NetworkStateError>;
}

#[derive(Debug, Clone)]
pub struct NetworkSnapshot {
    pub height: BlockHeight,
    pub state_context: ErgoStateContext,
}

impl NetworkSnapshot {
    pub fn take(source: &dyn NetworkStateSource) -> Result<Self, NetworkStateError> {
        let height = source.current_height()?;
        let state_context = source.state_context()?;
        Ok(NetworkSnapshot {
            height,
            state_context,
        })
    }
}

/// Build a signing context from recent headers, in any order. The newest header becomes the
/// pre-header.
pub fn state_context_from_headers(
    mut headers: Vec<Header>,
) -> Result<ErgoStateContext, NetworkStateError> {
    headers.sort_by(|a, b| b.height.cmp(&a.height));
    headers.truncate(STATE_CONTEXT_HEADERS);
    let last_headers: [Header; STATE_CONTEXT_HEADERS] = headers
        .try_into()
        .map_err(|h: Vec<Header>| NetworkStateError::NotEnoughHeaders(h.len()))?;
    let pre_header = PreHeader::from(last_headers[0].clone());
    Ok(ErgoStateContext::new(pre_header, last_headers))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use sigma_test_util::force_any_val;

    use super::*;

    fn header_at(height: u32) -> Header {
        let mut header = force_any_val::<Header>();
        header.height = height;
        header
    }

    #[test]
    fn newest_header_becomes_pre_header() {
        let headers: Vec<Header> = (100..112).map(header_at).collect();
        let ctx = state_context_from_headers(headers).unwrap();
        assert_eq!(ctx.pre_header.height, 111);
    }

    #[test]
    fn too_few_headers() {
        let headers: Vec<Header> = (100..104).map(header_at).collect();
        assert!(matches!(
            state_context_from_headers(headers),
            Err(NetworkStateError::NotEnoughHeaders(4))
        ));
    }
}
