use alloy::{
    network::Ethereum,
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{Filter, Log},
    transports::TransportError,
};
use async_trait::async_trait;
use url::Url;

use crate::types::BlockNumber;

/// Read access to a block-oriented node.
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn block_number(&self) -> Result<BlockNumber, TransportError>;

    async fn logs(&self, filter: &Filter) -> Result<Vec<Log>, TransportError>;
}

#[async_trait]
impl LogSource for DynProvider<Ethereum> {
    async fn block_number(&self) -> Result<BlockNumber, TransportError> {
        Provider::get_block_number(self).await
    }

    async fn logs(&self, filter: &Filter) -> Result<Vec<Log>, TransportError> {
        Provider::get_logs(self, filter).await
    }
}

pub fn build_http_provider(url: Url) -> DynProvider<Ethereum> {
    ProviderBuilder::new().connect_http(url).erased()
}
