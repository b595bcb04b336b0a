use std::sync::Arc;

use alloy::{primitives::Address, sol_types::SolEvent};
use tracing::instrument;

use crate::{
    abi::ICredentialSbt::{CredentialIssued, CredentialRevoked},
    content::IpfsGateway,
    decoder::decode_all,
    error::{CredentialIndexerError, NodeUnavailableError},
    fetcher::{IndexedTopic, LogFetcher, LogQuery},
    node::{LogSource, build_http_provider},
    projector::project,
    reconciler::reconcile,
    settings::CredentialIndexerSettings,
    types::{BlockNumber, BlockRange, CredentialSummary, IssuedEvent, RevokedEvent},
};

/// Read-only credential queries against the node.
pub struct CredentialService {
    source: Arc<dyn LogSource>,
    fetcher: LogFetcher,
    contract: Address,
    gateway: IpfsGateway,
    settings: CredentialIndexerSettings,
}

impl CredentialService {
    pub fn new(
        source: Arc<dyn LogSource>,
        settings: CredentialIndexerSettings,
    ) -> Result<Self, CredentialIndexerError> {
        let contract = settings.contract_address.ok_or_else(|| {
            CredentialIndexerError::Configuration("credential contract address is not set".into())
        })?;
        let fetcher = LogFetcher::new(source.clone(), settings.fetch.clone());
        let gateway = IpfsGateway::new(settings.ipfs_gateway.clone());

        Ok(Self {
            source,
            fetcher,
            contract,
            gateway,
            settings,
        })
    }

    /// Connects to `settings.rpc_url` over HTTP.
    pub fn from_settings(
        settings: CredentialIndexerSettings,
    ) -> Result<Self, CredentialIndexerError> {
        let rpc_url = settings.rpc_url.clone().ok_or_else(|| {
            CredentialIndexerError::Configuration("node rpc url is not set".into())
        })?;
        Self::new(Arc::new(build_http_provider(rpc_url)), settings)
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    pub fn gateway(&self) -> &IpfsGateway {
        &self.gateway
    }

    pub async fn latest_block(&self) -> Result<BlockNumber, NodeUnavailableError> {
        self.source
            .block_number()
            .await
            .map_err(NodeUnavailableError::BlockHeight)
    }

    /// Trailing window ending at the current head. Falls back to the configured default window.
    pub async fn trailing_range(
        &self,
        window: Option<u64>,
    ) -> Result<BlockRange, NodeUnavailableError> {
        let latest = self.latest_block().await?;
        Ok(BlockRange::trailing(
            latest,
            window.unwrap_or(self.settings.default_window),
        ))
    }

    #[instrument(skip_all, fields(%subject, ?window))]
    pub async fn credentials_for_subject(
        &self,
        subject: Address,
        window: Option<u64>,
    ) -> Result<Vec<CredentialSummary>, CredentialIndexerError> {
        let range = self.trailing_range(window).await?;
        self.credentials_in_range(subject, range).await
    }

    /// Credentials issued to `subject` within `range`, newest first.
    pub async fn credentials_in_range(
        &self,
        subject: Address,
        range: BlockRange,
    ) -> Result<Vec<CredentialSummary>, CredentialIndexerError> {
        let issued = self.fetch_issued(subject, range).await?;
        if issued.is_empty() {
            tracing::debug!(%subject, %range, "no credentials issued in range");
            return Ok(Vec::new());
        }
        let revoked = self.fetch_revoked(range).await?;

        let summaries = project(reconcile(&issued, &revoked), &self.gateway);
        tracing::debug!(
            %subject,
            %range,
            count = summaries.len(),
            "collected credentials"
        );
        Ok(summaries)
    }

    pub async fn fetch_issued(
        &self,
        subject: Address,
        range: BlockRange,
    ) -> Result<Vec<IssuedEvent>, NodeUnavailableError> {
        let query = LogQuery {
            address: self.contract,
            range,
            event_signature: CredentialIssued::SIGNATURE_HASH,
            indexed: Some(IndexedTopic::Topic3(subject.into_word())),
            chunk_size: self.settings.issued_chunk_size,
        };
        let logs = self.fetcher.fetch_logs_chunked(&query).await?;
        Ok(decode_all(&logs).issued)
    }

    /// Revocations of any token in `range`.
    pub async fn fetch_revoked(
        &self,
        range: BlockRange,
    ) -> Result<Vec<RevokedEvent>, NodeUnavailableError> {
        let query = LogQuery {
            address: self.contract,
            range,
            event_signature: CredentialRevoked::SIGNATURE_HASH,
            indexed: None,
            chunk_size: self.settings.revoked_chunk_size,
        };
        let logs = self.fetcher.fetch_logs_chunked(&query).await?;
        Ok(decode_all(&logs).revoked)
    }
}
