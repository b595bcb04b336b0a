use alloy::{primitives::U256, transports::TransportError};
use sea_orm::DbErr;
use thiserror::Error;

use crate::types::BlockRange;

#[derive(Debug, Error)]
pub enum CredentialIndexerError {
    /// Missing contract address or node endpoint. Never retried.
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    NodeUnavailable(#[from] NodeUnavailableError),
    #[error("failed to resolve owner profile: {0}")]
    Profile(#[source] DbErr),
}

/// The node could not serve the query. The whole call fails and nothing partial is returned.
#[derive(Debug, Error)]
pub enum NodeUnavailableError {
    #[error("failed to fetch latest block number: {0}")]
    BlockHeight(#[source] TransportError),
    #[error(transparent)]
    LogFetch(#[from] LogFetchError),
}

#[derive(Debug, Error)]
#[error("failed to fetch logs for blocks {range} after {attempts} attempts: {source}")]
pub struct LogFetchError {
    pub range: BlockRange,
    pub attempts: u32,
    #[source]
    pub source: TransportError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceOperation {
    Upsert,
    MarkRevoked,
}

/// A single store write that failed during sync. Remaining writes still run.
#[derive(Debug, Error)]
#[error("failed to {operation:?} credential {token_id}: {source}")]
pub struct PersistenceError {
    pub token_id: U256,
    pub operation: PersistenceOperation,
    #[source]
    pub source: DbErr,
}
