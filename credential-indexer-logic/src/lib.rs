mod abi;
mod content;
mod database;
mod decoder;
mod error;
mod fetcher;
mod metadata;
mod node;
mod projector;
mod reconciler;
mod service;
pub mod settings;
mod sync;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use abi::ICredentialSbt;
pub use content::{ContentResolver, IPFS_SCHEME, IpfsGateway, to_ipfs_uri};
pub use database::{CredentialDatabase, CredentialStore};
pub use decoder::{DecodeFailure, DecodedBatch, DecodedEvent, decode, decode_all};
pub use error::{
    CredentialIndexerError, LogFetchError, NodeUnavailableError, PersistenceError,
    PersistenceOperation,
};
pub use fetcher::{IndexedTopic, LogFetcher, LogQuery, MAX_CHUNK_SIZE};
pub use metadata::{CredentialMetadata, MetadataClient, MetadataError, MetadataLink};
pub use node::{LogSource, build_http_provider};
pub use projector::project;
pub use reconciler::{ReconciledCredentials, earliest_revocations, reconcile};
pub use service::CredentialService;
pub use settings::{CredentialIndexerSettings, LogFetcherSettings, MetadataClientSettings};
pub use sync::{CredentialSynchronizer, SyncReport};
pub use types::{
    BlockNumber, BlockRange, BlockRangeChunks, CredentialRecord, CredentialSummary,
    InvalidBlockRange, IssuedEvent, RevokedEvent,
};
