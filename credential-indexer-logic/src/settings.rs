use std::time::Duration;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use url::Url;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialIndexerSettings {
    pub rpc_url: Option<Url>,
    pub contract_address: Option<Address>,
    pub default_window: u64,
    pub issued_chunk_size: u64,
    pub revoked_chunk_size: u64,
    pub fetch: LogFetcherSettings,
    pub ipfs_gateway: Url,
    pub metadata: MetadataClientSettings,
}

impl Default for CredentialIndexerSettings {
    fn default() -> Self {
        Self {
            rpc_url: None,
            contract_address: None,
            default_window: default_window(),
            issued_chunk_size: 800,
            revoked_chunk_size: 256,
            fetch: LogFetcherSettings::default(),
            ipfs_gateway: default_ipfs_gateway(),
            metadata: MetadataClientSettings::default(),
        }
    }
}

fn default_window() -> u64 {
    100_000
}

fn default_ipfs_gateway() -> Url {
    Url::parse("https://ipfs.io/ipfs/").expect("valid default gateway url")
}

#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LogFetcherSettings {
    pub max_attempts: u32,
    /// Delay after the n-th failed attempt. The last entry repeats if there are more attempts.
    #[serde_as(as = "Vec<serde_with::DurationMilliSeconds<u64>>")]
    pub retry_delays: Vec<Duration>,
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub pacing_delay: Duration,
}

impl Default for LogFetcherSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delays: vec![Duration::from_millis(200), Duration::from_millis(500)],
            pacing_delay: Duration::from_millis(50),
        }
    }
}

impl LogFetcherSettings {
    pub fn retry_delay(&self, failed_attempt: u32) -> Duration {
        let index = failed_attempt.saturating_sub(1) as usize;
        self.retry_delays
            .get(index)
            .or_else(|| self.retry_delays.last())
            .copied()
            .unwrap_or_default()
    }
}

#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataClientSettings {
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub timeout: Duration,
}

impl Default for MetadataClientSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}
