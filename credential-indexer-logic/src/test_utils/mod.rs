use std::time::Duration;

use alloy::primitives::{Address, U256, address};

use crate::{
    content::{IpfsGateway, to_ipfs_uri},
    settings::{CredentialIndexerSettings, LogFetcherSettings},
    types::CredentialSummary,
};

mod in_memory_store;
mod logs;
mod mock_log_source;

pub use in_memory_store::InMemoryCredentialStore;
pub use logs::{issued_log, log_with, revoked_log};
pub use mock_log_source::MockLogSource;

pub const CONTRACT: Address = address!("0x2525252525252525252525252525252525252525");
pub const ISSUER: Address = address!("0x1111111111111111111111111111111111111111");
pub const SUBJECT: Address = address!("0x2222222222222222222222222222222222222222");

#[cfg(test)]
pub async fn init_db(name: &str) -> blockscout_service_launcher::test_database::TestDbGuard {
    blockscout_service_launcher::test_database::TestDbGuard::new::<migration::Migrator>(name)
        .await
}

/// Retries and pacing without any sleeping.
pub fn instant_fetch_settings() -> LogFetcherSettings {
    LogFetcherSettings {
        max_attempts: 3,
        retry_delays: vec![Duration::ZERO, Duration::ZERO],
        pacing_delay: Duration::ZERO,
    }
}

pub fn test_settings() -> CredentialIndexerSettings {
    CredentialIndexerSettings {
        contract_address: Some(CONTRACT),
        fetch: instant_fetch_settings(),
        ..Default::default()
    }
}

/// Active credential of `SUBJECT` issued by `ISSUER`, resolved through the default gateway.
pub fn summary(token_id: u64, issued_at_block: u64) -> CredentialSummary {
    let content_id = format!("bafy-{token_id}");
    let uri = to_ipfs_uri(&content_id);
    let gateway_url = IpfsGateway::new(test_settings().ipfs_gateway).to_gateway_url(&uri);
    CredentialSummary {
        token_id: U256::from(token_id),
        issuer: ISSUER,
        subject: SUBJECT,
        content_id,
        uri,
        gateway_url,
        issued_at_block,
        revoked: false,
        revoked_at_block: None,
    }
}
