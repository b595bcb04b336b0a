use std::collections::{BTreeMap, HashSet};

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use parking_lot::Mutex;
use sea_orm::DbErr;

use crate::{
    database::CredentialStore,
    types::{BlockNumber, CredentialSummary},
};

/// Store with the same conflict semantics as the Postgres one.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    profiles: Vec<Address>,
    credentials: BTreeMap<(i64, U256), CredentialSummary>,
    failing_upserts: HashSet<U256>,
    fail_profiles: bool,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts of `token_id` fail from now on.
    pub fn fail_upserts_for(&self, token_id: U256) {
        self.state.lock().failing_upserts.insert(token_id);
    }

    pub fn fail_profiles(&self, fail: bool) {
        self.state.lock().fail_profiles = fail;
    }

    pub fn profile_id(&self, wallet: Address) -> Option<i64> {
        let state = self.state.lock();
        state
            .profiles
            .iter()
            .position(|profile| *profile == wallet)
            .map(|index| index as i64 + 1)
    }

    /// All stored credentials keyed by `(profile_id, token_id)`.
    pub fn snapshot(&self) -> BTreeMap<(i64, U256), CredentialSummary> {
        self.state.lock().credentials.clone()
    }
}

fn earliest(a: Option<BlockNumber>, b: Option<BlockNumber>) -> Option<BlockNumber> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get_or_create_profile(&self, wallet: Address) -> Result<i64, DbErr> {
        let mut state = self.state.lock();
        if state.fail_profiles {
            return Err(DbErr::Custom("profile store unavailable".to_string()));
        }
        let index = match state.profiles.iter().position(|profile| *profile == wallet) {
            Some(index) => index,
            None => {
                state.profiles.push(wallet);
                state.profiles.len() - 1
            }
        };
        Ok(index as i64 + 1)
    }

    async fn upsert_credential(
        &self,
        profile_id: i64,
        summary: &CredentialSummary,
    ) -> Result<(), DbErr> {
        let mut state = self.state.lock();
        if state.failing_upserts.contains(&summary.token_id) {
            return Err(DbErr::Custom(format!(
                "upsert of {} rejected",
                summary.token_id
            )));
        }

        state
            .credentials
            .entry((profile_id, summary.token_id))
            .and_modify(|stored| {
                let revoked = stored.revoked || summary.revoked;
                let revoked_at_block = earliest(stored.revoked_at_block, summary.revoked_at_block);
                *stored = CredentialSummary {
                    revoked,
                    revoked_at_block,
                    ..summary.clone()
                };
            })
            .or_insert_with(|| summary.clone());
        Ok(())
    }

    async fn mark_revoked(&self, token_id: U256, block: BlockNumber) -> Result<u64, DbErr> {
        let mut state = self.state.lock();
        let mut affected = 0;
        for stored in state
            .credentials
            .values_mut()
            .filter(|stored| stored.token_id == token_id)
        {
            stored.revoked = true;
            stored.revoked_at_block = earliest(stored.revoked_at_block, Some(block));
            affected += 1;
        }
        Ok(affected)
    }

    async fn list_credentials(&self, profile_id: i64) -> Result<Vec<CredentialSummary>, DbErr> {
        let state = self.state.lock();
        let mut credentials: Vec<_> = state
            .credentials
            .iter()
            .filter(|((owner, _), _)| *owner == profile_id)
            .map(|(_, summary)| summary.clone())
            .collect();
        credentials.sort_by(|a, b| b.issued_at_block.cmp(&a.issued_at_block));
        Ok(credentials)
    }
}
