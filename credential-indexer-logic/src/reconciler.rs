use std::collections::{BTreeMap, HashMap};

use alloy::primitives::U256;

use crate::types::{BlockNumber, CredentialRecord, IssuedEvent, RevokedEvent};

/// Records keyed by token id, kept in the order their Issued events arrived.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconciledCredentials {
    records: Vec<CredentialRecord>,
    index: HashMap<U256, usize>,
}

impl ReconciledCredentials {
    pub fn get(&self, token_id: &U256) -> Option<&CredentialRecord> {
        self.index.get(token_id).map(|&slot| &self.records[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &CredentialRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<CredentialRecord> {
        self.records
    }

    fn insert(&mut self, record: CredentialRecord) {
        match self.index.get(&record.token_id) {
            Some(&slot) => {
                tracing::warn!(
                    token_id = %record.token_id,
                    previous_block = self.records[slot].issued_at_block,
                    block = record.issued_at_block,
                    "token issued more than once, keeping the later issuance"
                );
                self.records[slot] = record;
            }
            None => {
                self.index.insert(record.token_id, self.records.len());
                self.records.push(record);
            }
        }
    }
}

impl IntoIterator for ReconciledCredentials {
    type Item = CredentialRecord;
    type IntoIter = std::vec::IntoIter<CredentialRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// Earliest revocation block per token id. On equal blocks the first-seen event wins.
pub fn earliest_revocations(revoked: &[RevokedEvent]) -> BTreeMap<U256, BlockNumber> {
    let mut revocations = BTreeMap::new();
    for event in revoked {
        revocations
            .entry(event.token_id)
            .and_modify(|block: &mut BlockNumber| {
                if event.block_number < *block {
                    *block = event.block_number;
                }
            })
            .or_insert(event.block_number);
    }
    revocations
}

/// Merges Issued and Revoked events into one record per issued token.
///
/// Revocations for tokens without an Issued event in `issued` are dropped.
pub fn reconcile(issued: &[IssuedEvent], revoked: &[RevokedEvent]) -> ReconciledCredentials {
    let revocations = earliest_revocations(revoked);
    let mut reconciled = ReconciledCredentials::default();

    for event in issued {
        let mut record = CredentialRecord::from_issued(event);
        if let Some(&block) = revocations.get(&event.token_id) {
            record.mark_revoked(block);
        }
        reconciled.insert(record);
    }

    reconciled
}
