use std::sync::Arc;

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::{
    database::CredentialStore,
    error::{CredentialIndexerError, PersistenceError, PersistenceOperation},
    projector::project,
    reconciler::{earliest_revocations, reconcile},
    service::CredentialService,
    types::BlockRange,
};

#[derive(Debug)]
pub struct SyncReport {
    /// Credentials written for the subject's profile.
    pub created: usize,
    /// Revoked token ids applied to the store.
    pub revoked_marked: usize,
    pub failures: Vec<PersistenceError>,
    pub synced_at: DateTime<Utc>,
    pub window: BlockRange,
}

/// Runs the credential query for a subject and persists the outcome.
#[derive(Clone)]
pub struct CredentialSynchronizer {
    service: Arc<CredentialService>,
    store: Arc<dyn CredentialStore>,
}

impl CredentialSynchronizer {
    pub fn new(service: Arc<CredentialService>, store: Arc<dyn CredentialStore>) -> Self {
        Self { service, store }
    }

    /// Upserts every credential issued to `subject` within the trailing window,
    /// then marks stored credentials revoked for every revocation seen in that
    /// window, including ones whose issuance lies outside of it.
    ///
    /// Node failures abort the sync before anything is written. Store failures
    /// are collected per record and the remaining writes still run.
    #[instrument(skip_all, fields(%subject, ?window))]
    pub async fn sync(
        &self,
        subject: Address,
        window: Option<u64>,
    ) -> Result<SyncReport, CredentialIndexerError> {
        let range = self.service.trailing_range(window).await?;
        let (issued, revoked) = futures::try_join!(
            self.service.fetch_issued(subject, range),
            self.service.fetch_revoked(range),
        )?;
        let summaries = project(reconcile(&issued, &revoked), self.service.gateway());

        let profile_id = self
            .store
            .get_or_create_profile(subject)
            .await
            .map_err(CredentialIndexerError::Profile)?;

        let mut failures = Vec::new();
        let mut created = 0;
        for summary in &summaries {
            match self.store.upsert_credential(profile_id, summary).await {
                Ok(()) => created += 1,
                Err(source) => failures.push(PersistenceError {
                    token_id: summary.token_id,
                    operation: PersistenceOperation::Upsert,
                    source,
                }),
            }
        }

        let mut revoked_marked = 0;
        for (token_id, block) in earliest_revocations(&revoked) {
            match self.store.mark_revoked(token_id, block).await {
                Ok(rows) => {
                    tracing::trace!(%token_id, block, rows, "marked credential revoked");
                    revoked_marked += 1;
                }
                Err(source) => failures.push(PersistenceError {
                    token_id,
                    operation: PersistenceOperation::MarkRevoked,
                    source,
                }),
            }
        }

        if failures.is_empty() {
            tracing::info!(%subject, %range, created, revoked_marked, "credentials synced");
        } else {
            tracing::warn!(
                %subject,
                %range,
                created,
                revoked_marked,
                failed = failures.len(),
                "credentials synced with failures"
            );
        }

        Ok(SyncReport {
            created,
            revoked_marked,
            failures,
            synced_at: Utc::now(),
            window: range,
        })
    }
}
