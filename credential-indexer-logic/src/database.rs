use std::sync::Arc;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use credential_indexer_entity::{credentials, user_profiles};
use sea_orm::{
    ActiveValue::{NotSet, Set},
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    prelude::Expr,
    sea_query::OnConflict,
};

use crate::types::{BlockNumber, CredentialSummary};

/// Durable owner profiles and credentials.
///
/// Every write is idempotent, and no write ever turns a revoked credential back
/// into an active one.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get_or_create_profile(&self, wallet: Address) -> Result<i64, DbErr>;

    /// Inserts or refreshes the credential keyed by `(token_id, profile_id)`.
    async fn upsert_credential(
        &self,
        profile_id: i64,
        summary: &CredentialSummary,
    ) -> Result<(), DbErr>;

    /// Marks every stored credential with `token_id` as revoked, keeping the
    /// earliest known revocation block. Returns the number of affected rows.
    async fn mark_revoked(&self, token_id: U256, block: BlockNumber) -> Result<u64, DbErr>;

    /// Credentials of one profile, newest issuance first.
    async fn list_credentials(&self, profile_id: i64) -> Result<Vec<CredentialSummary>, DbErr>;
}

#[derive(Clone)]
pub struct CredentialDatabase {
    pub db: Arc<DatabaseConnection>,
}

impl CredentialDatabase {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for CredentialDatabase {
    async fn get_or_create_profile(&self, wallet: Address) -> Result<i64, DbErr> {
        let profile = user_profiles::ActiveModel {
            id: NotSet,
            wallet_address: Set(wallet.to_string()),
            created_at: NotSet,
            updated_at: NotSet,
        };

        user_profiles::Entity::insert(profile)
            .on_conflict(
                OnConflict::column(user_profiles::Column::WalletAddress)
                    .value(user_profiles::Column::UpdatedAt, Expr::current_timestamp())
                    .to_owned(),
            )
            .exec_with_returning(self.db.as_ref())
            .await
            .map(|profile| profile.id)
            .inspect_err(|err| {
                tracing::error!(err = ?err, %wallet, "Failed to get or create user profile");
            })
    }

    async fn upsert_credential(
        &self,
        profile_id: i64,
        summary: &CredentialSummary,
    ) -> Result<(), DbErr> {
        let credential = credentials::ActiveModel {
            id: NotSet,
            token_id: Set(summary.token_id.to_string()),
            user_profile_id: Set(profile_id),
            issuer: Set(summary.issuer.to_vec()),
            subject: Set(summary.subject.to_vec()),
            cid: Set(summary.content_id.clone()),
            uri: Set(summary.uri.clone()),
            gateway_url: Set(summary.gateway_url.clone()),
            issued_at_block: Set(to_db_block(summary.issued_at_block)?),
            revoked: Set(summary.revoked),
            revoked_at_block: Set(summary.revoked_at_block.map(to_db_block).transpose()?),
            created_at: NotSet,
            updated_at: NotSet,
        };

        credentials::Entity::insert(credential)
            .on_conflict(
                OnConflict::columns([
                    credentials::Column::TokenId,
                    credentials::Column::UserProfileId,
                ])
                .update_columns([
                    credentials::Column::Issuer,
                    credentials::Column::Subject,
                    credentials::Column::Cid,
                    credentials::Column::Uri,
                    credentials::Column::GatewayUrl,
                    credentials::Column::IssuedAtBlock,
                ])
                // revocation is one-directional
                .value(
                    credentials::Column::Revoked,
                    Expr::cust("credentials.revoked OR EXCLUDED.revoked"),
                )
                .value(
                    credentials::Column::RevokedAtBlock,
                    Expr::cust(
                        "LEAST(credentials.revoked_at_block, EXCLUDED.revoked_at_block)",
                    ),
                )
                .value(credentials::Column::UpdatedAt, Expr::current_timestamp())
                .to_owned(),
            )
            .exec(self.db.as_ref())
            .await
            .map(|_| ())
            .inspect_err(|err| {
                tracing::error!(
                    err = ?err,
                    profile_id,
                    token_id = %summary.token_id,
                    "Failed to upsert credential"
                );
            })
    }

    async fn mark_revoked(&self, token_id: U256, block: BlockNumber) -> Result<u64, DbErr> {
        let block = to_db_block(block)?;

        credentials::Entity::update_many()
            .col_expr(credentials::Column::Revoked, Expr::value(true))
            .col_expr(
                credentials::Column::RevokedAtBlock,
                Expr::cust_with_values("LEAST(revoked_at_block, $1)", [block]),
            )
            .col_expr(credentials::Column::UpdatedAt, Expr::current_timestamp().into())
            .filter(credentials::Column::TokenId.eq(token_id.to_string()))
            .exec(self.db.as_ref())
            .await
            .map(|result| result.rows_affected)
            .inspect_err(|err| {
                tracing::error!(err = ?err, %token_id, "Failed to mark credential revoked");
            })
    }

    async fn list_credentials(&self, profile_id: i64) -> Result<Vec<CredentialSummary>, DbErr> {
        credentials::Entity::find()
            .filter(credentials::Column::UserProfileId.eq(profile_id))
            .order_by_desc(credentials::Column::IssuedAtBlock)
            .order_by_desc(credentials::Column::Id)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(summary_from_model)
            .collect()
    }
}

fn to_db_block(block: BlockNumber) -> Result<i64, DbErr> {
    i64::try_from(block).map_err(|_| DbErr::Custom(format!("block number {block} out of range")))
}

fn summary_from_model(model: credentials::Model) -> Result<CredentialSummary, DbErr> {
    let token_id = model.token_id.parse::<U256>().map_err(|err| {
        DbErr::Custom(format!("invalid stored token id {}: {err}", model.token_id))
    })?;
    let address = |bytes: &[u8]| {
        Address::try_from(bytes)
            .map_err(|err| DbErr::Custom(format!("invalid stored address: {err}")))
    };

    Ok(CredentialSummary {
        token_id,
        issuer: address(&model.issuer)?,
        subject: address(&model.subject)?,
        issued_at_block: model.validated_issued_at_block(),
        revoked_at_block: model.validated_revoked_at_block(),
        content_id: model.cid,
        uri: model.uri,
        gateway_url: model.gateway_url,
        revoked: model.revoked,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{init_db, summary};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    #[ignore = "needs database to run"]
    async fn profile_is_created_once() {
        let db = init_db("profile_is_created_once").await;
        let store = CredentialDatabase::new(db.client());
        let wallet = Address::repeat_byte(0x22);

        let first = store.get_or_create_profile(wallet).await.unwrap();
        let second = store.get_or_create_profile(wallet).await.unwrap();
        let other = store
            .get_or_create_profile(Address::repeat_byte(0x33))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[tokio::test]
    #[ignore = "needs database to run"]
    async fn upsert_is_idempotent() {
        let db = init_db("upsert_is_idempotent").await;
        let store = CredentialDatabase::new(db.client());
        let profile_id = store
            .get_or_create_profile(Address::repeat_byte(0x22))
            .await
            .unwrap();

        let credentials = [summary(1, 100), summary(2, 250)];
        for _ in 0..2 {
            for credential in &credentials {
                store.upsert_credential(profile_id, credential).await.unwrap();
            }
        }

        let stored = store.list_credentials(profile_id).await.unwrap();
        assert_eq!(stored, vec![summary(2, 250), summary(1, 100)]);
    }

    #[tokio::test]
    #[ignore = "needs database to run"]
    async fn upsert_never_reverts_revocation() {
        let db = init_db("upsert_never_reverts_revocation").await;
        let store = CredentialDatabase::new(db.client());
        let profile_id = store
            .get_or_create_profile(Address::repeat_byte(0x22))
            .await
            .unwrap();

        let mut revoked = summary(1, 100);
        revoked.revoked = true;
        revoked.revoked_at_block = Some(150);
        store.upsert_credential(profile_id, &revoked).await.unwrap();
        store
            .upsert_credential(profile_id, &summary(1, 100))
            .await
            .unwrap();

        let stored = store.list_credentials(profile_id).await.unwrap();
        assert_eq!(stored, vec![revoked]);
    }

    #[tokio::test]
    #[ignore = "needs database to run"]
    async fn mark_revoked_keeps_earliest_block() {
        let db = init_db("mark_revoked_keeps_earliest_block").await;
        let store = CredentialDatabase::new(db.client());
        let first = store
            .get_or_create_profile(Address::repeat_byte(0x22))
            .await
            .unwrap();
        let second = store
            .get_or_create_profile(Address::repeat_byte(0x33))
            .await
            .unwrap();
        store.upsert_credential(first, &summary(1, 100)).await.unwrap();
        store.upsert_credential(second, &summary(1, 100)).await.unwrap();
        store.upsert_credential(first, &summary(2, 100)).await.unwrap();

        assert_eq!(store.mark_revoked(U256::from(1), 300).await.unwrap(), 2);
        assert_eq!(store.mark_revoked(U256::from(1), 200).await.unwrap(), 2);
        assert_eq!(store.mark_revoked(U256::from(1), 400).await.unwrap(), 2);
        assert_eq!(store.mark_revoked(U256::from(9), 400).await.unwrap(), 0);

        let stored = store.list_credentials(first).await.unwrap();
        let revoked = stored
            .iter()
            .find(|credential| credential.token_id == U256::from(1))
            .unwrap();
        assert!(revoked.revoked);
        assert_eq!(revoked.revoked_at_block, Some(200));
        let active = stored
            .iter()
            .find(|credential| credential.token_id == U256::from(2))
            .unwrap();
        assert!(!active.revoked);
    }
}
