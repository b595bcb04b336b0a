use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let sql = r#"
            CREATE TABLE user_profiles (
                id bigserial PRIMARY KEY,
                wallet_address text NOT NULL UNIQUE,
                created_at timestamp NOT NULL DEFAULT (now()),
                updated_at timestamp NOT NULL DEFAULT (now())
            );

            CREATE TABLE credentials (
                id bigserial PRIMARY KEY,
                token_id text NOT NULL,
                user_profile_id bigint NOT NULL REFERENCES user_profiles (id) ON DELETE CASCADE,
                issuer bytea NOT NULL,
                subject bytea NOT NULL,
                cid text NOT NULL,
                uri text NOT NULL,
                gateway_url text NOT NULL,
                issued_at_block bigint NOT NULL,
                revoked boolean NOT NULL DEFAULT false,
                revoked_at_block bigint,
                created_at timestamp NOT NULL DEFAULT (now()),
                updated_at timestamp NOT NULL DEFAULT (now()),
                CONSTRAINT credentials_token_id_user_profile_id_key UNIQUE (token_id, user_profile_id)
            );

            CREATE INDEX credentials_token_id_idx ON credentials (token_id);
            CREATE INDEX credentials_user_profile_id_issued_at_block_idx
                ON credentials (user_profile_id, issued_at_block DESC);
        "#;
        crate::from_sql(manager, sql).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let sql = r#"
            DROP TABLE credentials;
            DROP TABLE user_profiles;
        "#;
        crate::from_sql(manager, sql).await
    }
}
