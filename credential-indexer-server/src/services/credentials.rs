use std::str::FromStr;

use actix_web::web::{self, Json};
use alloy::primitives::Address;
use chrono::SecondsFormat;
use credential_indexer_logic::{CredentialMetadata, CredentialSummary};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ApiError, CredentialsState};

#[derive(Debug, Deserialize)]
pub struct CredentialsQuery {
    address: String,
    window: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    wallet_address: String,
    window: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    success: bool,
    data: SyncData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncData {
    credentials_count: usize,
    revoked_count: usize,
    failed_count: usize,
    synced_at: String,
}

#[derive(Debug, Deserialize)]
pub struct MetadataQuery {
    cid: String,
}

/// Negative windows scan only the latest block.
fn clamp_window(window: Option<i64>) -> Option<u64> {
    window.map(|window| window.max(0).unsigned_abs())
}

/// Accepts `0x` followed by 40 hex digits, in any letter case.
fn parse_address(value: &str) -> Result<Address, ApiError> {
    let invalid = || ApiError::InvalidInput(format!("invalid wallet address: {value}"));
    if !value.starts_with("0x") || value.len() != 42 {
        return Err(invalid());
    }
    Address::from_str(value).map_err(|_| invalid())
}

#[instrument(skip(state), level = "debug")]
pub async fn list_credentials(
    state: web::Data<CredentialsState>,
    query: web::Query<CredentialsQuery>,
) -> Result<Json<Vec<CredentialSummary>>, ApiError> {
    let query = query.into_inner();
    let subject = parse_address(&query.address)?;
    let credentials = state
        .service
        .credentials_for_subject(subject, clamp_window(query.window))
        .await?;
    Ok(Json(credentials))
}

#[instrument(skip(state), level = "debug")]
pub async fn sync_credentials(
    state: web::Data<CredentialsState>,
    request: Json<SyncRequest>,
) -> Result<Json<SyncResponse>, ApiError> {
    let request = request.into_inner();
    let subject = parse_address(&request.wallet_address)?;
    let report = state
        .synchronizer
        .sync(subject, clamp_window(request.window))
        .await?;

    Ok(Json(SyncResponse {
        success: true,
        data: SyncData {
            credentials_count: report.created,
            revoked_count: report.revoked_marked,
            failed_count: report.failures.len(),
            synced_at: report.synced_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        },
    }))
}

#[instrument(skip(state), level = "debug")]
pub async fn get_metadata(
    state: web::Data<CredentialsState>,
    query: web::Query<MetadataQuery>,
) -> Result<Json<CredentialMetadata>, ApiError> {
    let cid = query.into_inner().cid;
    if cid.is_empty() {
        return Err(ApiError::InvalidInput("cid is empty".to_string()));
    }
    state
        .metadata
        .fetch(&cid)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}
