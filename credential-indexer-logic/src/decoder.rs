use alloy::{primitives::B256, rpc::types::Log, sol_types::SolEvent};
use thiserror::Error;

use crate::{
    abi::ICredentialSbt::{CredentialIssued, CredentialRevoked},
    types::{BlockNumber, IssuedEvent, RevokedEvent},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedEvent {
    Issued(IssuedEvent),
    Revoked(RevokedEvent),
}

/// Reason a log was not turned into an event. Callers skip such logs.
#[derive(Debug, Error)]
pub enum DecodeFailure {
    #[error("log has no event signature")]
    MissingSignature,
    #[error("unknown event signature {0}")]
    UnknownSignature(B256),
    #[error("log was removed by a chain reorganization")]
    Removed,
    #[error("log has no {0}")]
    Pending(&'static str),
    #[error("malformed {event} log: {source}")]
    Malformed {
        event: &'static str,
        #[source]
        source: alloy::sol_types::Error,
    },
}

pub fn decode(log: &Log) -> Result<DecodedEvent, DecodeFailure> {
    if log.removed {
        return Err(DecodeFailure::Removed);
    }
    let signature = *log.topic0().ok_or(DecodeFailure::MissingSignature)?;

    if signature == CredentialIssued::SIGNATURE_HASH {
        let event = log
            .log_decode::<CredentialIssued>()
            .map_err(|source| DecodeFailure::Malformed {
                event: "CredentialIssued",
                source,
            })?
            .inner
            .data;
        let (block_number, transaction_hash) = position(log)?;
        Ok(DecodedEvent::Issued(IssuedEvent {
            token_id: event.tokenId,
            issuer: event.issuer,
            subject: event.subject,
            content_id: event.cid,
            block_number,
            transaction_hash,
        }))
    } else if signature == CredentialRevoked::SIGNATURE_HASH {
        let event = log
            .log_decode::<CredentialRevoked>()
            .map_err(|source| DecodeFailure::Malformed {
                event: "CredentialRevoked",
                source,
            })?
            .inner
            .data;
        let (block_number, transaction_hash) = position(log)?;
        Ok(DecodedEvent::Revoked(RevokedEvent {
            token_id: event.tokenId,
            issuer: event.issuer,
            block_number,
            transaction_hash,
        }))
    } else {
        Err(DecodeFailure::UnknownSignature(signature))
    }
}

fn position(log: &Log) -> Result<(BlockNumber, B256), DecodeFailure> {
    let block_number = log
        .block_number
        .ok_or(DecodeFailure::Pending("block number"))?;
    let transaction_hash = log
        .transaction_hash
        .ok_or(DecodeFailure::Pending("transaction hash"))?;
    Ok((block_number, transaction_hash))
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DecodedBatch {
    pub issued: Vec<IssuedEvent>,
    pub revoked: Vec<RevokedEvent>,
    pub skipped: usize,
}

/// Decodes every log, keeping input order within each event kind.
/// Logs that fail to decode are counted and dropped.
pub fn decode_all<'a>(logs: impl IntoIterator<Item = &'a Log>) -> DecodedBatch {
    let mut batch = DecodedBatch::default();
    for log in logs {
        match decode(log) {
            Ok(DecodedEvent::Issued(event)) => batch.issued.push(event),
            Ok(DecodedEvent::Revoked(event)) => batch.revoked.push(event),
            Err(failure) => {
                tracing::debug!(
                    reason = %failure,
                    block_number = ?log.block_number,
                    transaction_hash = ?log.transaction_hash,
                    "skipping undecodable log"
                );
                batch.skipped += 1;
            }
        }
    }
    batch
}
