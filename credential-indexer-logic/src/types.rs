use std::fmt;

use alloy::primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use thiserror::Error;

pub type BlockNumber = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid block range: from {from} is greater than to {to}")]
pub struct InvalidBlockRange {
    pub from: BlockNumber,
    pub to: BlockNumber,
}

/// Inclusive range of block heights, `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BlockRange {
    from: BlockNumber,
    to: BlockNumber,
}

impl BlockRange {
    pub fn new(from: BlockNumber, to: BlockNumber) -> Result<Self, InvalidBlockRange> {
        if from > to {
            return Err(InvalidBlockRange { from, to });
        }
        Ok(Self { from, to })
    }

    /// `[latest - window, latest]`, clamped at the genesis block.
    pub fn trailing(latest: BlockNumber, window: u64) -> Self {
        Self {
            from: latest.saturating_sub(window),
            to: latest,
        }
    }

    pub fn from(&self) -> BlockNumber {
        self.from
    }

    pub fn to(&self) -> BlockNumber {
        self.to
    }

    /// Consecutive, non-overlapping sub-ranges of at most `size` blocks, left to right.
    /// A zero `size` is treated as one.
    pub fn chunks(&self, size: u64) -> BlockRangeChunks {
        BlockRangeChunks {
            next: Some(self.from),
            to: self.to,
            size: size.max(1),
        }
    }
}

impl fmt::Display for BlockRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.from, self.to)
    }
}

#[derive(Debug, Clone)]
pub struct BlockRangeChunks {
    next: Option<BlockNumber>,
    to: BlockNumber,
    size: u64,
}

impl Iterator for BlockRangeChunks {
    type Item = BlockRange;

    fn next(&mut self) -> Option<Self::Item> {
        let from = self.next?;
        let to = from.saturating_add(self.size - 1).min(self.to);
        self.next = (to < self.to).then(|| to + 1);
        Some(BlockRange { from, to })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedEvent {
    pub token_id: U256,
    pub issuer: Address,
    pub subject: Address,
    pub content_id: String,
    pub block_number: BlockNumber,
    pub transaction_hash: B256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevokedEvent {
    pub token_id: U256,
    pub issuer: Address,
    pub block_number: BlockNumber,
    pub transaction_hash: B256,
}

/// Current state of one credential, as reconstructed from the scanned window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub token_id: U256,
    pub issuer: Address,
    pub subject: Address,
    pub content_id: String,
    pub issued_at_block: BlockNumber,
    pub revoked: bool,
    pub revoked_at_block: Option<BlockNumber>,
}

impl CredentialRecord {
    pub fn from_issued(event: &IssuedEvent) -> Self {
        Self {
            token_id: event.token_id,
            issuer: event.issuer,
            subject: event.subject,
            content_id: event.content_id.clone(),
            issued_at_block: event.block_number,
            revoked: false,
            revoked_at_block: None,
        }
    }

    /// Flips the record to revoked. Never flips it back; keeps the earliest block.
    pub fn mark_revoked(&mut self, block: BlockNumber) {
        self.revoked = true;
        self.revoked_at_block = Some(
            self.revoked_at_block
                .map_or(block, |existing| existing.min(block)),
        );
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSummary {
    #[serde_as(as = "DisplayFromStr")]
    pub token_id: U256,
    pub issuer: Address,
    pub subject: Address,
    #[serde(rename = "cid")]
    pub content_id: String,
    pub uri: String,
    pub gateway_url: String,
    #[serde_as(as = "DisplayFromStr")]
    pub issued_at_block: BlockNumber,
    pub revoked: bool,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_at_block: Option<BlockNumber>,
}
