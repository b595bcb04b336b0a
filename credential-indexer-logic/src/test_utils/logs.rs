use alloy::{
    primitives::{Address, B256, Bytes, LogData, U256},
    rpc::types::Log,
    sol_types::SolEvent,
};

use super::{CONTRACT, ISSUER};
use crate::abi::ICredentialSbt;

/// `CredentialIssued` log emitted by `CONTRACT` and issued by `ISSUER`.
pub fn issued_log(token_id: U256, subject: Address, cid: &str, block_number: u64) -> Log {
    let event = ICredentialSbt::CredentialIssued {
        tokenId: token_id,
        issuer: ISSUER,
        subject,
        cid: cid.to_string(),
    };
    let topics = vec![
        ICredentialSbt::CredentialIssued::SIGNATURE_HASH,
        B256::from(token_id.to_be_bytes::<32>()),
        ISSUER.into_word(),
        subject.into_word(),
    ];
    log_with(topics, event.encode_data().into(), block_number)
}

pub fn revoked_log(token_id: U256, block_number: u64) -> Log {
    let topics = vec![
        ICredentialSbt::CredentialRevoked::SIGNATURE_HASH,
        B256::from(token_id.to_be_bytes::<32>()),
        ISSUER.into_word(),
    ];
    log_with(topics, Bytes::new(), block_number)
}

pub fn log_with(topics: Vec<B256>, data: Bytes, block_number: u64) -> Log {
    Log {
        inner: alloy::primitives::Log {
            address: CONTRACT,
            data: LogData::new_unchecked(topics, data),
        },
        block_hash: Some(B256::repeat_byte(0xbb)),
        block_number: Some(block_number),
        block_timestamp: None,
        transaction_hash: Some(B256::left_padding_from(&block_number.to_be_bytes())),
        transaction_index: Some(0),
        log_index: Some(0),
        removed: false,
    }
}
