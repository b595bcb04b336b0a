use crate::{
    content::{ContentResolver, to_ipfs_uri},
    types::{CredentialRecord, CredentialSummary},
};

/// Turns records into summaries, newest issuance first.
///
/// Records issued in the same block come out in reverse input order, so the
/// most recently observed issuance is listed first.
pub fn project<R>(
    records: impl IntoIterator<Item = CredentialRecord>,
    resolver: &R,
) -> Vec<CredentialSummary>
where
    R: ContentResolver + ?Sized,
{
    let mut records: Vec<_> = records.into_iter().collect();
    records.reverse();

    let mut summaries: Vec<_> = records
        .into_iter()
        .map(|record| {
            let uri = to_ipfs_uri(&record.content_id);
            let gateway_url = resolver.resolve_content_locator(&uri);
            CredentialSummary {
                token_id: record.token_id,
                issuer: record.issuer,
                subject: record.subject,
                content_id: record.content_id,
                uri,
                gateway_url,
                issued_at_block: record.issued_at_block,
                revoked: record.revoked,
                revoked_at_block: record.revoked_at_block,
            }
        })
        .collect();
    summaries.sort_by(|a, b| b.issued_at_block.cmp(&a.issued_at_block));
    summaries
}
