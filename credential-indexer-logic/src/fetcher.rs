use std::sync::Arc;

use alloy::{
    primitives::{Address, B256},
    rpc::types::{Filter, Log},
};
use tokio::time::sleep;

use crate::{
    error::LogFetchError,
    node::LogSource,
    settings::LogFetcherSettings,
    types::BlockRange,
};

/// Provider-imposed ceiling on the number of blocks in one log query.
pub const MAX_CHUNK_SIZE: u64 = 256;

/// Indexed event argument pushed down to the node as a topic filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexedTopic {
    Topic1(B256),
    Topic2(B256),
    Topic3(B256),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub address: Address,
    pub range: BlockRange,
    pub event_signature: B256,
    pub indexed: Option<IndexedTopic>,
    pub chunk_size: u64,
}

impl LogQuery {
    fn filter(&self, chunk: BlockRange) -> Filter {
        let filter = Filter::new()
            .address(self.address)
            .event_signature(self.event_signature)
            .from_block(chunk.from())
            .to_block(chunk.to());

        match self.indexed {
            None => filter,
            Some(IndexedTopic::Topic1(topic)) => filter.topic1(topic),
            Some(IndexedTopic::Topic2(topic)) => filter.topic2(topic),
            Some(IndexedTopic::Topic3(topic)) => filter.topic3(topic),
        }
    }
}

/// Splits a scan window into bounded log queries, retrying each one with backoff.
#[derive(Clone)]
pub struct LogFetcher {
    source: Arc<dyn LogSource>,
    settings: LogFetcherSettings,
}

impl LogFetcher {
    pub fn new(source: Arc<dyn LogSource>, settings: LogFetcherSettings) -> Self {
        Self { source, settings }
    }

    /// Fetches all logs matching `query`, chunk by chunk from left to right.
    ///
    /// Fails as a whole if any chunk exhausts its retries; logs collected from
    /// earlier chunks are dropped in that case.
    pub async fn fetch_logs_chunked(&self, query: &LogQuery) -> Result<Vec<Log>, LogFetchError> {
        let chunk_size = query.chunk_size.clamp(1, MAX_CHUNK_SIZE);
        let mut chunks = query.range.chunks(chunk_size).peekable();
        let mut logs = Vec::new();

        while let Some(chunk) = chunks.next() {
            let chunk_logs = self.fetch_chunk(query, chunk).await?;
            tracing::trace!(
                from_block = chunk.from(),
                to_block = chunk.to(),
                count = chunk_logs.len(),
                "fetched log chunk"
            );
            logs.extend(chunk_logs);

            if chunks.peek().is_some() && !self.settings.pacing_delay.is_zero() {
                sleep(self.settings.pacing_delay).await;
            }
        }

        Ok(logs)
    }

    async fn fetch_chunk(
        &self,
        query: &LogQuery,
        chunk: BlockRange,
    ) -> Result<Vec<Log>, LogFetchError> {
        let filter = query.filter(chunk);
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.source.logs(&filter).await {
                Ok(logs) => return Ok(logs),
                Err(err) if attempt < max_attempts => {
                    let delay = self.settings.retry_delay(attempt);
                    tracing::warn!(
                        err = ?err,
                        from_block = chunk.from(),
                        to_block = chunk.to(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "log query failed, retrying"
                    );
                    sleep(delay).await;
                }
                Err(err) => {
                    tracing::error!(
                        err = ?err,
                        from_block = chunk.from(),
                        to_block = chunk.to(),
                        attempts = attempt,
                        "log query failed, giving up"
                    );
                    return Err(LogFetchError {
                        range: chunk,
                        attempts: attempt,
                        source: err,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        abi::ICredentialSbt,
        test_utils::{CONTRACT, MockLogSource, instant_fetch_settings, issued_log, revoked_log},
    };
    use alloy::{primitives::U256, sol_types::SolEvent};
    use pretty_assertions::assert_eq;

    fn range(from: u64, to: u64) -> BlockRange {
        BlockRange::new(from, to).unwrap()
    }

    fn revoked_query(window: BlockRange, chunk_size: u64) -> LogQuery {
        LogQuery {
            address: CONTRACT,
            range: window,
            event_signature: ICredentialSbt::CredentialRevoked::SIGNATURE_HASH,
            indexed: None,
            chunk_size,
        }
    }

    fn fetcher(source: &Arc<MockLogSource>) -> LogFetcher {
        LogFetcher::new(source.clone(), instant_fetch_settings())
    }

    #[tokio::test]
    async fn splits_window_into_bounded_queries() {
        let source = Arc::new(MockLogSource::new(999));

        let logs = fetcher(&source)
            .fetch_logs_chunked(&revoked_query(range(0, 999), 256))
            .await
            .unwrap();

        assert!(logs.is_empty());
        assert_eq!(
            source.queried_ranges(),
            vec![range(0, 255), range(256, 511), range(512, 767), range(768, 999)]
        );
    }

    #[tokio::test]
    async fn oversized_chunks_are_clamped() {
        let source = Arc::new(MockLogSource::new(999));

        fetcher(&source)
            .fetch_logs_chunked(&revoked_query(range(0, 999), 800))
            .await
            .unwrap();

        assert_eq!(source.queried_ranges().len(), 4);
    }

    #[tokio::test]
    async fn collects_logs_from_every_chunk() {
        let source = Arc::new(MockLogSource::new(1_000));
        source.push_logs([
            revoked_log(U256::from(1), 10),
            revoked_log(U256::from(2), 300),
            revoked_log(U256::from(3), 900),
            revoked_log(U256::from(4), 1_000),
        ]);

        let logs = fetcher(&source)
            .fetch_logs_chunked(&revoked_query(range(0, 999), 256))
            .await
            .unwrap();

        let blocks: Vec<_> = logs.iter().filter_map(|log| log.block_number).collect();
        assert_eq!(blocks, vec![10, 300, 900]);
    }

    #[tokio::test]
    async fn retried_chunk_contributes_logs() {
        let source = Arc::new(MockLogSource::new(100));
        source.push_logs([revoked_log(U256::from(7), 50)]);
        source.fail_next_log_queries(2);

        let logs = fetcher(&source)
            .fetch_logs_chunked(&revoked_query(range(0, 100), 256))
            .await
            .unwrap();

        assert_eq!(logs.len(), 1);
        assert_eq!(source.log_query_count(), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_abort_the_whole_fetch() {
        let source = Arc::new(MockLogSource::new(1_000));
        source.push_logs([revoked_log(U256::from(1), 10)]);

        let fetcher = fetcher(&source);
        // first chunk succeeds, every attempt on the second one fails
        source.fail_log_queries_from(1);

        let err = fetcher
            .fetch_logs_chunked(&revoked_query(range(0, 999), 256))
            .await
            .unwrap_err();

        assert_eq!(err.range, range(256, 511));
        assert_eq!(err.attempts, 3);
        assert_eq!(source.log_query_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn backs_off_on_failures_and_paces_between_chunks_only() {
        let source = Arc::new(MockLogSource::new(511));
        source.fail_next_log_queries(2);
        let fetcher = LogFetcher::new(source.clone(), LogFetcherSettings::default());

        let started = tokio::time::Instant::now();
        fetcher
            .fetch_logs_chunked(&revoked_query(range(0, 511), 256))
            .await
            .unwrap();

        // 200ms and 500ms backoff on the first chunk, one 50ms pause before the second
        assert_eq!(started.elapsed(), std::time::Duration::from_millis(750));
        assert_eq!(source.log_query_count(), 4);
    }

    #[tokio::test]
    async fn indexed_subject_is_pushed_to_the_node() {
        let subject = alloy::primitives::Address::repeat_byte(0x22);
        let other = alloy::primitives::Address::repeat_byte(0x33);
        let source = Arc::new(MockLogSource::new(100));
        source.push_logs([
            issued_log(U256::from(1), subject, "bafy-1", 10),
            issued_log(U256::from(2), other, "bafy-2", 20),
        ]);

        let query = LogQuery {
            address: CONTRACT,
            range: range(0, 100),
            event_signature: ICredentialSbt::CredentialIssued::SIGNATURE_HASH,
            indexed: Some(IndexedTopic::Topic3(subject.into_word())),
            chunk_size: 256,
        };
        let logs = fetcher(&source).fetch_logs_chunked(&query).await.unwrap();

        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].topics()[3], subject.into_word());
    }
}
