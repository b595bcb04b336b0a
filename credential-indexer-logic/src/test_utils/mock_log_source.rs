use alloy::{
    rpc::types::{Filter, Log},
    transports::{TransportError, TransportErrorKind},
};
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    node::LogSource,
    types::{BlockNumber, BlockRange},
};

/// In-process node serving a fixed set of logs.
/// Applies address, topic and block range filters the way a node would.
pub struct MockLogSource {
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    block_number: BlockNumber,
    logs: Vec<Log>,
    filters: Vec<Filter>,
    fail_next: usize,
    fail_from: Option<usize>,
    fail_block_number: bool,
}

impl MockLogSource {
    pub fn new(block_number: BlockNumber) -> Self {
        Self {
            state: Mutex::new(MockState {
                block_number,
                ..Default::default()
            }),
        }
    }

    pub fn set_block_number(&self, block_number: BlockNumber) {
        self.state.lock().block_number = block_number;
    }

    pub fn push_logs(&self, logs: impl IntoIterator<Item = Log>) {
        self.state.lock().logs.extend(logs);
    }

    /// The next `count` log queries fail.
    pub fn fail_next_log_queries(&self, count: usize) {
        self.state.lock().fail_next = count;
    }

    /// Every log query starting from the zero-based `call` fails.
    pub fn fail_log_queries_from(&self, call: usize) {
        self.state.lock().fail_from = Some(call);
    }

    pub fn fail_block_number(&self, fail: bool) {
        self.state.lock().fail_block_number = fail;
    }

    pub fn log_query_count(&self) -> usize {
        self.state.lock().filters.len()
    }

    pub fn queried_ranges(&self) -> Vec<BlockRange> {
        self.state
            .lock()
            .filters
            .iter()
            .map(|filter| {
                BlockRange::new(
                    filter.get_from_block().expect("from block is set"),
                    filter.get_to_block().expect("to block is set"),
                )
                .expect("valid queried range")
            })
            .collect()
    }
}

fn matches(filter: &Filter, log: &Log) -> bool {
    let Some(block) = log.block_number else {
        return false;
    };
    let in_range = filter.get_from_block().is_none_or(|from| from <= block)
        && filter.get_to_block().is_none_or(|to| block <= to);
    let topics_match = filter.topics.iter().enumerate().all(|(i, topic)| {
        topic.is_empty() || log.topics().get(i).is_some_and(|value| topic.matches(value))
    });

    in_range && filter.address.matches(&log.address()) && topics_match
}

#[async_trait]
impl LogSource for MockLogSource {
    async fn block_number(&self) -> Result<BlockNumber, TransportError> {
        let state = self.state.lock();
        if state.fail_block_number {
            return Err(TransportErrorKind::custom_str("mock block number failure"));
        }
        Ok(state.block_number)
    }

    async fn logs(&self, filter: &Filter) -> Result<Vec<Log>, TransportError> {
        let mut state = self.state.lock();
        let call = state.filters.len();
        state.filters.push(filter.clone());

        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(TransportErrorKind::custom_str("mock log query failure"));
        }
        if state.fail_from.is_some_and(|from| call >= from) {
            return Err(TransportErrorKind::custom_str("mock log query failure"));
        }

        Ok(state
            .logs
            .iter()
            .filter(|log| matches(filter, log))
            .cloned()
            .collect())
    }
}
