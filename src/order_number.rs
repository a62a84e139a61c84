use std::sync::Mutex;

use chrono::Utc;
use thiserror::Error;

/// 2024-01-01T00:00:00Z in unix milliseconds.
const EPOCH_MS: i64 = 1_704_067_200_000;
const WORKER_BITS: u32 = 10;
const SEQUENCE_BITS: u32 = 12;
pub const MAX_WORKER_ID: u16 = (1 << WORKER_BITS) - 1;
const MAX_SEQUENCE: u64 = (1 << SEQUENCE_BITS) - 1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderNumberError {
    #[error("worker id {0} exceeds {MAX_WORKER_ID}")]
    WorkerIdOutOfRange(u16),
}

/// Issues order numbers that are unique across concurrent submissions.
pub trait OrderNumberGenerator: Send + Sync {
    fn next_number(&self) -> String;
}

#[derive(Debug, Default)]
struct SnowflakeState {
    last_ms: i64,
    sequence: u64,
}

/// Snowflake layout: 41 bits of milliseconds since [`EPOCH_MS`], 10 bits of worker id
/// and a 12 bit per-millisecond sequence. Numbers are rendered in decimal so that
/// clients limited to 53-bit integers can carry them as strings.
///
/// The generator never waits. When a millisecond's sequence is used up, or the wall
/// clock has gone backwards, it moves on to the next millisecond of its own and lets
/// the wall clock catch up later.
#[derive(Debug)]
pub struct SnowflakeGenerator {
    worker_id: u64,
    state: Mutex<SnowflakeState>,
    time_ms: fn() -> i64,
}

impl SnowflakeGenerator {
    pub fn new(worker_id: u16) -> Result<Self, OrderNumberError> {
        Self::with_time_source(worker_id, current_ms)
    }

    /// Same as [`SnowflakeGenerator::new`] with a custom millisecond clock.
    pub fn with_time_source(worker_id: u16, time_ms: fn() -> i64) -> Result<Self, OrderNumberError> {
        if worker_id > MAX_WORKER_ID {
            return Err(OrderNumberError::WorkerIdOutOfRange(worker_id));
        }
        Ok(Self {
            worker_id: u64::from(worker_id),
            state: Mutex::new(SnowflakeState::default()),
            time_ms,
        })
    }

    pub fn next_id(&self) -> u64 {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let mut now = (self.time_ms)().max(state.last_ms);
        if now == state.last_ms {
            state.sequence = (state.sequence + 1) & MAX_SEQUENCE;
            if state.sequence == 0 {
                now += 1;
            }
        } else {
            state.sequence = 0;
        }
        state.last_ms = now;

        let elapsed = (now - EPOCH_MS).max(0) as u64;
        (elapsed << (WORKER_BITS + SEQUENCE_BITS))
            | (self.worker_id << SEQUENCE_BITS)
            | state.sequence
    }
}

impl OrderNumberGenerator for SnowflakeGenerator {
    fn next_number(&self) -> String {
        self.next_id().to_string()
    }
}

fn current_ms() -> i64 {
    Utc::now().timestamp_millis()
}
