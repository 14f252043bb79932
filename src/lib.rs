//! uid64 generates unique 64-bit IDs from the current time, a node ID, and a
//! sequence value, in the style of Twitter's Snowflake. Generators on
//! different nodes need no coordination as long as their node IDs differ.
//!
//! ID structure, most significant bit first:
//! - **Sign bit**: Always 0, so IDs are positive `i64` values.
//! - **Timestamp**: 41 bits, milliseconds since 2015-01-01T00:00:00Z.
//! - **Node ID**: 10 bits, identifying the generator.
//! - **Sequence**: 12 bits, counting IDs issued within the same millisecond.
//!
//! Ordering guarantees:
//! - **Per generator**: every ID is strictly greater than the previous one
//!   from the same generator.
//! - **Across nodes**: IDs are only roughly time-ordered; two nodes issuing in
//!   the same millisecond interleave by node ID.
//! - **Clock skew**: if the clock moves backwards the generator returns
//!   [`InvalidState`](SnowflakeError::InvalidState) instead of risking a
//!   duplicate, until the clock catches up.
//!
//! # Examples
//!
//! ```
//! use uid64::Snowflake;
//!
//! // Create a new snowflake generator with a node ID
//! let snowflake = Snowflake::with_node_id(1).unwrap();
//!
//! // Generate a snowflake ID
//! let id = snowflake.next_id().unwrap();
//! println!("Generated ID: {}", id);
//! ```
//!
//! Without an explicit node ID the generator derives one from the host's
//! network hardware addresses on first use, see [`HardwareNodeId`].
//!
//! # Errors
//!
//! - [`OutOfBoundNodeId`](SnowflakeError::OutOfBoundNodeId): the node ID is
//!   outside `0..=1023`.
//! - [`InvalidState`](SnowflakeError::InvalidState): the clock is behind the
//!   last issued ID.
//! - [`NodeIdResolution`](SnowflakeError::NodeIdResolution): the node ID could
//!   not be resolved on first use.
//! - [`TimestampOverflow`](SnowflakeError::TimestampOverflow): the clock has
//!   run past the 41-bit timestamp range.
//! - [`InvalidEpoch`](SnowflakeError::InvalidEpoch): a clock epoch is in the
//!   future or too far in the past.
//!
//! # Concurrency
//!
//! [`Snowflake::next_id`] takes `&self`; share a generator between threads with
//! a reference or an [`Arc`](std::sync::Arc). Calls are serialized by a lock.
//! When 4096 IDs have been issued within one millisecond, the caller spins
//! until the next millisecond while holding that lock, so the stall delays
//! every caller of the same generator.

mod clock;
mod id;
mod node;

use std::{cmp::Ordering, hint::spin_loop};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

pub use crate::{
    clock::{Clock, SystemClock},
    id::{compose, decompose, IdParts},
    node::{HardwareNodeId, NodeIdProvider, StaticNodeId},
};

/// Custom epoch: 2015-01-01 00:00:00.000 UTC, in Unix milliseconds.
pub const CUSTOM_EPOCH_MILLIS: i64 = 1_420_070_400_000;

pub const TIMESTAMP_BITS: u32 = 41;
pub const NODE_ID_BITS: u32 = 10;
pub const SEQUENCE_BITS: u32 = 12;

pub const MAX_NODE_ID: u16 = (1 << NODE_ID_BITS) - 1;
pub const MAX_SEQUENCE: u16 = (1 << SEQUENCE_BITS) - 1;
pub const MAX_TIMESTAMP: i64 = (1 << TIMESTAMP_BITS) - 1;

const NO_TIMESTAMP: i64 = -1;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SnowflakeError {
    #[error("node id must be between 0 and {max}, got {0}", max = MAX_NODE_ID)]
    OutOfBoundNodeId(u16),
    #[error("the system clock is invalid: now {now}, last issued at {last}")]
    InvalidState { last: i64, now: i64 },
    #[error("failed to resolve node id: {0}")]
    NodeIdResolution(String),
    #[error("timestamp {0} does not fit in {bits} bits", bits = TIMESTAMP_BITS)]
    TimestampOverflow(i64),
    #[error("epoch {0} must be in the past and less than 2^{bits} ms ago", bits = TIMESTAMP_BITS)]
    InvalidEpoch(i64),
}

#[derive(Debug)]
struct State {
    node_id: Option<u16>, // None until resolved by the provider
    last_timestamp: i64,  // The timestamp of the last issued ID
    sequence: u16,        // The sequence within `last_timestamp`
}

/// A Snowflake ID generator.
///
/// `C` is the time source and `P` resolves the node ID when none was given at
/// construction.
#[derive(Debug)]
pub struct Snowflake<C = SystemClock, P = HardwareNodeId> {
    state: Mutex<State>,
    clock: C,
    provider: P,
}

impl Snowflake {
    /// Creates a generator whose node ID is derived from the host's hardware
    /// addresses on the first call to [`next_id`](Self::next_id).
    pub fn new() -> Self {
        Self::from_parts(None, SystemClock::default(), HardwareNodeId)
    }

    /// Creates a generator with an explicit node ID.
    ///
    /// # Errors
    ///
    /// [`SnowflakeError::OutOfBoundNodeId`] if `node_id` exceeds
    /// [`MAX_NODE_ID`].
    pub fn with_node_id(node_id: u16) -> Result<Self, SnowflakeError> {
        Self::builder().with_node_id(node_id).build()
    }

    pub fn builder() -> SnowflakeBuilder {
        SnowflakeBuilder::new()
    }
}

impl Default for Snowflake {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, P> Snowflake<C, P>
where
    C: Clock,
    P: NodeIdProvider,
{
    fn from_parts(node_id: Option<u16>, clock: C, provider: P) -> Self {
        Self {
            state: Mutex::new(State {
                node_id,
                last_timestamp: NO_TIMESTAMP,
                sequence: 0,
            }),
            clock,
            provider,
        }
    }

    /// Issues the next ID.
    ///
    /// Blocks while the sequence of the current millisecond is exhausted.
    ///
    /// # Errors
    ///
    /// - [`SnowflakeError::InvalidState`] if the clock reads earlier than the
    ///   last issued ID. Nothing is consumed; the call may be retried once the
    ///   clock has caught up.
    /// - [`SnowflakeError::TimestampOverflow`] if the clock reads past the
    ///   41-bit timestamp range. Issuing would flip the sign bit.
    /// - [`SnowflakeError::NodeIdResolution`] or
    ///   [`SnowflakeError::OutOfBoundNodeId`] if the node ID had to be resolved
    ///   and the provider failed.
    pub fn next_id(&self) -> Result<i64, SnowflakeError> {
        let mut state = self.state.lock();

        let node_id = match state.node_id {
            Some(node_id) => node_id,
            None => {
                let node_id = check_node_id(self.provider.resolve_node_id()?)?;
                debug!(node_id, "resolved node id");
                state.node_id = Some(node_id);
                node_id
            }
        };

        let now = self.clock.current_millis();
        if now < 0 {
            // The clock is before the custom epoch.
            return Err(Self::cold_clock_behind(state.last_timestamp, now));
        }
        let (timestamp, sequence) = match now.cmp(&state.last_timestamp) {
            Ordering::Less => return Err(Self::cold_clock_behind(state.last_timestamp, now)),
            // Multiple calls within the same millisecond increase the sequence
            Ordering::Equal => match (state.sequence + 1) & MAX_SEQUENCE {
                0 => {
                    trace!(timestamp = now, "sequence exhausted, waiting for the next millisecond");
                    (self.wait_for_next_millis(state.last_timestamp), 0)
                }
                sequence => (now, sequence),
            },
            // First call in a millisecond
            Ordering::Greater => (now, 0),
        };
        if timestamp > MAX_TIMESTAMP {
            return Err(Self::cold_timestamp_overflow(timestamp));
        }
        state.last_timestamp = timestamp;
        state.sequence = sequence;

        Ok(compose(IdParts {
            timestamp,
            node_id,
            sequence,
        }))
    }

    /// The node ID, or `None` if it has not been resolved yet.
    pub fn node_id(&self) -> Option<u16> {
        self.state.lock().node_id
    }

    /// The timestamp of the last issued ID, `-1` before the first one.
    pub fn last_timestamp(&self) -> i64 {
        self.state.lock().last_timestamp
    }

    /// The sequence of the last issued ID.
    pub fn sequence(&self) -> u16 {
        self.state.lock().sequence
    }

    fn wait_for_next_millis(&self, last_timestamp: i64) -> i64 {
        let mut now = self.clock.current_millis();
        while now <= last_timestamp {
            spin_loop();
            now = self.clock.current_millis();
        }
        now
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(last: i64, now: i64) -> SnowflakeError {
        warn!(last, now, "clock moved backwards, refusing to issue an id");
        SnowflakeError::InvalidState { last, now }
    }

    #[cold]
    #[inline(never)]
    fn cold_timestamp_overflow(timestamp: i64) -> SnowflakeError {
        warn!(timestamp, "timestamp exceeds the 41-bit range, refusing to issue an id");
        SnowflakeError::TimestampOverflow(timestamp)
    }
}

fn check_node_id(node_id: u16) -> Result<u16, SnowflakeError> {
    if node_id > MAX_NODE_ID {
        return Err(SnowflakeError::OutOfBoundNodeId(node_id));
    }
    Ok(node_id)
}

/// Configures a [`Snowflake`] generator.
///
/// # Examples
///
/// ```
/// use uid64::{Snowflake, StaticNodeId, SystemClock};
///
/// let epoch = 1_609_459_200_000; // 2021-01-01 00:00:00.000 UTC
/// let snowflake = Snowflake::builder()
///     .with_clock(SystemClock::with_epoch(epoch).unwrap())
///     .with_node_id_provider(StaticNodeId(12))
///     .build()
///     .unwrap();
///
/// assert_eq!(snowflake.node_id(), None);
/// snowflake.next_id().unwrap();
/// assert_eq!(snowflake.node_id(), Some(12));
/// ```
#[derive(Debug)]
pub struct SnowflakeBuilder<C = SystemClock, P = HardwareNodeId> {
    node_id: Option<u16>,
    clock: C,
    provider: P,
}

impl SnowflakeBuilder {
    pub fn new() -> Self {
        Self {
            node_id: None,
            clock: SystemClock::default(),
            provider: HardwareNodeId,
        }
    }
}

impl Default for SnowflakeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, P> SnowflakeBuilder<C, P> {
    /// Sets an explicit node ID; the provider is then never consulted.
    pub fn with_node_id(mut self, node_id: u16) -> Self {
        self.node_id = Some(node_id);
        self
    }

    pub fn with_clock<T: Clock>(self, clock: T) -> SnowflakeBuilder<T, P> {
        SnowflakeBuilder {
            node_id: self.node_id,
            clock,
            provider: self.provider,
        }
    }

    /// Sets the strategy used to resolve the node ID lazily when none is given.
    pub fn with_node_id_provider<T: NodeIdProvider>(self, provider: T) -> SnowflakeBuilder<C, T> {
        SnowflakeBuilder {
            node_id: self.node_id,
            clock: self.clock,
            provider,
        }
    }

    /// # Errors
    ///
    /// [`SnowflakeError::OutOfBoundNodeId`] if the explicit node ID exceeds
    /// [`MAX_NODE_ID`].
    pub fn build(self) -> Result<Snowflake<C, P>, SnowflakeError>
    where
        C: Clock,
        P: NodeIdProvider,
    {
        let node_id = self.node_id.map(check_node_id).transpose()?;
        Ok(Snowflake::from_parts(node_id, self.clock, self.provider))
    }
}
