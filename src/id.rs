use crate::{CUSTOM_EPOCH_MILLIS, MAX_NODE_ID, MAX_SEQUENCE, MAX_TIMESTAMP, NODE_ID_BITS, SEQUENCE_BITS};

const NODE_ID_SHIFT: u32 = SEQUENCE_BITS;
const TIMESTAMP_SHIFT: u32 = NODE_ID_BITS + SEQUENCE_BITS;

/// The three fields packed into an ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdParts {
    /// Milliseconds since the custom epoch.
    pub timestamp: i64,
    pub node_id: u16,
    pub sequence: u16,
}

impl IdParts {
    /// The timestamp as milliseconds since the Unix epoch, for IDs issued by a
    /// clock on the default custom epoch.
    pub fn unix_millis(&self) -> i64 {
        self.timestamp + CUSTOM_EPOCH_MILLIS
    }
}

/// Packs `parts` into an ID: `timestamp | node_id | sequence`, most
/// significant first.
///
/// Node ID and sequence are masked to their field widths.
pub fn compose(parts: IdParts) -> i64 {
    (parts.timestamp << TIMESTAMP_SHIFT)
        | (i64::from(parts.node_id & MAX_NODE_ID) << NODE_ID_SHIFT)
        | i64::from(parts.sequence & MAX_SEQUENCE)
}

/// Splits an ID back into its fields.
///
/// # Examples
///
/// ```
/// use uid64::{decompose, Snowflake};
///
/// let snowflake = Snowflake::with_node_id(42).unwrap();
/// let id = snowflake.next_id().unwrap();
///
/// let parts = decompose(id);
/// assert_eq!(parts.node_id, 42);
/// assert_eq!(parts.timestamp, snowflake.last_timestamp());
/// ```
pub fn decompose(id: i64) -> IdParts {
    IdParts {
        timestamp: (id >> TIMESTAMP_SHIFT) & MAX_TIMESTAMP,
        node_id: ((id >> NODE_ID_SHIFT) as u16) & MAX_NODE_ID,
        sequence: (id as u16) & MAX_SEQUENCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let id = compose(IdParts { timestamp: 1, node_id: 1, sequence: 1 });
        assert_eq!(id, (1 << 22) | (1 << 12) | 1);
    }

    #[test]
    fn test_max_fields_stay_positive() {
        let parts = IdParts {
            timestamp: MAX_TIMESTAMP,
            node_id: MAX_NODE_ID,
            sequence: MAX_SEQUENCE,
        };
        let id = compose(parts);
        assert_eq!(id, i64::MAX);
        assert_eq!(decompose(id), parts);
    }

    #[test]
    fn test_fields_do_not_bleed() {
        let id = compose(IdParts { timestamp: 0, node_id: 0x3ff, sequence: 0 });
        let parts = decompose(id);
        assert_eq!(parts.timestamp, 0);
        assert_eq!(parts.node_id, 0x3ff);
        assert_eq!(parts.sequence, 0);
    }

    #[test]
    fn test_unix_millis() {
        let parts = decompose(compose(IdParts { timestamp: 5, node_id: 3, sequence: 9 }));
        assert_eq!(parts.unix_millis(), 1_420_070_400_005);
    }
}
