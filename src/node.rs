//! Node ID resolution.
//!
//! A generator built without an explicit node ID asks a [`NodeIdProvider`] for
//! one on its first call to [`next_id`](crate::Snowflake::next_id). The default
//! [`HardwareNodeId`] derives it from the host's network hardware addresses.

use std::sync::Arc;

use mac_address::MacAddressIterator;
use rand::Rng;
use tracing::{debug, trace};

use crate::{SnowflakeError, MAX_NODE_ID};

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Supplies the node ID of a generator that was built without one.
pub trait NodeIdProvider: Send + Sync {
    /// Resolves a node ID. Values above [`MAX_NODE_ID`] are rejected by the
    /// generator with [`SnowflakeError::OutOfBoundNodeId`].
    fn resolve_node_id(&self) -> Result<u16, SnowflakeError>;
}

impl<P: NodeIdProvider + ?Sized> NodeIdProvider for &P {
    fn resolve_node_id(&self) -> Result<u16, SnowflakeError> {
        (**self).resolve_node_id()
    }
}

impl<P: NodeIdProvider + ?Sized> NodeIdProvider for Arc<P> {
    fn resolve_node_id(&self) -> Result<u16, SnowflakeError> {
        (**self).resolve_node_id()
    }
}

/// Always resolves to the wrapped node ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticNodeId(pub u16);

impl NodeIdProvider for StaticNodeId {
    fn resolve_node_id(&self) -> Result<u16, SnowflakeError> {
        Ok(self.0)
    }
}

/// Derives a host-specific node ID from network interface hardware addresses.
///
/// The addresses are rendered as upper-case hex, concatenated and hashed with
/// 32-bit FNV-1a; the low 10 bits are the node ID. Distinct hosts can collide.
///
/// When the host exposes no hardware address at all, a random node ID is
/// picked instead. Two such processes on one host may then share a node ID and
/// emit duplicate IDs; configure explicit node IDs where that matters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HardwareNodeId;

impl NodeIdProvider for HardwareNodeId {
    fn resolve_node_id(&self) -> Result<u16, SnowflakeError> {
        let addresses = MacAddressIterator::new()
            .map_err(|e| SnowflakeError::NodeIdResolution(e.to_string()))?
            .map(|mac| mac.bytes());

        match node_id_from_addresses(addresses) {
            Some(node_id) => Ok(node_id),
            None => {
                let node_id = rand::rng().random_range(0 ..= MAX_NODE_ID);
                debug!(node_id, "no hardware address found, using a random node id");
                Ok(node_id)
            }
        }
    }
}

/// Hashes hardware addresses into a node ID, or `None` if there are none.
///
/// All-zero addresses (loopback and virtual devices) are skipped.
pub(crate) fn node_id_from_addresses<I>(addresses: I) -> Option<u16>
where
    I: IntoIterator<Item = [u8; 6]>,
{
    let mut hex = String::new();
    for address in addresses.into_iter().filter(|a| a.iter().any(|&b| b != 0)) {
        for byte in address {
            hex.push_str(&format!("{byte:02X}"));
        }
    }
    if hex.is_empty() {
        return None;
    }
    trace!(addresses = %hex, "hashing hardware addresses");
    Some((fnv1a_32(hex.as_bytes()) & u32::from(MAX_NODE_ID)) as u16)
}

fn fnv1a_32(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(FNV_OFFSET_BASIS, |hash, &b| (hash ^ u32::from(b)).wrapping_mul(FNV_PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_32_vectors() {
        assert_eq!(fnv1a_32(b""), 0x811c_9dc5);
        assert_eq!(fnv1a_32(b"a"), 0xe40c_292c);
        assert_eq!(fnv1a_32(b"foobar"), 0xbf9c_f968);
    }

    #[test]
    fn test_no_addresses() {
        assert_eq!(node_id_from_addresses([]), None);
        assert_eq!(node_id_from_addresses([[0; 6], [0; 6]]), None);
    }

    #[test]
    fn test_addresses_hash_into_range() {
        let mac = [0x00, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e];
        let expected = (fnv1a_32(b"001A2B3C4D5E") & 0x3ff) as u16;
        assert_eq!(node_id_from_addresses([mac]), Some(expected));
        assert!(expected <= MAX_NODE_ID);
    }

    #[test]
    fn test_loopback_is_ignored() {
        let mac = [0x02, 0x42, 0xac, 0x11, 0x00, 0x02];
        assert_eq!(node_id_from_addresses([[0; 6], mac]), node_id_from_addresses([mac]));
    }

    #[test]
    fn test_addresses_are_concatenated_in_order() {
        let a = [0x02, 0x42, 0xac, 0x11, 0x00, 0x02];
        let b = [0xde, 0xad, 0xbe, 0xef, 0x00, 0x01];
        let expected = (fnv1a_32(b"0242AC110002DEADBEEF0001") & 0x3ff) as u16;
        assert_eq!(node_id_from_addresses([a, b]), Some(expected));
    }

    #[test]
    fn test_static_node_id() {
        assert_eq!(StaticNodeId(7).resolve_node_id(), Ok(7));
    }
}
