//! Canonical key partitioner.
//!
//! The log, the stores, and the query router all place keys with the same
//! [`Partitioner`]. A lookup computed with any other function silently misses.
//! The hash is the murmur2 variant used by Kafka's default partitioner, so
//! partition numbers agree with Kafka-produced topics keyed by the same strings.

use crate::error::{FleetError, Result};

/// Partition number within a topic.
pub type PartitionId = u32;

const MURMUR2_SEED: u32 = 0x9747_b28c;
const MURMUR2_M: u32 = 0x5bd1_e995;
const MURMUR2_R: u32 = 24;

/// Maps keys to partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partitioner {
    partition_count: u32,
}

impl Partitioner {
    /// Create a partitioner over `partition_count` partitions.
    pub fn new(partition_count: u32) -> Result<Self> {
        if partition_count == 0 {
            return Err(FleetError::Config(
                "partition count must be at least 1".to_string(),
            ));
        }
        Ok(Self { partition_count })
    }

    pub fn partition_count(&self) -> u32 {
        self.partition_count
    }

    /// Partition owning `key`.
    pub fn partition_for(&self, key: &str) -> PartitionId {
        to_positive(murmur2(key.as_bytes())) % self.partition_count
    }

    /// All partition ids, ascending.
    pub fn partitions(&self) -> impl Iterator<Item = PartitionId> {
        0..self.partition_count
    }
}

/// 32-bit murmur2 hash as computed by Kafka's `Utils.murmur2`.
pub fn murmur2(data: &[u8]) -> i32 {
    let mut h: u32 = MURMUR2_SEED ^ (data.len() as u32);

    let chunks = data.chunks_exact(4);
    let tail = chunks.remainder();
    for chunk in chunks {
        let mut k = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        k = k.wrapping_mul(MURMUR2_M);
        k ^= k >> MURMUR2_R;
        k = k.wrapping_mul(MURMUR2_M);
        h = h.wrapping_mul(MURMUR2_M);
        h ^= k;
    }

    if tail.len() >= 3 {
        h ^= (tail[2] as u32) << 16;
    }
    if tail.len() >= 2 {
        h ^= (tail[1] as u32) << 8;
    }
    if !tail.is_empty() {
        h ^= tail[0] as u32;
        h = h.wrapping_mul(MURMUR2_M);
    }

    h ^= h >> 13;
    h = h.wrapping_mul(MURMUR2_M);
    h ^= h >> 15;
    h as i32
}

fn to_positive(hash: i32) -> u32 {
    (hash & 0x7fff_ffff) as u32
}
