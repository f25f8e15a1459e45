/// Packet table keyed by sequence number
///
/// Insert is last-write-wins: a later packet with the same sequence replaces
/// the stored one.

use crate::gap_detector::GapDetector;
use crate::packet::Packet;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct PacketTable {
    packets: BTreeMap<i32, Packet>,
}

impl PacketTable {
    pub fn new() -> Self {
        PacketTable {
            packets: BTreeMap::new(),
        }
    }

    /// Insert or overwrite; returns the displaced packet if the sequence was
    /// already present
    pub fn insert(&mut self, packet: Packet) -> Option<Packet> {
        self.packets.insert(packet.sequence, packet)
    }

    pub fn get(&self, sequence: i32) -> Option<&Packet> {
        self.packets.get(&sequence)
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn max_sequence(&self) -> Option<i32> {
        self.packets.keys().next_back().copied()
    }

    /// Gap detector over `[first_sequence, max_sequence]`
    pub fn gaps(&self, first_sequence: i32) -> GapDetector {
        GapDetector::from_sorted(first_sequence, self.packets.keys().copied())
    }

    /// Packets in ascending sequence order
    pub fn ordered(&self) -> Vec<Packet> {
        self.packets.values().copied().collect()
    }

    pub fn into_ordered(self) -> Vec<Packet> {
        self.packets.into_values().collect()
    }
}
