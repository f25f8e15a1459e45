/// Packet frame codec
///
/// Maps a 17-byte wire frame to a `Packet` and back. Decoding only checks the
/// frame length; any byte pattern of the right size decodes to some packet.

use crate::packet::Packet;
use crate::protocol::*;
use byteorder::{BigEndian, ByteOrder};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("invalid frame size: expected {expected} bytes, got {actual}")]
    FrameSize { expected: usize, actual: usize },
}

pub type FrameResult<T> = Result<T, FrameError>;

/// Outcome of splitting a raw buffer into frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamSummary {
    pub frames: usize,
    pub trailing_bytes: usize,
}

pub struct Codec;

impl Codec {
    /// Decode exactly one frame
    pub fn decode(frame: &[u8]) -> FrameResult<Packet> {
        if frame.len() != PACKET_SIZE {
            return Err(FrameError::FrameSize {
                expected: PACKET_SIZE,
                actual: frame.len(),
            });
        }

        let mut symbol = [0u8; 4];
        symbol.copy_from_slice(&frame[SYMBOL_OFFSET..SIDE_OFFSET]);

        Ok(Packet {
            symbol,
            side: frame[SIDE_OFFSET],
            quantity: BigEndian::read_i32(&frame[QUANTITY_OFFSET..PRICE_OFFSET]),
            price: BigEndian::read_i32(&frame[PRICE_OFFSET..SEQUENCE_OFFSET]),
            sequence: BigEndian::read_i32(&frame[SEQUENCE_OFFSET..PACKET_SIZE]),
        })
    }

    pub fn encode(packet: &Packet) -> [u8; PACKET_SIZE] {
        let mut frame = [0u8; PACKET_SIZE];
        frame[SYMBOL_OFFSET..SIDE_OFFSET].copy_from_slice(&packet.symbol);
        frame[SIDE_OFFSET] = packet.side;
        BigEndian::write_i32(&mut frame[QUANTITY_OFFSET..PRICE_OFFSET], packet.quantity);
        BigEndian::write_i32(&mut frame[PRICE_OFFSET..SEQUENCE_OFFSET], packet.price);
        BigEndian::write_i32(&mut frame[SEQUENCE_OFFSET..PACKET_SIZE], packet.sequence);
        frame
    }

    /// Decode consecutive frames from a bulk buffer in arrival order.
    /// A short tail (fewer than 17 bytes) is not decoded and is reported
    /// in the summary instead.
    pub fn decode_stream<F>(buffer: &[u8], mut callback: F) -> StreamSummary
    where
        F: FnMut(Packet),
    {
        let chunks = buffer.chunks_exact(PACKET_SIZE);
        let trailing_bytes = chunks.remainder().len();
        let mut frames = 0;

        for chunk in chunks {
            // chunks_exact only yields full frames
            if let Ok(packet) = Self::decode(chunk) {
                callback(packet);
                frames += 1;
            }
        }

        StreamSummary {
            frames,
            trailing_bytes,
        }
    }
}
