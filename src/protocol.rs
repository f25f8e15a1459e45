/// ABX wire format
///
/// Request (client -> server): 2 bytes
///   - call_type: u8 - 1 = stream all packets, 2 = resend one packet
///   - argument: u8 - unused (0) for stream all, target sequence for resend
///
/// Packet frame (server -> client): 17 bytes, integers big-endian
///   - symbol: [u8; 4]
///   - side: u8
///   - quantity: i32
///   - price: i32
///   - sequence: i32

use thiserror::Error;

pub const PACKET_SIZE: usize = 17;
pub const REQUEST_SIZE: usize = 2;
pub const DEFAULT_PORT: u16 = 3000;

pub const SYMBOL_OFFSET: usize = 0;
pub const SIDE_OFFSET: usize = 4;
pub const QUANTITY_OFFSET: usize = 5;
pub const PRICE_OFFSET: usize = 9;
pub const SEQUENCE_OFFSET: usize = 13;

/// Highest sequence a resend request can address (one-byte argument)
pub const MAX_RESEND_SEQUENCE: i32 = u8::MAX as i32;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallType {
    StreamAll = 1,
    Resend = 2,
}

impl CallType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(CallType::StreamAll),
            2 => Some(CallType::Resend),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    #[error("sequence {0} cannot be encoded in a resend request (valid range 0..=255)")]
    SequenceOutOfRange(i32),

    #[error("invalid call type: {0}")]
    InvalidCallType(u8),
}

/// A single 2-byte request frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    StreamAll,
    Resend(u8),
}

impl Request {
    pub fn stream_all() -> Self {
        Request::StreamAll
    }

    /// Build a resend request. Sequences outside 0..=255 are rejected rather
    /// than truncated to the low byte.
    pub fn resend(sequence: i32) -> Result<Self, RequestError> {
        u8::try_from(sequence)
            .map(Request::Resend)
            .map_err(|_| RequestError::SequenceOutOfRange(sequence))
    }

    pub fn call_type(&self) -> CallType {
        match self {
            Request::StreamAll => CallType::StreamAll,
            Request::Resend(_) => CallType::Resend,
        }
    }

    pub fn to_bytes(&self) -> [u8; REQUEST_SIZE] {
        match *self {
            Request::StreamAll => [CallType::StreamAll as u8, 0],
            Request::Resend(seq) => [CallType::Resend as u8, seq],
        }
    }

    pub fn from_bytes(bytes: [u8; REQUEST_SIZE]) -> Result<Self, RequestError> {
        match CallType::from_u8(bytes[0]) {
            Some(CallType::StreamAll) => Ok(Request::StreamAll),
            Some(CallType::Resend) => Ok(Request::Resend(bytes[1])),
            None => Err(RequestError::InvalidCallType(bytes[0])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_type_conversion() {
        assert_eq!(CallType::from_u8(1), Some(CallType::StreamAll));
        assert_eq!(CallType::from_u8(2), Some(CallType::Resend));
        assert_eq!(CallType::from_u8(0), None);
        assert_eq!(CallType::from_u8(99), None);
    }

    #[test]
    fn test_request_bytes() {
        assert_eq!(Request::stream_all().to_bytes(), [1, 0]);
        assert_eq!(Request::resend(4).unwrap().to_bytes(), [2, 4]);
        assert_eq!(Request::resend(255).unwrap().to_bytes(), [2, 255]);
    }

    #[test]
    fn test_resend_out_of_range() {
        assert_eq!(
            Request::resend(300),
            Err(RequestError::SequenceOutOfRange(300))
        );
        assert_eq!(
            Request::resend(256),
            Err(RequestError::SequenceOutOfRange(256))
        );
        assert_eq!(Request::resend(-1), Err(RequestError::SequenceOutOfRange(-1)));
    }

    #[test]
    fn test_request_from_bytes() {
        assert_eq!(Request::from_bytes([1, 0]), Ok(Request::StreamAll));
        assert_eq!(Request::from_bytes([2, 7]), Ok(Request::Resend(7)));
        assert_eq!(
            Request::from_bytes([3, 0]),
            Err(RequestError::InvalidCallType(3))
        );
        assert_eq!(Request::Resend(7).call_type(), CallType::Resend);
    }
}
