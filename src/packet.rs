/// Decoded ABX packet
///
/// All fields are carried exactly as they arrived on the wire. Symbol and side
/// bytes are never validated; text views map each byte to the char with the
/// same code point, so nothing is lost when a packet is rendered.

use serde::ser::{Serialize, SerializeStruct, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Packet {
    pub symbol: [u8; 4],
    pub side: u8,
    pub quantity: i32,
    pub price: i32,
    pub sequence: i32,
}

/// Trade side as sent by the exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
    Other(u8),
}

impl Side {
    pub fn from_byte(b: u8) -> Self {
        match b {
            b'B' => Side::Buy,
            b'S' => Side::Sell,
            other => Side::Other(other),
        }
    }
}

impl Packet {
    pub fn new(symbol: [u8; 4], side: u8, quantity: i32, price: i32, sequence: i32) -> Self {
        Packet {
            symbol,
            side,
            quantity,
            price,
            sequence,
        }
    }

    pub fn symbol_str(&self) -> String {
        self.symbol.iter().map(|&b| b as char).collect()
    }

    pub fn side_char(&self) -> char {
        self.side as char
    }

    pub fn side(&self) -> Side {
        Side::from_byte(self.side)
    }
}

impl Serialize for Packet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Packet", 5)?;
        state.serialize_field("symbol", &self.symbol_str())?;
        state.serialize_field("side", &self.side_char())?;
        state.serialize_field("quantity", &self.quantity)?;
        state.serialize_field("price", &self.price)?;
        state.serialize_field("sequence", &self.sequence)?;
        state.end()
    }
}
