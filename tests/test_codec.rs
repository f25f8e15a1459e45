/// Wire conformance and codec tests

use abx_client::{Codec, FrameError, Packet, PACKET_SIZE};
use byteorder::{BigEndian, ByteOrder};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn create_frame(symbol: &[u8; 4], side: u8, qty: i32, price: i32, seq: i32) -> Vec<u8> {
    let mut frame = vec![0u8; PACKET_SIZE];
    frame[0..4].copy_from_slice(symbol);
    frame[4] = side;
    BigEndian::write_i32(&mut frame[5..9], qty);
    BigEndian::write_i32(&mut frame[9..13], price);
    BigEndian::write_i32(&mut frame[13..17], seq);
    frame
}

#[test]
fn test_decode_known_bytes() {
    // AAPL, Buy, qty 50, price 100, seq 1
    let frame = [
        b'A', b'A', b'P', b'L', b'B', 0, 0, 0, 50, 0, 0, 0, 100, 0, 0, 0, 1,
    ];
    let packet = Codec::decode(&frame).unwrap();

    assert_eq!(packet.symbol_str(), "AAPL");
    assert_eq!(packet.side_char(), 'B');
    assert_eq!(packet.quantity, 50);
    assert_eq!(packet.price, 100);
    assert_eq!(packet.sequence, 1);
}

#[test]
fn test_round_trip_random_packets() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..1000 {
        let packet = Packet::new(rng.gen(), rng.gen(), rng.gen(), rng.gen(), rng.gen());
        assert_eq!(Codec::decode(&Codec::encode(&packet)).unwrap(), packet);
    }
}

#[test]
fn test_encode_reproduces_wire_bytes() {
    let frame = create_frame(b"META", b'S', 1_000_000, -3, 255);
    let packet = Codec::decode(&frame).unwrap();
    assert_eq!(Codec::encode(&packet).to_vec(), frame);
}

#[test]
fn test_length_guard() {
    for len in [0, 1, 2, 16, 18, 34] {
        let buf = vec![0u8; len];
        assert_eq!(
            Codec::decode(&buf),
            Err(FrameError::FrameSize {
                expected: PACKET_SIZE,
                actual: len
            }),
            "length {} should be rejected",
            len
        );
    }
}

#[test]
fn test_symbol_bytes_not_trimmed() {
    let frame = create_frame(b"AB  ", b'B', 1, 1, 1);
    let packet = Codec::decode(&frame).unwrap();
    assert_eq!(&packet.symbol, b"AB  ");
    assert_eq!(packet.symbol_str(), "AB  ");
}

#[test]
fn test_unknown_side_carried_through() {
    let frame = create_frame(b"AAPL", b'?', 1, 1, 1);
    let packet = Codec::decode(&frame).unwrap();
    assert_eq!(packet.side, b'?');
    assert_eq!(packet.side(), abx_client::Side::Other(b'?'));
}

#[test]
fn test_decode_stream_in_arrival_order() {
    let mut buffer = create_frame(b"AAPL", b'B', 1, 1, 3);
    buffer.extend(create_frame(b"AAPL", b'B', 1, 1, 1));
    buffer.extend(create_frame(b"AAPL", b'B', 1, 1, 2));

    let mut seen = Vec::new();
    let summary = Codec::decode_stream(&buffer, |p| seen.push(p.sequence));

    assert_eq!(seen, vec![3, 1, 2]);
    assert_eq!(summary.frames, 3);
    assert_eq!(summary.trailing_bytes, 0);
}

#[test]
fn test_decode_stream_truncated_tail() {
    let mut buffer = create_frame(b"AAPL", b'B', 1, 1, 1);
    buffer.extend(create_frame(b"AAPL", b'S', 2, 2, 2));
    buffer.extend([1, 2, 3, 4, 5]);
    assert_eq!(buffer.len(), 37);

    let mut count = 0;
    let summary = Codec::decode_stream(&buffer, |_| count += 1);

    assert_eq!(count, 2);
    assert_eq!(summary.frames, 2);
    assert_eq!(summary.trailing_bytes, 5);
}

#[test]
fn test_decode_stream_empty_and_short() {
    let summary = Codec::decode_stream(&[], |_| panic!("no frames expected"));
    assert_eq!(summary.frames, 0);

    let summary = Codec::decode_stream(&[0u8; 16], |_| panic!("no frames expected"));
    assert_eq!(summary.frames, 0);
    assert_eq!(summary.trailing_bytes, 16);
}
