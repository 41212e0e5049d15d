//! Fuzz target: DHT22 frame decoding and line sampling
//!
//! Interprets the input as a 5-byte frame followed by a sensor-side
//! waveform (pairs of level/duration bytes) and asserts that the decoder
//! never panics, that `Frame::decode` agrees with the checksum, and that a
//! transaction always ends with the line released.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use envctl::error::DecodeError;
use envctl::sensors::dht22::{Dht22, Frame};
use envctl::sensors::one_wire::PinDirection;
use envctl::sensors::sim::{Pulse, SimLine, SimTimebase, VirtualClock};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((head, waveform)) = data.split_first_chunk::<5>() else {
        return;
    };

    let frame = Frame::new(*head);
    match frame.decode() {
        Ok(_) => assert!(frame.checksum_ok()),
        Err(e) => {
            assert_eq!(e, DecodeError::ChecksumMismatch);
            assert!(!frame.checksum_ok());
        }
    }

    let script: Vec<Pulse> = waveform
        .chunks_exact(2)
        .map(|p| {
            let us = u32::from(p[1]) * 8;
            if p[0] & 1 == 0 {
                Pulse::low(us)
            } else {
                Pulse::high(us)
            }
        })
        .collect();

    let clock = VirtualClock::starting_at(u32::from_le_bytes([head[0], head[1], head[2], head[3]]));
    let line = SimLine::new(&clock);
    line.push_script(script);
    let mut dht = Dht22::new(line.clone(), SimTimebase::new(&clock));
    let _ = dht.read();
    assert_eq!(line.direction(), PinDirection::Input);
    assert_eq!(dht.stats().attempts, 1);
});
