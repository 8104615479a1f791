#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use puppet_wire::FrameReader;

#[derive(Debug, Arbitrary)]
struct Stream {
    chunks: Vec<Vec<u8>>,
}

fuzz_target!(|stream: Stream| {
    let mut reader = FrameReader::new();
    for chunk in &stream.chunks {
        reader.extend(chunk);
        // Every call either makes progress or asks for more bytes
        loop {
            let before = reader.buffered();
            match reader.next_message() {
                Ok(Some(_)) | Err(_) => assert!(reader.buffered() < before),
                Ok(None) => break,
            }
        }
    }
});
