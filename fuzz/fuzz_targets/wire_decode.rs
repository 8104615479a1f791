#![no_main]

use libfuzzer_sys::fuzz_target;
use puppet_core::PuppetError;
use puppet_wire::{decode_frame, encode_frame};

fuzz_target!(|data: &[u8]| {
    // Anything that decodes must survive a re-encode
    if let Ok((message, consumed)) = decode_frame(data) {
        assert!(consumed <= data.len());
        let frame = match encode_frame(&message) {
            Ok(frame) => frame,
            // Legacy {x,y} points re-encode longer and may cross the body cap
            Err(PuppetError::InvalidWireFormat(_)) => return,
            Err(e) => panic!("decoded message failed to re-encode: {e}"),
        };
        assert!(decode_frame(&frame).is_ok());
    }
});
