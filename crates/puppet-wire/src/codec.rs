//! Frame codec
//!
//! Frame layout (6-byte header, then the body):
//! - Byte 0: Protocol version
//! - Byte 1: Flags
//! - Bytes 2-5: Body length (LE)
//! - Body: JSON-encoded [`PeerMessage`]

use bytes::{Buf, BufMut, Bytes, BytesMut};
use puppet_core::{PuppetError, PuppetResult};
use tracing::trace;

use crate::{PeerMessage, PROTOCOL_VERSION};

/// Frame header size in bytes
pub const FRAME_HEADER_SIZE: usize = 6;

/// Largest body a frame may declare
pub const MAX_BODY_SIZE: usize = 1 << 20;

/// Frame flags (1 byte)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameFlags(pub u8);

impl FrameFlags {
    pub const NONE: FrameFlags = FrameFlags(0);

    /// Body is a keyframe skeleton update
    pub const KEYFRAME: u8 = 0b0000_0001;

    #[inline]
    pub fn is_keyframe(self) -> bool {
        self.0 & Self::KEYFRAME != 0
    }

    #[inline]
    pub fn set_keyframe(&mut self, value: bool) {
        if value {
            self.0 |= Self::KEYFRAME;
        } else {
            self.0 &= !Self::KEYFRAME;
        }
    }
}

/// Parsed frame header
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: u8,
    pub flags: FrameFlags,
    pub body_len: u32,
}

impl FrameHeader {
    /// Parse a header from the front of `buf`
    pub fn parse(buf: &[u8]) -> PuppetResult<Self> {
        if buf.len() < FRAME_HEADER_SIZE {
            return Err(PuppetError::BufferTooShort {
                expected: FRAME_HEADER_SIZE,
                actual: buf.len(),
            });
        }
        let mut cursor = buf;
        let version = cursor.get_u8();
        if version != PROTOCOL_VERSION {
            return Err(PuppetError::UnsupportedVersion(version));
        }
        let flags = FrameFlags(cursor.get_u8());
        let body_len = cursor.get_u32_le();
        if body_len as usize > MAX_BODY_SIZE {
            return Err(PuppetError::InvalidWireFormat(format!(
                "Frame body too large: {} > {}",
                body_len, MAX_BODY_SIZE
            )));
        }
        Ok(FrameHeader {
            version,
            flags,
            body_len,
        })
    }

    /// Header plus body
    pub fn frame_len(&self) -> usize {
        FRAME_HEADER_SIZE + self.body_len as usize
    }
}

/// Encode a message as one frame
pub fn encode_frame(message: &PeerMessage) -> PuppetResult<Bytes> {
    let body = message.to_json()?;
    if body.len() > MAX_BODY_SIZE {
        return Err(PuppetError::InvalidWireFormat(format!(
            "Frame body too large: {} > {}",
            body.len(),
            MAX_BODY_SIZE
        )));
    }

    let mut flags = FrameFlags::NONE;
    flags.set_keyframe(message.is_keyframe());

    let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + body.len());
    buf.put_u8(PROTOCOL_VERSION);
    buf.put_u8(flags.0);
    buf.put_u32_le(body.len() as u32);
    buf.put_slice(&body);
    Ok(buf.freeze())
}

/// Decode one frame from the front of `buf`, returning the message and the
/// number of bytes consumed
pub fn decode_frame(buf: &[u8]) -> PuppetResult<(PeerMessage, usize)> {
    let header = FrameHeader::parse(buf)?;
    let frame_len = header.frame_len();
    if buf.len() < frame_len {
        return Err(PuppetError::BufferTooShort {
            expected: frame_len,
            actual: buf.len(),
        });
    }
    let message = PeerMessage::from_json(&buf[FRAME_HEADER_SIZE..frame_len])?;
    Ok((message, frame_len))
}

/// Reassembles frames from a byte stream
#[derive(Debug, Default)]
pub struct FrameReader {
    buf: BytesMut,
}

impl FrameReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append received bytes
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Bytes waiting for a complete frame
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Next complete message, `None` if more bytes are needed.
    ///
    /// A malformed frame is dropped from the buffer before its error is
    /// returned, so the reader can keep going.
    pub fn next_message(&mut self) -> PuppetResult<Option<PeerMessage>> {
        if self.buf.len() < FRAME_HEADER_SIZE {
            return Ok(None);
        }
        let header = match FrameHeader::parse(&self.buf) {
            Ok(header) => header,
            Err(e) => {
                // No trustworthy length; nothing after this can be framed
                self.buf.clear();
                return Err(e);
            }
        };
        let frame_len = header.frame_len();
        if self.buf.len() < frame_len {
            return Ok(None);
        }

        let frame = self.buf.split_to(frame_len);
        trace!(len = frame_len, keyframe = header.flags.is_keyframe(), "frame reassembled");
        PeerMessage::from_json(&frame[FRAME_HEADER_SIZE..]).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Payload, SkeletonDiff, WirePart, WirePoint};
    use proptest::prelude::*;
    use puppet_core::Vec2;

    fn update(sequence: u64, keyframe: bool) -> PeerMessage {
        let mut diff = SkeletonDiff {
            keyframe,
            body_scale: Some(1.25),
            ..Default::default()
        };
        diff.parts.insert(
            "leftWrist".into(),
            WirePart {
                position: WirePoint(Vec2::new(-170.0, 60.0)),
                confidence: 0.75,
            },
        );
        PeerMessage::new(sequence, Payload::SkeletonUpdate(diff))
    }

    #[test]
    fn test_frame_layout() {
        let msg = update(1, true);
        let frame = encode_frame(&msg).unwrap();
        let header = FrameHeader::parse(&frame).unwrap();
        assert_eq!(header.version, PROTOCOL_VERSION);
        assert!(header.flags.is_keyframe());
        assert_eq!(header.frame_len(), frame.len());

        let (decoded, used) = decode_frame(&frame).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(used, frame.len());
    }

    #[test]
    fn test_truncated_frame() {
        let frame = encode_frame(&update(1, false)).unwrap();
        let err = decode_frame(&frame[..frame.len() - 1]).unwrap_err();
        assert!(matches!(err, PuppetError::BufferTooShort { .. }));
        assert!(matches!(
            decode_frame(&frame[..3]),
            Err(PuppetError::BufferTooShort { expected: FRAME_HEADER_SIZE, actual: 3 })
        ));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut frame = encode_frame(&update(1, false)).unwrap().to_vec();
        frame[0] = 9;
        assert!(matches!(
            decode_frame(&frame),
            Err(PuppetError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn test_oversized_length_rejected() {
        let mut frame = vec![PROTOCOL_VERSION, 0];
        frame.extend_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            FrameHeader::parse(&frame),
            Err(PuppetError::InvalidWireFormat(_))
        ));
    }

    #[test]
    fn test_oversized_body_not_encoded() {
        let reason = "x".repeat(MAX_BODY_SIZE);
        let message = PeerMessage::new(1, Payload::Frozen { reason });
        assert!(matches!(
            encode_frame(&message),
            Err(PuppetError::InvalidWireFormat(_))
        ));
    }

    #[test]
    fn test_reader_skips_bad_body() {
        let mut bad = vec![PROTOCOL_VERSION, 0];
        bad.extend_from_slice(&4u32.to_le_bytes());
        bad.extend_from_slice(b"oops");
        let good = encode_frame(&PeerMessage::new(2, Payload::Goodbye)).unwrap();

        let mut reader = FrameReader::new();
        reader.extend(&bad);
        reader.extend(&good);
        assert!(matches!(reader.next_message(), Err(PuppetError::Json(_))));
        assert_eq!(reader.next_message().unwrap().unwrap().payload, Payload::Goodbye);
        assert!(reader.next_message().unwrap().is_none());
        assert_eq!(reader.buffered(), 0);
    }

    proptest! {
        #[test]
        fn prop_reader_reassembles_any_chunking(split in 1usize..64, count in 1u64..5) {
            let mut stream = Vec::new();
            for seq in 0..count {
                stream.extend_from_slice(&encode_frame(&update(seq, seq == 0)).unwrap());
            }

            let mut reader = FrameReader::new();
            let mut received = Vec::new();
            for chunk in stream.chunks(split) {
                reader.extend(chunk);
                while let Some(msg) = reader.next_message().unwrap() {
                    received.push(msg.sequence);
                }
            }
            prop_assert_eq!(received, (0..count).collect::<Vec<_>>());
            prop_assert_eq!(reader.buffered(), 0);
        }
    }
}
