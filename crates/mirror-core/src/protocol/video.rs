//! Video stream framing.
//!
//! The video socket carries one metadata record followed by a sequence of
//! packets:
//!
//! ```text
//! metadata  [codec_id:4][width:4][height:4]
//! packet    [pts_and_flags:8][payload_len:4][payload:N]
//! ```
//!
//! The two top bits of `pts_and_flags` mark configuration packets (bit 63)
//! and keyframes (bit 62); the remaining 62 bits hold the presentation
//! timestamp in microseconds.  Configuration packets carry codec parameter
//! sets rather than picture data and have no meaningful timestamp.

use crate::protocol::codec::{require_len, ProtocolError};
use serde::{Deserialize, Serialize};

/// Size of the stream metadata record in bytes.
pub const METADATA_SIZE: usize = 12;

/// Size of a packet header in bytes.
pub const PACKET_HEADER_SIZE: usize = 12;

/// Largest payload a single packet may declare (16 MiB).
pub const MAX_PACKET_SIZE: usize = 16 * 1024 * 1024;

const FLAG_CONFIG: u64 = 1 << 63;
const FLAG_KEYFRAME: u64 = 1 << 62;
const PTS_MASK: u64 = FLAG_KEYFRAME - 1;

// ── Codec ─────────────────────────────────────────────────────────────────────

/// Video codecs the server can announce, identified by FourCC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u32)]
pub enum VideoCodec {
    H264 = 0x6832_3634,
    H265 = 0x6832_3635,
    Av1 = 0x0061_7631,
}

impl TryFrom<u32> for VideoCodec {
    type Error = ();

    fn try_from(value: u32) -> Result<Self, ()> {
        match value {
            0x6832_3634 => Ok(VideoCodec::H264),
            0x6832_3635 => Ok(VideoCodec::H265),
            0x0061_7631 => Ok(VideoCodec::Av1),
            _ => Err(()),
        }
    }
}

impl VideoCodec {
    /// Name used in server options (`video_codec=...`).
    pub fn option_name(self) -> &'static str {
        match self {
            VideoCodec::H264 => "h264",
            VideoCodec::H265 => "h265",
            VideoCodec::Av1 => "av1",
        }
    }
}

impl std::fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.option_name())
    }
}

impl std::str::FromStr for VideoCodec {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "h264" => Ok(VideoCodec::H264),
            "h265" => Ok(VideoCodec::H265),
            "av1" => Ok(VideoCodec::Av1),
            other => Err(ProtocolError::MalformedPayload(format!("unknown codec name: {other}"))),
        }
    }
}

// ── Metadata ──────────────────────────────────────────────────────────────────

/// Stream metadata, delivered once before the first packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoStreamMetadata {
    pub codec: VideoCodec,
    /// Initial encoded width; superseded by the first configuration packet.
    pub width: u32,
    pub height: u32,
}

impl VideoStreamMetadata {
    pub fn encode(&self) -> [u8; METADATA_SIZE] {
        let mut out = [0u8; METADATA_SIZE];
        out[0..4].copy_from_slice(&(self.codec as u32).to_be_bytes());
        out[4..8].copy_from_slice(&self.width.to_be_bytes());
        out[8..12].copy_from_slice(&self.height.to_be_bytes());
        out
    }

    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownCodec`] for an unrecognized FourCC.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        require_len(bytes, METADATA_SIZE)?;
        let codec_id = be_u32(&bytes[0..4]);
        let codec = VideoCodec::try_from(codec_id).map_err(|_| ProtocolError::UnknownCodec(codec_id))?;
        Ok(Self {
            codec,
            width: be_u32(&bytes[4..8]),
            height: be_u32(&bytes[8..12]),
        })
    }
}

// ── Packets ───────────────────────────────────────────────────────────────────

/// An encoded picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    /// Presentation timestamp in microseconds.
    pub pts: i64,
    pub keyframe: bool,
    pub data: Vec<u8>,
}

/// One unit of the video stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoPacket {
    /// Codec parameter sets (SPS/PPS/VPS); never sent to the decoder as a picture.
    Configuration(Vec<u8>),
    Frame(VideoFrame),
}

impl VideoPacket {
    /// Encodes this packet with its header.
    pub fn encode(&self) -> Vec<u8> {
        let (pts_and_flags, data) = match self {
            VideoPacket::Configuration(data) => (FLAG_CONFIG, data),
            VideoPacket::Frame(frame) => {
                let mut value = (frame.pts as u64) & PTS_MASK;
                if frame.keyframe {
                    value |= FLAG_KEYFRAME;
                }
                (value, &frame.data)
            }
        };
        let mut buf = Vec::with_capacity(PACKET_HEADER_SIZE + data.len());
        buf.extend_from_slice(&pts_and_flags.to_be_bytes());
        buf.extend_from_slice(&(data.len() as u32).to_be_bytes());
        buf.extend_from_slice(data);
        buf
    }
}

/// Decoded packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub config: bool,
    pub keyframe: bool,
    pub pts: i64,
    pub payload_len: usize,
}

impl PacketHeader {
    /// # Errors
    ///
    /// Returns [`ProtocolError::PacketTooLarge`] when the declared payload
    /// exceeds [`MAX_PACKET_SIZE`].
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        require_len(bytes, PACKET_HEADER_SIZE)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&bytes[0..8]);
        let pts_and_flags = u64::from_be_bytes(raw);
        let payload_len = be_u32(&bytes[8..12]) as usize;
        if payload_len > MAX_PACKET_SIZE {
            return Err(ProtocolError::PacketTooLarge {
                declared: payload_len,
                limit: MAX_PACKET_SIZE,
            });
        }
        Ok(Self {
            config: pts_and_flags & FLAG_CONFIG != 0,
            keyframe: pts_and_flags & FLAG_KEYFRAME != 0,
            pts: (pts_and_flags & PTS_MASK) as i64,
            payload_len,
        })
    }

    /// Combines this header with its payload.
    pub fn into_packet(self, data: Vec<u8>) -> VideoPacket {
        if self.config {
            VideoPacket::Configuration(data)
        } else {
            VideoPacket::Frame(VideoFrame {
                pts: self.pts,
                keyframe: self.keyframe,
                data,
            })
        }
    }
}

fn be_u32(b: &[u8]) -> u32 {
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

// ── Tests ─────────────────────────────────────────────────────────────────────
