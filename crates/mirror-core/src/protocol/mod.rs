//! Wire protocol: control messages, video stream framing and server options.

pub mod codec;
pub mod messages;
pub mod options;
pub mod video;

pub use codec::{decode_control_message, encode_control_message, ProtocolError};
pub use messages::*;
pub use options::ServerOptions;
pub use video::{VideoCodec, VideoFrame, VideoPacket, VideoStreamMetadata};
