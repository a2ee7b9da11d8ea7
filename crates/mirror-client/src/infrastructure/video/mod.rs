//! Video packet source over a byte stream.
//!
//! The stream starts with a 12-byte metadata block (codec FourCC, initial
//! width and height), followed by packets, each a 12-byte header plus
//! payload.  See [`mirror_core::protocol::video`] for the layout.

use async_trait::async_trait;
use mirror_core::{
    protocol::video::{PacketHeader, METADATA_SIZE, PACKET_HEADER_SIZE},
    VideoPacket, VideoStreamMetadata,
};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

use crate::application::{demux::PacketSource, session::TransportError};

/// Reads the stream metadata block.
///
/// # Errors
///
/// Returns [`TransportError::Closed`] if the stream ends first, or
/// [`TransportError::Protocol`] for an unknown codec.
pub async fn read_metadata<R>(reader: &mut R) -> Result<VideoStreamMetadata, TransportError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; METADATA_SIZE];
    reader.read_exact(&mut buf).await.map_err(eof_is_closed)?;
    Ok(VideoStreamMetadata::decode(&buf)?)
}

fn eof_is_closed(e: std::io::Error) -> TransportError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        TransportError::Closed
    } else {
        TransportError::Io(e)
    }
}

/// A [`PacketSource`] that parses packets from `R`.
pub struct StreamPacketSource<R> {
    reader: R,
    packets_read: u64,
}

impl<R> StreamPacketSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    /// Wraps a reader positioned just after the metadata block.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            packets_read: 0,
        }
    }

    pub fn packets_read(&self) -> u64 {
        self.packets_read
    }

    /// Reads a header, or `None` on a clean end of stream.
    async fn read_header(&mut self) -> Result<Option<PacketHeader>, TransportError> {
        let mut buf = [0u8; PACKET_HEADER_SIZE];
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.reader.read(&mut buf[filled..]).await?;
            if n == 0 {
                return if filled == 0 {
                    Ok(None)
                } else {
                    Err(TransportError::Closed)
                };
            }
            filled += n;
        }
        Ok(Some(PacketHeader::decode(&buf)?))
    }
}

#[async_trait]
impl<R> PacketSource for StreamPacketSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn next_packet(&mut self) -> Result<Option<VideoPacket>, TransportError> {
        let Some(header) = self.read_header().await? else {
            return Ok(None);
        };
        let mut data = vec![0u8; header.payload_len];
        self.reader
            .read_exact(&mut data)
            .await
            .map_err(eof_is_closed)?;
        self.packets_read += 1;
        trace!(
            config = header.config,
            keyframe = header.keyframe,
            pts = header.pts,
            len = header.payload_len,
            "video packet"
        );
        Ok(Some(header.into_packet(data)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_core::{protocol::codec::ProtocolError, VideoCodec, VideoFrame};
    use tokio_test::io::Builder;

    fn frame(pts: i64, keyframe: bool) -> VideoPacket {
        VideoPacket::Frame(VideoFrame {
            pts,
            keyframe,
            data: vec![0, 0, 0, 1, 0x41, 0x9A],
        })
    }

    #[tokio::test]
    async fn test_read_metadata_decodes_codec_and_size() {
        // Arrange
        let meta = VideoStreamMetadata {
            codec: VideoCodec::H265,
            width: 1080,
            height: 2400,
        };
        let mut mock = Builder::new().read(&meta.encode()).build();

        // Act
        let decoded = read_metadata(&mut mock).await.unwrap();

        // Assert
        assert_eq!(decoded, meta);
    }

    #[tokio::test]
    async fn test_read_metadata_unknown_codec_is_protocol_error() {
        let mut mock = Builder::new().read(b"vp09\0\0\0\x01\0\0\0\x01").build();

        let result = read_metadata(&mut mock).await;

        assert!(matches!(
            result,
            Err(TransportError::Protocol(ProtocolError::UnknownCodec(_)))
        ));
    }

    #[tokio::test]
    async fn test_packets_read_in_order_then_clean_end() {
        // Arrange
        let config = VideoPacket::Configuration(vec![0, 0, 0, 1, 0x67, 0x42]);
        let mut bytes = config.encode();
        bytes.extend(frame(1000, true).encode());
        let mut source = StreamPacketSource::new(Builder::new().read(&bytes).build());

        // Act
        let first = source.next_packet().await.unwrap();
        let second = source.next_packet().await.unwrap();
        let end = source.next_packet().await.unwrap();

        // Assert
        assert_eq!(first, Some(config));
        assert_eq!(second, Some(frame(1000, true)));
        assert_eq!(end, None);
        assert_eq!(source.packets_read(), 2);
    }

    #[tokio::test]
    async fn test_header_split_across_reads() {
        let bytes = frame(33_333, false).encode();
        let mock = Builder::new()
            .read(&bytes[..5])
            .read(&bytes[5..])
            .build();
        let mut source = StreamPacketSource::new(mock);

        let packet = source.next_packet().await.unwrap();

        assert_eq!(packet, Some(frame(33_333, false)));
    }

    #[tokio::test]
    async fn test_truncated_payload_is_closed() {
        let bytes = frame(0, true).encode();
        let mut source =
            StreamPacketSource::new(Builder::new().read(&bytes[..bytes.len() - 2]).build());

        let result = source.next_packet().await;

        assert!(matches!(result, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn test_truncated_header_is_closed() {
        let bytes = frame(0, true).encode();
        let mut source = StreamPacketSource::new(Builder::new().read(&bytes[..7]).build());

        let result = source.next_packet().await;

        assert!(matches!(result, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn test_oversized_packet_is_protocol_error() {
        let mut header = [0u8; PACKET_HEADER_SIZE];
        header[8..12].copy_from_slice(&u32::MAX.to_be_bytes());
        let mut source = StreamPacketSource::new(Builder::new().read(&header).build());

        let result = source.next_packet().await;

        assert!(matches!(
            result,
            Err(TransportError::Protocol(ProtocolError::PacketTooLarge { .. }))
        ));
    }
}
