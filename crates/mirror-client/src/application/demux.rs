//! VideoDemuxer: splits the video packet stream into configuration records
//! and decoder frames.
//!
//! Configuration packets are parsed for the displayed picture size and are
//! never handed to the decoder.  Frame packets are forwarded to the
//! [`DecoderSink`] unchanged and in order.  The sink's `write` is awaited
//! before the next packet is pulled, so a slow decoder suspends the reader
//! instead of growing a buffer.

use std::sync::Arc;

use async_trait::async_trait;
use mirror_core::{
    parse_configuration, ConfigurationError, VideoCodec, VideoConfiguration, VideoFrame,
    VideoPacket,
};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::session::TransportError;

// ── Collaborator traits ───────────────────────────────────────────────────────

/// A source that yields one video packet at a time.
///
/// `Ok(None)` means the stream ended cleanly.
#[async_trait]
pub trait PacketSource: Send {
    async fn next_packet(&mut self) -> Result<Option<VideoPacket>, TransportError>;
}

/// Identifies the renderer resource a decoder draws into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RendererHandle(pub Uuid);

impl RendererHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RendererHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Error type for decoder operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecoderError {
    /// The decoder refused this frame; later frames may still succeed.
    #[error("decoder rejected frame: {0}")]
    Rejected(String),
    #[error("decoder is closed")]
    Closed,
    #[error("no decoder available for {0}")]
    Unsupported(VideoCodec),
}

/// The consumer of decoded-order video frames.
///
/// `write` may suspend until the decoder can accept another frame.
#[async_trait]
pub trait DecoderSink: Send + Sync {
    async fn write(&self, frame: VideoFrame) -> Result<(), DecoderError>;

    /// The renderer resource to attach to the rendering surface.
    fn renderer(&self) -> RendererHandle;

    /// Releases the renderer and stops accepting frames.  Idempotent.
    async fn release(&self);
}

/// Creates a decoder sink for a codec.
pub trait DecoderFactory: Send + Sync {
    fn create(&self, codec: VideoCodec) -> Result<Arc<dyn DecoderSink>, DecoderError>;
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors that end the current stream.
#[derive(Debug, Error, PartialEq)]
pub enum DemuxError {
    #[error("unsupported codec: {0}")]
    UnsupportedCodec(VideoCodec),
    #[error("invalid configuration record: {0}")]
    InvalidConfiguration(ConfigurationError),
}

impl From<ConfigurationError> for DemuxError {
    fn from(err: ConfigurationError) -> Self {
        match err {
            ConfigurationError::UnsupportedCodec(codec) => DemuxError::UnsupportedCodec(codec),
            other => DemuxError::InvalidConfiguration(other),
        }
    }
}

// ── KeyframeTracker ───────────────────────────────────────────────────────────

/// Tracks the timestamp of the last keyframe to report keyframe intervals.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KeyframeTracker {
    last_pts: Option<i64>,
}

impl KeyframeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a keyframe at `pts` (microseconds).
    ///
    /// Returns the interval since the previous keyframe in whole
    /// milliseconds (floored), or `None` for the first keyframe of a stream.
    pub fn observe(&mut self, pts: i64) -> Option<i64> {
        let interval = self.last_pts.map(|last| (pts - last).div_euclid(1000));
        self.last_pts = Some(pts);
        interval
    }

    pub fn last_keyframe_pts(&self) -> Option<i64> {
        self.last_pts
    }

    pub fn reset(&mut self) {
        self.last_pts = None;
    }
}

// ── Demultiplexer ─────────────────────────────────────────────────────────────

/// What the demultiplexer did with one packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemuxOutcome {
    /// A configuration record was parsed.
    Configured(VideoConfiguration),
    /// A frame was forwarded to the sink.  Carries the keyframe interval
    /// when this frame was a keyframe with a predecessor.
    Frame { keyframe_interval_ms: Option<i64> },
    /// The sink rejected the frame; the stream continues.
    FrameRejected,
}

/// Routes the packets of one stream.
pub struct VideoDemuxer {
    codec: VideoCodec,
    sink: Arc<dyn DecoderSink>,
    tracker: KeyframeTracker,
}

impl VideoDemuxer {
    pub fn new(codec: VideoCodec, sink: Arc<dyn DecoderSink>) -> Self {
        Self {
            codec,
            sink,
            tracker: KeyframeTracker::new(),
        }
    }

    pub fn codec(&self) -> VideoCodec {
        self.codec
    }

    pub fn tracker(&self) -> &KeyframeTracker {
        &self.tracker
    }

    /// Processes one packet.
    ///
    /// # Errors
    ///
    /// Returns [`DemuxError`] if a configuration record cannot be parsed for
    /// the active codec.  Decoder write failures are logged and reported as
    /// [`DemuxOutcome::FrameRejected`], never as an error.
    pub async fn process(&mut self, packet: VideoPacket) -> Result<DemuxOutcome, DemuxError> {
        match packet {
            VideoPacket::Configuration(record) => {
                let config = parse_configuration(self.codec, &record)?;
                debug!(
                    codec = %self.codec,
                    width = config.cropped_width,
                    height = config.cropped_height,
                    "configuration record"
                );
                Ok(DemuxOutcome::Configured(config))
            }
            VideoPacket::Frame(frame) => {
                let pts = frame.pts;
                let keyframe_interval_ms = if frame.keyframe {
                    self.tracker.observe(pts)
                } else {
                    None
                };
                if let Some(interval_ms) = keyframe_interval_ms {
                    info!(interval_ms, "keyframe interval");
                }
                if let Err(e) = self.sink.write(frame).await {
                    warn!(pts, error = %e, "decoder write failed; dropping frame");
                    return Ok(DemuxOutcome::FrameRejected);
                }
                Ok(DemuxOutcome::Frame {
                    keyframe_interval_ms,
                })
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const H264_SPS: &[u8] = &[
        0, 0, 0, 1, 0x67, 0x64, 0x00, 0x28, 0xAC, 0xD9, 0x40, 0x78, 0x02, 0x27, 0xE5, 0xC0, 0x44,
        0x00, 0x00, 0x03, 0x00, 0x04, 0x00, 0x00, 0x03, 0x00, 0xF0, 0x3C, 0x60, 0xC6, 0x58,
    ];

    /// Sink that records frames and rejects those whose pts is listed.
    #[derive(Default)]
    struct TestSink {
        frames: Mutex<Vec<VideoFrame>>,
        reject_pts: Vec<i64>,
    }

    #[async_trait]
    impl DecoderSink for TestSink {
        async fn write(&self, frame: VideoFrame) -> Result<(), DecoderError> {
            if self.reject_pts.contains(&frame.pts) {
                return Err(DecoderError::Rejected("corrupt".to_string()));
            }
            self.frames.lock().unwrap().push(frame);
            Ok(())
        }

        fn renderer(&self) -> RendererHandle {
            RendererHandle(Uuid::nil())
        }

        async fn release(&self) {}
    }

    fn frame(pts: i64, keyframe: bool) -> VideoPacket {
        VideoPacket::Frame(VideoFrame {
            pts,
            keyframe,
            data: vec![0, 0, 0, 1, 0x65],
        })
    }

    #[test]
    fn test_tracker_first_keyframe_has_no_interval() {
        let mut tracker = KeyframeTracker::new();
        assert_eq!(tracker.observe(1000), None);
        assert_eq!(tracker.last_keyframe_pts(), Some(1000));
    }

    #[test]
    fn test_tracker_floors_to_whole_milliseconds() {
        let mut tracker = KeyframeTracker::new();
        tracker.observe(0);
        assert_eq!(tracker.observe(33_999), Some(33));
        assert_eq!(tracker.observe(34_999), Some(1));
    }

    #[test]
    fn test_tracker_floors_backwards_timestamps() {
        let mut tracker = KeyframeTracker::new();
        tracker.observe(10_000);
        // -500 us is -0.5 ms, floored to -1
        assert_eq!(tracker.observe(9_500), Some(-1));
        assert_eq!(tracker.observe(7_500), Some(-2));
    }

    #[test]
    fn test_tracker_reset_forgets_last_keyframe() {
        let mut tracker = KeyframeTracker::new();
        tracker.observe(1000);
        tracker.reset();
        assert_eq!(tracker.last_keyframe_pts(), None);
        assert_eq!(tracker.observe(9000), None);
    }

    #[tokio::test]
    async fn test_configuration_is_parsed_not_forwarded() {
        // Arrange
        let sink = Arc::new(TestSink::default());
        let mut demuxer = VideoDemuxer::new(VideoCodec::H264, sink.clone());

        // Act
        let outcome = demuxer
            .process(VideoPacket::Configuration(H264_SPS.to_vec()))
            .await
            .unwrap();

        // Assert
        let DemuxOutcome::Configured(config) = outcome else {
            panic!("expected Configured, got {outcome:?}");
        };
        assert_eq!((config.cropped_width, config.cropped_height), (1920, 1080));
        assert!(sink.frames.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_frames_forwarded_in_order_with_interval() {
        // Arrange
        let sink = Arc::new(TestSink::default());
        let mut demuxer = VideoDemuxer::new(VideoCodec::H264, sink.clone());
        let packets = vec![
            VideoPacket::Configuration(H264_SPS.to_vec()),
            frame(1000, true),
            frame(2000, false),
            frame(5000, true),
        ];

        // Act
        let mut outcomes = Vec::new();
        for packet in packets {
            outcomes.push(demuxer.process(packet).await.unwrap());
        }

        // Assert
        let forwarded = sink.frames.lock().unwrap();
        let seen: Vec<(i64, bool)> = forwarded.iter().map(|f| (f.pts, f.keyframe)).collect();
        assert_eq!(seen, vec![(1000, true), (2000, false), (5000, true)]);
        assert_eq!(
            outcomes[1..],
            [
                DemuxOutcome::Frame { keyframe_interval_ms: None },
                DemuxOutcome::Frame { keyframe_interval_ms: None },
                DemuxOutcome::Frame { keyframe_interval_ms: Some(4) },
            ]
        );
    }

    #[tokio::test]
    async fn test_rejected_frame_does_not_stop_stream() {
        let sink = Arc::new(TestSink {
            reject_pts: vec![2000],
            ..TestSink::default()
        });
        let mut demuxer = VideoDemuxer::new(VideoCodec::H264, sink.clone());

        let first = demuxer.process(frame(1000, true)).await.unwrap();
        let bad = demuxer.process(frame(2000, true)).await.unwrap();
        let next = demuxer.process(frame(3000, true)).await.unwrap();

        assert_eq!(first, DemuxOutcome::Frame { keyframe_interval_ms: None });
        assert_eq!(bad, DemuxOutcome::FrameRejected);
        assert_eq!(next, DemuxOutcome::Frame { keyframe_interval_ms: Some(1) });
        assert_eq!(sink.frames.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unsupported_codec_fails() {
        let sink = Arc::new(TestSink::default());
        let mut demuxer = VideoDemuxer::new(VideoCodec::Av1, sink);

        let result = demuxer.process(VideoPacket::Configuration(vec![0x0A, 0x0B])).await;

        assert_eq!(result, Err(DemuxError::UnsupportedCodec(VideoCodec::Av1)));
    }

    #[tokio::test]
    async fn test_malformed_configuration_fails() {
        let sink = Arc::new(TestSink::default());
        let mut demuxer = VideoDemuxer::new(VideoCodec::H264, sink);

        let result = demuxer.process(VideoPacket::Configuration(vec![1, 2, 3])).await;

        assert!(matches!(result, Err(DemuxError::InvalidConfiguration(_))));
    }
}
