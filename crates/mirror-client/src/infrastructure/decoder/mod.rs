//! Bounded decoder sink.
//!
//! Frames go through a bounded `mpsc` channel to a consumer task.  When the
//! channel is full, `write` suspends, which in turn suspends the video read
//! loop: the socket stops being read and TCP flow control pushes back on
//! the server.
//!
//! The consumer shipped here does not decode pictures; it keeps running
//! statistics, which is what the headless binary reports.  A GUI front end
//! plugs its own [`DecoderFactory`] in instead.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, PoisonError,
};

use async_trait::async_trait;
use mirror_core::{VideoCodec, VideoFrame};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::application::demux::{DecoderError, DecoderFactory, DecoderSink, RendererHandle};

/// Default number of frames buffered between the reader and the consumer.
pub const DEFAULT_QUEUE_DEPTH: usize = 8;

/// Running totals across every sink a factory has created.
#[derive(Debug, Default)]
pub struct DecoderStats {
    frames: AtomicU64,
    keyframes: AtomicU64,
    bytes: AtomicU64,
    last_pts: AtomicU64,
}

impl DecoderStats {
    fn record(&self, frame: &VideoFrame) {
        self.frames.fetch_add(1, Ordering::Relaxed);
        if frame.keyframe {
            self.keyframes.fetch_add(1, Ordering::Relaxed);
        }
        self.bytes
            .fetch_add(frame.data.len() as u64, Ordering::Relaxed);
        self.last_pts.store(frame.pts as u64, Ordering::Relaxed);
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn keyframes(&self) -> u64 {
        self.keyframes.load(Ordering::Relaxed)
    }

    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    pub fn last_pts(&self) -> i64 {
        self.last_pts.load(Ordering::Relaxed) as i64
    }
}

/// A [`DecoderSink`] backed by a bounded channel.
pub struct ChannelDecoderSink {
    codec: VideoCodec,
    renderer: RendererHandle,
    tx: Mutex<Option<mpsc::Sender<VideoFrame>>>,
}

impl ChannelDecoderSink {
    /// Creates a sink and the receiving end its consumer reads from.
    pub fn new(codec: VideoCodec, depth: usize) -> (Self, mpsc::Receiver<VideoFrame>) {
        let (tx, rx) = mpsc::channel(depth.max(1));
        let sink = Self {
            codec,
            renderer: RendererHandle::new(),
            tx: Mutex::new(Some(tx)),
        };
        (sink, rx)
    }

    pub fn codec(&self) -> VideoCodec {
        self.codec
    }

    fn sender(&self) -> Option<mpsc::Sender<VideoFrame>> {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl DecoderSink for ChannelDecoderSink {
    async fn write(&self, frame: VideoFrame) -> Result<(), DecoderError> {
        let tx = self.sender().ok_or(DecoderError::Closed)?;
        tx.send(frame).await.map_err(|_| DecoderError::Closed)
    }

    fn renderer(&self) -> RendererHandle {
        self.renderer
    }

    async fn release(&self) {
        let released = self
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if released.is_some() {
            debug!(codec = %self.codec, "decoder released");
        }
    }
}

/// Creates [`ChannelDecoderSink`]s whose consumer tasks feed [`DecoderStats`].
pub struct StatsDecoderFactory {
    depth: usize,
    codecs: Vec<VideoCodec>,
    stats: Arc<DecoderStats>,
}

impl StatsDecoderFactory {
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            codecs: vec![VideoCodec::H264, VideoCodec::H265, VideoCodec::Av1],
            stats: Arc::new(DecoderStats::default()),
        }
    }

    /// Restricts the codecs this factory accepts.
    pub fn with_codecs(mut self, codecs: impl IntoIterator<Item = VideoCodec>) -> Self {
        self.codecs = codecs.into_iter().collect();
        self
    }

    pub fn stats(&self) -> Arc<DecoderStats> {
        Arc::clone(&self.stats)
    }
}

impl Default for StatsDecoderFactory {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_DEPTH)
    }
}

impl DecoderFactory for StatsDecoderFactory {
    /// Must be called from within a Tokio runtime.
    fn create(&self, codec: VideoCodec) -> Result<Arc<dyn DecoderSink>, DecoderError> {
        if !self.codecs.contains(&codec) {
            return Err(DecoderError::Unsupported(codec));
        }
        let (sink, mut rx) = ChannelDecoderSink::new(codec, self.depth);
        let stats = Arc::clone(&self.stats);
        tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                trace!(pts = frame.pts, keyframe = frame.keyframe, "frame consumed");
                stats.record(&frame);
            }
        });
        Ok(Arc::new(sink))
    }
}
