//! Recording test doubles for every session collaborator.
//!
//! # Why hand-written doubles?
//!
//! The real collaborators open sockets, spawn decoder tasks and talk to a
//! device.  These doubles replace all of that with in-memory recording so
//! tests can assert exactly which messages were sent, which frames reached
//! the decoder and which surface calls happened, in order.
//!
//! Each recorder keeps its log in a `Mutex<Vec<...>>` and exposes a snapshot
//! accessor.  Where a failure path matters there is a `should_fail` switch.
//!
//! # Usage in tests
//!
//! ```ignore
//! let transport = Arc::new(MockTransport::new(metadata, ScriptedPacketSource::held_open(packets)));
//! let discovery = Arc::new(MockDiscovery::with_device(device));
//! discovery.push_transport(Arc::clone(&transport));
//!
//! let (controller, events) = SessionController::new(discovery, decoders, surface, options);
//! controller.connect().await?;
//! controller.press_back().await?;
//!
//! assert_eq!(transport.control.sent().len(), 2);
//! ```

use std::collections::{HashSet, VecDeque};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

use async_trait::async_trait;
use mirror_core::{
    ControlMessage, DeviceSize, ServerOptions, SurfaceRect, VideoCodec, VideoFrame, VideoPacket,
    VideoStreamMetadata,
};
use uuid::Uuid;

use crate::application::{
    demux::{DecoderError, DecoderFactory, DecoderSink, PacketSource, RendererHandle},
    session::{
        ChannelError, ControlChannel, DeviceDiscovery, DeviceInfo, ListenerId, RenderSurface,
        Transport, TransportError,
    },
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Control channel ───────────────────────────────────────────────────────────

/// Records every message passed to `send`.
#[derive(Default)]
pub struct RecordingControlChannel {
    sent: Mutex<Vec<ControlMessage>>,
    /// When `true`, `send` returns [`ChannelError::Rejected`] and records nothing.
    should_fail: AtomicBool,
}

impl RecordingControlChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<ControlMessage> {
        lock(&self.sent).clone()
    }

    pub fn set_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ControlChannel for RecordingControlChannel {
    async fn send(&self, message: &ControlMessage) -> Result<(), ChannelError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(ChannelError::Rejected("mock failure".to_string()));
        }
        lock(&self.sent).push(*message);
        Ok(())
    }
}

// ── Packet source ─────────────────────────────────────────────────────────────

/// What a [`ScriptedPacketSource`] does once its script runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptEnd {
    /// Returns `Ok(None)`.
    Eof,
    /// Never returns, like a live stream with no new packets.
    HoldOpen,
    /// Returns `Err(TransportError::Closed)`.
    Fail,
}

/// Yields a fixed list of packets.
pub struct ScriptedPacketSource {
    packets: VecDeque<VideoPacket>,
    end: ScriptEnd,
}

impl ScriptedPacketSource {
    pub fn new(packets: Vec<VideoPacket>, end: ScriptEnd) -> Self {
        Self {
            packets: packets.into(),
            end,
        }
    }

    pub fn ending(packets: Vec<VideoPacket>) -> Self {
        Self::new(packets, ScriptEnd::Eof)
    }

    pub fn held_open(packets: Vec<VideoPacket>) -> Self {
        Self::new(packets, ScriptEnd::HoldOpen)
    }

    pub fn failing(packets: Vec<VideoPacket>) -> Self {
        Self::new(packets, ScriptEnd::Fail)
    }
}

#[async_trait]
impl PacketSource for ScriptedPacketSource {
    async fn next_packet(&mut self) -> Result<Option<VideoPacket>, TransportError> {
        if let Some(packet) = self.packets.pop_front() {
            return Ok(Some(packet));
        }
        match self.end {
            ScriptEnd::Eof => Ok(None),
            ScriptEnd::Fail => Err(TransportError::Closed),
            ScriptEnd::HoldOpen => std::future::pending().await,
        }
    }
}

// ── Transport ─────────────────────────────────────────────────────────────────

/// A transport with a recording control channel and a scripted video stream.
pub struct MockTransport {
    pub control: Arc<RecordingControlChannel>,
    control_override: Mutex<Option<Arc<dyn ControlChannel>>>,
    video: Mutex<Option<(VideoStreamMetadata, ScriptedPacketSource)>>,
    closes: AtomicUsize,
}

impl MockTransport {
    pub fn new(metadata: VideoStreamMetadata, source: ScriptedPacketSource) -> Self {
        Self {
            control: Arc::new(RecordingControlChannel::new()),
            control_override: Mutex::new(None),
            video: Mutex::new(Some((metadata, source))),
            closes: AtomicUsize::new(0),
        }
    }

    /// Hands out `control` instead of the recording channel.
    pub fn set_control(&self, control: Arc<dyn ControlChannel>) {
        *lock(&self.control_override) = Some(control);
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn control(&self) -> Arc<dyn ControlChannel> {
        match lock(&self.control_override).clone() {
            Some(control) => control,
            None => Arc::clone(&self.control) as Arc<dyn ControlChannel>,
        }
    }

    async fn take_video_stream(
        &self,
    ) -> Result<(VideoStreamMetadata, Box<dyn PacketSource>), TransportError> {
        let (metadata, source) = lock(&self.video).take().ok_or(TransportError::Closed)?;
        Ok((metadata, Box::new(source)))
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Discovery ─────────────────────────────────────────────────────────────────

/// Discovery over a fixed device list.  `open` hands out queued transports
/// in order and fails with [`TransportError::Unavailable`] once they run out.
#[derive(Default)]
pub struct MockDiscovery {
    devices: Mutex<Vec<DeviceInfo>>,
    transports: Mutex<VecDeque<Arc<MockTransport>>>,
    opened: Mutex<Vec<DeviceInfo>>,
    forgotten: Mutex<Vec<DeviceInfo>>,
    /// When `true`, `open` returns [`TransportError::DeviceBusy`].
    pub should_fail: AtomicBool,
}

impl MockDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(device: DeviceInfo) -> Self {
        let discovery = Self::new();
        lock(&discovery.devices).push(device);
        discovery
    }

    pub fn add_device(&self, device: DeviceInfo) {
        lock(&self.devices).push(device);
    }

    pub fn push_transport(&self, transport: Arc<MockTransport>) {
        lock(&self.transports).push_back(transport);
    }

    pub fn opened(&self) -> Vec<DeviceInfo> {
        lock(&self.opened).clone()
    }

    pub fn forgotten(&self) -> Vec<DeviceInfo> {
        lock(&self.forgotten).clone()
    }
}

#[async_trait]
impl DeviceDiscovery for MockDiscovery {
    async fn request_device(&self) -> Result<Option<DeviceInfo>, TransportError> {
        Ok(lock(&self.devices).first().cloned())
    }

    async fn devices(&self) -> Result<Vec<DeviceInfo>, TransportError> {
        Ok(lock(&self.devices).clone())
    }

    async fn open(
        &self,
        device: &DeviceInfo,
        _options: &ServerOptions,
    ) -> Result<Arc<dyn Transport>, TransportError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(TransportError::DeviceBusy(device.serial.clone()));
        }
        lock(&self.opened).push(device.clone());
        let transport = lock(&self.transports)
            .pop_front()
            .ok_or_else(|| TransportError::Unavailable(device.serial.clone()))?;
        Ok(transport as Arc<dyn Transport>)
    }

    async fn forget(&self, device: &DeviceInfo) -> Result<(), TransportError> {
        lock(&self.devices).retain(|d| d != device);
        lock(&self.forgotten).push(device.clone());
        Ok(())
    }
}

// ── Decoder ───────────────────────────────────────────────────────────────────

/// Records every frame written.
pub struct RecordingDecoderSink {
    pub codec: VideoCodec,
    renderer: RendererHandle,
    frames: Mutex<Vec<VideoFrame>>,
    released: AtomicBool,
    /// When `true`, `write` returns [`DecoderError::Rejected`] and records nothing.
    pub should_fail: AtomicBool,
}

impl RecordingDecoderSink {
    pub fn new(codec: VideoCodec) -> Self {
        Self {
            codec,
            renderer: RendererHandle::new(),
            frames: Mutex::new(Vec::new()),
            released: AtomicBool::new(false),
            should_fail: AtomicBool::new(false),
        }
    }

    pub fn frames(&self) -> Vec<VideoFrame> {
        lock(&self.frames).clone()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DecoderSink for RecordingDecoderSink {
    async fn write(&self, frame: VideoFrame) -> Result<(), DecoderError> {
        if self.is_released() {
            return Err(DecoderError::Closed);
        }
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(DecoderError::Rejected(format!("pts {}", frame.pts)));
        }
        lock(&self.frames).push(frame);
        Ok(())
    }

    fn renderer(&self) -> RendererHandle {
        self.renderer
    }

    async fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// Creates [`RecordingDecoderSink`]s and keeps them for inspection.
#[derive(Default)]
pub struct RecordingDecoderFactory {
    sinks: Mutex<Vec<Arc<RecordingDecoderSink>>>,
}

impl RecordingDecoderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sinks(&self) -> Vec<Arc<RecordingDecoderSink>> {
        lock(&self.sinks).clone()
    }

    pub fn last_sink(&self) -> Option<Arc<RecordingDecoderSink>> {
        lock(&self.sinks).last().cloned()
    }
}

impl DecoderFactory for RecordingDecoderFactory {
    fn create(&self, codec: VideoCodec) -> Result<Arc<dyn DecoderSink>, DecoderError> {
        let sink = Arc::new(RecordingDecoderSink::new(codec));
        lock(&self.sinks).push(Arc::clone(&sink));
        Ok(sink)
    }
}

// ── Surface ───────────────────────────────────────────────────────────────────

/// A surface with fixed bounds that records renderer, listener and resize calls.
#[derive(Default)]
pub struct RecordingSurface {
    bounds: Mutex<Option<SurfaceRect>>,
    attached: Mutex<Vec<RendererHandle>>,
    listeners: Mutex<HashSet<ListenerId>>,
    resizes: Mutex<Vec<DeviceSize>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bounds(bounds: SurfaceRect) -> Self {
        let surface = Self::new();
        surface.set_bounds(Some(bounds));
        surface
    }

    pub fn set_bounds(&self, bounds: Option<SurfaceRect>) {
        *lock(&self.bounds) = bounds;
    }

    /// Renderers currently attached.
    pub fn attached(&self) -> Vec<RendererHandle> {
        lock(&self.attached).clone()
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }

    pub fn resizes(&self) -> Vec<DeviceSize> {
        lock(&self.resizes).clone()
    }
}

impl RenderSurface for RecordingSurface {
    fn bounding_rect(&self) -> Option<SurfaceRect> {
        *lock(&self.bounds)
    }

    fn attach_renderer(&self, renderer: RendererHandle) {
        lock(&self.attached).push(renderer);
    }

    fn detach_renderer(&self, renderer: RendererHandle) {
        lock(&self.attached).retain(|r| *r != renderer);
    }

    fn add_input_listeners(&self) -> ListenerId {
        let id = ListenerId(Uuid::new_v4());
        lock(&self.listeners).insert(id);
        id
    }

    fn remove_input_listeners(&self, id: ListenerId) {
        lock(&self.listeners).remove(&id);
    }

    fn resize(&self, size: DeviceSize) {
        lock(&self.resizes).push(size);
    }
}
