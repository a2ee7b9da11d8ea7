//! SessionController: owns one mirroring session from device selection to
//! teardown.
//!
//! # Lifecycle
//!
//! ```text
//!   Idle ──connect──▶ Connecting ──first configuration──▶ Streaming
//!    ▲                    │                                  │
//!    │                    │ error            disconnect /    │
//!    │                    ▼                  stream failure  ▼
//!    └──────────────── Closing ◀─────────────────────────────┘
//! ```
//!
//! At most one session is active.  Connecting while a session exists first
//! runs a full teardown.  Teardown is idempotent: calling
//! [`SessionController::disconnect`] while `Idle` does nothing.
//!
//! # Concurrency
//!
//! Video packets are pulled by a spawned read loop, one at a time, awaiting
//! the decoder before pulling the next.  Host input arrives through the
//! `on_*` handlers.  Both paths share only the [`DeviceFrame`] and the
//! control channel.  Teardown signals the read loop through a `watch`
//! channel and waits for it to exit before removing input listeners.
//!
//! When the read loop hits end-of-stream or an unrecoverable error it moves
//! the session to `Closing`, emits [`SessionEvent::StreamFailed`] and then
//! releases the session itself.  A later `disconnect` is a no-op.
//!
//! Connect, disconnect and that self-teardown are serialised by one
//! lifecycle lock.  `disconnect` first signals the connect in progress, so
//! it never waits on a stream that has not produced its first
//! configuration record.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use mirror_core::{
    dom_code_to_android,
    protocol::messages::{DeviceKeyMessage, KeyAction, ScreenPowerMode},
    AndroidKeyCode, ControlMessage, DeviceFrame, DeviceSize, KeyDirection, KeyboardEvent,
    PointerEvent, PointerPhase, ProtocolError, Rotation, ServerOptions, SurfaceRect,
    VideoConfiguration, VideoStreamMetadata, WheelEvent,
};
use thiserror::Error;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::demux::{
    DecoderError, DecoderFactory, DecoderSink, DemuxError, DemuxOutcome, PacketSource,
    RendererHandle, VideoDemuxer,
};
use super::gesture::{scroll_message, GestureSynthesizer};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors raised by device discovery and transports.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No compatible device interface is present.
    #[error("transport unavailable: {0}")]
    Unavailable(String),
    /// Another process holds the device.
    #[error("device busy: {0}")]
    DeviceBusy(String),
    #[error("transport closed")]
    Closed,
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Errors raised by a control channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("control channel closed")]
    Closed,
    #[error("control channel I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("control message rejected: {0}")]
    Rejected(String),
}

/// Errors returned by [`SessionController`] operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("no device selected")]
    NoDevice,
    #[error("no active stream")]
    NotStreaming,
    /// The video stream ended before it was configured.
    #[error("video channel closed")]
    ChannelClosed,
    /// `disconnect` was called while connecting.
    #[error("connect cancelled")]
    Cancelled,
    #[error(transparent)]
    Demux(#[from] DemuxError),
    #[error(transparent)]
    Decoder(#[from] DecoderError),
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

// ── Collaborator traits ───────────────────────────────────────────────────────

/// Sends control messages to the device.
///
/// Each call must put one whole message on the wire; concurrent callers
/// never interleave partial messages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ControlChannel: Send + Sync {
    async fn send(&self, message: &ControlMessage) -> Result<(), ChannelError>;
}

/// Handle for one registration of input listeners on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub Uuid);

/// The on-screen element that shows the video and produces host input.
pub trait RenderSurface: Send + Sync {
    /// Current bounds in host pixels, or `None` when not laid out.
    fn bounding_rect(&self) -> Option<SurfaceRect>;
    fn attach_renderer(&self, renderer: RendererHandle);
    fn detach_renderer(&self, renderer: RendererHandle);
    fn add_input_listeners(&self) -> ListenerId;
    fn remove_input_listeners(&self, id: ListenerId);
    /// Resizes the surface to the device's displayed size.
    fn resize(&self, size: DeviceSize);
}

/// An open connection to a device.
#[async_trait]
pub trait Transport: Send + Sync {
    fn control(&self) -> Arc<dyn ControlChannel>;

    /// Hands over the video stream.  May be called once per transport.
    async fn take_video_stream(
        &self,
    ) -> Result<(VideoStreamMetadata, Box<dyn PacketSource>), TransportError>;

    /// Closes both channels.  Never fails; closing twice is a no-op.
    async fn close(&self);
}

/// A device known to discovery.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceInfo {
    pub serial: String,
    pub name: String,
}

/// Finds devices and opens transports to them.
#[async_trait]
pub trait DeviceDiscovery: Send + Sync {
    /// Asks the user to grant access to a device.  `Ok(None)` means nothing
    /// was selected.
    async fn request_device(&self) -> Result<Option<DeviceInfo>, TransportError>;

    /// Devices access has already been granted to, in a stable order.
    async fn devices(&self) -> Result<Vec<DeviceInfo>, TransportError>;

    async fn open(
        &self,
        device: &DeviceInfo,
        options: &ServerOptions,
    ) -> Result<Arc<dyn Transport>, TransportError>;

    /// Revokes access to a device.
    async fn forget(&self, device: &DeviceInfo) -> Result<(), TransportError>;
}

// ── Public state ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    Connecting,
    Streaming,
    Closing,
}

/// Notifications delivered to the controller's owner.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged(SessionState),
    ResolutionChanged(DeviceSize),
    KeyframeInterval { interval_ms: i64 },
    /// The video stream ended or failed; call `disconnect` to finish.
    StreamFailed(String),
}

/// Device watcher notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceChange {
    Added(DeviceInfo),
    Removed(DeviceInfo),
}

// ── Shared state ──────────────────────────────────────────────────────────────

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Resolves once `true` is sent on the cancel channel or its sender is gone.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let _ = cancel.wait_for(|stop| *stop).await;
}

/// State touched by both the controller and the read loop.
struct Shared {
    state: Mutex<SessionState>,
    frame: Mutex<DeviceFrame>,
    surface: Arc<dyn RenderSurface>,
    events: mpsc::UnboundedSender<SessionEvent>,
    /// Serialises connect, disconnect and the read loop's own teardown.
    lifecycle: tokio::sync::Mutex<()>,
    active: Mutex<Option<ActiveSession>>,
    /// Cancels the connect in progress, if any.
    connecting: Mutex<Option<Arc<watch::Sender<bool>>>>,
    control: Mutex<Option<Arc<dyn ControlChannel>>>,
    gestures: Mutex<GestureSynthesizer>,
}

impl Shared {
    fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    fn set_state(&self, next: SessionState) {
        let mut state = lock(&self.state);
        if *state == next {
            return;
        }
        debug!(from = ?*state, to = ?next, "session state");
        *state = next;
        drop(state);
        self.emit(SessionEvent::StateChanged(next));
    }

    fn emit(&self, event: SessionEvent) {
        // The receiver may be gone during shutdown.
        let _ = self.events.send(event);
    }

    fn set_resolution(&self, size: DeviceSize) {
        let mut frame = lock(&self.frame);
        if frame.resolution == size {
            return;
        }
        frame.resolution = size;
        drop(frame);
        info!(width = size.width, height = size.height, "device resolution");
        self.surface.resize(size);
        self.emit(SessionEvent::ResolutionChanged(size));
    }

    fn apply(&self, outcome: DemuxOutcome) {
        match outcome {
            DemuxOutcome::Configured(VideoConfiguration {
                cropped_width,
                cropped_height,
                ..
            }) => self.set_resolution(DeviceSize::new(cropped_width, cropped_height)),
            DemuxOutcome::Frame {
                keyframe_interval_ms: Some(interval_ms),
            } => self.emit(SessionEvent::KeyframeInterval { interval_ms }),
            DemuxOutcome::Frame { .. } | DemuxOutcome::FrameRejected => {}
        }
    }

    /// Moves a streaming session to `Closing` after the read loop stopped.
    fn stream_failed(&self, reason: String) {
        warn!(%reason, "video stream stopped");
        let mut state = lock(&self.state);
        if *state == SessionState::Streaming {
            *state = SessionState::Closing;
            drop(state);
            self.emit(SessionEvent::StateChanged(SessionState::Closing));
        } else {
            drop(state);
        }
        self.emit(SessionEvent::StreamFailed(reason));
    }

    /// Removes the active session if it is still session `id`.
    fn take_session(&self, id: Uuid) -> Option<ActiveSession> {
        let mut active = lock(&self.active);
        match active.as_ref() {
            Some(session) if session.id == id => active.take(),
            _ => None,
        }
    }

    /// Stops the read loop, then releases the session.
    async fn teardown(&self, mut session: ActiveSession) {
        self.set_state(SessionState::Closing);
        if let Some(reader) = session.reader.take() {
            let _ = reader.cancel.send(true);
            if let Err(e) = reader.handle.await {
                warn!(error = %e, "read loop ended abnormally");
            }
        }
        self.release(session).await;
    }

    /// Unregisters listeners, detaches and releases the decoder, closes the
    /// transport and returns to `Idle`.
    async fn release(&self, mut session: ActiveSession) {
        self.set_state(SessionState::Closing);
        if let Some(id) = session.listeners.take() {
            self.surface.remove_input_listeners(id);
        }
        *lock(&self.control) = None;
        lock(&self.gestures).reset();
        if let Some(renderer) = session.renderer.take() {
            self.surface.detach_renderer(renderer);
        }
        if let Some(decoder) = session.decoder.take() {
            decoder.release().await;
        }
        if let Some(transport) = session.transport.take() {
            transport.close().await;
        }

        self.set_state(SessionState::Idle);
        info!(session = %session.id, "session closed");
    }
}

// ── Active session ────────────────────────────────────────────────────────────

struct ReadLoop {
    cancel: Arc<watch::Sender<bool>>,
    handle: JoinHandle<()>,
}

/// Resources held by one session.  Fields fill in as connecting proceeds so
/// a failed connect can release exactly what it acquired.
struct ActiveSession {
    id: Uuid,
    device: DeviceInfo,
    transport: Option<Arc<dyn Transport>>,
    decoder: Option<Arc<dyn DecoderSink>>,
    renderer: Option<RendererHandle>,
    listeners: Option<ListenerId>,
    reader: Option<ReadLoop>,
}

impl ActiveSession {
    fn new(device: DeviceInfo) -> Self {
        Self {
            id: Uuid::new_v4(),
            device,
            transport: None,
            decoder: None,
            renderer: None,
            listeners: None,
            reader: None,
        }
    }
}

/// Pulls packets until cancelled or the stream fails.
///
/// On failure the loop tears its own session down, unless a disconnect or
/// reconnect has already started doing so.
async fn read_loop(
    shared: Arc<Shared>,
    session_id: Uuid,
    mut source: Box<dyn PacketSource>,
    mut demuxer: VideoDemuxer,
    mut cancel: watch::Receiver<bool>,
) {
    let reason = tokio::select! {
        biased;
        _ = cancelled(&mut cancel) => None,
        reason = pump(&shared, source.as_mut(), &mut demuxer) => Some(reason),
    };
    let Some(reason) = reason else {
        debug!("read loop cancelled");
        return;
    };
    shared.stream_failed(reason);

    let _lifecycle = tokio::select! {
        biased;
        _ = cancelled(&mut cancel) => return,
        guard = shared.lifecycle.lock() => guard,
    };
    if let Some(mut session) = shared.take_session(session_id) {
        // The handle is this task's own.
        session.reader.take();
        shared.release(session).await;
    }
    debug!("read loop exited");
}

/// Feeds packets to the demuxer; returns why the stream stopped.
async fn pump(shared: &Shared, source: &mut dyn PacketSource, demuxer: &mut VideoDemuxer) -> String {
    loop {
        let packet = match source.next_packet().await {
            Ok(Some(packet)) => packet,
            Ok(None) => return "video stream ended".to_string(),
            Err(e) => return e.to_string(),
        };
        match demuxer.process(packet).await {
            Ok(outcome) => shared.apply(outcome),
            Err(e) => return e.to_string(),
        }
    }
}

// ── Controller ────────────────────────────────────────────────────────────────

/// Drives the mirroring session and routes host input to the device.
pub struct SessionController {
    discovery: Arc<dyn DeviceDiscovery>,
    decoders: Arc<dyn DecoderFactory>,
    options: ServerOptions,
    shared: Arc<Shared>,
}

impl SessionController {
    /// Creates an idle controller and the receiver for its events.
    pub fn new(
        discovery: Arc<dyn DeviceDiscovery>,
        decoders: Arc<dyn DecoderFactory>,
        surface: Arc<dyn RenderSurface>,
        options: ServerOptions,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            state: Mutex::new(SessionState::Idle),
            frame: Mutex::new(DeviceFrame::default()),
            surface,
            events,
            lifecycle: tokio::sync::Mutex::new(()),
            active: Mutex::new(None),
            connecting: Mutex::new(None),
            control: Mutex::new(None),
            gestures: Mutex::new(GestureSynthesizer::new()),
        });
        let controller = Self {
            discovery,
            decoders,
            options,
            shared,
        };
        (controller, rx)
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// The current frame, bound to the surface's current bounds.
    pub fn frame(&self) -> DeviceFrame {
        let bounds = self.shared.surface.bounding_rect();
        lock(&self.shared.frame).with_bounds(bounds)
    }

    pub fn options(&self) -> &ServerOptions {
        &self.options
    }

    pub fn session_id(&self) -> Option<Uuid> {
        lock(&self.shared.active).as_ref().map(|s| s.id)
    }

    pub fn current_device(&self) -> Option<DeviceInfo> {
        lock(&self.shared.active)
            .as_ref()
            .map(|s| s.device.clone())
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    /// Connects to the first granted device.
    pub async fn connect(&self) -> Result<(), SessionError> {
        self.connect_to(0).await
    }

    /// Connects to the granted device at `index`.
    ///
    /// Any existing session is torn down first.  On failure the controller
    /// passes through `Closing` back to `Idle` and the error is returned.
    ///
    /// # Errors
    ///
    /// - [`SessionError::NoDevice`] if there is no device at `index`.
    /// - [`SessionError::Transport`] if the device cannot be opened.
    /// - [`SessionError::Demux`] if the stream's codec is unsupported or its
    ///   configuration record is malformed.
    /// - [`SessionError::ChannelClosed`] if the stream ends before its first
    ///   configuration record.
    /// - [`SessionError::Cancelled`] if `disconnect` was called meanwhile.
    pub async fn connect_to(&self, index: usize) -> Result<(), SessionError> {
        let _lifecycle = self.shared.lifecycle.lock().await;
        let previous = lock(&self.shared.active).take();
        if let Some(previous) = previous {
            info!(session = %previous.id, "replacing active session");
            self.shared.teardown(previous).await;
        }

        let device = self
            .discovery
            .devices()
            .await?
            .into_iter()
            .nth(index)
            .ok_or(SessionError::NoDevice)?;

        let mut session = ActiveSession::new(device);
        let (cancel, mut cancel_rx) = watch::channel(false);
        let cancel = Arc::new(cancel);
        let reader_cancel = cancel_rx.clone();
        *lock(&self.shared.connecting) = Some(Arc::clone(&cancel));

        let span = info_span!("session", id = %session.id, device = %session.device.name);
        self.shared.set_state(SessionState::Connecting);

        let result = tokio::select! {
            biased;
            _ = cancelled(&mut cancel_rx) => Err(SessionError::Cancelled),
            result = self
                .establish(&mut session, cancel, reader_cancel)
                .instrument(span) => result,
        };
        *lock(&self.shared.connecting) = None;

        match result {
            Ok(()) => {
                info!(session = %session.id, serial = %session.device.serial, "streaming");
                *lock(&self.shared.active) = Some(session);
                Ok(())
            }
            Err(e) => {
                warn!(session = %session.id, error = %e, "connect failed");
                self.shared.teardown(session).await;
                Err(e)
            }
        }
    }

    async fn establish(
        &self,
        session: &mut ActiveSession,
        cancel: Arc<watch::Sender<bool>>,
        cancel_rx: watch::Receiver<bool>,
    ) -> Result<(), SessionError> {
        lock(&self.shared.frame).rotation = Rotation::Deg0;

        let transport = self.discovery.open(&session.device, &self.options).await?;
        session.transport = Some(Arc::clone(&transport));

        let (metadata, mut source) = transport.take_video_stream().await?;
        debug!(codec = %metadata.codec, width = metadata.width, height = metadata.height, "stream metadata");

        let decoder = self.decoders.create(metadata.codec)?;
        session.decoder = Some(Arc::clone(&decoder));
        let renderer = decoder.renderer();
        self.shared.surface.attach_renderer(renderer);
        session.renderer = Some(renderer);
        self.shared
            .set_resolution(DeviceSize::new(metadata.width, metadata.height));

        // Frames ahead of the first configuration record are still forwarded.
        let mut demuxer = VideoDemuxer::new(metadata.codec, decoder);
        loop {
            let packet = source
                .next_packet()
                .await?
                .ok_or(SessionError::ChannelClosed)?;
            let outcome = demuxer.process(packet).await?;
            self.shared.apply(outcome);
            if matches!(outcome, DemuxOutcome::Configured(_)) {
                break;
            }
        }

        session.listeners = Some(self.shared.surface.add_input_listeners());
        lock(&self.shared.gestures).reset();
        *lock(&self.shared.control) = Some(transport.control());
        self.shared.set_state(SessionState::Streaming);

        let span = info_span!("video", session = %session.id);
        let handle = tokio::spawn(
            read_loop(
                Arc::clone(&self.shared),
                session.id,
                source,
                demuxer,
                cancel_rx,
            )
            .instrument(span),
        );
        session.reader = Some(ReadLoop { cancel, handle });
        Ok(())
    }

    /// Ends the active session, if any.  Never fails.
    ///
    /// A connect still waiting for its first configuration record is
    /// cancelled and returns [`SessionError::Cancelled`].
    pub async fn disconnect(&self) {
        let connecting = lock(&self.shared.connecting).clone();
        if let Some(cancel) = connecting {
            debug!("cancelling connect in progress");
            let _ = cancel.send(true);
        }

        let _lifecycle = self.shared.lifecycle.lock().await;
        let session = lock(&self.shared.active).take();
        match session {
            Some(session) => self.shared.teardown(session).await,
            None => debug!("disconnect with no active session"),
        }
    }

    /// Asks discovery for access to a device.
    pub async fn request_permission(&self) -> Result<DeviceInfo, SessionError> {
        match self.discovery.request_device().await? {
            Some(device) => {
                info!(serial = %device.serial, "device access granted");
                Ok(device)
            }
            None => {
                warn!("no device selected");
                Err(SessionError::NoDevice)
            }
        }
    }

    /// Disconnects and revokes access to the current device.
    pub async fn forget_device(&self) -> Result<(), SessionError> {
        let device = self.current_device().ok_or(SessionError::NoDevice)?;
        self.disconnect().await;
        self.discovery.forget(&device).await?;
        info!(serial = %device.serial, "device forgotten");
        Ok(())
    }

    /// Reacts to a device being plugged in or removed.
    pub async fn on_device_change(&self, change: DeviceChange) -> Result<(), SessionError> {
        match change {
            DeviceChange::Added(device) => {
                info!(serial = %device.serial, "device added");
                self.connect().await
            }
            DeviceChange::Removed(device) => {
                info!(serial = %device.serial, "device removed");
                self.disconnect().await;
                Ok(())
            }
        }
    }

    pub fn on_rotation_changed(&self, rotation: Rotation) {
        lock(&self.shared.frame).rotation = rotation;
        info!(degrees = rotation.degrees(), "device rotation");
    }

    // ── Input ────────────────────────────────────────────────────────────────

    pub async fn on_pointer_down(&self, event: &PointerEvent) {
        self.on_pointer(PointerPhase::Down, event).await;
    }

    pub async fn on_pointer_move(&self, event: &PointerEvent) {
        self.on_pointer(PointerPhase::Move, event).await;
    }

    pub async fn on_pointer_up(&self, event: &PointerEvent) {
        self.on_pointer(PointerPhase::Up, event).await;
    }

    pub async fn on_pointer_cancel(&self, event: &PointerEvent) {
        self.on_pointer(PointerPhase::Cancel, event).await;
    }

    pub async fn on_pointer_leave(&self, event: &PointerEvent) {
        self.on_pointer(PointerPhase::Leave, event).await;
    }

    /// Routes one pointer event through the gesture synthesizer.
    pub async fn on_pointer(&self, phase: PointerPhase, event: &PointerEvent) {
        let Some(control) = self.streaming_control() else {
            return;
        };
        let frame = self.frame();
        let messages = lock(&self.shared.gestures).process(phase, event, &frame);
        for message in messages {
            send_input(control.as_ref(), ControlMessage::InjectTouch(message)).await;
        }
    }

    pub async fn on_wheel(&self, event: &WheelEvent) {
        let Some(control) = self.streaming_control() else {
            return;
        };
        let message = scroll_message(event, &self.frame());
        send_input(control.as_ref(), ControlMessage::InjectScroll(message)).await;
    }

    pub async fn on_key_down(&self, event: &KeyboardEvent) {
        self.on_key(KeyDirection::Down, event).await;
    }

    pub async fn on_key_up(&self, event: &KeyboardEvent) {
        self.on_key(KeyDirection::Up, event).await;
    }

    pub async fn on_key(&self, direction: KeyDirection, event: &KeyboardEvent) {
        let Some(control) = self.streaming_control() else {
            return;
        };
        let Some(keycode) = dom_code_to_android(&event.code) else {
            debug!(code = %event.code, "unmapped key");
            return;
        };
        let action = match direction {
            KeyDirection::Down => KeyAction::Down,
            KeyDirection::Up => KeyAction::Up,
        };
        let message = DeviceKeyMessage::keyboard(action, keycode);
        send_input(control.as_ref(), ControlMessage::InjectKeycode(message)).await;
    }

    /// Secondary click: toggles the screen (BACK when on, wake when off).
    pub async fn on_context_menu(&self) {
        if let Err(e) = self.toggle_screen().await {
            debug!(error = %e, "context menu ignored");
        }
    }

    fn streaming_control(&self) -> Option<Arc<dyn ControlChannel>> {
        if self.shared.state() != SessionState::Streaming {
            return None;
        }
        lock(&self.shared.control).clone()
    }

    // ── Shortcuts ────────────────────────────────────────────────────────────

    pub async fn turn_screen_on(&self) -> Result<(), SessionError> {
        self.send_commands(&[ControlMessage::SetScreenPowerMode(ScreenPowerMode::Normal)])
            .await
    }

    pub async fn turn_screen_off(&self) -> Result<(), SessionError> {
        self.send_commands(&[ControlMessage::SetScreenPowerMode(ScreenPowerMode::Off)])
            .await
    }

    pub async fn toggle_screen(&self) -> Result<(), SessionError> {
        self.send_commands(&[ControlMessage::BackOrScreenOn(KeyAction::Down)])
            .await
    }

    pub async fn press_back(&self) -> Result<(), SessionError> {
        self.send_commands(&[
            ControlMessage::BackOrScreenOn(KeyAction::Down),
            ControlMessage::BackOrScreenOn(KeyAction::Up),
        ])
        .await
    }

    pub async fn press_home(&self) -> Result<(), SessionError> {
        self.press_key(AndroidKeyCode::AndroidHome).await
    }

    pub async fn press_app_switch(&self) -> Result<(), SessionError> {
        self.press_key(AndroidKeyCode::AndroidAppSwitch).await
    }

    async fn press_key(&self, keycode: AndroidKeyCode) -> Result<(), SessionError> {
        self.send_commands(&[
            ControlMessage::InjectKeycode(DeviceKeyMessage::shortcut(KeyAction::Down, keycode)),
            ControlMessage::InjectKeycode(DeviceKeyMessage::shortcut(KeyAction::Up, keycode)),
        ])
        .await
    }

    async fn send_commands(&self, messages: &[ControlMessage]) -> Result<(), SessionError> {
        let control = self.streaming_control().ok_or(SessionError::NotStreaming)?;
        for message in messages {
            control.send(message).await?;
        }
        Ok(())
    }
}

/// Sends one input message, logging rather than returning failures.
async fn send_input(control: &dyn ControlChannel, message: ControlMessage) {
    if let Err(e) = control.send(&message).await {
        warn!(kind = ?message.message_type(), error = %e, "input message dropped");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
