//! # mirror-core
//!
//! Shared library for the device screen mirror: input event types, the
//! host → device coordinate mapper, the control-message codec, video stream
//! framing and codec configuration parsing.
//!
//! It has zero dependencies on OS APIs, async runtimes, UI frameworks, or
//! network sockets.
//!
//! # Architecture overview (for beginners)
//!
//! A mirroring server runs on the device.  It streams the device screen as
//! compressed video over one socket and accepts input-injection messages on
//! a second socket.  The host application shows the video and turns its own
//! mouse, touch and keyboard events into device touch, scroll and key
//! events.
//!
//! This crate (`mirror-core`) is the shared foundation.  It defines:
//!
//! - **`domain`** – The mirror surface (`DeviceFrame`), device rotation and
//!   the pure function that maps a host pixel to a device pixel.
//!
//! - **`protocol`** – How bytes travel over the two sockets: control
//!   messages encoded into Android's input vocabulary, and the video
//!   stream's metadata and packet headers.
//!
//! - **`video`** – Parsing H.264 / H.265 parameter sets out of configuration
//!   packets to learn the displayed picture size.
//!
//! - **`keymap`** – Translation from DOM key codes to Android key codes.

pub mod domain;
pub mod keymap;
pub mod protocol;
pub mod video;

// Re-export the most-used types at the crate root so callers can write
// `mirror_core::DeviceFrame` instead of `mirror_core::domain::frame::DeviceFrame`.
pub use domain::frame::{to_device_space, DeviceFrame, DevicePoint, DeviceSize, Rotation, SurfaceRect};
pub use domain::input::{KeyDirection, KeyboardEvent, PointerEvent, PointerKind, PointerPhase, WheelEvent};
pub use keymap::android::{dom_code_to_android, AndroidKeyCode};
pub use protocol::codec::{decode_control_message, encode_control_message, ProtocolError};
pub use protocol::messages::ControlMessage;
pub use protocol::options::ServerOptions;
pub use protocol::video::{VideoCodec, VideoFrame, VideoPacket, VideoStreamMetadata};
pub use video::{parse_configuration, ConfigurationError, VideoConfiguration};
