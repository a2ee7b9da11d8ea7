//! mirror-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does mirror-client do? (for beginners)
//!
//! A mirroring server runs on an Android device and is reachable over two
//! forwarded sockets: one streams the screen as H.264/H.265 video, the other
//! accepts input-injection messages.
//!
//! The client:
//!
//! 1. Opens both sockets and reads the stream metadata (codec, initial size).
//! 2. Waits for the first configuration record to learn the displayed
//!    resolution, then starts forwarding frames to a decoder.
//! 3. Maps host mouse, touch, wheel and keyboard events onto the device
//!    screen (honouring rotation) and sends them as control messages.
//! 4. Tears the session down cleanly on disconnect, device removal or a
//!    stream failure.

/// Application layer: gesture synthesis, demultiplexing, session control.
pub mod application;

/// Infrastructure layer: sockets, decoder sink, surface, config, test doubles.
pub mod infrastructure;

pub use application::session::{
    DeviceChange, DeviceInfo, SessionController, SessionError, SessionEvent, SessionState,
};
