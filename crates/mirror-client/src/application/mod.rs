//! Application layer use cases for the mirror client.
//!
//! # What use cases does the client have?
//!
//! - **`gesture`** – Turns host pointer and wheel events into device touch
//!   and scroll messages, tracking each pointer identity so the device always
//!   sees a well-formed down/move/up or hover sequence.
//!
//! - **`demux`** – Splits the video packet stream into configuration records
//!   (parsed for the picture size) and frames (forwarded to the decoder),
//!   reporting keyframe intervals along the way.
//!
//! - **`session`** – The session controller.  Opens the device through an
//!   injected `DeviceDiscovery`, drives the video read loop, routes input to
//!   the control channel and tears everything down again.
//!
//! Every collaborator (transport, decoder, rendering surface) is a trait
//! defined here and implemented in the infrastructure layer.

pub mod demux;
pub mod gesture;
pub mod session;
