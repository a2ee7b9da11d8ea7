//! Domain entities for the device mirror.
//!
//! Pure data and pure functions: no sockets, no async runtime, no UI.
//!
//! - [`frame`] – the on-screen mirror surface and the host → device
//!   coordinate mapper.
//! - [`input`] – host pointer, wheel and keyboard events.

pub mod frame;
pub mod input;
