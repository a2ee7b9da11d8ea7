//! Host input events as delivered by the rendering surface.
//!
//! These mirror the fields of DOM `PointerEvent`, `WheelEvent` and
//! `KeyboardEvent` that the mirror needs.  Positions are in host pixels.

use serde::{Deserialize, Serialize};

/// The kind of device that produced a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    Mouse,
    Pen,
    Touch,
}

/// Lifecycle phase of a host pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
    Leave,
}

/// A single host pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Host pointer identity, stable for the lifetime of one contact.
    pub pointer_id: i32,
    pub kind: PointerKind,
    pub client_x: f64,
    pub client_y: f64,
    /// Normalised pressure in `[0, 1]`.
    pub pressure: f32,
    /// Index of the button whose state changed (`-1` when none did).
    pub button: i16,
    /// Bit mask of the buttons currently held down.
    pub buttons: u32,
}

impl PointerEvent {
    /// A mouse event at `(x, y)` with the given button state.
    pub fn mouse(client_x: f64, client_y: f64, button: i16, buttons: u32) -> Self {
        Self {
            pointer_id: 1,
            kind: PointerKind::Mouse,
            client_x,
            client_y,
            pressure: if buttons == 0 { 0.0 } else { 0.5 },
            button,
            buttons,
        }
    }

    /// A touch contact event for finger `pointer_id`.
    pub fn touch(pointer_id: i32, client_x: f64, client_y: f64, pressure: f32) -> Self {
        Self {
            pointer_id,
            kind: PointerKind::Touch,
            client_x,
            client_y,
            pressure,
            button: 0,
            buttons: 1,
        }
    }
}

/// A host wheel event.  Deltas are in host pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelEvent {
    pub client_x: f64,
    pub client_y: f64,
    pub delta_x: f64,
    pub delta_y: f64,
}

/// Direction of a key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyDirection {
    Down,
    Up,
}

/// A host keyboard event, identified by its physical DOM `code`
/// (e.g. `"KeyA"`, `"ArrowLeft"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardEvent {
    pub code: String,
}

impl KeyboardEvent {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}
