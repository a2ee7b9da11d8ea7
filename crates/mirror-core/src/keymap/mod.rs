//! Key code translation for keyboard input injection.
//!
//! Host keys are identified by DOM `KeyboardEvent.code`; the device expects
//! Android key codes.

pub mod android;

pub use android::{dom_code_to_android, AndroidKeyCode};
