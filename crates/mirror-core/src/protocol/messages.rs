//! Control message types sent from the host to the mirroring server.
//!
//! Every control message starts with a one-byte type code followed by a
//! fixed-size body.  The numeric constants (motion actions, button bits, key
//! actions, power modes) are Android's own values: the server hands them to
//! the input subsystem unchanged.

use crate::keymap::android::AndroidKeyCode;
use serde::{Deserialize, Serialize};

// ── Message sizes ─────────────────────────────────────────────────────────────

/// Encoded size of an inject-keycode message, type byte included.
pub const INJECT_KEYCODE_SIZE: usize = 14;

/// Encoded size of an inject-touch message, type byte included.
pub const INJECT_TOUCH_SIZE: usize = 32;

/// Encoded size of an inject-scroll message, type byte included.
pub const INJECT_SCROLL_SIZE: usize = 21;

/// Encoded size of the one-argument messages (back-or-screen-on, power mode).
pub const SHORT_MESSAGE_SIZE: usize = 2;

/// Android `KeyEvent.META_NUM_LOCK_ON`.
pub const META_NUM_LOCK_ON: u32 = 0x0020_0000;

// ── Message type codes ────────────────────────────────────────────────────────

/// Control message type codes understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ControlMessageType {
    InjectKeycode = 0,
    InjectTouch = 2,
    InjectScroll = 3,
    BackOrScreenOn = 4,
    SetScreenPowerMode = 10,
}

impl TryFrom<u8> for ControlMessageType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0 => Ok(ControlMessageType::InjectKeycode),
            2 => Ok(ControlMessageType::InjectTouch),
            3 => Ok(ControlMessageType::InjectScroll),
            4 => Ok(ControlMessageType::BackOrScreenOn),
            10 => Ok(ControlMessageType::SetScreenPowerMode),
            _ => Err(()),
        }
    }
}

// ── Motion events ─────────────────────────────────────────────────────────────

/// Android `MotionEvent` action codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MotionAction {
    Down = 0,
    Up = 1,
    Move = 2,
    Cancel = 3,
    HoverMove = 7,
    HoverEnter = 9,
    HoverExit = 10,
}

impl TryFrom<u8> for MotionAction {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0 => Ok(MotionAction::Down),
            1 => Ok(MotionAction::Up),
            2 => Ok(MotionAction::Move),
            3 => Ok(MotionAction::Cancel),
            7 => Ok(MotionAction::HoverMove),
            9 => Ok(MotionAction::HoverEnter),
            10 => Ok(MotionAction::HoverExit),
            _ => Err(()),
        }
    }
}

/// Android `MotionEvent` button state bits.
///
/// Used both for the single "action button" that changed and for the full
/// mask of held buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MotionButtons(pub u32);

impl MotionButtons {
    pub const NONE: MotionButtons = MotionButtons(0);
    pub const PRIMARY: MotionButtons = MotionButtons(1);
    pub const SECONDARY: MotionButtons = MotionButtons(1 << 1);
    pub const TERTIARY: MotionButtons = MotionButtons(1 << 2);
    pub const BACK: MotionButtons = MotionButtons(1 << 3);
    pub const FORWARD: MotionButtons = MotionButtons(1 << 4);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Pointer identity as seen by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointerId(pub u64);

impl PointerId {
    /// Reserved id the server treats as a real mouse.
    pub const MOUSE: PointerId = PointerId(-1i64 as u64);
    /// Reserved id for a generic finger; used for all host mouse input.
    pub const FINGER: PointerId = PointerId(-2i64 as u64);
    /// Reserved id for the server's virtual second finger (pinch-to-zoom).
    pub const VIRTUAL_FINGER: PointerId = PointerId(-3i64 as u64);

    /// Widens a host touch identifier, sign-extending negative ids.
    pub fn from_touch(id: i32) -> Self {
        PointerId(i64::from(id) as u64)
    }
}

/// A device-space position together with the screen size it refers to.
///
/// The server drops events whose screen size no longer matches the current
/// video size, which protects against injecting stale coordinates across a
/// rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScreenPosition {
    pub x: i32,
    pub y: i32,
    pub screen_width: u16,
    pub screen_height: u16,
}

/// An inject-touch message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceTouchMessage {
    pub action: MotionAction,
    pub pointer_id: PointerId,
    pub position: ScreenPosition,
    /// Pressure in `[0, 1]`.
    pub pressure: f32,
    pub action_button: MotionButtons,
    pub buttons: MotionButtons,
}

/// An inject-scroll message.
///
/// `horizontal` and `vertical` are in "notches": one notch per 100 host
/// pixels, positive meaning left/up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceScrollMessage {
    pub position: ScreenPosition,
    pub horizontal: f32,
    pub vertical: f32,
    pub buttons: MotionButtons,
}

// ── Key events ────────────────────────────────────────────────────────────────

/// Android `KeyEvent` action codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum KeyAction {
    Down = 0,
    Up = 1,
}

impl TryFrom<u8> for KeyAction {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0 => Ok(KeyAction::Down),
            1 => Ok(KeyAction::Up),
            _ => Err(()),
        }
    }
}

/// An inject-keycode message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceKeyMessage {
    pub action: KeyAction,
    pub keycode: AndroidKeyCode,
    pub repeat: u32,
    pub meta_state: u32,
}

impl DeviceKeyMessage {
    /// A key message as produced by the host keyboard: no repeat, num lock on.
    pub fn keyboard(action: KeyAction, keycode: AndroidKeyCode) -> Self {
        Self {
            action,
            keycode,
            repeat: 0,
            meta_state: META_NUM_LOCK_ON,
        }
    }

    /// A key message for a navigation shortcut: no repeat, no meta state.
    pub fn shortcut(action: KeyAction, keycode: AndroidKeyCode) -> Self {
        Self {
            action,
            keycode,
            repeat: 0,
            meta_state: 0,
        }
    }
}

// ── Power ─────────────────────────────────────────────────────────────────────

/// Display power modes accepted by `SetScreenPowerMode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ScreenPowerMode {
    Off = 0,
    Normal = 2,
}

impl TryFrom<u8> for ScreenPowerMode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0 => Ok(ScreenPowerMode::Off),
            2 => Ok(ScreenPowerMode::Normal),
            _ => Err(()),
        }
    }
}

// ── Top-level message enum ────────────────────────────────────────────────────

/// Every control message the host can send.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ControlMessage {
    InjectKeycode(DeviceKeyMessage),
    InjectTouch(DeviceTouchMessage),
    InjectScroll(DeviceScrollMessage),
    /// Presses BACK when the screen is on, turns the screen on otherwise.
    BackOrScreenOn(KeyAction),
    SetScreenPowerMode(ScreenPowerMode),
}

impl ControlMessage {
    /// Returns the type code of this message.
    pub fn message_type(&self) -> ControlMessageType {
        match self {
            ControlMessage::InjectKeycode(_) => ControlMessageType::InjectKeycode,
            ControlMessage::InjectTouch(_) => ControlMessageType::InjectTouch,
            ControlMessage::InjectScroll(_) => ControlMessageType::InjectScroll,
            ControlMessage::BackOrScreenOn(_) => ControlMessageType::BackOrScreenOn,
            ControlMessage::SetScreenPowerMode(_) => ControlMessageType::SetScreenPowerMode,
        }
    }

    /// Returns the encoded size of this message in bytes.
    pub fn encoded_len(&self) -> usize {
        match self {
            ControlMessage::InjectKeycode(_) => INJECT_KEYCODE_SIZE,
            ControlMessage::InjectTouch(_) => INJECT_TOUCH_SIZE,
            ControlMessage::InjectScroll(_) => INJECT_SCROLL_SIZE,
            ControlMessage::BackOrScreenOn(_) | ControlMessage::SetScreenPowerMode(_) => {
                SHORT_MESSAGE_SIZE
            }
        }
    }
}

impl From<DeviceTouchMessage> for ControlMessage {
    fn from(m: DeviceTouchMessage) -> Self {
        ControlMessage::InjectTouch(m)
    }
}

impl From<DeviceKeyMessage> for ControlMessage {
    fn from(m: DeviceKeyMessage) -> Self {
        ControlMessage::InjectKeycode(m)
    }
}

impl From<DeviceScrollMessage> for ControlMessage {
    fn from(m: DeviceScrollMessage) -> Self {
        ControlMessage::InjectScroll(m)
    }
}
