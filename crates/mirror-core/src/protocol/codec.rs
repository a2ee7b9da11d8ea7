//! Binary codec for control messages.
//!
//! Wire format: one type byte followed by a fixed-size body.  All
//! multi-byte integers are big-endian.
//!
//! ```text
//! InjectKeycode      [0][action:1][keycode:4][repeat:4][meta_state:4]
//! InjectTouch        [2][action:1][pointer_id:8][position:12][pressure:2][action_button:4][buttons:4]
//! InjectScroll       [3][position:12][hscroll:2][vscroll:2][buttons:4]
//! BackOrScreenOn     [4][action:1]
//! SetScreenPowerMode [10][mode:1]
//!
//! position = [x:i32][y:i32][screen_width:u16][screen_height:u16]
//! ```
//!
//! Pressure is an unsigned 16-bit fixed-point fraction; scroll amounts are
//! signed 16-bit fixed-point fractions of 16 notches.

use crate::keymap::android::AndroidKeyCode;
use crate::protocol::messages::{
    ControlMessage, ControlMessageType, DeviceKeyMessage, DeviceScrollMessage,
    DeviceTouchMessage, KeyAction, MotionAction, MotionButtons, PointerId, ScreenPosition,
    ScreenPowerMode, INJECT_KEYCODE_SIZE, INJECT_SCROLL_SIZE, INJECT_TOUCH_SIZE,
    SHORT_MESSAGE_SIZE,
};
use thiserror::Error;

/// Errors that can occur while decoding control messages or video framing.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The byte slice is shorter than the minimum required length.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The message type byte is not a recognized value.
    #[error("unknown message type: {0}")]
    UnknownMessageType(u8),

    /// A field value is out of range.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// A video packet declares a payload larger than the accepted maximum.
    #[error("packet too large: {declared} bytes exceeds limit of {limit}")]
    PacketTooLarge { declared: usize, limit: usize },

    /// The video stream announced a codec id this client does not know.
    #[error("unknown codec id: 0x{0:08X}")]
    UnknownCodec(u32),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a [`ControlMessage`] into its wire representation.
///
/// # Examples
///
/// ```rust
/// use mirror_core::protocol::codec::encode_control_message;
/// use mirror_core::protocol::messages::{ControlMessage, ScreenPowerMode};
///
/// let bytes = encode_control_message(&ControlMessage::SetScreenPowerMode(ScreenPowerMode::Normal));
/// assert_eq!(bytes, vec![10, 2]);
/// ```
pub fn encode_control_message(msg: &ControlMessage) -> Vec<u8> {
    let mut buf = Vec::with_capacity(msg.encoded_len());
    buf.push(msg.message_type() as u8);

    match msg {
        ControlMessage::InjectKeycode(m) => encode_keycode(&mut buf, m),
        ControlMessage::InjectTouch(m) => encode_touch(&mut buf, m),
        ControlMessage::InjectScroll(m) => encode_scroll(&mut buf, m),
        ControlMessage::BackOrScreenOn(action) => buf.push(*action as u8),
        ControlMessage::SetScreenPowerMode(mode) => buf.push(*mode as u8),
    }

    buf
}

/// Decodes one [`ControlMessage`] from the beginning of `bytes`.
///
/// Returns the message and the number of bytes consumed.  Fixed-point fields
/// decode to the nearest representable value, so floats do not round-trip
/// exactly.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the bytes are truncated or malformed.
pub fn decode_control_message(bytes: &[u8]) -> Result<(ControlMessage, usize), ProtocolError> {
    require_len(bytes, 1)?;
    let type_byte = bytes[0];
    let msg_type = ControlMessageType::try_from(type_byte)
        .map_err(|_| ProtocolError::UnknownMessageType(type_byte))?;

    let msg = match msg_type {
        ControlMessageType::InjectKeycode => {
            require_len(bytes, INJECT_KEYCODE_SIZE)?;
            ControlMessage::InjectKeycode(decode_keycode(bytes)?)
        }
        ControlMessageType::InjectTouch => {
            require_len(bytes, INJECT_TOUCH_SIZE)?;
            ControlMessage::InjectTouch(decode_touch(bytes)?)
        }
        ControlMessageType::InjectScroll => {
            require_len(bytes, INJECT_SCROLL_SIZE)?;
            ControlMessage::InjectScroll(decode_scroll(bytes))
        }
        ControlMessageType::BackOrScreenOn => {
            require_len(bytes, SHORT_MESSAGE_SIZE)?;
            let action = KeyAction::try_from(bytes[1]).map_err(|_| {
                ProtocolError::MalformedPayload(format!("unknown key action: {}", bytes[1]))
            })?;
            ControlMessage::BackOrScreenOn(action)
        }
        ControlMessageType::SetScreenPowerMode => {
            require_len(bytes, SHORT_MESSAGE_SIZE)?;
            let mode = ScreenPowerMode::try_from(bytes[1]).map_err(|_| {
                ProtocolError::MalformedPayload(format!("unknown power mode: {}", bytes[1]))
            })?;
            ControlMessage::SetScreenPowerMode(mode)
        }
    };

    let consumed = msg.encoded_len();
    Ok((msg, consumed))
}

/// Converts a pressure in `[0, 1]` to unsigned 16-bit fixed point.
///
/// `1.0` saturates to `0xFFFF`; NaN becomes 0.
pub fn pressure_to_fixed(pressure: f32) -> u16 {
    let p = if pressure.is_nan() { 0.0 } else { pressure.clamp(0.0, 1.0) };
    // `as` saturates, so 65536.0 lands on 0xFFFF.
    (f64::from(p) * 65536.0).floor() as u16
}

/// Converts a scroll amount in notches to signed 16-bit fixed point.
///
/// The server accepts at most 16 notches per message; larger amounts are
/// clamped.
pub fn scroll_to_fixed(notches: f32) -> i16 {
    let v = if notches.is_nan() { 0.0 } else { (notches / 16.0).clamp(-1.0, 1.0) };
    let scaled = (f64::from(v) * 32768.0).trunc();
    scaled.min(f64::from(i16::MAX)) as i16
}

// ── Encoding ──────────────────────────────────────────────────────────────────

fn encode_keycode(buf: &mut Vec<u8>, m: &DeviceKeyMessage) {
    buf.push(m.action as u8);
    buf.extend_from_slice(&m.keycode.code().to_be_bytes());
    buf.extend_from_slice(&m.repeat.to_be_bytes());
    buf.extend_from_slice(&m.meta_state.to_be_bytes());
}

fn encode_touch(buf: &mut Vec<u8>, m: &DeviceTouchMessage) {
    buf.push(m.action as u8);
    buf.extend_from_slice(&m.pointer_id.0.to_be_bytes());
    encode_position(buf, &m.position);
    buf.extend_from_slice(&pressure_to_fixed(m.pressure).to_be_bytes());
    buf.extend_from_slice(&m.action_button.bits().to_be_bytes());
    buf.extend_from_slice(&m.buttons.bits().to_be_bytes());
}

fn encode_scroll(buf: &mut Vec<u8>, m: &DeviceScrollMessage) {
    encode_position(buf, &m.position);
    buf.extend_from_slice(&scroll_to_fixed(m.horizontal).to_be_bytes());
    buf.extend_from_slice(&scroll_to_fixed(m.vertical).to_be_bytes());
    buf.extend_from_slice(&m.buttons.bits().to_be_bytes());
}

fn encode_position(buf: &mut Vec<u8>, p: &ScreenPosition) {
    buf.extend_from_slice(&p.x.to_be_bytes());
    buf.extend_from_slice(&p.y.to_be_bytes());
    buf.extend_from_slice(&p.screen_width.to_be_bytes());
    buf.extend_from_slice(&p.screen_height.to_be_bytes());
}

// ── Decoding ──────────────────────────────────────────────────────────────────

fn decode_keycode(p: &[u8]) -> Result<DeviceKeyMessage, ProtocolError> {
    let action = KeyAction::try_from(p[1])
        .map_err(|_| ProtocolError::MalformedPayload(format!("unknown key action: {}", p[1])))?;
    let raw_code = read_u32(p, 2);
    let keycode = AndroidKeyCode::try_from(raw_code)
        .map_err(|_| ProtocolError::MalformedPayload(format!("unknown key code: {raw_code}")))?;
    Ok(DeviceKeyMessage {
        action,
        keycode,
        repeat: read_u32(p, 6),
        meta_state: read_u32(p, 10),
    })
}

fn decode_touch(p: &[u8]) -> Result<DeviceTouchMessage, ProtocolError> {
    let action = MotionAction::try_from(p[1])
        .map_err(|_| ProtocolError::MalformedPayload(format!("unknown motion action: {}", p[1])))?;
    let mut id = [0u8; 8];
    id.copy_from_slice(&p[2..10]);
    Ok(DeviceTouchMessage {
        action,
        pointer_id: PointerId(u64::from_be_bytes(id)),
        position: decode_position(p, 10),
        pressure: f32::from(read_u16(p, 22)) / 65536.0,
        action_button: MotionButtons(read_u32(p, 24)),
        buttons: MotionButtons(read_u32(p, 28)),
    })
}

fn decode_scroll(p: &[u8]) -> DeviceScrollMessage {
    let fixed_to_notches = |v: u16| f32::from(v as i16) / 32768.0 * 16.0;
    DeviceScrollMessage {
        position: decode_position(p, 1),
        horizontal: fixed_to_notches(read_u16(p, 13)),
        vertical: fixed_to_notches(read_u16(p, 15)),
        buttons: MotionButtons(read_u32(p, 17)),
    }
}

fn decode_position(p: &[u8], offset: usize) -> ScreenPosition {
    ScreenPosition {
        x: read_u32(p, offset) as i32,
        y: read_u32(p, offset + 4) as i32,
        screen_width: read_u16(p, offset + 8),
        screen_height: read_u16(p, offset + 10),
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Callers must have checked the length with [`require_len`].
fn read_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

/// Callers must have checked the length with [`require_len`].
fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

pub(crate) fn require_len(buf: &[u8], needed: usize) -> Result<(), ProtocolError> {
    if buf.len() < needed {
        Err(ProtocolError::InsufficientData {
            needed,
            available: buf.len(),
        })
    } else {
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
