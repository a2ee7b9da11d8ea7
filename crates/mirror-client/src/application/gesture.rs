//! GestureSynthesizer: turns host pointer events into device touch messages.
//!
//! Android expects every pointer identity to follow a well-formed sequence:
//! `Down → Move* → Up` for a contact, or `HoverMove* → HoverExit` for a
//! pointer that floats above the screen without pressing.  Host pointer
//! events do not guarantee this (a mouse can move with no button held, a
//! pointer can leave the surface mid-drag, a button can be released outside
//! the surface), so the synthesizer tracks each identity and inserts the
//! bridging action whenever the raw event would otherwise break the
//! sequence.
//!
//! # Per-identity state machine
//!
//! ```text
//!             down / move+buttons
//!   Absent ─────────────────────────▶ Down
//!     │  ▲                             │ ▲
//!     │  │ up, cancel, leave           │ │ move+buttons
//!     │  └─────────────────────────────┘ │ (bridging Down)
//!     │ move (no buttons)                │
//!     ▼                                  │
//!   Hovering ────────────────────────────┘
//! ```
//!
//! Wheel input does not touch this state; see [`scroll_message`].

use std::collections::HashMap;

use mirror_core::{
    domain::{
        frame::{to_device_space, DeviceFrame, DeviceSize},
        input::{PointerEvent, PointerKind, PointerPhase, WheelEvent},
    },
    protocol::messages::{
        DeviceScrollMessage, DeviceTouchMessage, MotionAction, MotionButtons, PointerId,
        ScreenPosition,
    },
};

/// DOM `PointerEvent.button` index → Android button.
///
/// DOM numbers the middle button 1 and the right button 2; Android uses
/// the opposite bit order, hence the swap.
pub const BUTTON_TABLE: [MotionButtons; 5] = [
    MotionButtons::PRIMARY,
    MotionButtons::TERTIARY,
    MotionButtons::SECONDARY,
    MotionButtons::BACK,
    MotionButtons::FORWARD,
];

/// Host pixels per scroll notch.
const WHEEL_PIXELS_PER_NOTCH: f64 = 100.0;

/// Maps a DOM button index to the Android action button.
///
/// Out-of-range indices (including `-1`, "no button changed") map to
/// [`MotionButtons::NONE`].
pub fn action_button(button: i16) -> MotionButtons {
    usize::try_from(button)
        .ok()
        .and_then(|i| BUTTON_TABLE.get(i).copied())
        .unwrap_or(MotionButtons::NONE)
}

/// Returns the device pointer identity for a host pointer.
///
/// All mouse input shares the reserved finger id: injecting it as a real
/// mouse makes some Android 13 builds hit-test against the wrong window.
pub fn device_pointer_id(event: &PointerEvent) -> PointerId {
    match event.kind {
        PointerKind::Mouse => PointerId::FINGER,
        PointerKind::Pen | PointerKind::Touch => PointerId::from_touch(event.pointer_id),
    }
}

/// Builds the screen position for a host position under `frame`.
pub fn screen_position(client_x: f64, client_y: f64, frame: &DeviceFrame) -> ScreenPosition {
    let point = to_device_space(client_x, client_y, frame);
    let DeviceSize { width, height } = frame.resolution;
    ScreenPosition {
        x: point.x as i32,
        y: point.y as i32,
        screen_width: u16::try_from(width).unwrap_or(u16::MAX),
        screen_height: u16::try_from(height).unwrap_or(u16::MAX),
    }
}

/// Builds the scroll message for a wheel event.
///
/// Deltas are negated: a positive DOM `deltaY` scrolls the page down, which
/// on Android is a negative vertical scroll.
pub fn scroll_message(event: &WheelEvent, frame: &DeviceFrame) -> DeviceScrollMessage {
    DeviceScrollMessage {
        position: screen_position(event.client_x, event.client_y, frame),
        horizontal: (-event.delta_x / WHEEL_PIXELS_PER_NOTCH) as f32,
        vertical: (-event.delta_y / WHEEL_PIXELS_PER_NOTCH) as f32,
        buttons: MotionButtons::NONE,
    }
}

// ── Pointer state ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Contact {
    Down,
    Hovering,
}

/// Last known state of one active pointer identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerState {
    contact: Contact,
    pub position: ScreenPosition,
    pub pressure: f32,
    pub buttons: MotionButtons,
}

impl PointerState {
    pub fn is_down(&self) -> bool {
        self.contact == Contact::Down
    }

    pub fn is_hovering(&self) -> bool {
        self.contact == Contact::Hovering
    }
}

/// Converts host pointer events into well-formed device touch sequences.
///
/// One synthesizer belongs to one streaming session; it is rebuilt whenever
/// a new stream starts.
#[derive(Debug, Default)]
pub struct GestureSynthesizer {
    pointers: HashMap<PointerId, PointerState>,
}

impl GestureSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pointer identities currently down or hovering.
    pub fn active_pointers(&self) -> usize {
        self.pointers.len()
    }

    /// Returns the tracked state of `id`, if it is active.
    pub fn pointer(&self, id: PointerId) -> Option<&PointerState> {
        self.pointers.get(&id)
    }

    /// Forgets every tracked pointer.
    pub fn reset(&mut self) {
        self.pointers.clear();
    }

    /// Processes one host pointer event and returns the device messages to
    /// send, in order.
    ///
    /// Returns zero messages for events that have nothing to retire (for
    /// example `Up` on an identity that never went down).
    pub fn process(
        &mut self,
        phase: PointerPhase,
        event: &PointerEvent,
        frame: &DeviceFrame,
    ) -> Vec<DeviceTouchMessage> {
        let id = device_pointer_id(event);
        let position = screen_position(event.client_x, event.client_y, frame);
        let buttons = MotionButtons(event.buttons);
        let message = |action: MotionAction| DeviceTouchMessage {
            action,
            pointer_id: id,
            position,
            pressure: event.pressure,
            action_button: action_button(event.button),
            buttons,
        };

        let previous = self.pointers.get(&id).map(|p| p.contact);
        let mut out = Vec::with_capacity(2);

        match phase {
            PointerPhase::Down => {
                if previous == Some(Contact::Down) {
                    out.push(message(MotionAction::Up));
                }
                out.push(message(MotionAction::Down));
                self.track(id, Contact::Down, position, event.pressure, buttons);
            }
            PointerPhase::Move if buttons.is_empty() => {
                if previous == Some(Contact::Down) {
                    out.push(message(MotionAction::Up));
                }
                out.push(message(MotionAction::HoverMove));
                self.track(id, Contact::Hovering, position, event.pressure, buttons);
            }
            PointerPhase::Move => {
                if previous != Some(Contact::Down) {
                    out.push(message(MotionAction::Down));
                }
                out.push(message(MotionAction::Move));
                self.track(id, Contact::Down, position, event.pressure, buttons);
            }
            PointerPhase::Up | PointerPhase::Cancel => {
                match previous {
                    Some(Contact::Down) => out.push(message(MotionAction::Up)),
                    Some(Contact::Hovering) => out.push(message(MotionAction::HoverExit)),
                    None => {}
                }
                self.pointers.remove(&id);
            }
            PointerPhase::Leave => {
                if previous.is_some() {
                    out.push(message(MotionAction::HoverExit));
                    out.push(message(MotionAction::Up));
                }
                self.pointers.remove(&id);
            }
        }

        out
    }

    fn track(
        &mut self,
        id: PointerId,
        contact: Contact,
        position: ScreenPosition,
        pressure: f32,
        buttons: MotionButtons,
    ) {
        self.pointers.insert(
            id,
            PointerState {
                contact,
                position,
                pressure,
                buttons,
            },
        );
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_core::domain::frame::{Rotation, SurfaceRect};

    fn frame() -> DeviceFrame {
        DeviceFrame {
            bounds: Some(SurfaceRect::new(0.0, 0.0, 100.0, 200.0)),
            rotation: Rotation::Deg0,
            resolution: DeviceSize::new(1000, 2000),
        }
    }

    fn actions(messages: &[DeviceTouchMessage]) -> Vec<MotionAction> {
        messages.iter().map(|m| m.action).collect()
    }

    fn mouse(x: f64, y: f64, buttons: u32) -> PointerEvent {
        PointerEvent::mouse(x, y, 0, buttons)
    }

    #[test]
    fn test_down_move_up_emits_three_messages() {
        // Arrange
        let mut synth = GestureSynthesizer::new();
        let f = frame();

        // Act
        let mut all = synth.process(PointerPhase::Down, &mouse(10.0, 10.0, 1), &f);
        all.extend(synth.process(PointerPhase::Move, &mouse(20.0, 20.0, 1), &f));
        all.extend(synth.process(PointerPhase::Up, &mouse(20.0, 20.0, 0), &f));

        // Assert
        assert_eq!(
            actions(&all),
            vec![MotionAction::Down, MotionAction::Move, MotionAction::Up]
        );
        assert_eq!(synth.active_pointers(), 0);
    }

    #[test]
    fn test_down_move_leave_emits_hover_exit_then_up() {
        let mut synth = GestureSynthesizer::new();
        let f = frame();

        let mut all = synth.process(PointerPhase::Down, &mouse(10.0, 10.0, 1), &f);
        all.extend(synth.process(PointerPhase::Move, &mouse(50.0, 50.0, 1), &f));
        all.extend(synth.process(PointerPhase::Leave, &mouse(100.0, 50.0, 1), &f));

        assert_eq!(
            actions(&all),
            vec![
                MotionAction::Down,
                MotionAction::Move,
                MotionAction::HoverExit,
                MotionAction::Up
            ]
        );
        assert_eq!(synth.active_pointers(), 0);
    }

    #[test]
    fn test_message_fields_are_mapped() {
        let mut synth = GestureSynthesizer::new();
        let event = PointerEvent {
            pointer_id: 9,
            kind: PointerKind::Mouse,
            client_x: 50.0,
            client_y: 50.0,
            pressure: 0.5,
            button: 2,
            buttons: 2,
        };

        let messages = synth.process(PointerPhase::Down, &event, &frame());

        assert_eq!(messages.len(), 1);
        let m = messages[0];
        assert_eq!(m.pointer_id, PointerId::FINGER);
        assert_eq!((m.position.x, m.position.y), (500, 500));
        assert_eq!((m.position.screen_width, m.position.screen_height), (1000, 2000));
        assert_eq!(m.action_button, MotionButtons::SECONDARY);
        assert_eq!(m.buttons, MotionButtons(2));
        assert_eq!(m.pressure, 0.5);
    }

    #[test]
    fn test_hover_moves_without_contact() {
        let mut synth = GestureSynthesizer::new();
        let f = frame();

        let first = synth.process(PointerPhase::Move, &mouse(10.0, 10.0, 0), &f);
        let second = synth.process(PointerPhase::Move, &mouse(11.0, 10.0, 0), &f);

        assert_eq!(actions(&first), vec![MotionAction::HoverMove]);
        assert_eq!(actions(&second), vec![MotionAction::HoverMove]);
        assert!(synth.pointer(PointerId::FINGER).unwrap().is_hovering());
    }

    #[test]
    fn test_hover_to_press_needs_no_bridge() {
        let mut synth = GestureSynthesizer::new();
        let f = frame();
        synth.process(PointerPhase::Move, &mouse(10.0, 10.0, 0), &f);

        let messages = synth.process(PointerPhase::Down, &mouse(10.0, 10.0, 1), &f);

        assert_eq!(actions(&messages), vec![MotionAction::Down]);
        assert!(synth.pointer(PointerId::FINGER).unwrap().is_down());
    }

    #[test]
    fn test_buttons_released_outside_bridges_with_up() {
        // Arrange: pressed, then the button is released somewhere we never saw
        let mut synth = GestureSynthesizer::new();
        let f = frame();
        synth.process(PointerPhase::Down, &mouse(10.0, 10.0, 1), &f);

        // Act
        let messages = synth.process(PointerPhase::Move, &mouse(12.0, 10.0, 0), &f);

        // Assert
        assert_eq!(actions(&messages), vec![MotionAction::Up, MotionAction::HoverMove]);
    }

    #[test]
    fn test_buttons_pressed_outside_bridges_with_down() {
        let mut synth = GestureSynthesizer::new();
        let f = frame();

        let from_absent = synth.process(PointerPhase::Move, &mouse(10.0, 10.0, 1), &f);
        synth.reset();
        synth.process(PointerPhase::Move, &mouse(10.0, 10.0, 0), &f);
        let from_hover = synth.process(PointerPhase::Move, &mouse(10.0, 10.0, 1), &f);

        assert_eq!(actions(&from_absent), vec![MotionAction::Down, MotionAction::Move]);
        assert_eq!(actions(&from_hover), vec![MotionAction::Down, MotionAction::Move]);
    }

    #[test]
    fn test_repeated_down_closes_previous_contact() {
        let mut synth = GestureSynthesizer::new();
        let f = frame();
        synth.process(PointerPhase::Down, &mouse(10.0, 10.0, 1), &f);

        let messages = synth.process(PointerPhase::Down, &mouse(30.0, 10.0, 1), &f);

        assert_eq!(actions(&messages), vec![MotionAction::Up, MotionAction::Down]);
    }

    #[test]
    fn test_up_while_hovering_exits_hover() {
        let mut synth = GestureSynthesizer::new();
        let f = frame();
        synth.process(PointerPhase::Move, &mouse(10.0, 10.0, 0), &f);

        let messages = synth.process(PointerPhase::Up, &mouse(10.0, 10.0, 0), &f);

        assert_eq!(actions(&messages), vec![MotionAction::HoverExit]);
        assert_eq!(synth.active_pointers(), 0);
    }

    #[test]
    fn test_events_for_absent_pointer_emit_nothing() {
        let mut synth = GestureSynthesizer::new();
        let f = frame();

        assert!(synth.process(PointerPhase::Up, &mouse(1.0, 1.0, 0), &f).is_empty());
        assert!(synth.process(PointerPhase::Cancel, &mouse(1.0, 1.0, 0), &f).is_empty());
        assert!(synth.process(PointerPhase::Leave, &mouse(1.0, 1.0, 0), &f).is_empty());
    }

    #[test]
    fn test_cancel_behaves_like_up() {
        let mut synth = GestureSynthesizer::new();
        let f = frame();
        synth.process(PointerPhase::Down, &PointerEvent::touch(4, 5.0, 5.0, 1.0), &f);

        let messages = synth.process(PointerPhase::Cancel, &PointerEvent::touch(4, 5.0, 5.0, 0.0), &f);

        assert_eq!(actions(&messages), vec![MotionAction::Up]);
        assert_eq!(messages[0].pointer_id, PointerId(4));
    }

    #[test]
    fn test_touch_identities_do_not_interfere() {
        // Arrange
        let mut synth = GestureSynthesizer::new();
        let f = frame();
        let a = |x| PointerEvent::touch(1, x, 10.0, 0.5);
        let b = |x| PointerEvent::touch(2, x, 90.0, 0.5);

        // Act
        let a_down = synth.process(PointerPhase::Down, &a(10.0), &f);
        let b_down = synth.process(PointerPhase::Down, &b(10.0), &f);
        let a_up = synth.process(PointerPhase::Up, &a(10.0), &f);
        let b_move = synth.process(PointerPhase::Move, &b(20.0), &f);
        let b_up = synth.process(PointerPhase::Up, &b(20.0), &f);

        // Assert
        assert_eq!(actions(&a_down), vec![MotionAction::Down]);
        assert_eq!(actions(&b_down), vec![MotionAction::Down]);
        assert_eq!(actions(&a_up), vec![MotionAction::Up]);
        assert_eq!(a_up[0].pointer_id, PointerId(1));
        assert_eq!(actions(&b_move), vec![MotionAction::Move]);
        assert_eq!(b_move[0].pointer_id, PointerId(2));
        assert_eq!(actions(&b_up), vec![MotionAction::Up]);
        assert_eq!(synth.active_pointers(), 0);
    }

    #[test]
    fn test_mouse_and_touch_use_distinct_identities() {
        let mut synth = GestureSynthesizer::new();
        let f = frame();
        synth.process(PointerPhase::Down, &mouse(10.0, 10.0, 1), &f);
        synth.process(PointerPhase::Down, &PointerEvent::touch(1, 10.0, 10.0, 1.0), &f);

        assert_eq!(synth.active_pointers(), 2);
        assert!(synth.pointer(PointerId::FINGER).is_some());
        assert!(synth.pointer(PointerId(1)).is_some());
    }

    #[test]
    fn test_action_button_table() {
        assert_eq!(action_button(0), MotionButtons::PRIMARY);
        assert_eq!(action_button(1), MotionButtons::TERTIARY);
        assert_eq!(action_button(2), MotionButtons::SECONDARY);
        assert_eq!(action_button(3), MotionButtons::BACK);
        assert_eq!(action_button(4), MotionButtons::FORWARD);
        assert_eq!(action_button(5), MotionButtons::NONE);
        assert_eq!(action_button(-1), MotionButtons::NONE);
    }

    #[test]
    fn test_unbound_frame_maps_to_origin() {
        let mut synth = GestureSynthesizer::new();
        let unbound = DeviceFrame::new(DeviceSize::new(1000, 2000));

        let messages = synth.process(PointerPhase::Down, &mouse(50.0, 50.0, 1), &unbound);

        assert_eq!((messages[0].position.x, messages[0].position.y), (0, 0));
    }

    #[test]
    fn test_scroll_message_normalises_deltas() {
        let wheel = WheelEvent {
            client_x: 50.0,
            client_y: 100.0,
            delta_x: -50.0,
            delta_y: 200.0,
        };

        let msg = scroll_message(&wheel, &frame());

        assert_eq!((msg.position.x, msg.position.y), (500, 1000));
        assert_eq!(msg.horizontal, 0.5);
        assert_eq!(msg.vertical, -2.0);
        assert_eq!(msg.buttons, MotionButtons::NONE);
    }

    #[test]
    fn test_large_resolution_saturates_screen_size() {
        let f = DeviceFrame {
            resolution: DeviceSize::new(70_000, 100),
            ..frame()
        };
        let pos = screen_position(0.0, 0.0, &f);
        assert_eq!(pos.screen_width, u16::MAX);
        assert_eq!(pos.screen_height, 100);
    }
}
