//! Android key codes and the DOM `KeyboardEvent.code` → Android table.
//!
//! The host identifies keys by their physical position (`code`), not by the
//! character they produce, so the device applies its own keyboard layout.
//! Keys with no sensible Android counterpart (media keys, IME keys) are
//! left unmapped and dropped by the caller.
//!
//! Three pseudo-codes, `AndroidHome`, `AndroidBack` and `AndroidAppSwitch`,
//! are not produced by any physical keyboard; they let UI buttons travel
//! the same path as real keys.

use serde::{Deserialize, Serialize};

/// Android `KeyEvent` key codes used by the mirror.
///
/// Values are `android.view.KeyEvent.KEYCODE_*`.  Variant names follow the
/// DOM `code` they are mapped from, so `Backspace` is Android's `DEL` and
/// `Delete` is Android's `FORWARD_DEL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum AndroidKeyCode {
    AndroidHome = 3,
    AndroidBack = 4,
    Digit0 = 7,
    Digit1 = 8,
    Digit2 = 9,
    Digit3 = 10,
    Digit4 = 11,
    Digit5 = 12,
    Digit6 = 13,
    Digit7 = 14,
    Digit8 = 15,
    Digit9 = 16,
    ArrowUp = 19,
    ArrowDown = 20,
    ArrowLeft = 21,
    ArrowRight = 22,
    VolumeUp = 24,
    VolumeDown = 25,
    Power = 26,
    KeyA = 29,
    KeyB = 30,
    KeyC = 31,
    KeyD = 32,
    KeyE = 33,
    KeyF = 34,
    KeyG = 35,
    KeyH = 36,
    KeyI = 37,
    KeyJ = 38,
    KeyK = 39,
    KeyL = 40,
    KeyM = 41,
    KeyN = 42,
    KeyO = 43,
    KeyP = 44,
    KeyQ = 45,
    KeyR = 46,
    KeyS = 47,
    KeyT = 48,
    KeyU = 49,
    KeyV = 50,
    KeyW = 51,
    KeyX = 52,
    KeyY = 53,
    KeyZ = 54,
    Comma = 55,
    Period = 56,
    AltLeft = 57,
    AltRight = 58,
    ShiftLeft = 59,
    ShiftRight = 60,
    Tab = 61,
    Space = 62,
    Enter = 66,
    Backspace = 67,
    Backquote = 68,
    Minus = 69,
    Equal = 70,
    BracketLeft = 71,
    BracketRight = 72,
    Backslash = 73,
    Semicolon = 74,
    Quote = 75,
    Slash = 76,
    ContextMenu = 82,
    PageUp = 92,
    PageDown = 93,
    Escape = 111,
    Delete = 112,
    ControlLeft = 113,
    ControlRight = 114,
    CapsLock = 115,
    ScrollLock = 116,
    MetaLeft = 117,
    MetaRight = 118,
    PrintScreen = 120,
    Pause = 121,
    Home = 122,
    End = 123,
    Insert = 124,
    F1 = 131,
    F2 = 132,
    F3 = 133,
    F4 = 134,
    F5 = 135,
    F6 = 136,
    F7 = 137,
    F8 = 138,
    F9 = 139,
    F10 = 140,
    F11 = 141,
    F12 = 142,
    NumLock = 143,
    Numpad0 = 144,
    Numpad1 = 145,
    Numpad2 = 146,
    Numpad3 = 147,
    Numpad4 = 148,
    Numpad5 = 149,
    Numpad6 = 150,
    Numpad7 = 151,
    Numpad8 = 152,
    Numpad9 = 153,
    NumpadDivide = 154,
    NumpadMultiply = 155,
    NumpadSubtract = 156,
    NumpadAdd = 157,
    NumpadDecimal = 158,
    NumpadComma = 159,
    NumpadEnter = 160,
    NumpadEqual = 161,
    AndroidAppSwitch = 187,
}

impl TryFrom<u32> for AndroidKeyCode {
    type Error = ();

    fn try_from(value: u32) -> Result<Self, ()> {
        use AndroidKeyCode::*;
        match value {
            3 => Ok(AndroidHome),
            4 => Ok(AndroidBack),
            7 => Ok(Digit0),
            8 => Ok(Digit1),
            9 => Ok(Digit2),
            10 => Ok(Digit3),
            11 => Ok(Digit4),
            12 => Ok(Digit5),
            13 => Ok(Digit6),
            14 => Ok(Digit7),
            15 => Ok(Digit8),
            16 => Ok(Digit9),
            19 => Ok(ArrowUp),
            20 => Ok(ArrowDown),
            21 => Ok(ArrowLeft),
            22 => Ok(ArrowRight),
            24 => Ok(VolumeUp),
            25 => Ok(VolumeDown),
            26 => Ok(Power),
            29 => Ok(KeyA),
            30 => Ok(KeyB),
            31 => Ok(KeyC),
            32 => Ok(KeyD),
            33 => Ok(KeyE),
            34 => Ok(KeyF),
            35 => Ok(KeyG),
            36 => Ok(KeyH),
            37 => Ok(KeyI),
            38 => Ok(KeyJ),
            39 => Ok(KeyK),
            40 => Ok(KeyL),
            41 => Ok(KeyM),
            42 => Ok(KeyN),
            43 => Ok(KeyO),
            44 => Ok(KeyP),
            45 => Ok(KeyQ),
            46 => Ok(KeyR),
            47 => Ok(KeyS),
            48 => Ok(KeyT),
            49 => Ok(KeyU),
            50 => Ok(KeyV),
            51 => Ok(KeyW),
            52 => Ok(KeyX),
            53 => Ok(KeyY),
            54 => Ok(KeyZ),
            55 => Ok(Comma),
            56 => Ok(Period),
            57 => Ok(AltLeft),
            58 => Ok(AltRight),
            59 => Ok(ShiftLeft),
            60 => Ok(ShiftRight),
            61 => Ok(Tab),
            62 => Ok(Space),
            66 => Ok(Enter),
            67 => Ok(Backspace),
            68 => Ok(Backquote),
            69 => Ok(Minus),
            70 => Ok(Equal),
            71 => Ok(BracketLeft),
            72 => Ok(BracketRight),
            73 => Ok(Backslash),
            74 => Ok(Semicolon),
            75 => Ok(Quote),
            76 => Ok(Slash),
            82 => Ok(ContextMenu),
            92 => Ok(PageUp),
            93 => Ok(PageDown),
            111 => Ok(Escape),
            112 => Ok(Delete),
            113 => Ok(ControlLeft),
            114 => Ok(ControlRight),
            115 => Ok(CapsLock),
            116 => Ok(ScrollLock),
            117 => Ok(MetaLeft),
            118 => Ok(MetaRight),
            120 => Ok(PrintScreen),
            121 => Ok(Pause),
            122 => Ok(Home),
            123 => Ok(End),
            124 => Ok(Insert),
            131 => Ok(F1),
            132 => Ok(F2),
            133 => Ok(F3),
            134 => Ok(F4),
            135 => Ok(F5),
            136 => Ok(F6),
            137 => Ok(F7),
            138 => Ok(F8),
            139 => Ok(F9),
            140 => Ok(F10),
            141 => Ok(F11),
            142 => Ok(F12),
            143 => Ok(NumLock),
            144 => Ok(Numpad0),
            145 => Ok(Numpad1),
            146 => Ok(Numpad2),
            147 => Ok(Numpad3),
            148 => Ok(Numpad4),
            149 => Ok(Numpad5),
            150 => Ok(Numpad6),
            151 => Ok(Numpad7),
            152 => Ok(Numpad8),
            153 => Ok(Numpad9),
            154 => Ok(NumpadDivide),
            155 => Ok(NumpadMultiply),
            156 => Ok(NumpadSubtract),
            157 => Ok(NumpadAdd),
            158 => Ok(NumpadDecimal),
            159 => Ok(NumpadComma),
            160 => Ok(NumpadEnter),
            161 => Ok(NumpadEqual),
            187 => Ok(AndroidAppSwitch),
            _ => Err(()),
        }
    }
}

/// Translates a DOM `KeyboardEvent.code` string to an Android key code.
///
/// Returns `None` for codes with no Android equivalent.
///
/// # Examples
///
/// ```rust
/// use mirror_core::keymap::android::{dom_code_to_android, AndroidKeyCode};
///
/// assert_eq!(dom_code_to_android("KeyA"), Some(AndroidKeyCode::KeyA));
/// assert_eq!(dom_code_to_android("LaunchMail"), None);
/// ```
pub fn dom_code_to_android(code: &str) -> Option<AndroidKeyCode> {
    use AndroidKeyCode::*;
    let key = match code {
        "AndroidHome" => AndroidHome,
        "AndroidBack" => AndroidBack,
        "Digit0" => Digit0,
        "Digit1" => Digit1,
        "Digit2" => Digit2,
        "Digit3" => Digit3,
        "Digit4" => Digit4,
        "Digit5" => Digit5,
        "Digit6" => Digit6,
        "Digit7" => Digit7,
        "Digit8" => Digit8,
        "Digit9" => Digit9,
        "ArrowUp" => ArrowUp,
        "ArrowDown" => ArrowDown,
        "ArrowLeft" => ArrowLeft,
        "ArrowRight" => ArrowRight,
        "AudioVolumeUp" => VolumeUp,
        "AudioVolumeDown" => VolumeDown,
        "Power" => Power,
        "KeyA" => KeyA,
        "KeyB" => KeyB,
        "KeyC" => KeyC,
        "KeyD" => KeyD,
        "KeyE" => KeyE,
        "KeyF" => KeyF,
        "KeyG" => KeyG,
        "KeyH" => KeyH,
        "KeyI" => KeyI,
        "KeyJ" => KeyJ,
        "KeyK" => KeyK,
        "KeyL" => KeyL,
        "KeyM" => KeyM,
        "KeyN" => KeyN,
        "KeyO" => KeyO,
        "KeyP" => KeyP,
        "KeyQ" => KeyQ,
        "KeyR" => KeyR,
        "KeyS" => KeyS,
        "KeyT" => KeyT,
        "KeyU" => KeyU,
        "KeyV" => KeyV,
        "KeyW" => KeyW,
        "KeyX" => KeyX,
        "KeyY" => KeyY,
        "KeyZ" => KeyZ,
        "Comma" => Comma,
        "Period" => Period,
        "AltLeft" => AltLeft,
        "AltRight" => AltRight,
        "ShiftLeft" => ShiftLeft,
        "ShiftRight" => ShiftRight,
        "Tab" => Tab,
        "Space" => Space,
        "Enter" => Enter,
        "Backspace" => Backspace,
        "Backquote" => Backquote,
        "Minus" => Minus,
        "Equal" => Equal,
        "BracketLeft" => BracketLeft,
        "BracketRight" => BracketRight,
        "Backslash" => Backslash,
        "Semicolon" => Semicolon,
        "Quote" => Quote,
        "Slash" => Slash,
        "ContextMenu" => ContextMenu,
        "PageUp" => PageUp,
        "PageDown" => PageDown,
        "Escape" => Escape,
        "Delete" => Delete,
        "ControlLeft" => ControlLeft,
        "ControlRight" => ControlRight,
        "CapsLock" => CapsLock,
        "ScrollLock" => ScrollLock,
        "MetaLeft" => MetaLeft,
        "MetaRight" => MetaRight,
        "PrintScreen" => PrintScreen,
        "Pause" => Pause,
        "Home" => Home,
        "End" => End,
        "Insert" => Insert,
        "F1" => F1,
        "F2" => F2,
        "F3" => F3,
        "F4" => F4,
        "F5" => F5,
        "F6" => F6,
        "F7" => F7,
        "F8" => F8,
        "F9" => F9,
        "F10" => F10,
        "F11" => F11,
        "F12" => F12,
        "NumLock" => NumLock,
        "Numpad0" => Numpad0,
        "Numpad1" => Numpad1,
        "Numpad2" => Numpad2,
        "Numpad3" => Numpad3,
        "Numpad4" => Numpad4,
        "Numpad5" => Numpad5,
        "Numpad6" => Numpad6,
        "Numpad7" => Numpad7,
        "Numpad8" => Numpad8,
        "Numpad9" => Numpad9,
        "NumpadDivide" => NumpadDivide,
        "NumpadMultiply" => NumpadMultiply,
        "NumpadSubtract" => NumpadSubtract,
        "NumpadAdd" => NumpadAdd,
        "NumpadDecimal" => NumpadDecimal,
        "NumpadComma" => NumpadComma,
        "NumpadEnter" => NumpadEnter,
        "NumpadEqual" => NumpadEqual,
        "AndroidAppSwitch" => AndroidAppSwitch,
        _ => return None,
    };
    Some(key)
}


impl AndroidKeyCode {
    /// Returns the numeric Android key code.
    pub fn code(self) -> u32 {
        self as u32
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
