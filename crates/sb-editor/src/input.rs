//! Input layer: pointer, keyboard, and IME composition events.
//!
//! The host (native window or browser) translates raw device input into
//! these events. Composition events mirror the platform IME lifecycle:
//! `CompositionStart` … `CompositionUpdate`* … `CompositionEnd(text)`,
//! where only the end event carries the committed text.

/// Modifier key state at the time of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };
}

/// A discrete input event delivered by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown {
        x: f32,
        y: f32,
        modifiers: Modifiers,
    },
    PointerMove {
        x: f32,
        y: f32,
        modifiers: Modifiers,
    },
    PointerUp {
        x: f32,
        y: f32,
        modifiers: Modifiers,
    },
    /// A key press, pre-translation. `key` follows `KeyboardEvent.key`
    /// naming (`"z"`, `"Delete"`, `"Escape"`).
    Key {
        key: String,
        modifiers: Modifiers,
    },
    /// IME composition began in the active text field.
    CompositionStart,
    /// Intermediate composition text changed (not yet committed).
    CompositionUpdate(String),
    /// Composition committed the given final text.
    CompositionEnd(String),
}
