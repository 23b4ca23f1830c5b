//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. Platform
//! aware: on macOS `meta` is ⌘, elsewhere `ctrl` serves the same role.

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── History ──
    Undo,
    Redo,

    // ── Edit ──
    Delete,
    SelectAll,
    Group,
    Ungroup,
    Copy,
    Cut,
    Paste,

    // ── Z-order ──
    SendBackward,
    BringForward,
    SendToBack,
    BringToFront,

    // ── UI ──
    Deselect,
}

/// Resolves key events into shortcut actions.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        _alt: bool,
        meta: bool,
    ) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;

        // ── Modifier combos first (most specific) ──
        if cmd && shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                "g" | "G" => Some(ShortcutAction::Ungroup),
                "[" => Some(ShortcutAction::SendToBack),
                "]" => Some(ShortcutAction::BringToFront),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "a" | "A" => Some(ShortcutAction::SelectAll),
                "g" | "G" => Some(ShortcutAction::Group),
                "c" | "C" => Some(ShortcutAction::Copy),
                "x" | "X" => Some(ShortcutAction::Cut),
                "v" | "V" => Some(ShortcutAction::Paste),
                "[" => Some(ShortcutAction::SendBackward),
                "]" => Some(ShortcutAction::BringForward),
                _ => None,
            };
        }

        // ── Single keys (no modifiers) ──
        match key {
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Deselect),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_undo_redo() {
        // Cmd+Z → Undo
        assert_eq!(
            ShortcutMap::resolve("z", false, false, false, true),
            Some(ShortcutAction::Undo)
        );
        // Ctrl+Z → Undo
        assert_eq!(
            ShortcutMap::resolve("z", true, false, false, false),
            Some(ShortcutAction::Undo)
        );
        // Cmd+Shift+Z → Redo
        assert_eq!(
            ShortcutMap::resolve("z", false, true, false, true),
            Some(ShortcutAction::Redo)
        );
        // Cmd+Y → Redo
        assert_eq!(
            ShortcutMap::resolve("y", false, false, false, true),
            Some(ShortcutAction::Redo)
        );
    }

    #[test]
    fn resolve_group_ungroup() {
        assert_eq!(
            ShortcutMap::resolve("g", false, false, false, true),
            Some(ShortcutAction::Group)
        );
        assert_eq!(
            ShortcutMap::resolve("g", false, true, false, true),
            Some(ShortcutAction::Ungroup)
        );
    }

    #[test]
    fn resolve_z_order() {
        assert_eq!(
            ShortcutMap::resolve("[", false, false, false, true),
            Some(ShortcutAction::SendBackward)
        );
        assert_eq!(
            ShortcutMap::resolve("]", false, false, false, true),
            Some(ShortcutAction::BringForward)
        );
        assert_eq!(
            ShortcutMap::resolve("[", false, true, false, true),
            Some(ShortcutAction::SendToBack)
        );
        assert_eq!(
            ShortcutMap::resolve("]", false, true, false, true),
            Some(ShortcutAction::BringToFront)
        );
    }

    #[test]
    fn resolve_delete_and_escape() {
        assert_eq!(
            ShortcutMap::resolve("Delete", false, false, false, false),
            Some(ShortcutAction::Delete)
        );
        assert_eq!(
            ShortcutMap::resolve("Backspace", false, false, false, false),
            Some(ShortcutAction::Delete)
        );
        assert_eq!(
            ShortcutMap::resolve("Escape", false, false, false, false),
            Some(ShortcutAction::Deselect)
        );
    }

    #[test]
    fn resolve_unknown_key() {
        assert_eq!(ShortcutMap::resolve("q", false, false, false, false), None);
        assert_eq!(ShortcutMap::resolve("z", false, false, false, false), None);
    }
}
