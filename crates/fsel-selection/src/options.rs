#![forbid(unsafe_code)]

//! Flags and small enums accepted by the controller.

/// How a committed selection change should ripple out.
///
/// A named-field record instead of a bitmask; start from `Default` and
/// switch individual behaviours off with the builder methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SetSelectionOptions {
    /// End the open typing command (observers get `typing_closed`).
    pub close_typing: bool,
    /// Drop the pending typing style instead of carrying it to the new caret.
    pub clear_typing_style: bool,
    /// The change comes from accepting a spelling correction.
    pub spell_correction_triggered: bool,
    /// Move keyboard focus to the selection's editable root.
    pub move_focus: bool,
    /// Restart the caret blink and mark the caret rect dirty.
    pub update_appearance: bool,
    /// The change was requested by the user (keyboard, mouse) rather than
    /// by script; user changes reveal the selection.
    pub user_triggered: bool,
}

impl Default for SetSelectionOptions {
    fn default() -> Self {
        Self {
            close_typing: true,
            clear_typing_style: true,
            spell_correction_triggered: false,
            move_focus: true,
            update_appearance: true,
            user_triggered: false,
        }
    }
}

impl SetSelectionOptions {
    /// Options used when re-anchoring after a document mutation.
    pub const fn mutation() -> Self {
        Self {
            close_typing: false,
            clear_typing_style: false,
            spell_correction_triggered: false,
            move_focus: false,
            update_appearance: true,
            user_triggered: false,
        }
    }

    #[must_use]
    pub const fn user_triggered(mut self, user: bool) -> Self {
        self.user_triggered = user;
        self
    }

    #[must_use]
    pub const fn close_typing(mut self, close: bool) -> Self {
        self.close_typing = close;
        self
    }

    #[must_use]
    pub const fn clear_typing_style(mut self, clear: bool) -> Self {
        self.clear_typing_style = clear;
        self
    }

    #[must_use]
    pub const fn spell_correction_triggered(mut self, triggered: bool) -> Self {
        self.spell_correction_triggered = triggered;
        self
    }

    #[must_use]
    pub const fn move_focus(mut self, move_focus: bool) -> Self {
        self.move_focus = move_focus;
        self
    }

    #[must_use]
    pub const fn update_appearance(mut self, update: bool) -> Self {
        self.update_appearance = update;
        self
    }
}

/// Whether `modify` moves the whole selection or only its extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alteration {
    Move,
    Extend,
}

impl Alteration {
    pub const fn as_str(self) -> &'static str {
        match self {
            Alteration::Move => "move",
            Alteration::Extend => "extend",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_closes_typing_and_clears_style() {
        let opts = SetSelectionOptions::default();
        assert!(opts.close_typing && opts.clear_typing_style);
        assert!(opts.move_focus && opts.update_appearance);
        assert!(!opts.spell_correction_triggered && !opts.user_triggered);
    }

    #[test]
    fn mutation_options_keep_focus_and_typing_state() {
        let opts = SetSelectionOptions::mutation();
        assert!(!opts.close_typing && !opts.clear_typing_style && !opts.move_focus);
        assert_eq!(
            SetSelectionOptions::default().move_focus(false).user_triggered(true),
            SetSelectionOptions {
                move_focus: false,
                user_triggered: true,
                ..SetSelectionOptions::default()
            }
        );
    }
}
