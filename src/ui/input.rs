use crate::ui::{EventKind, KeyCode, KeyModifiers, MouseButton, MouseButtons};
use glam::Vec2;
use smol_str::SmolStr;

/// A raw record from the platform input source, before it becomes a typed [`Event`].
///
/// [`Event`]: crate::ui::Event
#[derive(Debug, Clone, PartialEq)]
pub enum InputRecord {
    PointerMove {
        position: Vec2,
        buttons: MouseButtons,
        modifiers: KeyModifiers,
    },
    PointerDrag {
        position: Vec2,
        buttons: MouseButtons,
        modifiers: KeyModifiers,
    },
    PointerDown {
        position: Vec2,
        button: MouseButton,
        buttons: MouseButtons,
        modifiers: KeyModifiers,
        click_count: u32,
    },
    PointerUp {
        position: Vec2,
        button: MouseButton,
        buttons: MouseButtons,
        modifiers: KeyModifiers,
    },
    Wheel {
        position: Vec2,
        delta: Vec2,
        modifiers: KeyModifiers,
    },
    KeyDown {
        code: KeyCode,
        character: Option<char>,
        modifiers: KeyModifiers,
    },
    KeyUp {
        code: KeyCode,
        character: Option<char>,
        modifiers: KeyModifiers,
    },
    ValidateCommand {
        name: SmolStr,
    },
    ExecuteCommand {
        name: SmolStr,
    },
    DragUpdated {
        position: Vec2,
    },
    DragPerform {
        position: Vec2,
    },
    DragExited {
        position: Vec2,
    },
    /// Anything the table below has no typed event for.
    Other {
        name: SmolStr,
        position: Option<Vec2>,
    },
}

impl InputRecord {
    pub fn pointer_move(x: f32, y: f32) -> Self {
        Self::PointerMove {
            position: Vec2::new(x, y),
            buttons: MouseButtons::default(),
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn pointer_down(x: f32, y: f32, button: MouseButton) -> Self {
        Self::PointerDown {
            position: Vec2::new(x, y),
            button,
            buttons: MouseButtons::default().with(button),
            modifiers: KeyModifiers::NONE,
            click_count: 1,
        }
    }

    pub fn pointer_up(x: f32, y: f32, button: MouseButton) -> Self {
        Self::PointerUp {
            position: Vec2::new(x, y),
            button,
            buttons: MouseButtons::default(),
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn wheel(x: f32, y: f32, delta_x: f32, delta_y: f32) -> Self {
        Self::Wheel {
            position: Vec2::new(x, y),
            delta: Vec2::new(delta_x, delta_y),
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn key_down(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self::KeyDown {
            code,
            character: None,
            modifiers,
        }
    }

    pub fn key_up(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self::KeyUp {
            code,
            character: None,
            modifiers,
        }
    }

    /// The fixed record-to-event mapping.
    pub fn event_kind(&self) -> EventKind {
        match self {
            Self::PointerMove { .. } | Self::PointerDrag { .. } => EventKind::PointerMove,
            Self::PointerDown { .. } => EventKind::PointerDown,
            Self::PointerUp { .. } => EventKind::PointerUp,
            Self::Wheel { .. } => EventKind::Wheel,
            Self::KeyDown { .. } => EventKind::KeyDown,
            Self::KeyUp { .. } => EventKind::KeyUp,
            Self::ValidateCommand { .. } => EventKind::ValidateCommand,
            Self::ExecuteCommand { .. } => EventKind::ExecuteCommand,
            Self::DragUpdated { .. } => EventKind::DragUpdated,
            Self::DragPerform { .. } => EventKind::DragPerform,
            Self::DragExited { .. } => EventKind::DragExited,
            Self::Other { .. } => EventKind::Passthrough,
        }
    }

    pub fn position(&self) -> Option<Vec2> {
        match self {
            Self::PointerMove { position, .. }
            | Self::PointerDrag { position, .. }
            | Self::PointerDown { position, .. }
            | Self::PointerUp { position, .. }
            | Self::Wheel { position, .. }
            | Self::DragUpdated { position }
            | Self::DragPerform { position }
            | Self::DragExited { position } => Some(*position),
            Self::Other { position, .. } => *position,
            Self::KeyDown { .. }
            | Self::KeyUp { .. }
            | Self::ValidateCommand { .. }
            | Self::ExecuteCommand { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_maps_to_move_and_unknown_to_passthrough() {
        let drag = InputRecord::PointerDrag {
            position: Vec2::new(1.0, 2.0),
            buttons: MouseButtons::default().with(MouseButton::Left),
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(drag.event_kind(), EventKind::PointerMove);

        let other = InputRecord::Other {
            name: "ime-commit".into(),
            position: None,
        };
        assert_eq!(other.event_kind(), EventKind::Passthrough);
        assert_eq!(other.position(), None);
        assert_eq!(
            InputRecord::wheel(0.0, 0.0, 0.0, 3.0).event_kind(),
            EventKind::Wheel
        );
    }
}
