use crate::ui::{FocusDirection, InputRecord};
use crate::view::ElementId;
use bitflags::bitflags;
use glam::Vec2;
use smol_str::SmolStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyModifiers {
    pub alt: bool,
    pub ctrl: bool,
    pub shift: bool,
    pub meta: bool,
}

impl KeyModifiers {
    pub const NONE: Self = Self {
        alt: false,
        ctrl: false,
        shift: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        alt: false,
        ctrl: false,
        shift: true,
        meta: false,
    };
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MouseButtons {
    pub left: bool,
    pub right: bool,
    pub middle: bool,
    pub back: bool,
    pub forward: bool,
}

impl MouseButtons {
    pub fn with(mut self, button: MouseButton) -> Self {
        match button {
            MouseButton::Left => self.left = true,
            MouseButton::Right => self.right = true,
            MouseButton::Middle => self.middle = true,
            MouseButton::Back => self.back = true,
            MouseButton::Forward => self.forward = true,
            MouseButton::Other(_) => {}
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Tab,
    Enter,
    Space,
    Escape,
    Backspace,
    Delete,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,
    Char(char),
    Other(u32),
}

/// Stable numeric id per event kind, used for listener lookup and pooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventTypeId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerDown,
    PointerUp,
    PointerMove,
    Wheel,
    Click,
    KeyDown,
    KeyUp,
    PointerEnter,
    PointerLeave,
    PointerOver,
    PointerOut,
    FocusOut,
    FocusIn,
    Blur,
    Focus,
    PointerCapture,
    PointerCaptureOut,
    ValidateCommand,
    ExecuteCommand,
    DragUpdated,
    DragPerform,
    DragExited,
    Passthrough,
}

impl EventKind {
    pub fn type_id(self) -> EventTypeId {
        EventTypeId(self as u16)
    }

    /// Pointer-routed kinds: positioned input plus the hover notifications.
    pub fn is_pointer(self) -> bool {
        matches!(
            self,
            Self::PointerDown
                | Self::PointerUp
                | Self::PointerMove
                | Self::Wheel
                | Self::Click
                | Self::PointerEnter
                | Self::PointerLeave
                | Self::PointerOver
                | Self::PointerOut
        )
    }

    pub fn is_keyboard(self) -> bool {
        matches!(self, Self::KeyDown | Self::KeyUp)
    }

    /// Hover notifications; always dispatched to a preassigned target.
    pub fn is_enter_leave(self) -> bool {
        matches!(
            self,
            Self::PointerEnter | Self::PointerLeave | Self::PointerOver | Self::PointerOut
        )
    }

    pub fn is_native_command(self) -> bool {
        matches!(
            self,
            Self::ValidateCommand
                | Self::ExecuteCommand
                | Self::DragUpdated
                | Self::DragPerform
                | Self::DragExited
        )
    }

    pub fn is_drag(self) -> bool {
        matches!(
            self,
            Self::DragUpdated | Self::DragPerform | Self::DragExited
        )
    }

    pub fn is_focus(self) -> bool {
        matches!(
            self,
            Self::FocusOut | Self::FocusIn | Self::Blur | Self::Focus
        )
    }

    fn default_flags(self) -> EventFlags {
        match self {
            Self::PointerEnter | Self::PointerLeave | Self::PointerOver | Self::PointerOut => {
                EventFlags::empty()
            }
            Self::Blur | Self::Focus | Self::PointerCapture | Self::PointerCaptureOut => {
                EventFlags::CAPTURABLE
            }
            _ => EventFlags::CAPTURABLE | EventFlags::BUBBLES,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PropagationPhase {
    #[default]
    None,
    Capture,
    AtTarget,
    BubbleUp,
    DefaultAction,
}

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct EventFlags: u8 {
        const CAPTURABLE = 1 << 0;
        const BUBBLES = 1 << 1;
        const PROPAGATION_STOPPED = 1 << 2;
        const IMMEDIATE_STOPPED = 1 << 3;
        const DEFAULT_PREVENTED = 1 << 4;
        const DISPATCHING = 1 << 5;
        /// Consumed by a behavior without stopping propagation.
        const HANDLED = 1 << 6;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerData {
    /// Panel coordinates.
    pub position: Vec2,
    pub button: Option<MouseButton>,
    pub buttons: MouseButtons,
    pub modifiers: KeyModifiers,
    pub click_count: u32,
    pub wheel_delta: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyData {
    pub code: KeyCode,
    pub character: Option<char>,
    pub modifiers: KeyModifiers,
}

impl Default for KeyData {
    fn default() -> Self {
        Self {
            code: KeyCode::Other(0),
            character: None,
            modifiers: KeyModifiers::NONE,
        }
    }
}

/// A typed event. Target, current target and phase change in place while it is dispatched.
#[derive(Debug, Clone)]
pub struct Event {
    kind: EventKind,
    target: Option<ElementId>,
    current_target: Option<ElementId>,
    related_target: Option<ElementId>,
    phase: PropagationPhase,
    flags: EventFlags,
    pub pointer: PointerData,
    pub key: KeyData,
    pub command: Option<SmolStr>,
    pub focus_direction: FocusDirection,
    pub input: Option<InputRecord>,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            target: None,
            current_target: None,
            related_target: None,
            phase: PropagationPhase::None,
            flags: kind.default_flags(),
            pointer: PointerData::default(),
            key: KeyData::default(),
            command: None,
            focus_direction: FocusDirection::None,
            input: None,
        }
    }

    pub fn pointer(kind: EventKind, position: Vec2) -> Self {
        let mut event = Self::new(kind);
        event.pointer.position = position;
        event
    }

    pub fn key(kind: EventKind, code: KeyCode, modifiers: KeyModifiers) -> Self {
        let mut event = Self::new(kind);
        event.key = KeyData {
            code,
            character: None,
            modifiers,
        };
        event
    }

    pub fn with_target(mut self, target: ElementId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_related_target(mut self, related: Option<ElementId>) -> Self {
        self.related_target = related;
        self
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.pointer.button = Some(button);
        self.pointer.buttons = self.pointer.buttons.with(button);
        self
    }

    /// Returns the event to the state `Event::new(kind)` would produce.
    pub fn reset(&mut self, kind: EventKind) {
        *self = Self::new(kind);
    }

    /// Copies the payload of a raw record. The kind is left untouched.
    pub fn fill_from_input(&mut self, record: &InputRecord) {
        match record {
            InputRecord::PointerMove {
                position,
                buttons,
                modifiers,
            }
            | InputRecord::PointerDrag {
                position,
                buttons,
                modifiers,
            } => {
                self.pointer.position = *position;
                self.pointer.buttons = *buttons;
                self.pointer.modifiers = *modifiers;
            }
            InputRecord::PointerDown {
                position,
                button,
                buttons,
                modifiers,
                click_count,
            } => {
                self.pointer.position = *position;
                self.pointer.button = Some(*button);
                self.pointer.buttons = *buttons;
                self.pointer.modifiers = *modifiers;
                self.pointer.click_count = *click_count;
            }
            InputRecord::PointerUp {
                position,
                button,
                buttons,
                modifiers,
            } => {
                self.pointer.position = *position;
                self.pointer.button = Some(*button);
                self.pointer.buttons = *buttons;
                self.pointer.modifiers = *modifiers;
            }
            InputRecord::Wheel {
                position,
                delta,
                modifiers,
            } => {
                self.pointer.position = *position;
                self.pointer.wheel_delta = *delta;
                self.pointer.modifiers = *modifiers;
            }
            InputRecord::KeyDown {
                code,
                character,
                modifiers,
            }
            | InputRecord::KeyUp {
                code,
                character,
                modifiers,
            } => {
                self.key = KeyData {
                    code: *code,
                    character: *character,
                    modifiers: *modifiers,
                };
            }
            InputRecord::ValidateCommand { name } | InputRecord::ExecuteCommand { name } => {
                self.command = Some(name.clone());
            }
            InputRecord::DragUpdated { position }
            | InputRecord::DragPerform { position }
            | InputRecord::DragExited { position } => {
                self.pointer.position = *position;
            }
            InputRecord::Other { position, .. } => {
                if let Some(position) = position {
                    self.pointer.position = *position;
                }
            }
        }
        self.input = Some(record.clone());
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn type_id(&self) -> EventTypeId {
        self.kind.type_id()
    }

    pub fn target(&self) -> Option<ElementId> {
        self.target
    }

    pub fn set_target(&mut self, target: Option<ElementId>) {
        self.target = target;
    }

    pub fn current_target(&self) -> Option<ElementId> {
        self.current_target
    }

    pub(crate) fn set_current_target(&mut self, current: Option<ElementId>) {
        self.current_target = current;
    }

    pub fn related_target(&self) -> Option<ElementId> {
        self.related_target
    }

    pub fn set_related_target(&mut self, related: Option<ElementId>) {
        self.related_target = related;
    }

    pub fn phase(&self) -> PropagationPhase {
        self.phase
    }

    pub(crate) fn set_phase(&mut self, phase: PropagationPhase) {
        self.phase = phase;
    }

    pub fn flags(&self) -> EventFlags {
        self.flags
    }

    pub fn bubbles(&self) -> bool {
        self.flags.contains(EventFlags::BUBBLES)
    }

    pub fn capturable(&self) -> bool {
        self.flags.contains(EventFlags::CAPTURABLE)
    }

    pub fn stop_propagation(&mut self) {
        self.flags.insert(EventFlags::PROPAGATION_STOPPED);
    }

    /// Also skips the handlers not yet run on the current element.
    pub fn stop_immediate_propagation(&mut self) {
        self.flags
            .insert(EventFlags::PROPAGATION_STOPPED | EventFlags::IMMEDIATE_STOPPED);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.flags.contains(EventFlags::PROPAGATION_STOPPED)
    }

    pub fn is_immediate_propagation_stopped(&self) -> bool {
        self.flags.contains(EventFlags::IMMEDIATE_STOPPED)
    }

    pub fn prevent_default(&mut self) {
        self.flags.insert(EventFlags::DEFAULT_PREVENTED);
    }

    pub fn is_default_prevented(&self) -> bool {
        self.flags.contains(EventFlags::DEFAULT_PREVENTED)
    }

    pub fn is_dispatching(&self) -> bool {
        self.flags.contains(EventFlags::DISPATCHING)
    }

    pub(crate) fn set_dispatching(&mut self, dispatching: bool) {
        self.flags.set(EventFlags::DISPATCHING, dispatching);
    }

    pub fn mark_handled(&mut self) {
        self.flags.insert(EventFlags::HANDLED);
    }

    /// Whether anything reacted: propagation stopped, default prevented or consumed.
    pub fn is_handled(&self) -> bool {
        self.flags.intersects(
            EventFlags::HANDLED | EventFlags::PROPAGATION_STOPPED | EventFlags::DEFAULT_PREVENTED,
        )
    }
}
