use crate::error::UiResult;
use crate::style::{AlignItems, Color, FlexDirection, Length, ParsedValue, PropertyId, Style};
use crate::ui::{Event, EventKind, KeyCode};
use crate::view::{
    ElementBehavior, ElementId, LabelProps, Panel, PickingMode, PseudoStates, Rect, build_label,
};
use std::any::Any;
use std::rc::Rc;

pub type ToggleHandler = Rc<dyn Fn(&mut Panel, bool) -> UiResult<()>>;

const TRACK_WIDTH: f32 = 44.0;
const TRACK_HEIGHT: f32 = 24.0;
const THUMB_SIZE: f32 = 20.0;
const THUMB_INSET: f32 = 2.0;

pub struct ToggleProps {
    pub label: String,
    pub checked: bool,
    pub disabled: bool,
    pub on_change: Option<ToggleHandler>,
}

impl ToggleProps {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            checked: false,
            disabled: false,
            on_change: None,
        }
    }

    pub fn on_change(mut self, handler: impl Fn(&mut Panel, bool) -> UiResult<()> + 'static) -> Self {
        self.on_change = Some(Rc::new(handler));
        self
    }
}

pub struct Toggle {
    track: ElementId,
    thumb: ElementId,
    on_change: Option<ToggleHandler>,
}

impl Toggle {
    pub fn is_checked(panel: &Panel, id: ElementId) -> bool {
        panel
            .get(id)
            .is_some_and(|element| element.pseudo_states().contains(PseudoStates::CHECKED))
    }

    fn flip(&self, panel: &mut Panel, id: ElementId, event: &mut Event) -> UiResult<()> {
        let states = panel.element(id)?.pseudo_states();
        if states.contains(PseudoStates::DISABLED) {
            return Ok(());
        }
        let checked = !states.contains(PseudoStates::CHECKED);
        panel.set_pseudo_state(id, PseudoStates::CHECKED, checked)?;
        self.sync(panel, checked)?;
        event.mark_handled();
        match self.on_change.clone() {
            Some(handler) => handler(panel, checked),
            None => Ok(()),
        }
    }

    fn sync(&self, panel: &mut Panel, checked: bool) -> UiResult<()> {
        panel.set_rect(self.thumb, thumb_rect(checked))?;
        panel.set_style_property(
            self.track,
            PropertyId::BackgroundColor,
            ParsedValue::Color(track_color(checked)),
        )
    }
}

impl ElementBehavior for Toggle {
    fn type_name(&self) -> &'static str {
        "Toggle"
    }

    fn default_action(&self, panel: &mut Panel, id: ElementId, event: &mut Event) -> UiResult<()> {
        match event.kind() {
            EventKind::Click => self.flip(panel, id, event),
            EventKind::KeyDown if event.key.code == KeyCode::Space => self.flip(panel, id, event),
            _ => Ok(()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn build_toggle(panel: &mut Panel, props: ToggleProps) -> UiResult<ElementId> {
    let root = panel.create_element()?;
    panel.set_name(root, "toggle")?;
    panel.apply_style(
        root,
        Style::new()
            .with_flex_direction(FlexDirection::Row)
            .with(PropertyId::AlignItems, ParsedValue::AlignItems(AlignItems::Center))
            .with(PropertyId::Gap, ParsedValue::Length(Length::px(8.0))),
    )?;
    panel.set_focusable(root, !props.disabled)?;
    if props.disabled {
        panel.set_pseudo_state(root, PseudoStates::DISABLED, true)?;
    }

    let track = panel.create_element()?;
    panel.set_name(track, "track")?;
    panel.set_picking_mode(track, PickingMode::Ignore)?;
    panel.apply_style(
        track,
        Style::new()
            .with_size(TRACK_WIDTH, TRACK_HEIGHT)
            .with_background(track_color(false)),
    )?;
    panel.hierarchy_add(root, track)?;

    let thumb = panel.create_element()?;
    panel.set_name(thumb, "thumb")?;
    panel.set_picking_mode(thumb, PickingMode::Ignore)?;
    panel.apply_style(thumb, Style::new().with_background(Color::WHITE))?;
    panel.hierarchy_add(track, thumb)?;

    let label = build_label(panel, LabelProps::new(props.label))?;
    panel.hierarchy_add(root, label)?;

    let toggle = Toggle {
        track,
        thumb,
        on_change: props.on_change,
    };
    toggle.sync(panel, props.checked)?;
    if props.checked {
        panel.set_pseudo_state(root, PseudoStates::CHECKED, true)?;
    }
    panel.set_behavior(root, Rc::new(toggle))?;
    Ok(root)
}

fn thumb_rect(checked: bool) -> Rect {
    let x = if checked {
        TRACK_WIDTH - THUMB_SIZE - THUMB_INSET
    } else {
        THUMB_INSET
    };
    Rect::new(x, THUMB_INSET, THUMB_SIZE, THUMB_SIZE)
}

fn track_color(checked: bool) -> Color {
    if checked {
        Color::hex("#1976D2")
    } else {
        Color::hex("#BDBDBD")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PanelSettings;
    use crate::schedule::ManualTimeSource;
    use crate::ui::{InputRecord, KeyModifiers, MouseButton};
    use crate::view::TaffyLayoutEngine;
    use std::cell::RefCell;

    fn panel() -> Panel {
        Panel::with_parts(
            PanelSettings::default().with_viewport(400.0, 300.0),
            Box::new(TaffyLayoutEngine::new()),
            Box::new(ManualTimeSource::new(0)),
        )
        .expect("panel")
    }

    fn click(panel: &mut Panel, x: f32, y: f32) {
        panel
            .send_input(InputRecord::pointer_down(x, y, MouseButton::Left))
            .expect("down");
        panel
            .send_input(InputRecord::pointer_up(x, y, MouseButton::Left))
            .expect("up");
    }

    #[test]
    fn click_flips_and_reports() {
        let mut panel = panel();
        let reported = Rc::new(RefCell::new(Vec::new()));
        let sink = reported.clone();
        let toggle = build_toggle(
            &mut panel,
            ToggleProps::new("Wifi").on_change(move |_, checked| {
                sink.borrow_mut().push(checked);
                Ok(())
            }),
        )
        .expect("toggle");
        let root = panel.root();
        panel.add(root, toggle).expect("add");
        assert!(!Toggle::is_checked(&panel, toggle));

        click(&mut panel, 10.0, 10.0);
        assert!(Toggle::is_checked(&panel, toggle));
        click(&mut panel, 10.0, 10.0);
        panel
            .send_input(InputRecord::key_down(KeyCode::Space, KeyModifiers::NONE))
            .expect("space");
        assert_eq!(*reported.borrow(), vec![true, false, true]);
    }

    #[test]
    fn thumb_follows_the_checked_state() {
        let mut panel = panel();
        let mut props = ToggleProps::new("Dark mode");
        props.checked = true;
        let toggle = build_toggle(&mut panel, props).expect("toggle");
        let root = panel.root();
        panel.add(root, toggle).expect("add");
        panel.validate().expect("validate");

        assert!(Toggle::is_checked(&panel, toggle));
        let track = panel.element(toggle).expect("toggle").children()[0];
        let thumb = panel.element(track).expect("track").children()[0];
        assert_eq!(panel.element(thumb).expect("thumb").rect().x, 22.0);

        click(&mut panel, 10.0, 10.0);
        panel.validate().expect("validate");
        assert_eq!(panel.element(thumb).expect("thumb").rect().x, 2.0);
    }

    #[test]
    fn disabled_toggle_stays_put() {
        let mut panel = panel();
        let mut props = ToggleProps::new("Locked");
        props.disabled = true;
        let toggle = build_toggle(&mut panel, props).expect("toggle");
        let root = panel.root();
        panel.add(root, toggle).expect("add");

        click(&mut panel, 10.0, 10.0);
        assert!(!Toggle::is_checked(&panel, toggle));
    }
}
