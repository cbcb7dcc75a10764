use crate::error::UiResult;
use crate::style::{
    AlignItems, Color, Display, FlexDirection, JustifyContent, ParsedValue, PropertyId, Style,
};
use crate::ui::{Event, EventKind, KeyCode};
use crate::view::{ElementBehavior, ElementId, LabelProps, Panel, PseudoStates, build_label};
use std::any::Any;
use std::rc::Rc;

pub type ClickHandler = Rc<dyn Fn(&mut Panel) -> UiResult<()>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonVariant {
    Contained,
    Outlined,
    Text,
}

pub struct ButtonProps {
    pub label: String,
    pub width: f32,
    pub height: f32,
    pub variant: ButtonVariant,
    pub disabled: bool,
    pub on_click: Option<ClickHandler>,
}

impl ButtonProps {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            width: 124.0,
            height: 36.0,
            variant: ButtonVariant::Contained,
            disabled: false,
            on_click: None,
        }
    }

    pub fn on_click(mut self, handler: impl Fn(&mut Panel) -> UiResult<()> + 'static) -> Self {
        self.on_click = Some(Rc::new(handler));
        self
    }
}

pub struct Button {
    on_click: Option<ClickHandler>,
}

impl Button {
    fn activate(&self, panel: &mut Panel, id: ElementId, event: &mut Event) -> UiResult<()> {
        let disabled = panel
            .element(id)?
            .pseudo_states()
            .contains(PseudoStates::DISABLED);
        if disabled {
            return Ok(());
        }
        event.mark_handled();
        match self.on_click.clone() {
            Some(handler) => handler(panel),
            None => Ok(()),
        }
    }
}

impl ElementBehavior for Button {
    fn type_name(&self) -> &'static str {
        "Button"
    }

    fn default_action(&self, panel: &mut Panel, id: ElementId, event: &mut Event) -> UiResult<()> {
        match event.kind() {
            EventKind::Click => self.activate(panel, id, event),
            EventKind::KeyDown if matches!(event.key.code, KeyCode::Enter | KeyCode::Space) => {
                self.activate(panel, id, event)
            }
            _ => Ok(()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn build_button(panel: &mut Panel, props: ButtonProps) -> UiResult<ElementId> {
    let root = panel.create_element()?;
    panel.set_name(root, "button")?;
    panel.apply_style(
        root,
        button_style(props.variant, props.disabled, props.width, props.height),
    )?;
    panel.set_focusable(root, !props.disabled)?;
    if props.disabled {
        panel.set_pseudo_state(root, PseudoStates::DISABLED, true)?;
    }

    let mut label = LabelProps::new(props.label);
    label.color = Some(button_text_color(props.variant, props.disabled));
    let label = build_label(panel, label)?;
    panel.hierarchy_add(root, label)?;

    panel.set_behavior(
        root,
        Rc::new(Button {
            on_click: props.on_click,
        }),
    )?;
    Ok(root)
}

fn button_style(variant: ButtonVariant, disabled: bool, width: f32, height: f32) -> Style {
    let mut style = Style::new()
        .with_display(Display::Flex)
        .with_flex_direction(FlexDirection::Row)
        .with_size(width, height)
        .with(
            PropertyId::JustifyContent,
            ParsedValue::JustifyContent(JustifyContent::Center),
        )
        .with(
            PropertyId::AlignItems,
            ParsedValue::AlignItems(AlignItems::Center),
        );

    if disabled {
        return style
            .with_background(Color::hex("#E0E0E0"))
            .with_border(1.0, Color::hex("#E0E0E0"));
    }

    match variant {
        ButtonVariant::Contained => {
            style = style
                .with_background(Color::hex("#1976D2"))
                .with_border(1.0, Color::hex("#1976D2"));
        }
        ButtonVariant::Outlined => {
            style = style.with_border(1.0, Color::hex("#90CAF9"));
        }
        ButtonVariant::Text => {}
    }
    style
}

fn button_text_color(variant: ButtonVariant, disabled: bool) -> Color {
    if disabled {
        return Color::hex("#9E9E9E");
    }
    match variant {
        ButtonVariant::Contained => Color::WHITE,
        ButtonVariant::Outlined | ButtonVariant::Text => Color::hex("#1976D2"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PanelSettings;
    use crate::schedule::ManualTimeSource;
    use crate::ui::{InputRecord, KeyModifiers, MouseButton};
    use crate::view::TaffyLayoutEngine;
    use std::cell::Cell;

    fn panel() -> Panel {
        Panel::with_parts(
            PanelSettings::default().with_viewport(400.0, 300.0),
            Box::new(TaffyLayoutEngine::new()),
            Box::new(ManualTimeSource::new(0)),
        )
        .expect("panel")
    }

    fn counting_button(panel: &mut Panel, disabled: bool) -> (ElementId, Rc<Cell<u32>>) {
        let clicks = Rc::new(Cell::new(0));
        let counter = clicks.clone();
        let mut props = ButtonProps::new("OK").on_click(move |_| {
            counter.set(counter.get() + 1);
            Ok(())
        });
        props.disabled = disabled;
        let button = build_button(panel, props).expect("button");
        let root = panel.root();
        panel.add(root, button).expect("add");
        (button, clicks)
    }

    #[test]
    fn pointer_click_and_keys_activate() {
        let mut panel = panel();
        let (button, clicks) = counting_button(&mut panel, false);

        panel
            .send_input(InputRecord::pointer_down(10.0, 10.0, MouseButton::Left))
            .expect("down");
        assert_eq!(panel.focused(), Some(button));
        panel
            .send_input(InputRecord::pointer_up(10.0, 10.0, MouseButton::Left))
            .expect("up");
        assert_eq!(clicks.get(), 1);

        let handled = panel
            .send_input(InputRecord::key_down(KeyCode::Enter, KeyModifiers::NONE))
            .expect("enter");
        assert!(handled);
        panel
            .send_input(InputRecord::key_down(KeyCode::Space, KeyModifiers::NONE))
            .expect("space");
        panel
            .send_input(InputRecord::key_down(KeyCode::Char('a'), KeyModifiers::NONE))
            .expect("other");
        assert_eq!(clicks.get(), 3);
    }

    #[test]
    fn disabled_button_ignores_clicks() {
        let mut panel = panel();
        let (button, clicks) = counting_button(&mut panel, true);
        assert!(!panel.is_focusable(button));

        panel
            .send_input(InputRecord::pointer_down(10.0, 10.0, MouseButton::Left))
            .expect("down");
        panel
            .send_input(InputRecord::pointer_up(10.0, 10.0, MouseButton::Left))
            .expect("up");
        assert_eq!(clicks.get(), 0);
        assert_eq!(panel.focused(), None);
    }

    #[test]
    fn label_child_is_laid_out_inside() {
        let mut panel = panel();
        let (button, _) = counting_button(&mut panel, false);
        panel.validate().expect("validate");
        let rect = panel.element(button).expect("button").rect();
        assert_eq!((rect.width, rect.height), (124.0, 36.0));
        let label = panel.element(button).expect("button").children()[0];
        assert_eq!(panel.element(label).expect("label").type_name(), "Label");
    }
}
