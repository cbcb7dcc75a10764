use crate::error::UiResult;
use crate::style::{Color, Style};
use crate::ui::{Event, EventKind, KeyCode, MouseButton};
use crate::view::{ElementBehavior, ElementId, Panel, PickingMode, PseudoStates, Rect};
use glam::Vec2;
use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

pub type SliderHandler = Rc<dyn Fn(&mut Panel, f64) -> UiResult<()>>;

const RAIL_HEIGHT: f32 = 4.0;
const THUMB_SIZE: f32 = 16.0;

pub struct SliderProps {
    pub value: f64,
    pub min: f64,
    pub max: f64,
    /// Arrow-key increment; `0` steps by a hundredth of the range.
    pub step: f64,
    pub width: f32,
    pub height: f32,
    pub disabled: bool,
    pub on_change: Option<SliderHandler>,
}

impl SliderProps {
    pub fn new() -> Self {
        Self {
            value: 30.0,
            min: 0.0,
            max: 100.0,
            step: 1.0,
            width: 240.0,
            height: 32.0,
            disabled: false,
            on_change: None,
        }
    }

    pub fn on_change(mut self, handler: impl Fn(&mut Panel, f64) -> UiResult<()> + 'static) -> Self {
        self.on_change = Some(Rc::new(handler));
        self
    }
}

impl Default for SliderProps {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Slider {
    min: f64,
    max: f64,
    step: f64,
    width: f32,
    height: f32,
    value: Cell<f64>,
    active: ElementId,
    thumb: ElementId,
    on_change: Option<SliderHandler>,
}

impl Slider {
    pub fn value(&self) -> f64 {
        self.value.get()
    }

    fn key_step(&self) -> f64 {
        if self.step > 0.0 {
            self.step
        } else {
            (self.max - self.min).abs() / 100.0
        }
    }

    /// Clamps, moves the thumb and reports; nothing happens when the value is unchanged.
    fn set_value(&self, panel: &mut Panel, next: f64) -> UiResult<()> {
        const EPS: f64 = 0.0001;
        let (low, high) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        let next = next.clamp(low, high);
        if (self.value.get() - next).abs() <= EPS {
            return Ok(());
        }
        self.value.set(next);
        self.sync(panel)?;
        match self.on_change.clone() {
            Some(handler) => handler(panel, next),
            None => Ok(()),
        }
    }

    fn sync(&self, panel: &mut Panel) -> UiResult<()> {
        let ratio = normalize_ratio(self.value.get(), self.min, self.max) as f32;
        let rail_y = (self.height - RAIL_HEIGHT) * 0.5;
        panel.set_rect(
            self.active,
            Rect::new(0.0, rail_y, self.width * ratio, RAIL_HEIGHT),
        )?;
        panel.set_rect(
            self.thumb,
            Rect::new(
                (self.width - THUMB_SIZE) * ratio,
                (self.height - THUMB_SIZE) * 0.5,
                THUMB_SIZE,
                THUMB_SIZE,
            ),
        )
    }

    fn local_x(&self, panel: &mut Panel, id: ElementId, position: Vec2) -> UiResult<f32> {
        let world = panel.world_transform(id)?;
        let rect = panel.element(id)?.rect();
        Ok(world.inverse().transform_point2(position).x - rect.x)
    }

    fn drag_to(&self, panel: &mut Panel, id: ElementId, position: Vec2) -> UiResult<()> {
        let local_x = self.local_x(panel, id, position)?;
        self.set_value(panel, value_from_local_x(local_x, self.width, self.min, self.max))
    }
}

impl ElementBehavior for Slider {
    fn type_name(&self) -> &'static str {
        "Slider"
    }

    fn default_action(&self, panel: &mut Panel, id: ElementId, event: &mut Event) -> UiResult<()> {
        if panel
            .element(id)?
            .pseudo_states()
            .contains(PseudoStates::DISABLED)
        {
            return Ok(());
        }
        match event.kind() {
            EventKind::PointerDown if event.pointer.button == Some(MouseButton::Left) => {
                panel.capture_pointer(id)?;
                event.mark_handled();
                self.drag_to(panel, id, event.pointer.position)
            }
            EventKind::PointerMove if panel.has_pointer_capture(id) => {
                event.mark_handled();
                self.drag_to(panel, id, event.pointer.position)
            }
            EventKind::PointerUp if panel.has_pointer_capture(id) => {
                event.mark_handled();
                panel.release_pointer(id).map(|_| ())
            }
            EventKind::KeyDown => {
                let next = match event.key.code {
                    KeyCode::ArrowLeft | KeyCode::ArrowDown => self.value() - self.key_step(),
                    KeyCode::ArrowRight | KeyCode::ArrowUp => self.value() + self.key_step(),
                    KeyCode::Home => self.min,
                    KeyCode::End => self.max,
                    _ => return Ok(()),
                };
                event.mark_handled();
                self.set_value(panel, next)
            }
            _ => Ok(()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn build_slider(panel: &mut Panel, props: SliderProps) -> UiResult<ElementId> {
    let root = panel.create_element()?;
    panel.set_name(root, "slider")?;
    panel.apply_style(root, Style::new().with_size(props.width, props.height))?;
    panel.set_focusable(root, !props.disabled)?;
    if props.disabled {
        panel.set_pseudo_state(root, PseudoStates::DISABLED, true)?;
    }

    let rail_y = (props.height - RAIL_HEIGHT) * 0.5;
    let rail = decoration(panel, root, slider_rail_style(props.disabled))?;
    panel.set_rect(rail, Rect::new(0.0, rail_y, props.width, RAIL_HEIGHT))?;
    let active = decoration(panel, root, slider_active_style(props.disabled))?;
    let thumb = decoration(panel, root, slider_thumb_style(props.disabled))?;

    let slider = Slider {
        min: props.min,
        max: props.max,
        step: props.step,
        width: props.width,
        height: props.height,
        value: Cell::new(props.value),
        active,
        thumb,
        on_change: props.on_change,
    };
    slider.sync(panel)?;
    panel.set_behavior(root, Rc::new(slider))?;
    Ok(root)
}

pub fn slider_value(panel: &Panel, id: ElementId) -> Option<f64> {
    panel.get(id)?.behavior_as::<Slider>().map(Slider::value)
}

fn decoration(panel: &mut Panel, parent: ElementId, style: Style) -> UiResult<ElementId> {
    let id = panel.create_element()?;
    panel.set_picking_mode(id, PickingMode::Ignore)?;
    panel.apply_style(id, style)?;
    panel.hierarchy_add(parent, id)?;
    Ok(id)
}

fn slider_rail_style(disabled: bool) -> Style {
    let color = if disabled { "#E0E0E0" } else { "#90CAF9" };
    Style::new().with_background(Color::hex(color))
}

fn slider_active_style(disabled: bool) -> Style {
    let color = if disabled { "#BDBDBD" } else { "#1976D2" };
    Style::new().with_background(Color::hex(color))
}

fn slider_thumb_style(disabled: bool) -> Style {
    let (fill, border) = if disabled {
        ("#F5F5F5", "#BDBDBD")
    } else {
        ("#FFFFFF", "#1976D2")
    };
    Style::new()
        .with_background(Color::hex(fill))
        .with_border(2.0, Color::hex(border))
}

fn normalize_ratio(value: f64, min: f64, max: f64) -> f64 {
    let span = (max - min).abs();
    if span <= f64::EPSILON {
        return 0.0;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

fn value_from_local_x(local_x: f32, width: f32, min: f64, max: f64) -> f64 {
    if width <= 0.0 {
        return min;
    }
    let ratio = (local_x / width).clamp(0.0, 1.0) as f64;
    min + (max - min) * ratio
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PanelSettings;
    use crate::schedule::ManualTimeSource;
    use crate::ui::{InputRecord, KeyModifiers};
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

    /// A 200px 0..100 slider placed at x = 50.
    fn slider(panel: &mut Panel, log: &Rc<RefCell<Vec<f64>>>) -> ElementId {
        let sink = log.clone();
        let mut props = SliderProps::new().on_change(move |_, value| {
            sink.borrow_mut().push(value);
            Ok(())
        });
        props.width = 200.0;
        props.value = 0.0;
        let slider = build_slider(panel, props).expect("slider");
        let root = panel.root();
        panel.add(root, slider).expect("add");
        panel
            .set_rect(slider, Rect::new(50.0, 0.0, 200.0, 32.0))
            .expect("rect");
        slider
    }

    #[test]
    fn ratio_helpers() {
        assert_eq!(normalize_ratio(25.0, 0.0, 100.0), 0.25);
        assert_eq!(normalize_ratio(5.0, 5.0, 5.0), 0.0);
        assert_eq!(normalize_ratio(150.0, 0.0, 100.0), 1.0);
        assert_eq!(value_from_local_x(50.0, 200.0, 0.0, 100.0), 25.0);
        assert_eq!(value_from_local_x(-10.0, 200.0, 0.0, 100.0), 0.0);
    }

    #[test]
    fn drag_tracks_the_pointer_under_capture() {
        let mut panel = panel();
        let log = Rc::new(RefCell::new(Vec::new()));
        let slider = slider(&mut panel, &log);

        panel
            .send_input(InputRecord::pointer_down(100.0, 16.0, MouseButton::Left))
            .expect("down");
        assert!(panel.has_pointer_capture(slider));
        assert_eq!(slider_value(&panel, slider), Some(25.0));

        // Far outside the slider, still routed to it.
        panel
            .send_input(InputRecord::pointer_move(390.0, 200.0))
            .expect("move");
        assert_eq!(slider_value(&panel, slider), Some(100.0));

        panel
            .send_input(InputRecord::pointer_up(390.0, 200.0, MouseButton::Left))
            .expect("up");
        assert!(!panel.has_pointer_capture(slider));

        panel
            .send_input(InputRecord::pointer_move(60.0, 16.0))
            .expect("move");
        assert_eq!(slider_value(&panel, slider), Some(100.0));
        assert_eq!(*log.borrow(), vec![25.0, 100.0]);
    }

    #[test]
    fn arrow_keys_step_within_bounds() {
        let mut panel = panel();
        let log = Rc::new(RefCell::new(Vec::new()));
        let slider = slider(&mut panel, &log);
        panel.focus(slider).expect("focus");

        let key = |panel: &mut Panel, code| {
            panel
                .send_input(InputRecord::key_down(code, KeyModifiers::NONE))
                .expect("key")
        };
        assert!(key(&mut panel, KeyCode::ArrowRight));
        assert!(key(&mut panel, KeyCode::ArrowUp));
        assert_eq!(slider_value(&panel, slider), Some(2.0));
        key(&mut panel, KeyCode::Home);
        key(&mut panel, KeyCode::ArrowLeft);
        assert_eq!(slider_value(&panel, slider), Some(0.0));
        key(&mut panel, KeyCode::End);
        assert_eq!(slider_value(&panel, slider), Some(100.0));
        assert!(!key(&mut panel, KeyCode::Char('x')));
        assert_eq!(*log.borrow(), vec![1.0, 2.0, 0.0, 100.0]);
    }

    #[test]
    fn thumb_follows_the_value() {
        let mut panel = panel();
        let log = Rc::new(RefCell::new(Vec::new()));
        let slider = slider(&mut panel, &log);
        panel.focus(slider).expect("focus");
        panel
            .send_input(InputRecord::key_down(KeyCode::End, KeyModifiers::NONE))
            .expect("end");
        panel.validate().expect("validate");

        let children = panel.element(slider).expect("slider").children().to_vec();
        let active = panel.element(children[1]).expect("active").rect();
        let thumb = panel.element(children[2]).expect("thumb").rect();
        assert_eq!(active.width, 200.0);
        assert_eq!(thumb.x, 184.0);
    }
}
