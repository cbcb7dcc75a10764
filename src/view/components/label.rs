use crate::error::UiResult;
use crate::style::Color;
use crate::view::{
    DirtyFlags, Element, ElementBehavior, ElementId, MeasureFunc, MeasureMode, PaintContext,
    Panel, PickingMode, RenderError,
};
use glam::Vec2;
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

/// Horizontal advance of one character, as a fraction of the font size.
pub const LABEL_ADVANCE_RATIO: f32 = 0.6;
pub const LABEL_LINE_HEIGHT: f32 = 1.2;

pub struct LabelProps {
    pub text: String,
    pub font_size: f32,
    pub color: Option<Color>,
}

impl LabelProps {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: 14.0,
            color: None,
        }
    }
}

pub struct Label {
    text: Rc<RefCell<String>>,
    font_size: f32,
    color: Option<Color>,
}

impl Label {
    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }
}

impl ElementBehavior for Label {
    fn type_name(&self) -> &'static str {
        "Label"
    }

    fn paint(&self, element: &Element, ctx: &mut PaintContext<'_>) -> Result<(), RenderError> {
        let rect = element.rect();
        let color = self.color.unwrap_or(element.style().color);
        ctx.draw_text(
            &self.text.borrow(),
            Vec2::new(rect.x, rect.y),
            color,
            self.font_size,
        )
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn build_label(panel: &mut Panel, props: LabelProps) -> UiResult<ElementId> {
    let id = panel.create_element()?;
    let text = Rc::new(RefCell::new(props.text));
    panel.set_picking_mode(id, PickingMode::Ignore)?;
    panel.set_measure(id, Some(label_measure(text.clone(), props.font_size)))?;
    panel.set_behavior(
        id,
        Rc::new(Label {
            text,
            font_size: props.font_size,
            color: props.color,
        }),
    )?;
    Ok(id)
}

/// Replaces the text of a label built by [`build_label`]; other elements are left alone.
pub fn set_label_text(panel: &mut Panel, id: ElementId, text: impl Into<String>) -> UiResult<()> {
    let Some(label) = panel.element(id)?.behavior_as::<Label>() else {
        return Ok(());
    };
    *label.text.borrow_mut() = text.into();
    panel.mark_dirty(id, DirtyFlags::LAYOUT | DirtyFlags::REPAINT)
}

pub fn measure_label_text(text: &str, font_size: f32) -> (f32, f32) {
    let advance = font_size * LABEL_ADVANCE_RATIO;
    (
        text.chars().count() as f32 * advance,
        font_size * LABEL_LINE_HEIGHT,
    )
}

fn label_measure(text: Rc<RefCell<String>>, font_size: f32) -> MeasureFunc {
    Rc::new(move |width, width_mode, height, height_mode| {
        let (natural_width, natural_height) = measure_label_text(&text.borrow(), font_size);
        let width = match width_mode {
            MeasureMode::Exactly => width,
            MeasureMode::AtMost => natural_width.min(width),
            MeasureMode::Undefined => natural_width,
        };
        let height = match height_mode {
            MeasureMode::Exactly => height,
            MeasureMode::AtMost => natural_height.min(height),
            MeasureMode::Undefined => natural_height,
        };
        (width, height)
    })
}
