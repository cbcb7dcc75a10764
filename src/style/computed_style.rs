use crate::style::color::Color;
use crate::style::parsed_style::{
    AlignItems, AlignSelf, Declaration, Display, FlexDirection, FlexWrap, JustifyContent, Length,
    Overflow, ParsedValue, PositionType, PropertyId, Style,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeValue {
    Auto,
    Length(Length),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeInsets<T> {
    pub top: T,
    pub right: T,
    pub bottom: T,
    pub left: T,
}

impl<T: Copy> EdgeInsets<T> {
    pub const fn uniform(value: T) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    pub display: Display,
    pub flex_direction: FlexDirection,
    pub flex_wrap: FlexWrap,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub align_self: AlignSelf,
    pub position: PositionType,
    pub inset: EdgeInsets<SizeValue>,
    pub width: SizeValue,
    pub height: SizeValue,
    pub min_width: SizeValue,
    pub min_height: SizeValue,
    pub max_width: SizeValue,
    pub max_height: SizeValue,
    pub margin: EdgeInsets<Length>,
    pub padding: EdgeInsets<Length>,
    pub border_widths: EdgeInsets<Length>,
    pub gap: Length,
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub flex_basis: SizeValue,
    pub overflow: Overflow,
    pub color: Color,
    pub background_color: Color,
    pub border_color: Color,
    pub font_size: f32,
    pub opacity: f32,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Flex,
            flex_direction: FlexDirection::Column,
            flex_wrap: FlexWrap::NoWrap,
            justify_content: JustifyContent::Start,
            align_items: AlignItems::Stretch,
            align_self: AlignSelf::Auto,
            position: PositionType::Relative,
            inset: EdgeInsets::uniform(SizeValue::Auto),
            width: SizeValue::Auto,
            height: SizeValue::Auto,
            min_width: SizeValue::Auto,
            min_height: SizeValue::Auto,
            max_width: SizeValue::Auto,
            max_height: SizeValue::Auto,
            margin: EdgeInsets::uniform(Length::Zero),
            padding: EdgeInsets::uniform(Length::Zero),
            border_widths: EdgeInsets::uniform(Length::Zero),
            gap: Length::Zero,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            flex_basis: SizeValue::Auto,
            overflow: Overflow::Visible,
            color: Color::BLACK,
            background_color: Color::TRANSPARENT,
            border_color: Color::BLACK,
            font_size: 14.0,
            opacity: 1.0,
        }
    }
}

impl ComputedStyle {
    pub fn is_displayed(&self) -> bool {
        self.display != Display::None
    }

    pub fn clips_children(&self) -> bool {
        self.overflow == Overflow::Hidden
    }

    pub fn inherit_from(&mut self, parent: &ComputedStyle) {
        self.color = parent.color;
        self.font_size = parent.font_size;
    }

    pub fn apply(&mut self, parsed: &Style) {
        for declaration in parsed.declarations() {
            self.apply_declaration(declaration);
        }
    }

    pub fn apply_declaration(&mut self, declaration: &Declaration) {
        let value = &declaration.value;
        match declaration.property {
            PropertyId::Display => {
                if let ParsedValue::Display(v) = value {
                    self.display = *v;
                }
            }
            PropertyId::FlexDirection => {
                if let ParsedValue::FlexDirection(v) = value {
                    self.flex_direction = *v;
                }
            }
            PropertyId::FlexWrap => {
                if let ParsedValue::FlexWrap(v) = value {
                    self.flex_wrap = *v;
                }
            }
            PropertyId::JustifyContent => {
                if let ParsedValue::JustifyContent(v) = value {
                    self.justify_content = *v;
                }
            }
            PropertyId::AlignItems => {
                if let ParsedValue::AlignItems(v) = value {
                    self.align_items = *v;
                }
            }
            PropertyId::AlignSelf => {
                if let ParsedValue::AlignSelf(v) = value {
                    self.align_self = *v;
                }
            }
            PropertyId::Position => {
                if let ParsedValue::Position(v) = value {
                    self.position = *v;
                }
            }
            PropertyId::Overflow => {
                if let ParsedValue::Overflow(v) = value {
                    self.overflow = *v;
                }
            }
            PropertyId::Left => assign_size(&mut self.inset.left, value),
            PropertyId::Top => assign_size(&mut self.inset.top, value),
            PropertyId::Right => assign_size(&mut self.inset.right, value),
            PropertyId::Bottom => assign_size(&mut self.inset.bottom, value),
            PropertyId::Width => assign_size(&mut self.width, value),
            PropertyId::Height => assign_size(&mut self.height, value),
            PropertyId::MinWidth => assign_size(&mut self.min_width, value),
            PropertyId::MinHeight => assign_size(&mut self.min_height, value),
            PropertyId::MaxWidth => assign_size(&mut self.max_width, value),
            PropertyId::MaxHeight => assign_size(&mut self.max_height, value),
            PropertyId::FlexBasis => assign_size(&mut self.flex_basis, value),
            PropertyId::MarginTop => assign_length(&mut self.margin.top, value),
            PropertyId::MarginRight => assign_length(&mut self.margin.right, value),
            PropertyId::MarginBottom => assign_length(&mut self.margin.bottom, value),
            PropertyId::MarginLeft => assign_length(&mut self.margin.left, value),
            PropertyId::PaddingTop => assign_length(&mut self.padding.top, value),
            PropertyId::PaddingRight => assign_length(&mut self.padding.right, value),
            PropertyId::PaddingBottom => assign_length(&mut self.padding.bottom, value),
            PropertyId::PaddingLeft => assign_length(&mut self.padding.left, value),
            PropertyId::BorderTopWidth => assign_length(&mut self.border_widths.top, value),
            PropertyId::BorderRightWidth => assign_length(&mut self.border_widths.right, value),
            PropertyId::BorderBottomWidth => assign_length(&mut self.border_widths.bottom, value),
            PropertyId::BorderLeftWidth => assign_length(&mut self.border_widths.left, value),
            PropertyId::Gap => assign_length(&mut self.gap, value),
            PropertyId::FlexGrow => assign_number(&mut self.flex_grow, value),
            PropertyId::FlexShrink => assign_number(&mut self.flex_shrink, value),
            PropertyId::FontSize => match value {
                ParsedValue::Length(Length::Px(v)) | ParsedValue::Number(v) => {
                    self.font_size = v.max(0.0);
                }
                ParsedValue::Length(Length::Percent(v)) => {
                    self.font_size = (self.font_size * v * 0.01).max(0.0);
                }
                _ => {}
            },
            PropertyId::Opacity => {
                if let ParsedValue::Number(v) = value {
                    self.opacity = v.clamp(0.0, 1.0);
                }
            }
            PropertyId::Color => assign_color(&mut self.color, value),
            PropertyId::BackgroundColor => assign_color(&mut self.background_color, value),
            PropertyId::BorderColor => assign_color(&mut self.border_color, value),
        }
    }
}

/// Resolves declarations on top of defaults, taking inherited text properties from `parent`.
pub fn compute_style(parsed: &Style, parent: Option<&ComputedStyle>) -> ComputedStyle {
    let mut computed = ComputedStyle::default();
    if let Some(parent) = parent {
        computed.inherit_from(parent);
    }
    computed.apply(parsed);
    computed
}

fn assign_size(slot: &mut SizeValue, value: &ParsedValue) {
    match value {
        ParsedValue::Auto => *slot = SizeValue::Auto,
        ParsedValue::Length(length) => *slot = SizeValue::Length(*length),
        ParsedValue::Number(v) => *slot = SizeValue::Length(Length::Px(*v)),
        _ => {}
    }
}

fn assign_length(slot: &mut Length, value: &ParsedValue) {
    match value {
        ParsedValue::Length(length) => *slot = *length,
        ParsedValue::Number(v) => *slot = Length::Px(*v),
        _ => {}
    }
}

fn assign_number(slot: &mut f32, value: &ParsedValue) {
    if let ParsedValue::Number(v) = value {
        *slot = v.max(0.0);
    }
}

fn assign_color(slot: &mut Color, value: &ParsedValue) {
    if let ParsedValue::Color(color) = value {
        *slot = *color;
    }
}
