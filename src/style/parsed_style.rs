use crate::style::color::Color;
use rustc_hash::FxHashMap;
use std::ops::Add;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyId {
    Display,
    FlexDirection,
    FlexWrap,
    JustifyContent,
    AlignItems,
    AlignSelf,
    Position,
    Left,
    Top,
    Right,
    Bottom,
    Width,
    Height,
    MinWidth,
    MinHeight,
    MaxWidth,
    MaxHeight,
    MarginTop,
    MarginRight,
    MarginBottom,
    MarginLeft,
    PaddingTop,
    PaddingRight,
    PaddingBottom,
    PaddingLeft,
    BorderTopWidth,
    BorderRightWidth,
    BorderBottomWidth,
    BorderLeftWidth,
    Gap,
    FlexGrow,
    FlexShrink,
    FlexBasis,
    Overflow,
    Color,
    BackgroundColor,
    BorderColor,
    FontSize,
    Opacity,
}

impl PropertyId {
    /// Whether a change to this property can move or resize anything.
    pub const fn affects_layout(self) -> bool {
        !matches!(
            self,
            Self::Color | Self::BackgroundColor | Self::BorderColor | Self::Opacity
        )
    }

    /// Whether children take this property from their parent when no rule sets it.
    pub const fn is_inherited(self) -> bool {
        matches!(self, Self::Color | Self::FontSize)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Display {
    #[default]
    Flex,
    None,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlexDirection {
    Row,
    #[default]
    Column,
    RowReverse,
    ColumnReverse,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlexWrap {
    #[default]
    NoWrap,
    Wrap,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JustifyContent {
    #[default]
    Start,
    Center,
    End,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AlignItems {
    Start,
    Center,
    End,
    #[default]
    Stretch,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AlignSelf {
    #[default]
    Auto,
    Start,
    Center,
    End,
    Stretch,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PositionType {
    #[default]
    Relative,
    Absolute,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Px(f32),
    Percent(f32),
    Zero,
}

impl Length {
    pub const fn px(value: f32) -> Self {
        Self::Px(value)
    }

    pub const fn percent(value: f32) -> Self {
        Self::Percent(value)
    }

    pub fn resolve_with_base(self, base: f32) -> f32 {
        match self {
            Self::Px(v) => v,
            Self::Percent(v) => base.max(0.0) * v * 0.01,
            Self::Zero => 0.0,
        }
    }
}

impl From<f32> for Length {
    fn from(value: f32) -> Self {
        Self::Px(value)
    }
}

impl From<i32> for Length {
    fn from(value: i32) -> Self {
        Self::Px(value as f32)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedValue {
    Display(Display),
    FlexDirection(FlexDirection),
    FlexWrap(FlexWrap),
    JustifyContent(JustifyContent),
    AlignItems(AlignItems),
    AlignSelf(AlignSelf),
    Position(PositionType),
    Overflow(Overflow),
    Auto,
    Length(Length),
    Number(f32),
    Color(Color),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: PropertyId,
    pub value: ParsedValue,
}

/// Ordered property declarations, last write per property wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    declarations: Vec<Declaration>,
    index: FxHashMap<PropertyId, usize>,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_declarations(declarations: Vec<Declaration>) -> Self {
        let mut parsed = Self::new();
        for declaration in declarations {
            parsed.insert(declaration.property, declaration.value);
        }
        parsed
    }

    pub fn insert(&mut self, property: PropertyId, value: ParsedValue) {
        let declaration = Declaration { property, value };
        match self.index.get(&property).copied() {
            Some(i) => self.declarations[i] = declaration,
            None => {
                self.declarations.push(declaration);
                self.index.insert(property, self.declarations.len() - 1);
            }
        }
    }

    pub fn with(mut self, property: PropertyId, value: ParsedValue) -> Self {
        self.insert(property, value);
        self
    }

    pub fn remove(&mut self, property: PropertyId) -> Option<ParsedValue> {
        let i = self.index.remove(&property)?;
        let removed = self.declarations.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(removed.value)
    }

    pub fn get(&self, property: PropertyId) -> Option<&ParsedValue> {
        self.index
            .get(&property)
            .and_then(|i| self.declarations.get(*i))
            .map(|decl| &decl.value)
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn clear(&mut self) {
        self.declarations.clear();
        self.index.clear();
    }

    pub fn merge(self, rhs: Self) -> Self {
        let mut merged = self;
        for declaration in rhs.declarations {
            merged.insert(declaration.property, declaration.value);
        }
        merged
    }

    pub fn set_size(&mut self, width: impl Into<Length>, height: impl Into<Length>) {
        self.insert(PropertyId::Width, ParsedValue::Length(width.into()));
        self.insert(PropertyId::Height, ParsedValue::Length(height.into()));
    }

    pub fn with_size(mut self, width: impl Into<Length>, height: impl Into<Length>) -> Self {
        self.set_size(width, height);
        self
    }

    pub fn set_padding(&mut self, padding: impl Into<Length>) {
        let padding = padding.into();
        for property in [
            PropertyId::PaddingTop,
            PropertyId::PaddingRight,
            PropertyId::PaddingBottom,
            PropertyId::PaddingLeft,
        ] {
            self.insert(property, ParsedValue::Length(padding));
        }
    }

    pub fn with_padding(mut self, padding: impl Into<Length>) -> Self {
        self.set_padding(padding);
        self
    }

    pub fn set_margin(&mut self, margin: impl Into<Length>) {
        let margin = margin.into();
        for property in [
            PropertyId::MarginTop,
            PropertyId::MarginRight,
            PropertyId::MarginBottom,
            PropertyId::MarginLeft,
        ] {
            self.insert(property, ParsedValue::Length(margin));
        }
    }

    pub fn with_margin(mut self, margin: impl Into<Length>) -> Self {
        self.set_margin(margin);
        self
    }

    pub fn set_border_width(&mut self, width: impl Into<Length>) {
        let width = width.into();
        for property in [
            PropertyId::BorderTopWidth,
            PropertyId::BorderRightWidth,
            PropertyId::BorderBottomWidth,
            PropertyId::BorderLeftWidth,
        ] {
            self.insert(property, ParsedValue::Length(width));
        }
    }

    pub fn with_border(mut self, width: impl Into<Length>, color: Color) -> Self {
        self.set_border_width(width);
        self.insert(PropertyId::BorderColor, ParsedValue::Color(color));
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.insert(PropertyId::BackgroundColor, ParsedValue::Color(color));
        self
    }

    pub fn with_display(mut self, display: Display) -> Self {
        self.insert(PropertyId::Display, ParsedValue::Display(display));
        self
    }

    pub fn with_flex_direction(mut self, direction: FlexDirection) -> Self {
        self.insert(PropertyId::FlexDirection, ParsedValue::FlexDirection(direction));
        self
    }

    pub fn with_overflow(mut self, overflow: Overflow) -> Self {
        self.insert(PropertyId::Overflow, ParsedValue::Overflow(overflow));
        self
    }

    pub fn with_absolute_rect(mut self, x: f32, y: f32, width: f32, height: f32) -> Self {
        self.insert(PropertyId::Position, ParsedValue::Position(PositionType::Absolute));
        self.insert(PropertyId::Left, ParsedValue::Length(Length::px(x)));
        self.insert(PropertyId::Top, ParsedValue::Length(Length::px(y)));
        self.set_size(width, height);
        self
    }
}

impl Add for Style {
    type Output = Style;

    fn add(self, rhs: Self) -> Self::Output {
        self.merge(rhs)
    }
}
