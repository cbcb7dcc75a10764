use crate::style::computed_style::ComputedStyle;
use crate::style::parsed_style::Style;
use crate::view::PseudoStates;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::cell::RefCell;
use std::rc::Rc;

/// What the cascade sees of an element.
#[derive(Debug, Clone, Copy)]
pub struct StyleTarget<'a> {
    pub type_name: &'a str,
    pub name: &'a str,
    pub classes: &'a [SmolStr],
    pub pseudo: PseudoStates,
}

/// Opaque cascade: produces the shared resolved record for an element.
pub trait StyleResolver {
    fn resolve(&self, target: &StyleTarget<'_>, parent: Option<&ComputedStyle>)
    -> Rc<ComputedStyle>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    type_name: Option<SmolStr>,
    name: Option<SmolStr>,
    classes: Vec<SmolStr>,
    pseudo: PseudoStates,
}

impl Selector {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn type_name(mut self, type_name: impl Into<SmolStr>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn name(mut self, name: impl Into<SmolStr>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn class(mut self, class: impl Into<SmolStr>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn pseudo(mut self, pseudo: PseudoStates) -> Self {
        self.pseudo |= pseudo;
        self
    }

    pub fn matches(&self, target: &StyleTarget<'_>) -> bool {
        if let Some(type_name) = &self.type_name {
            if type_name != target.type_name {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if name != target.name {
                return false;
            }
        }
        self.classes.iter().all(|class| target.classes.contains(class))
            && target.pseudo.contains(self.pseudo)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    pub selector: Selector,
    pub style: Style,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct InheritedKey {
    color: [u8; 4],
    font_size: u32,
}

impl InheritedKey {
    fn of(parent: Option<&ComputedStyle>) -> Option<Self> {
        parent.map(|parent| Self {
            color: parent.color.to_rgba_u8(),
            font_size: parent.font_size.to_bits(),
        })
    }
}

/// Rule list matched in declaration order, later rules winning.
#[derive(Default)]
pub struct StyleSheet {
    rules: Vec<StyleRule>,
    cache: RefCell<FxHashMap<(Vec<u32>, Option<InheritedKey>), Rc<ComputedStyle>>>,
}

impl StyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(&mut self, selector: Selector, style: Style) -> &mut Self {
        self.rules.push(StyleRule { selector, style });
        self.cache.get_mut().clear();
        self
    }

    pub fn with_rule(mut self, selector: Selector, style: Style) -> Self {
        self.add_rule(selector, style);
        self
    }

    pub fn rules(&self) -> &[StyleRule] {
        &self.rules
    }

    pub fn cached_len(&self) -> usize {
        self.cache.borrow().len()
    }
}

impl StyleResolver for StyleSheet {
    fn resolve(
        &self,
        target: &StyleTarget<'_>,
        parent: Option<&ComputedStyle>,
    ) -> Rc<ComputedStyle> {
        let matched: Vec<u32> = self
            .rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.selector.matches(target))
            .map(|(i, _)| i as u32)
            .collect();
        let key = (matched, InheritedKey::of(parent));
        if let Some(hit) = self.cache.borrow().get(&key) {
            return hit.clone();
        }

        let mut computed = ComputedStyle::default();
        if let Some(parent) = parent {
            computed.inherit_from(parent);
        }
        for i in &key.0 {
            computed.apply(&self.rules[*i as usize].style);
        }
        let computed = Rc::new(computed);
        self.cache.borrow_mut().insert(key, computed.clone());
        computed
    }
}
