use crate::view::{Element, ElementId, ElementTree, PseudoStates};
use smol_str::SmolStr;

/// Selector-style lookup over a subtree, in depth-first pre-order.
pub struct Query<'a> {
    tree: &'a ElementTree,
    scope: ElementId,
    name: Option<SmolStr>,
    classes: Vec<SmolStr>,
    type_name: Option<SmolStr>,
    pseudo: PseudoStates,
    predicates: Vec<Box<dyn Fn(&Element) -> bool + 'a>>,
}

impl<'a> Query<'a> {
    pub fn new(tree: &'a ElementTree, scope: ElementId) -> Self {
        Self {
            tree,
            scope,
            name: None,
            classes: Vec::new(),
            type_name: None,
            pseudo: PseudoStates::empty(),
            predicates: Vec::new(),
        }
    }

    pub fn name(mut self, name: impl Into<SmolStr>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn class(mut self, class: impl Into<SmolStr>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn type_name(mut self, type_name: impl Into<SmolStr>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Requires every bit of `pseudo`.
    pub fn pseudo(mut self, pseudo: PseudoStates) -> Self {
        self.pseudo |= pseudo;
        self
    }

    pub fn filter(mut self, predicate: impl Fn(&Element) -> bool + 'a) -> Self {
        self.predicates.push(Box::new(predicate));
        self
    }

    fn matches(&self, element: &Element) -> bool {
        self.name.as_ref().is_none_or(|name| name.as_str() == element.name())
            && self.classes.iter().all(|class| element.has_class(class))
            && self
                .type_name
                .as_ref()
                .is_none_or(|type_name| type_name.as_str() == element.type_name())
            && element.pseudo_states().contains(self.pseudo)
            && self.predicates.iter().all(|predicate| predicate(element))
    }

    fn matching(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.tree
            .descendants(self.scope)
            .into_iter()
            .filter(|id| self.tree.get(*id).is_some_and(|element| self.matches(element)))
    }

    pub fn first(&self) -> Option<ElementId> {
        self.matching().next()
    }

    pub fn all(&self) -> Vec<ElementId> {
        self.matching().collect()
    }

    pub fn count(&self) -> usize {
        self.matching().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::TaffyLayoutEngine;

    #[test]
    fn filters_compose_in_tree_order() {
        let mut tree = ElementTree::new(Box::new(TaffyLayoutEngine::new())).expect("tree");
        let root = tree.root();
        let mut ids = Vec::new();
        for (i, name) in ["ok", "cancel", "ok"].into_iter().enumerate() {
            let id = tree.create_element().expect("create");
            tree.insert_child(root, i, id).expect("insert");
            let element = tree.element_mut(id).expect("element");
            element.name = name.into();
            element.classes.push("action".into());
            ids.push(id);
        }
        tree.element_mut(ids[2]).expect("last").pseudo = PseudoStates::DISABLED;

        let query = Query::new(&tree, root).name("ok").class("action");
        assert_eq!(query.all(), vec![ids[0], ids[2]]);
        assert_eq!(
            Query::new(&tree, root)
                .name("ok")
                .pseudo(PseudoStates::DISABLED)
                .first(),
            Some(ids[2])
        );
        assert_eq!(Query::new(&tree, root).type_name("Element").count(), 4);
        assert_eq!(
            Query::new(&tree, root)
                .filter(|element| element.name() == "cancel")
                .count(),
            1
        );
    }
}
