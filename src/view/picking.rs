use crate::view::{ElementId, ElementTree, PickingMode};
use glam::Vec2;

impl ElementTree {
    /// Topmost element under `point` (panel space). Geometry must be validated.
    pub fn pick(&mut self, point: Vec2) -> Option<ElementId> {
        let mut hits = Vec::new();
        self.pick_into(self.root, point, &mut hits, false);
        hits.pop()
    }

    /// Every element under `point`, topmost first.
    pub fn pick_all(&mut self, point: Vec2) -> Vec<ElementId> {
        let mut hits = Vec::new();
        self.pick_into(self.root, point, &mut hits, true);
        hits
    }

    /// Returns true once a hit ends the search.
    fn pick_into(
        &mut self,
        id: ElementId,
        point: Vec2,
        hits: &mut Vec<ElementId>,
        collect_all: bool,
    ) -> bool {
        let Some(element) = self.get(id) else {
            return false;
        };
        if !element.is_displayed() {
            return false;
        }
        let Ok(world) = self.world_transform(id) else {
            return false;
        };
        if world.matrix2.determinant() == 0.0 {
            return false;
        }
        let local = world.inverse().transform_point2(point);

        let Some(element) = self.get(id) else {
            return false;
        };
        let inside = element.core.rect.contains(local);
        if !inside && element.clips_children() {
            return false;
        }
        let pickable = element.picking_mode == PickingMode::Position;
        let children = element.children.clone();

        for child in children.into_iter().rev() {
            if self.pick_into(child, point, hits, collect_all) {
                return true;
            }
        }

        if pickable && inside {
            hits.push(id);
            return !collect_all;
        }
        false
    }
}
