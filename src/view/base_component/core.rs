use glam::{Affine2, Vec2};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Half-open on the far edges, so adjacent rects never both contain a point.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x < self.x + self.width
            && point.y < self.y + self.height
    }

    pub fn translated(&self, offset: Vec2) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PositionMode {
    /// Rect comes from the layout engine.
    #[default]
    Layout,
    /// Rect is set explicitly and pinned in the layout engine.
    Manual,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalTransform {
    pub translation: Vec2,
    pub rotation: f32,
    pub scale: Vec2,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            translation: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
        }
    }
}

impl LocalTransform {
    pub fn translation(x: f32, y: f32) -> Self {
        Self {
            translation: Vec2::new(x, y),
            ..Self::default()
        }
    }

    pub fn matrix(&self) -> Affine2 {
        Affine2::from_scale_angle_translation(self.scale, self.rotation, self.translation)
    }
}

pub(crate) struct ElementCore {
    pub rect: Rect,
    pub manual_rect: Rect,
    pub position_mode: PositionMode,
    pub transform: LocalTransform,
    pub world_transform: Affine2,
}

impl ElementCore {
    pub fn new() -> Self {
        Self {
            rect: Rect::ZERO,
            manual_rect: Rect::ZERO,
            position_mode: PositionMode::Layout,
            transform: LocalTransform::default(),
            world_transform: Affine2::IDENTITY,
        }
    }

    pub fn local_matrix(&self) -> Affine2 {
        self.transform.matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_half_open() {
        let rect = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(rect.contains(Vec2::new(10.0, 10.0)));
        assert!(rect.contains(Vec2::new(29.9, 29.9)));
        assert!(!rect.contains(Vec2::new(30.0, 15.0)));
        assert!(!rect.contains(Vec2::new(9.9, 15.0)));
    }

    #[test]
    fn local_transform_composes_scale_then_translation() {
        let transform = LocalTransform {
            translation: Vec2::new(5.0, 0.0),
            rotation: 0.0,
            scale: Vec2::splat(2.0),
        };
        let p = transform.matrix().transform_point2(Vec2::new(1.0, 1.0));
        assert_eq!(p, Vec2::new(7.0, 2.0));
    }
}
