use crate::error::UiResult;
use crate::style::{Color, Length};
use crate::view::{DirtyFlags, Element, ElementId, Panel, Rect};
use glam::{Affine2, Vec2};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("texture {0:?} is no longer available")]
    TextureUnavailable(TextureHandle),
    #[error("clip stack underflow")]
    ClipUnderflow,
    #[error("render backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRect {
    pub position: [f32; 2],
    pub size: [f32; 2],
    /// Maps `position` space to the current target.
    pub transform: Affine2,
    pub fill_color: [f32; 4],
    pub border_color: [f32; 4],
    pub border_widths: [f32; 4], // [left, right, top, bottom]
    pub opacity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawText<'a> {
    pub text: &'a str,
    pub position: [f32; 2],
    pub transform: Affine2,
    pub color: [f32; 4],
    pub font_size: f32,
    pub opacity: f32,
}

/// Backend that draws resolved geometry. Coordinates arrive with the
/// transform that maps them into the current target (screen or offscreen).
pub trait Renderer {
    fn draw_rect(&mut self, rect: &DrawRect) -> Result<(), RenderError>;
    fn draw_text(&mut self, text: &DrawText<'_>) -> Result<(), RenderError>;
    fn draw_texture(
        &mut self,
        texture: TextureHandle,
        rect: Rect,
        transform: Affine2,
        opacity: f32,
    ) -> Result<(), RenderError>;
    fn push_clip(&mut self, rect: Rect, transform: Affine2) -> Result<(), RenderError>;
    fn pop_clip(&mut self) -> Result<(), RenderError>;
    /// Redirects drawing into a new `width` x `height` texture until `end_offscreen`.
    fn begin_offscreen(&mut self, width: u32, height: u32) -> Result<TextureHandle, RenderError>;
    fn end_offscreen(&mut self) -> Result<(), RenderError>;
    fn release_texture(&mut self, texture: TextureHandle);
}

/// Pixel cache of a `cache_as_bitmap` subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderCache {
    pub texture: TextureHandle,
    pub width: u32,
    pub height: u32,
}

pub struct PaintContext<'a> {
    pub renderer: &'a mut dyn Renderer,
    /// Maps the element's parent content space to the current target.
    pub transform: Affine2,
    pub opacity: f32,
}

impl PaintContext<'_> {
    pub fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<(), RenderError> {
        self.renderer.draw_rect(&DrawRect {
            position: [rect.x, rect.y],
            size: [rect.width, rect.height],
            transform: self.transform,
            fill_color: color.to_rgba_f32(),
            border_color: [0.0; 4],
            border_widths: [0.0; 4],
            opacity: self.opacity,
        })
    }

    pub fn draw_text(
        &mut self,
        text: &str,
        position: Vec2,
        color: Color,
        font_size: f32,
    ) -> Result<(), RenderError> {
        self.renderer.draw_text(&DrawText {
            text,
            position: position.to_array(),
            transform: self.transform,
            color: color.to_rgba_f32(),
            font_size,
            opacity: self.opacity,
        })
    }

    /// Background and border from the element's computed style.
    fn draw_box(&mut self, element: &Element) -> Result<(), RenderError> {
        let style = element.style();
        let rect = element.rect();
        let widths = style.border_widths;
        let resolve = |length: Length| length.resolve_with_base(rect.width).max(0.0);
        let border_widths = [
            resolve(widths.left),
            resolve(widths.right),
            resolve(widths.top),
            resolve(widths.bottom),
        ];
        let has_border = border_widths.iter().any(|w| *w > 0.0) && !style.border_color.is_transparent();
        if style.background_color.is_transparent() && !has_border {
            return Ok(());
        }
        self.renderer.draw_rect(&DrawRect {
            position: [rect.x, rect.y],
            size: [rect.width, rect.height],
            transform: self.transform,
            fill_color: style.background_color.to_rgba_f32(),
            border_color: style.border_color.to_rgba_f32(),
            border_widths,
            opacity: self.opacity,
        })
    }
}

impl Panel {
    /// Validates, then draws every visible element. A subtree that fails to
    /// draw is skipped with a warning and loses its pixel cache.
    pub fn paint(&mut self, renderer: &mut dyn Renderer) -> UiResult<()> {
        self.validate()?;
        let root = self.tree.root();
        self.paint_node(root, renderer, Affine2::IDENTITY, 1.0);
        Ok(())
    }

    fn paint_node(&mut self, id: ElementId, renderer: &mut dyn Renderer, base: Affine2, opacity: f32) {
        if let Err(err) = self.try_paint_node(id, renderer, base, opacity) {
            tracing::warn!(?id, %err, "skipping subtree that failed to paint");
            self.drop_render_cache(id, renderer);
        }
    }

    fn try_paint_node(
        &mut self,
        id: ElementId,
        renderer: &mut dyn Renderer,
        base: Affine2,
        opacity: f32,
    ) -> Result<(), RenderError> {
        let Some(element) = self.tree.get(id) else {
            return Ok(());
        };
        if !element.is_displayed() {
            return Ok(());
        }
        let Ok(world) = self.tree.world_transform(id) else {
            return Ok(());
        };
        let Some(element) = self.tree.get(id) else {
            return Ok(());
        };
        let opacity = opacity * element.style().opacity;
        if !element.cache_as_bitmap {
            if element.render_cache.is_some() {
                self.drop_render_cache(id, renderer);
            }
            return self.paint_contents(id, renderer, base, opacity);
        }

        let rect = element.rect();
        let transform = base * world;
        if !element.dirty.contains(DirtyFlags::REPAINT)
            && let Some(cache) = element.render_cache
        {
            return renderer.draw_texture(cache.texture, rect, transform, opacity);
        }

        self.drop_render_cache(id, renderer);
        let width = rect.width.ceil().max(1.0) as u32;
        let height = rect.height.ceil().max(1.0) as u32;
        let texture = renderer.begin_offscreen(width, height)?;
        let offscreen_base = Affine2::from_translation(-rect.position()) * world.inverse();
        let painted = self.paint_contents(id, renderer, offscreen_base, 1.0);
        let ended = renderer.end_offscreen();
        if let Err(err) = painted.and(ended) {
            renderer.release_texture(texture);
            return Err(err);
        }
        if let Some(element) = self.tree.get_mut(id) {
            element.render_cache = Some(RenderCache {
                texture,
                width,
                height,
            });
        }
        renderer.draw_texture(texture, rect, transform, opacity)
    }

    fn paint_contents(
        &mut self,
        id: ElementId,
        renderer: &mut dyn Renderer,
        base: Affine2,
        opacity: f32,
    ) -> Result<(), RenderError> {
        let Ok(world) = self.tree.world_transform(id) else {
            return Ok(());
        };
        let transform = base * world;
        let Some(element) = self.tree.get(id) else {
            return Ok(());
        };
        {
            let mut ctx = PaintContext {
                renderer: &mut *renderer,
                transform,
                opacity,
            };
            ctx.draw_box(element)?;
            if let Some(behavior) = element.behavior.clone() {
                behavior.paint(element, &mut ctx)?;
            }
        }
        let clip = element.clips_children().then_some(element.rect());
        let children = element.children.clone();
        self.tree.clear_dirty(id, DirtyFlags::REPAINT);

        if let Some(rect) = clip {
            renderer.push_clip(rect, transform)?;
        }
        for child in children {
            self.paint_node(child, renderer, base, opacity);
        }
        if clip.is_some() {
            renderer.pop_clip()?;
        }
        Ok(())
    }

    fn drop_render_cache(&mut self, id: ElementId, renderer: &mut dyn Renderer) {
        if let Some(cache) = self.tree.get_mut(id).and_then(|element| element.render_cache.take()) {
            renderer.release_texture(cache.texture);
        }
    }
}
