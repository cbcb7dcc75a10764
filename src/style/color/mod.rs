use once_cell::sync::Lazy;

mod hex_color;

pub use hex_color::*;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Color {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`; anything else is transparent.
    pub fn hex(raw: &str) -> Self {
        parse_hex(raw).unwrap_or(Self::TRANSPARENT)
    }

    pub const fn to_rgba_u8(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Linear-space components, the form renderers blend in.
    pub fn to_rgba_f32(self) -> [f32; 4] {
        [
            srgb_to_linear(self.r),
            srgb_to_linear(self.g),
            srgb_to_linear(self.b),
            self.a as f32 / 255.0,
        ]
    }

    pub const fn alpha(self) -> u8 {
        self.a
    }

    pub const fn is_transparent(self) -> bool {
        self.a == 0
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        let a = (self.a as f32 * alpha.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }
}

static SRGB8_TO_LINEAR: Lazy<[f32; 256]> = Lazy::new(|| {
    let mut t = [0.0f32; 256];
    for (i, slot) in t.iter_mut().enumerate() {
        *slot = srgb_to_linear_f32(i as f32 / 255.0);
    }
    t
});

pub fn srgb_to_linear(c: u8) -> f32 {
    SRGB8_TO_LINEAR[c as usize]
}

pub fn srgb_to_linear_f32(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_conversion_endpoints() {
        assert_eq!(Color::BLACK.to_rgba_f32(), [0.0, 0.0, 0.0, 1.0]);
        let white = Color::WHITE.to_rgba_f32();
        assert!((white[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn with_alpha_scales() {
        assert_eq!(Color::rgb(10, 20, 30).with_alpha(0.5).alpha(), 128);
        assert!(Color::rgb(1, 2, 3).with_alpha(0.0).is_transparent());
    }
}
