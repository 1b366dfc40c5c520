use glam::{Vec2, Vec3};

/// Edge function used in rasterization
///
/// Positive when `c` lies on the inner side of the edge `a -> b` for a
/// front-facing (counter-clockwise in NDC) triangle in y-down screen space.
pub fn edge_function(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (c.x - a.x) * (b.y - a.y) - (c.y - a.y) * (b.x - a.x)
}

/// Calculates the normal vector of a triangle
pub fn calculate_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a).normalize_or_zero()
}

/// Lambert term for a point light: cosine between the surface normal and the
/// direction towards the light, clamped at zero.
pub fn calculate_light_intensity(normal: Vec3, position: Vec3, light_pos: Vec3) -> f32 {
    let light_dir = (light_pos - position).normalize_or_zero();
    normal.dot(light_dir).max(0.0)
}

/// Hermite smoothstep between `low` and `high`.
pub fn smoothstep(low: f32, high: f32, x: f32) -> f32 {
    if x <= low {
        return 0.0;
    }
    if x >= high {
        return 1.0;
    }
    let t = (x - low) / (high - low);
    t * t * (3.0 - 2.0 * t)
}

/// Converts a 0xRRGGBB sRGB hex color into linear RGB.
pub fn hex_to_linear(hex: u32) -> Vec3 {
    let r = ((hex >> 16) & 0xff) as f32 / 255.0;
    let g = ((hex >> 8) & 0xff) as f32 / 255.0;
    let b = (hex & 0xff) as f32 / 255.0;
    Vec3::new(srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b))
}

pub fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.0773993808
    } else {
        (c * 0.9478672986 + 0.0521327014).powf(2.4)
    }
}

pub fn linear_to_srgb(c: f32) -> f32 {
    if c < 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(0.41666) - 0.055
    }
}

/// Perceived brightness in `[0, 1]` of a linear color once encoded for display.
pub fn brightness(linear: Vec3) -> f32 {
    let c = linear.clamp(Vec3::ZERO, Vec3::ONE);
    let r = linear_to_srgb(c.x);
    let g = linear_to_srgb(c.y);
    let b = linear_to_srgb(c.z);
    (0.3 * r + 0.59 * g + 0.11 * b).clamp(0.0, 1.0)
}

/// Clamps `value` into `[min, max]`, mapping NaN to `min`.
pub fn clamp_range(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        return min;
    }
    value.max(min).min(max)
}
