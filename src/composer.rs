//! Procedural scene composition.
//!
//! Every random draw comes from one owned generator seeded with the resolved
//! seed, consumed in a fixed order: optional background pick, then for each
//! circle `cx, cy, r, fill, opacity`. Changing that order changes every image.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

use crate::error::GenerationError;

pub const CIRCLE_COUNT: usize = 18;
pub const MIN_RADIUS: u32 = 20;
pub const LABEL_MAX_CHARS: usize = 48;

const BACKGROUNDS: [&str; 4] = ["#0f172a", "#111827", "#0b1020", "#0a0f1f"];
const FALLBACK_BACKGROUND: &str = "#0b1220";
const FILLS: [&str; 6] = ["#8b5cf6", "#06b6d4", "#ec4899", "#f59e0b", "#10b981", "#3b82f6"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Circle {
    pub cx: u32,
    pub cy: u32,
    pub r: u32,
    pub fill: &'static str,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub background: &'static str,
    pub circles: Vec<Circle>,
    /// First 48 characters of the prompt, cut before escaping `&`, `<` and `>`
    /// so an entity is never split.
    pub label: String,
    pub font_size: u32,
}

/// Build the scene for `prompt` at the given size.
///
/// `prompt` should already be trimmed: its character count decides whether
/// the background is drawn from the palette (even, non-zero) or fixed.
pub fn compose(prompt: &str, seed: u32, width: u32, height: u32) -> Result<Scene, GenerationError> {
    if width == 0 || height == 0 {
        return Err(GenerationError::InvalidDimensions { width, height });
    }

    let mut rng = StdRng::seed_from_u64(u64::from(seed));

    let prompt_len = prompt.chars().count();
    let background = if prompt_len > 0 && prompt_len % 2 == 0 {
        BACKGROUNDS[rng.gen_range(0..BACKGROUNDS.len())]
    } else {
        FALLBACK_BACKGROUND
    };

    let short_side = width.min(height);
    let max_radius = (short_side / 4).max(MIN_RADIUS);

    let circles = (0..CIRCLE_COUNT)
        .map(|_| {
            let cx = rng.gen_range(0..=width);
            let cy = rng.gen_range(0..=height);
            let r = rng.gen_range(MIN_RADIUS..=max_radius);
            let fill = FILLS[rng.gen_range(0..FILLS.len())];
            let opacity = rng.gen_range(0.2..0.8);
            Circle { cx, cy, r, fill, opacity }
        })
        .collect();

    Ok(Scene {
        background,
        circles,
        label: escape_markup(&truncate_chars(prompt, LABEL_MAX_CHARS)),
        font_size: short_side / 18,
    })
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn escape_markup(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assert_in_bounds(scene: &Scene, width: u32, height: u32) {
        let max_r = (width.min(height) / 4).max(MIN_RADIUS);
        assert_eq!(scene.circles.len(), CIRCLE_COUNT);
        for c in &scene.circles {
            assert!(c.cx <= width, "cx {} > {}", c.cx, width);
            assert!(c.cy <= height, "cy {} > {}", c.cy, height);
            assert!((MIN_RADIUS..=max_r).contains(&c.r), "r {} out of range", c.r);
            assert!((0.2..0.8).contains(&c.opacity), "opacity {} out of range", c.opacity);
            assert!(FILLS.contains(&c.fill));
        }
    }

    #[test]
    fn same_inputs_same_scene() {
        let a = compose("a blue sunset", 42, 512, 512).unwrap();
        let b = compose("a blue sunset", 42, 512, 512).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_differ() {
        let a = compose("a blue sunset", 1, 512, 512).unwrap();
        let b = compose("a blue sunset", 2, 512, 512).unwrap();
        assert_ne!(a.circles, b.circles);
    }

    #[test]
    fn circles_respect_bounds() {
        for seed in 0..64 {
            assert_in_bounds(&compose("bounds", seed, 512, 512).unwrap(), 512, 512);
            assert_in_bounds(&compose("wide", seed, 1920, 300).unwrap(), 1920, 300);
        }
    }

    #[test]
    fn tiny_canvas_pins_radius_to_minimum() {
        let scene = compose("tiny", 9, 40, 40).unwrap();
        assert!(scene.circles.iter().all(|c| c.r == MIN_RADIUS));
        assert_eq!(scene.font_size, 2);
    }

    #[test]
    fn odd_length_prompt_uses_fallback_background() {
        for seed in 0..16 {
            assert_eq!(compose("odd", seed, 256, 256).unwrap().background, FALLBACK_BACKGROUND);
        }
    }

    #[test]
    fn even_length_prompt_draws_from_palette() {
        for seed in 0..16 {
            let scene = compose("even", seed, 256, 256).unwrap();
            assert!(BACKGROUNDS.contains(&scene.background));
        }
    }

    #[test]
    fn background_draw_shifts_the_shape_stream() {
        // "ab" draws a background first, "abc" does not; same seed, different circles
        let even = compose("ab", 5, 256, 256).unwrap();
        let odd = compose("abc", 5, 256, 256).unwrap();
        assert_ne!(even.circles, odd.circles);
    }

    #[test]
    fn label_is_truncated_then_escaped() {
        let prompt = format!("<b>{}", "x".repeat(60));
        let scene = compose(&prompt, 1, 512, 512).unwrap();
        assert!(scene.label.starts_with("&lt;b&gt;"));
        assert_eq!(scene.label.len(), "&lt;b&gt;".len() + LABEL_MAX_CHARS - 3);
    }

    #[test]
    fn font_size_follows_short_side() {
        assert_eq!(compose("p", 1, 1024, 1024).unwrap().font_size, 56);
        assert_eq!(compose("p", 1, 1024, 360).unwrap().font_size, 20);
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert_eq!(
            compose("p", 1, 0, 100),
            Err(GenerationError::InvalidDimensions { width: 0, height: 100 })
        );
        assert!(compose("p", 1, 100, 0).is_err());
    }
}
