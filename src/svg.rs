use std::fmt::Write;

use base64::Engine;

use crate::composer::Scene;

pub const DATA_URL_PREFIX: &str = "data:image/svg+xml;base64,";
pub const TEMPLATE_VERSION: u32 = 1;

/// Render a scene to SVG markup. Identical scenes give identical bytes.
pub fn render(scene: &Scene, width: u32, height: u32) -> String {
    let mut shapes = String::with_capacity(scene.circles.len() * 96);
    for c in &scene.circles {
        // writing into a String cannot fail
        let _ = write!(
            shapes,
            r#"<circle cx="{}" cy="{}" r="{}" fill="{}" fill-opacity="{}" />"#,
            c.cx, c.cy, c.r, c.fill, c.opacity
        );
    }

    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" data-template="{version}">
  <rect width="100%" height="100%" fill="{bg}"/>
  <g filter="url(#blur)">{shapes}</g>
  <defs>
    <filter id="blur"><feGaussianBlur in="SourceGraphic" stdDeviation="20" /></filter>
  </defs>
  <text x="50%" y="50%" dominant-baseline="middle" text-anchor="middle" fill="white" font-family="Inter, system-ui" font-size="{font_size}" opacity="0.9">{label}</text>
</svg>"#,
        version = TEMPLATE_VERSION,
        bg = scene.background,
        font_size = scene.font_size,
        label = scene.label,
    )
}

/// Wrap SVG markup as an embeddable base64 data URL.
pub fn to_data_url(svg: &str) -> String {
    format!("{}{}", DATA_URL_PREFIX, base64::engine::general_purpose::STANDARD.encode(svg.as_bytes()))
}

pub fn encode(scene: &Scene, width: u32, height: u32) -> String {
    to_data_url(&render(scene, width, height))
}
