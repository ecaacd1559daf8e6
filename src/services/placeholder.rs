//! Placeholder previews.
//!
//! Every tile shows something: a flat 320×200 card with the tab title and
//! hostname on a gradient whose hue is derived from the hostname, so tabs of
//! the same site share a colour.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::types::preview::ImageRef;

const WIDTH: u32 = 320;
const HEIGHT: u32 = 200;
const TITLE_MAX_CHARS: usize = 30;

/// Hue in degrees: sum of the hostname's code points modulo 360.
pub fn hue_for(hostname: &str) -> u32 {
    hostname.chars().fold(0u32, |acc, c| acc.wrapping_add(c as u32)) % 360
}

/// CSS gradient used behind text-only tiles (thumbnails switched off).
pub fn text_gradient(seed: &str) -> String {
    let hue = hue_for(seed);
    format!(
        "linear-gradient(135deg, hsl({hue}, 40%, 25%), hsl({hue}, 40%, 15%))",
        hue = hue
    )
}

pub fn truncate_title(title: &str) -> String {
    if title.chars().count() > TITLE_MAX_CHARS {
        let head: String = title.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        title.to_string()
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// SVG source of the placeholder card.
pub fn placeholder_svg(title: &str, hostname: &str) -> String {
    let hue = hue_for(hostname);
    let title = escape_xml(&truncate_title(if title.is_empty() { "Untitled" } else { title }));
    let host = escape_xml(hostname);
    format!(
        concat!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"##,
            r##"<defs><linearGradient id="g" x1="0" y1="0" x2="0" y2="1">"##,
            r##"<stop offset="0" stop-color="hsl({hue},30%,25%)"/>"##,
            r##"<stop offset="1" stop-color="hsl({hue},30%,15%)"/>"##,
            r##"</linearGradient></defs>"##,
            r##"<rect width="{w}" height="{h}" fill="url(#g)"/>"##,
            r##"<text x="16" y="40" fill="#ffffff" font-family="sans-serif" font-size="16" font-weight="bold">{title}</text>"##,
            r##"<text x="16" y="180" fill="#a0aec0" font-family="monospace" font-size="12">{host}</text>"##,
            r##"</svg>"##
        ),
        w = WIDTH,
        h = HEIGHT,
        hue = hue,
        title = title,
        host = host
    )
}

/// Placeholder as an inline `data:` URL.
pub fn synthesize(title: &str, hostname: &str) -> ImageRef {
    let svg = placeholder_svg(title, hostname);
    ImageRef::Inline(format!("data:image/svg+xml;base64,{}", BASE64.encode(svg)))
}
