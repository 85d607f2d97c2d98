use once_cell::sync::Lazy;
use regex::Regex;

static RGB_TRIPLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*,\s*(\d+)\s*,\s*(\d+)").expect("rgb pattern"));

/// W3C relative luminance of a CSS color string.
///
/// Any string without an `r, g, b` integer triple yields exactly 1.0
/// (maximal brightness). That default biases the invisible-ink check toward
/// "visible": a color we cannot parse must never be declared invisible.
pub fn luminance(color: &str) -> f64 {
    let Some(caps) = RGB_TRIPLE.captures(color) else {
        return 1.0;
    };
    let channel = |i: usize| {
        let v: f64 = caps[i].parse().unwrap_or(255.0);
        let c = v / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    channel(1) * 0.2126 + channel(2) * 0.7152 + channel(3) * 0.0722
}

/// Perceptual contrast ratio between two colors: `(L1+0.05)/(L2+0.05)` with
/// the brighter luminance on top. Symmetric and always >= 1. Never fails.
pub fn contrast_ratio(fg: &str, bg: &str) -> f64 {
    let l1 = luminance(fg);
    let l2 = luminance(bg);
    let bright = l1.max(l2);
    let dark = l1.min(l2);
    (bright + 0.05) / (dark + 0.05)
}
