use serde::{Deserialize, Serialize};

/// Tunable detection parameters. The phrase lists and thresholds carry the
/// shipped defaults but are deliberately configurable: the injection phrase
/// match is a plain case-insensitive substring scan, so deployments can
/// extend or prune the list without a code change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heuristics {
    /// Effective opacity below this counts as invisible.
    #[serde(default = "default_opacity_floor")]
    pub opacity_floor: f64,

    /// Contrast ratio below this counts as invisible ink.
    #[serde(default = "default_contrast_floor")]
    pub contrast_floor: f64,

    /// Font sizes in (0, ceiling) px on a text leaf count as tiny text.
    #[serde(default = "default_tiny_text_px")]
    pub tiny_text_px: f64,

    /// Left/top beyond this (negative) offset counts as off-screen.
    #[serde(default = "default_offscreen_px")]
    pub offscreen_px: f64,

    /// Injected nodes stacked above this z-index are popup candidates.
    #[serde(default = "default_z_index_ceiling")]
    pub z_index_ceiling: i64,

    /// Fraction of the viewport an injected node must cover in both
    /// dimensions to count as "big".
    #[serde(default = "default_viewport_cover")]
    pub viewport_cover: f64,

    /// Lowercased substrings that mark hidden prompt-injection text.
    #[serde(default = "default_injection_phrases")]
    pub injection_phrases: Vec<String>,

    /// Lowercased substrings that allow-list benign overlays.
    #[serde(default = "default_allowlist_phrases")]
    pub allowlist_phrases: Vec<String>,

    /// ARIA roles that allow-list accessible dialogs.
    #[serde(default = "default_allowlist_roles")]
    pub allowlist_roles: Vec<String>,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            opacity_floor: default_opacity_floor(),
            contrast_floor: default_contrast_floor(),
            tiny_text_px: default_tiny_text_px(),
            offscreen_px: default_offscreen_px(),
            z_index_ceiling: default_z_index_ceiling(),
            viewport_cover: default_viewport_cover(),
            injection_phrases: default_injection_phrases(),
            allowlist_phrases: default_allowlist_phrases(),
            allowlist_roles: default_allowlist_roles(),
        }
    }
}

fn default_opacity_floor() -> f64 {
    0.1
}
fn default_contrast_floor() -> f64 {
    1.05
}
fn default_tiny_text_px() -> f64 {
    2.0
}
fn default_offscreen_px() -> f64 {
    -1000.0
}
fn default_z_index_ceiling() -> i64 {
    1000
}
fn default_viewport_cover() -> f64 {
    0.2
}
fn default_injection_phrases() -> Vec<String> {
    [
        "ignore previous",
        "system override",
        "new directive",
        "system command",
        "ignore user goal",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_allowlist_phrases() -> Vec<String> {
    ["cookie", "privacy", "accept all"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_allowlist_roles() -> Vec<String> {
    ["dialog", "alertdialog"].iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shipped_constants() {
        let h = Heuristics::default();
        assert_eq!(h.opacity_floor, 0.1);
        assert_eq!(h.contrast_floor, 1.05);
        assert_eq!(h.tiny_text_px, 2.0);
        assert_eq!(h.offscreen_px, -1000.0);
        assert_eq!(h.z_index_ceiling, 1000);
        assert_eq!(h.viewport_cover, 0.2);
        assert!(h.injection_phrases.contains(&"ignore previous".to_string()));
        assert!(h.allowlist_roles.contains(&"dialog".to_string()));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let h: Heuristics = toml::from_str("z_index_ceiling = 500").unwrap();
        assert_eq!(h.z_index_ceiling, 500);
        assert_eq!(h.opacity_floor, 0.1);
        assert_eq!(h.injection_phrases.len(), 5);
    }
}
