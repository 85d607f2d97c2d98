use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to a node in the host render tree. The render tree owns the
/// node; sentinel only reads style/geometry through it and writes mitigation
/// attributes onto it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Viewport coordinate used for hit-testing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Bounding rectangle relative to the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.left + self.width / 2.0,
            y: self.top + self.height / 2.0,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right() && p.y >= self.top && p.y <= self.bottom()
    }
}

/// Rendered viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

impl Viewport {
    pub fn contains(&self, p: Point) -> bool {
        p.x > 0.0 && p.y > 0.0 && p.x < self.width && p.y < self.height
    }
}

/// Read-only view of an element's resolved style at query time. Values are
/// kept as the raw strings the host reports; parsing happens at the point of
/// use so malformed values can degrade to conservative defaults instead of
/// failing. Never cached between checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputedStyle {
    pub display: String,
    pub visibility: String,
    pub opacity: String,
    pub color: String,
    pub background_color: String,
    pub background_image: String,
    pub font_size: String,
    pub cursor: String,
    pub position: String,
    pub z_index: String,
    pub pointer_events: String,
    pub border: String,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: "block".to_string(),
            visibility: "visible".to_string(),
            opacity: "1".to_string(),
            color: "rgb(0, 0, 0)".to_string(),
            background_color: "rgba(0, 0, 0, 0)".to_string(),
            background_image: "none".to_string(),
            font_size: "16px".to_string(),
            cursor: "auto".to_string(),
            position: "static".to_string(),
            z_index: "auto".to_string(),
            pointer_events: "auto".to_string(),
            border: "none".to_string(),
        }
    }
}

/// Result of resolving an element's effective background down the ancestor
/// chain. `Indeterminate` means an image or gradient was encountered and
/// contrast cannot be reasoned about mathematically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Background {
    Color(String),
    Indeterminate,
}

/// One batch of nodes added to the tree, delivered asynchronously by the
/// host. Each added node is classified independently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MutationBatch {
    pub added: Vec<NodeId>,
}

/// Classification produced by the visibility engine. Produced fresh per
/// call, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Verdict {
    NotFound,
    SafeHidden,
    HiddenOpacity,
    HiddenPromptInjection,
    TinyText { font_size: String },
    OffScreen,
    BlockedByInvisibleOverlay,
    InvisibleInk { ratio: f64 },
    Visible,
}

impl Verdict {
    /// True for verdicts that indicate a deception vector, as opposed to
    /// content that is visible or legitimately hidden.
    pub fn is_threat(&self) -> bool {
        !matches!(self, Verdict::NotFound | Verdict::SafeHidden | Verdict::Visible)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::NotFound => write!(f, "NOT_FOUND"),
            Verdict::SafeHidden => write!(f, "SAFE_HIDDEN"),
            Verdict::HiddenOpacity => write!(f, "HIDDEN_OPACITY"),
            Verdict::HiddenPromptInjection => write!(f, "HIDDEN_PROMPT_INJECTION"),
            Verdict::TinyText { font_size } => write!(f, "TINY_TEXT ({})", font_size),
            Verdict::OffScreen => write!(f, "OFF_SCREEN"),
            Verdict::BlockedByInvisibleOverlay => write!(f, "BLOCKED_BY_INVISIBLE_OVERLAY"),
            Verdict::InvisibleInk { ratio } => write!(f, "INVISIBLE_INK (Contrast: {:.2})", ratio),
            Verdict::Visible => write!(f, "VISIBLE"),
        }
    }
}

/// Threat category attached to audit findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThreatKind {
    PromptInjection,
    DeceptiveCss,
    Clickjacking,
    DynamicInjection,
    PhishingForm,
}

impl ThreatKind {
    pub fn risk_score(&self) -> u8 {
        match self {
            ThreatKind::PromptInjection => 95,
            ThreatKind::PhishingForm => 90,
            ThreatKind::Clickjacking => 90,
            ThreatKind::DynamicInjection => 85,
            ThreatKind::DeceptiveCss => 70,
        }
    }
}

/// One confirmed finding from a full-page audit sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    pub kind: ThreatKind,
    pub node: NodeId,
    pub tag: String,
    pub verdict: String,
    pub risk_score: u8,
}

/// Serializable result of auditing a whole page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatReport {
    pub page: String,
    pub findings: Vec<Finding>,
    pub elements_scanned: usize,
    pub scanned_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_labels_match_wire_format() {
        assert_eq!(Verdict::NotFound.to_string(), "NOT_FOUND");
        assert_eq!(
            Verdict::TinyText {
                font_size: "1px".to_string()
            }
            .to_string(),
            "TINY_TEXT (1px)"
        );
        assert_eq!(
            Verdict::InvisibleInk { ratio: 1.0199 }.to_string(),
            "INVISIBLE_INK (Contrast: 1.02)"
        );
    }

    #[test]
    fn threat_flag_excludes_benign_verdicts() {
        assert!(!Verdict::Visible.is_threat());
        assert!(!Verdict::SafeHidden.is_threat());
        assert!(!Verdict::NotFound.is_threat());
        assert!(Verdict::HiddenPromptInjection.is_threat());
        assert!(Verdict::BlockedByInvisibleOverlay.is_threat());
    }

    #[test]
    fn risk_scores_rank_threat_kinds() {
        assert_eq!(ThreatKind::PromptInjection.risk_score(), 95);
        assert_eq!(ThreatKind::Clickjacking.risk_score(), 90);
        assert_eq!(ThreatKind::PhishingForm.risk_score(), 90);
        assert_eq!(ThreatKind::DynamicInjection.risk_score(), 85);
        assert_eq!(ThreatKind::DeceptiveCss.risk_score(), 70);
    }

    #[test]
    fn rect_geometry() {
        let r = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(r.right(), 110.0);
        assert_eq!(r.bottom(), 70.0);
        let c = r.center();
        assert_eq!(c.x, 60.0);
        assert_eq!(c.y, 45.0);
        assert!(r.contains(c));
        assert!(!r.contains(Point { x: 0.0, y: 0.0 }));
    }
}
