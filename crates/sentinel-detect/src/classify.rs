use crate::{color, occlusion, style};
use sentinel_core::{Background, ComputedStyle, Heuristics, NodeId, Verdict};
use sentinel_dom::RenderHost;
use std::sync::Arc;
use tracing::debug;

const INTERACTIVE_TAGS: [&str; 7] = ["a", "button", "input", "textarea", "select", "iframe", "div"];

fn parse_px(font_size: &str) -> f64 {
    font_size
        .trim()
        .trim_end_matches("px")
        .trim()
        .parse()
        .unwrap_or(0.0)
}

fn is_likely_clickable(tag: &str, style: &ComputedStyle) -> bool {
    INTERACTIVE_TAGS.contains(&tag) || style.cursor == "pointer"
}

/// The visibility classification engine. Stateless across calls: every
/// check re-reads computed style through the host, so interleaved
/// invocations cannot corrupt each other and verdicts always reflect the
/// live tree.
pub struct Scanner<H> {
    pub(crate) host: Arc<H>,
    pub(crate) heuristics: Heuristics,
}

impl<H: RenderHost> Scanner<H> {
    pub fn new(host: Arc<H>, heuristics: Heuristics) -> Self {
        Self { host, heuristics }
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    pub fn heuristics(&self) -> &Heuristics {
        &self.heuristics
    }

    /// Resolve a selector and classify the result. The on-demand entry
    /// point for external callers.
    pub fn scan_element(&self, selector: &str) -> Verdict {
        match self.host.resolve(selector) {
            Some(node) => {
                let verdict = self.classify(node);
                debug!(%selector, %verdict, "scan");
                verdict
            }
            None => Verdict::NotFound,
        }
    }

    /// Classify one element. Checks run in a fixed priority order and the
    /// first match wins: cheap structural checks first, the
    /// security-critical phrase scan early regardless of visual state, and
    /// the expensive geometric/contrast checks last, each guarded so
    /// legitimate content is not misjudged.
    pub fn classify(&self, node: NodeId) -> Verdict {
        let host = self.host.as_ref();
        let h = &self.heuristics;
        let computed = host.computed_style(node);

        // properly hidden content is benign, whatever it contains
        if computed.display == "none" || computed.visibility == "hidden" {
            return Verdict::SafeHidden;
        }

        if style::effective_opacity(host, node, h.opacity_floor) < h.opacity_floor {
            return Verdict::HiddenOpacity;
        }

        // phrase scan applies at any nesting depth so a container catches
        // text split across inline descendants
        let text = host.text_content(node).to_lowercase();
        if h.injection_phrases.iter().any(|p| !p.is_empty() && text.contains(&p.to_lowercase())) {
            return Verdict::HiddenPromptInjection;
        }

        let is_text_leaf = host.child_count(node) == 0 && !text.trim().is_empty();
        if is_text_leaf {
            let px = parse_px(&computed.font_size);
            if px > 0.0 && px < h.tiny_text_px {
                return Verdict::TinyText {
                    font_size: computed.font_size.clone(),
                };
            }
        }

        let rect = host.bounding_rect(node);
        if rect.left < h.offscreen_px || rect.top < h.offscreen_px {
            return Verdict::OffScreen;
        }

        if is_likely_clickable(&host.tag_name(node), &computed)
            && rect.width > 2.0
            && rect.height > 2.0
            && rect.top >= 0.0
            && rect.left >= 0.0
        {
            if let Some(overlay) = occlusion::find_invisible_overlay(host, h, node, rect) {
                sentinel_guard::neutralize(host, overlay);
                return Verdict::BlockedByInvisibleOverlay;
            }
        }

        if is_text_leaf {
            if let Background::Color(bg) = style::effective_background(host, node) {
                let ratio = color::contrast_ratio(&computed.color, &bg);
                if ratio < h.contrast_floor {
                    return Verdict::InvisibleInk { ratio };
                }
            }
        }

        Verdict::Visible
    }
}
