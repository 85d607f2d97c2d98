use crate::classify::Scanner;
use chrono::Utc;
use sentinel_core::{Finding, NodeId, ThreatKind, ThreatReport, Verdict};
use sentinel_dom::RenderHost;
use tracing::warn;
use uuid::Uuid;

/// Marker set once a visibility finding has been reported for an element.
pub const LOGGED_MARKER: &str = "data-sentinel-logged";
/// Marker set once a quarantined dynamic injection has been reported.
pub const DYNAMIC_LOGGED_MARKER: &str = "data-sentinel-dynamic-logged";
/// Marker set once a phishing form field has been reported.
pub const PHISHING_LOGGED_MARKER: &str = "data-sentinel-phishing-logged";

impl<H: RenderHost> Scanner<H> {
    /// Sweep the whole page: classify every element and collect confirmed
    /// threats into a report. Each detector writes a per-vector marker on
    /// first report, so repeated sweeps of the same page only surface new
    /// findings. An element can still be reported once per distinct
    /// vector.
    pub fn audit_page(&self, page_name: &str) -> ThreatReport {
        let host = self.host.as_ref();
        let mut findings = Vec::new();

        let nodes: Vec<NodeId> = match host.body() {
            Some(body) => {
                let mut all = vec![body];
                all.extend(host.query_within(body, "*"));
                all
            }
            None => Vec::new(),
        };

        for &node in &nodes {
            // quarantine marks left by the surveillance loop
            if host.attribute(node, sentinel_guard::SUSPICIOUS_MARKER).as_deref() == Some("true")
                && host.attribute(node, DYNAMIC_LOGGED_MARKER).is_none()
            {
                host.set_attribute(node, DYNAMIC_LOGGED_MARKER, "true");
                findings.push(self.finding(node, ThreatKind::DynamicInjection, "SUSPICIOUS_INJECTION"));
            }

            if self.is_phishing_field(node) && host.attribute(node, PHISHING_LOGGED_MARKER).is_none()
            {
                host.set_attribute(node, PHISHING_LOGGED_MARKER, "true");
                findings.push(self.finding(node, ThreatKind::PhishingForm, "PHISHING_INPUT"));
            }

            if host.attribute(node, LOGGED_MARKER).is_some() {
                continue;
            }
            let verdict = self.classify(node);
            if !verdict.is_threat() {
                continue;
            }
            host.set_attribute(node, LOGGED_MARKER, "true");
            let kind = match verdict {
                Verdict::HiddenPromptInjection => ThreatKind::PromptInjection,
                Verdict::BlockedByInvisibleOverlay => ThreatKind::Clickjacking,
                _ => ThreatKind::DeceptiveCss,
            };
            // annotate the confirmed threat in-page so a human inspecting
            // the rendered result can see what tripped the sweep
            match kind {
                ThreatKind::Clickjacking => host.set_style(node, "border", "5px solid red"),
                ThreatKind::DeceptiveCss => host.set_style(node, "border", "3px dotted orange"),
                _ => {}
            }
            let finding = self.finding(node, kind, &verdict.to_string());
            warn!(node = %finding.node, tag = %finding.tag, verdict = %finding.verdict,
                risk = finding.risk_score, "threat detected");
            findings.push(finding);
        }

        ThreatReport {
            page: page_name.to_string(),
            findings,
            elements_scanned: nodes.len(),
            scanned_at: Utc::now(),
        }
    }

    fn finding(&self, node: NodeId, kind: ThreatKind, verdict: &str) -> Finding {
        Finding {
            id: Uuid::new_v4().to_string(),
            kind,
            node,
            tag: self.host.tag_name(node),
            verdict: verdict.to_string(),
            risk_score: kind.risk_score(),
        }
    }

    /// Inputs named like card fields are a phishing signal regardless of
    /// their visual state.
    fn is_phishing_field(&self, node: NodeId) -> bool {
        let host = self.host.as_ref();
        if host.tag_name(node) != "input" {
            return false;
        }
        let name = host.attribute(node, "name").unwrap_or_default();
        let id = host.attribute(node, "id").unwrap_or_default();
        name.to_lowercase().contains("card") || id.to_lowercase().contains("cc-")
    }
}
