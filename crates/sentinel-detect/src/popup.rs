use sentinel_core::{Heuristics, NodeId};
use sentinel_dom::RenderHost;
use serde::Serialize;

/// What the surveillance loop learned about one newly inserted node.
#[derive(Debug, Clone, Serialize)]
pub struct PopupReport {
    pub node: NodeId,
    pub tag: String,
    pub z_index: i64,
    pub fixed: bool,
    pub has_input: bool,
    pub has_button: bool,
    pub is_big: bool,
    pub allowlisted: bool,
}

impl PopupReport {
    /// A node is suspicious iff it is stacked or pinned above the page
    /// (high z-index or fixed position), carries interaction surface
    /// (controls, or sheer size), and matches no benign allow-list entry.
    pub fn suspicious(&self, heuristics: &Heuristics) -> bool {
        (self.z_index > heuristics.z_index_ceiling || self.fixed)
            && (self.has_input || self.has_button || self.is_big)
            && !self.allowlisted
    }
}

/// Phishing-popup heuristics for a freshly inserted element.
pub fn assess_popup(host: &impl RenderHost, heuristics: &Heuristics, node: NodeId) -> PopupReport {
    let style = host.computed_style(node);
    let tag = host.tag_name(node);
    let rect = host.bounding_rect(node);
    let viewport = host.viewport();

    // "auto" and garbage both settle at 0
    let z_index = style.z_index.trim().parse::<i64>().unwrap_or(0);
    let fixed = style.position == "fixed";
    let has_input = !host.query_within(node, "input").is_empty();
    let has_button = tag == "button" || !host.query_within(node, "button").is_empty();
    let is_big = rect.width > viewport.width * heuristics.viewport_cover
        && rect.height > viewport.height * heuristics.viewport_cover;

    let text = host.text_content(node).to_lowercase();
    let benign_text = heuristics
        .allowlist_phrases
        .iter()
        .any(|p| !p.is_empty() && text.contains(&p.to_lowercase()));
    let role = host.attribute(node, "role").unwrap_or_default();
    let benign_role = heuristics.allowlist_roles.iter().any(|r| r == &role);

    PopupReport {
        node,
        tag,
        z_index,
        fixed,
        has_input,
        has_button,
        is_big,
        allowlisted: benign_text || benign_role,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::Viewport;
    use sentinel_dom::{InMemoryPage, NodeSpec};

    fn page() -> InMemoryPage {
        let page = InMemoryPage::new(Viewport::default());
        page.attach_body(NodeSpec::new("body").rect(0.0, 0.0, 1280.0, 800.0));
        page
    }

    fn phishing_popup() -> NodeSpec {
        NodeSpec::new("div")
            .rect(300.0, 200.0, 400.0, 300.0)
            .style(|s| {
                s.position = "fixed".to_string();
                s.z_index = "5000".to_string();
            })
            .child(NodeSpec::new("input").attr("type", "password"))
            .child(NodeSpec::new("button").text("Sign in"))
    }

    #[test]
    fn fixed_high_z_popup_with_input_is_suspicious() {
        let page = page();
        let body = page.body().unwrap();
        let node = page.insert(body, &phishing_popup()).unwrap();
        let report = assess_popup(&page, &Heuristics::default(), node);
        assert_eq!(report.z_index, 5000);
        assert!(report.fixed && report.has_input && report.has_button);
        assert!(!report.allowlisted);
        assert!(report.suspicious(&Heuristics::default()));
    }

    #[test]
    fn auto_z_index_counts_as_zero() {
        let page = page();
        let body = page.body().unwrap();
        let node = page
            .insert(body, &NodeSpec::new("div").style(|s| s.z_index = "auto".to_string()))
            .unwrap();
        let report = assess_popup(&page, &Heuristics::default(), node);
        assert_eq!(report.z_index, 0);
        assert!(!report.suspicious(&Heuristics::default()));
    }

    #[test]
    fn dialog_role_is_allowlisted() {
        let page = page();
        let body = page.body().unwrap();
        let node = page
            .insert(body, &phishing_popup().attr("role", "dialog"))
            .unwrap();
        let report = assess_popup(&page, &Heuristics::default(), node);
        assert!(report.allowlisted);
        assert!(!report.suspicious(&Heuristics::default()));
    }

    #[test]
    fn cookie_banner_text_is_allowlisted() {
        let page = page();
        let body = page.body().unwrap();
        let node = page
            .insert(
                body,
                &NodeSpec::new("div")
                    .rect(0.0, 700.0, 1280.0, 100.0)
                    .style(|s| s.position = "fixed".to_string())
                    .text("We value your privacy. ")
                    .child(NodeSpec::new("button").text("Accept all")),
            )
            .unwrap();
        let report = assess_popup(&page, &Heuristics::default(), node);
        assert!(report.allowlisted);
        assert!(!report.suspicious(&Heuristics::default()));
    }

    #[test]
    fn big_fixed_panel_without_controls_is_still_suspicious() {
        let page = page();
        let body = page.body().unwrap();
        // covers well over 20% of a 1280x800 viewport in both dimensions
        let node = page
            .insert(
                body,
                &NodeSpec::new("div")
                    .rect(0.0, 0.0, 800.0, 600.0)
                    .style(|s| s.position = "fixed".to_string())
                    .text("Your session expired, re-enter your details"),
            )
            .unwrap();
        let report = assess_popup(&page, &Heuristics::default(), node);
        assert!(report.is_big && !report.has_input && !report.has_button);
        assert!(report.suspicious(&Heuristics::default()));
    }

    #[test]
    fn static_low_z_content_is_benign() {
        let page = page();
        let body = page.body().unwrap();
        let node = page
            .insert(
                body,
                &NodeSpec::new("div")
                    .rect(0.0, 0.0, 600.0, 400.0)
                    .child(NodeSpec::new("button").text("Read more")),
            )
            .unwrap();
        let report = assess_popup(&page, &Heuristics::default(), node);
        assert!(!report.suspicious(&Heuristics::default()));
    }
}
