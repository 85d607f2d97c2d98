use sentinel_core::{Background, NodeId};
use sentinel_dom::RenderHost;

/// True for backgrounds the renderer reports as carrying no paint at all.
pub fn is_fully_transparent(color: &str) -> bool {
    let squeezed: String = color.chars().filter(|c| !c.is_whitespace()).collect();
    squeezed == "transparent" || squeezed.contains("rgba(0,0,0,0)")
}

/// Effective opacity of a node: the product of its own opacity and every
/// ancestor's, since opacity multiplies down the stacking context (a 50%
/// parent of a 50% child renders the child at 25%). Unparsable opacity
/// contributes 1.0. Short-circuits as soon as the running product drops
/// below `floor`; callers only care whether the element cleared it.
///
/// This is the single opacity walk shared by the ghost check and the
/// occlusion detector; the two must never diverge on the threshold.
pub fn effective_opacity(host: &impl RenderHost, node: NodeId, floor: f64) -> f64 {
    let mut opacity = 1.0;
    let mut current = Some(node);
    while let Some(id) = current {
        let style = host.computed_style(id);
        opacity *= style.opacity.trim().parse::<f64>().unwrap_or(1.0);
        if opacity < floor {
            return opacity;
        }
        current = host.parent(id);
    }
    opacity
}

/// Walk the ancestor chain for the background a node actually composites
/// against. A background image or gradient anywhere on the way up makes the
/// result `Indeterminate`: contrast cannot be proven against compositing we
/// cannot model, so the caller must not judge it. Exhausting the chain
/// defaults to white.
pub fn effective_background(host: &impl RenderHost, node: NodeId) -> Background {
    let mut current = Some(node);
    while let Some(id) = current {
        let style = host.computed_style(id);
        // a multi-layer value whose layers are all "none" carries no paint
        if style.background_image != "none" && !style.background_image.contains("none,") {
            return Background::Indeterminate;
        }
        if !is_fully_transparent(&style.background_color) {
            return Background::Color(style.background_color);
        }
        current = host.parent(id);
    }
    Background::Color("rgb(255, 255, 255)".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::Viewport;
    use sentinel_dom::{InMemoryPage, NodeSpec};

    fn nested_opacity_page(opacities: &[&str]) -> (InMemoryPage, NodeId) {
        // build a chain body > div > div > ... with the given opacities,
        // innermost last
        let mut spec = NodeSpec::new("span")
            .attr("id", "leaf")
            .style(|s| s.opacity = opacities[opacities.len() - 1].to_string());
        for op in opacities[..opacities.len() - 1].iter().rev() {
            spec = NodeSpec::new("div").style(|s| s.opacity = op.to_string()).child(spec);
        }
        let page = InMemoryPage::new(Viewport::default());
        page.attach_body(NodeSpec::new("body").child(spec));
        let leaf = page.resolve("#leaf").unwrap();
        (page, leaf)
    }

    #[test]
    fn opacity_multiplies_down_the_chain() {
        let (page, leaf) = nested_opacity_page(&["1.0", "0.5", "0.5"]);
        let op = effective_opacity(&page, leaf, 0.1);
        assert!((op - 0.25).abs() < 1e-12);
    }

    #[test]
    fn opacity_walk_short_circuits_below_floor() {
        let (page, leaf) = nested_opacity_page(&["0.05", "1.0", "1.0"]);
        assert!(effective_opacity(&page, leaf, 0.1) < 0.1);
    }

    #[test]
    fn unparsable_opacity_counts_as_opaque() {
        let (page, leaf) = nested_opacity_page(&["garbage", "1.0"]);
        assert_eq!(effective_opacity(&page, leaf, 0.1), 1.0);
    }

    #[test]
    fn background_resolves_first_painted_ancestor() {
        let page = InMemoryPage::new(Viewport::default());
        page.attach_body(
            NodeSpec::new("body")
                .style(|s| s.background_color = "rgb(20, 20, 20)".to_string())
                .child(NodeSpec::new("div").child(NodeSpec::new("span").attr("id", "t"))),
        );
        let t = page.resolve("#t").unwrap();
        assert_eq!(
            effective_background(&page, t),
            Background::Color("rgb(20, 20, 20)".to_string())
        );
    }

    #[test]
    fn background_image_is_indeterminate() {
        let page = InMemoryPage::new(Viewport::default());
        page.attach_body(
            NodeSpec::new("body").child(
                NodeSpec::new("div")
                    .style(|s| s.background_image = "url(hero.png)".to_string())
                    .child(NodeSpec::new("span").attr("id", "t")),
            ),
        );
        let t = page.resolve("#t").unwrap();
        assert_eq!(effective_background(&page, t), Background::Indeterminate);
    }

    #[test]
    fn layered_none_background_is_not_indeterminate() {
        let page = InMemoryPage::new(Viewport::default());
        page.attach_body(
            NodeSpec::new("body")
                .style(|s| s.background_color = "rgb(20, 20, 20)".to_string())
                .child(
                    NodeSpec::new("div")
                        .style(|s| s.background_image = "none, none".to_string())
                        .child(NodeSpec::new("span").attr("id", "t")),
                ),
        );
        let t = page.resolve("#t").unwrap();
        assert_eq!(
            effective_background(&page, t),
            Background::Color("rgb(20, 20, 20)".to_string())
        );
    }

    #[test]
    fn exhausted_chain_defaults_to_white() {
        let page = InMemoryPage::new(Viewport::default());
        page.attach_body(NodeSpec::new("body").child(NodeSpec::new("span").attr("id", "t")));
        let t = page.resolve("#t").unwrap();
        assert_eq!(
            effective_background(&page, t),
            Background::Color("rgb(255, 255, 255)".to_string())
        );
    }

    #[test]
    fn transparency_detection() {
        assert!(is_fully_transparent("transparent"));
        assert!(is_fully_transparent("rgba(0, 0, 0, 0)"));
        assert!(is_fully_transparent("rgba(0,0,0,0)"));
        assert!(!is_fully_transparent("rgba(0, 0, 0, 0.5)"));
        assert!(!is_fully_transparent("rgb(255, 255, 255)"));
    }
}
