use sentinel_core::{ComputedStyle, NodeId};
use sentinel_dom::RenderHost;
use tracing::info;

/// Marker attribute written onto a neutralized clickjacking overlay.
pub const OVERLAY_MARKER: &str = "data-sentinel-clickjacking-overlay";

/// Marker attribute written onto a quarantined injected node.
pub const SUSPICIOUS_MARKER: &str = "data-sentinel-suspicious";

const WARNING_LABEL: &str = "BLOCKED: SUSPICIOUS INJECTION";

/// Disable pointer interaction on an invisible overlay and tag it for
/// diagnostics.
///
/// Postcondition: the overlay carries `pointer-events: none` and
/// [`OVERLAY_MARKER`]. The overlay stays in the tree; once it no longer
/// receives hits, reclassifying the element underneath finds no block, so
/// the mitigation is one-shot. Safe to re-apply.
pub fn neutralize(host: &impl RenderHost, overlay: NodeId) {
    host.set_style(overlay, "pointer-events", "none");
    host.set_attribute(overlay, OVERLAY_MARKER, "true");
    info!(%overlay, tag = %host.tag_name(overlay), "invisible overlay neutralized");
}

/// Quarantine a suspicious injected node without removing it.
///
/// Postcondition: the node carries [`SUSPICIOUS_MARKER`] and a disabled
/// attribute, ignores pointer events, is dimmed and framed, every contained
/// input/button is disabled, and exactly one warning label child exists.
/// Re-applying to an already-flagged node is a no-op, which is what keeps
/// the label count at one across repeated mutation batches.
pub fn flag_suspicious(host: &impl RenderHost, node: NodeId) {
    if host.attribute(node, SUSPICIOUS_MARKER).as_deref() == Some("true") {
        return;
    }
    host.set_attribute(node, SUSPICIOUS_MARKER, "true");
    host.set_style(node, "pointer-events", "none");
    host.set_style(node, "opacity", "0.5");
    host.set_attribute(node, "disabled", "true");
    for control in host.query_within(node, "input, button") {
        host.set_attribute(control, "disabled", "true");
    }
    host.set_style(node, "border", "5px solid red");
    host.append_label(node, WARNING_LABEL, warning_label_style());
    info!(%node, tag = %host.tag_name(node), "suspicious injection quarantined");
}

/// Label styling: pinned, painted above everything, and transparent to
/// hit-testing so the label can never be flagged as an overlay itself.
fn warning_label_style() -> ComputedStyle {
    ComputedStyle {
        position: "fixed".to_string(),
        z_index: "2147483647".to_string(),
        pointer_events: "none".to_string(),
        background_color: "rgb(255, 0, 0)".to_string(),
        color: "rgb(255, 255, 255)".to_string(),
        ..ComputedStyle::default()
    }
}
