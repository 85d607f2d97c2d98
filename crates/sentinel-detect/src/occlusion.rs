use crate::style;
use sentinel_core::{Heuristics, NodeId, Point, Rect};
use sentinel_dom::RenderHost;
use tracing::debug;

/// Probe an interactive element for an invisible overlay sitting on top of
/// it. Three samples (the center plus points inset 5 units from the
/// top-left and bottom-right corners) catch partial overlaps that a single
/// center probe would miss. The first conclusive finding wins.
///
/// An overlay counts only if it is a distinct element (neither contains the
/// other, so visual parent/child nesting never triggers) and is itself
/// invisible: effective opacity under the floor, or a fully transparent own
/// background.
pub fn find_invisible_overlay(
    host: &impl RenderHost,
    heuristics: &Heuristics,
    node: NodeId,
    rect: Rect,
) -> Option<NodeId> {
    let viewport = host.viewport();
    let samples = [
        rect.center(),
        Point {
            x: rect.left + 5.0,
            y: rect.top + 5.0,
        },
        Point {
            x: rect.right() - 5.0,
            y: rect.bottom() - 5.0,
        },
    ];

    for point in samples {
        if !viewport.contains(point) {
            continue;
        }
        let Some(top) = host.element_at(point) else {
            continue;
        };
        if top == node || host.contains(node, top) || host.contains(top, node) {
            continue;
        }
        let overlay_style = host.computed_style(top);
        let overlay_opacity = style::effective_opacity(host, top, heuristics.opacity_floor);
        if overlay_opacity < heuristics.opacity_floor
            || style::is_fully_transparent(&overlay_style.background_color)
        {
            debug!(element = %node, overlay = %top, x = point.x, y = point.y,
                "invisible overlay intercepts hit-testing");
            return Some(top);
        }
    }
    None
}
