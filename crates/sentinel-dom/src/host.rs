use sentinel_core::{ComputedStyle, MutationBatch, NodeId, Point, Rect, Viewport};
use tokio::sync::{mpsc, watch};

/// Capability surface of the hosting render environment.
///
/// The rendering/layout engine is treated as an oracle: it resolves
/// selectors, reports computed style and live geometry, answers hit-tests,
/// and delivers subtree-mutation batches. Sentinel never creates or destroys
/// elements through this surface except for diagnostic labels, and its only
/// writes are mitigation attributes and inline style.
///
/// Reads on missing nodes degrade to neutral defaults rather than failing;
/// the detection path must never be able to crash the page it protects.
pub trait RenderHost: Send + Sync {
    /// Resolve a selector to the first matching element, if any.
    fn resolve(&self, selector: &str) -> Option<NodeId>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Lowercased tag name, or empty if the node is gone.
    fn tag_name(&self, node: NodeId) -> String;

    /// Full text content of the node and all of its descendants.
    fn text_content(&self, node: NodeId) -> String;

    /// Number of child elements.
    fn child_count(&self, node: NodeId) -> usize;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Fresh computed-style snapshot. Implementations must re-resolve on
    /// every call; callers never cache it.
    fn computed_style(&self, node: NodeId) -> ComputedStyle;

    /// Live bounding rectangle relative to the viewport.
    fn bounding_rect(&self, node: NodeId) -> Rect;

    fn viewport(&self) -> Viewport;

    /// True if `descendant` is `ancestor` itself or inside its subtree.
    fn contains(&self, ancestor: NodeId, descendant: NodeId) -> bool;

    /// Descendants of `root` matching a sub-selector, in document order.
    fn query_within(&self, root: NodeId, selector: &str) -> Vec<NodeId>;

    /// Top-most rendered element at a viewport point. Elements with
    /// `pointer-events: none` are transparent to hit-testing, which is what
    /// makes overlay neutralization one-shot.
    fn element_at(&self, point: Point) -> Option<NodeId>;

    /// The document body, once it exists.
    fn body(&self) -> Option<NodeId>;

    /// Container-ready signal; flips to true when a body becomes available.
    fn ready_signal(&self) -> watch::Receiver<bool>;

    /// Subscribe to mutation batches for inserts under `root`. Batches are
    /// delivered in the order the changes occurred.
    fn observe(&self, root: NodeId) -> mpsc::UnboundedReceiver<MutationBatch>;

    fn set_attribute(&self, node: NodeId, name: &str, value: &str);

    /// Write one inline style property. Unknown properties are ignored.
    fn set_style(&self, node: NodeId, property: &str, value: &str);

    /// Append a diagnostic label element under `parent`.
    fn append_label(&self, parent: NodeId, text: &str, style: ComputedStyle) -> Option<NodeId>;
}
