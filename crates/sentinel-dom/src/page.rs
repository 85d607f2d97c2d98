use crate::host::RenderHost;
use crate::snapshot::{NodeSpec, PageSnapshot};
use sentinel_core::{ComputedStyle, MutationBatch, NodeId, Point, Rect, Viewport};
use std::collections::HashMap;
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::{mpsc, watch};
use tracing::debug;

struct NodeData {
    tag: String,
    text: String,
    attrs: HashMap<String, String>,
    style: ComputedStyle,
    rect: Rect,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Default)]
struct PageState {
    nodes: Vec<NodeData>,
    body: Option<NodeId>,
}

impl PageState {
    fn get(&self, node: NodeId) -> Option<&NodeData> {
        self.nodes.get(node.0 as usize)
    }

    fn get_mut(&mut self, node: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(node.0 as usize)
    }

    fn contains(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        let mut current = Some(descendant);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get(id).and_then(|n| n.parent);
        }
        false
    }

    // display:none removes the whole subtree from rendering; descendants
    // still report their own display value, so the hit-test has to walk up
    fn in_hidden_subtree(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            let Some(data) = self.get(id) else {
                return false;
            };
            if data.style.display == "none" {
                return true;
            }
            current = data.parent;
        }
        false
    }

    fn text_content(&self, node: NodeId) -> String {
        let Some(data) = self.get(node) else {
            return String::new();
        };
        let mut out = data.text.clone();
        for &child in &data.children {
            out.push_str(&self.text_content(child));
        }
        out
    }

    fn build(&mut self, parent: Option<NodeId>, spec: &NodeSpec) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            tag: spec.tag.to_ascii_lowercase(),
            text: spec.text.clone(),
            attrs: spec.attrs.clone(),
            style: spec.style.clone(),
            rect: spec.rect,
            parent,
            children: Vec::new(),
        });
        if let Some(p) = parent {
            if let Some(pdata) = self.get_mut(p) {
                pdata.children.push(id);
            }
        }
        for child in &spec.children {
            self.build(Some(id), child);
        }
        id
    }
}

fn matches_simple(node: &NodeData, selector: &str) -> bool {
    let selector = selector.trim();
    if selector.is_empty() || selector == "*" {
        return selector == "*";
    }
    if let Some(id) = selector.strip_prefix('#') {
        return node.attrs.get("id").map(String::as_str) == Some(id);
    }
    let (tag_part, attr_part) = match selector.find('[') {
        Some(i) => (&selector[..i], Some(&selector[i..])),
        None => (selector, None),
    };
    if !tag_part.is_empty() && !tag_part.eq_ignore_ascii_case(&node.tag) {
        return false;
    }
    match attr_part {
        None => true,
        Some(raw) => {
            let inner = raw.trim_start_matches('[').trim_end_matches(']');
            match inner.split_once('=') {
                Some((name, value)) => {
                    let value = value.trim_matches('"').trim_matches('\'');
                    node.attrs.get(name.trim()).map(String::as_str) == Some(value)
                }
                None => node.attrs.contains_key(inner.trim()),
            }
        }
    }
}

fn matches(node: &NodeData, selector: &str) -> bool {
    selector.split(',').any(|part| matches_simple(node, part))
}

fn parse_z(style: &ComputedStyle) -> i64 {
    style.z_index.trim().parse::<i64>().unwrap_or(0)
}

/// In-memory stand-in for a rendered page. Implements the full host
/// capability surface over a node arena: minimal selector matching,
/// geometric hit-testing with z-order, and ordered mutation delivery to
/// observers. Used by the test suites and by the CLI when scanning captured
/// page snapshots.
pub struct InMemoryPage {
    state: RwLock<PageState>,
    observers: Mutex<Vec<(NodeId, mpsc::UnboundedSender<MutationBatch>)>>,
    ready_tx: watch::Sender<bool>,
    viewport: Viewport,
}

impl InMemoryPage {
    /// An empty document with no body yet; observers stay unarmed until
    /// [`InMemoryPage::attach_body`] fires the ready signal.
    pub fn new(viewport: Viewport) -> Self {
        let (ready_tx, _) = watch::channel(false);
        Self {
            state: RwLock::new(PageState::default()),
            observers: Mutex::new(Vec::new()),
            ready_tx,
            viewport,
        }
    }

    pub fn from_snapshot(snapshot: &PageSnapshot) -> Self {
        let page = Self::new(snapshot.viewport);
        page.attach_body(snapshot.body.clone());
        page
    }

    fn read(&self) -> RwLockReadGuard<'_, PageState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, PageState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Install the document body and flip the container-ready signal.
    pub fn attach_body(&self, spec: NodeSpec) -> NodeId {
        let id = {
            let mut state = self.write();
            let id = state.build(None, &spec);
            state.body = Some(id);
            id
        };
        let _ = self.ready_tx.send(true);
        id
    }

    /// Insert a subtree under `parent` and deliver a mutation batch to every
    /// observer whose observed root covers the insertion point.
    pub fn insert(&self, parent: NodeId, spec: &NodeSpec) -> Option<NodeId> {
        let mut state = self.write();
        state.get(parent)?;
        let id = state.build(Some(parent), spec);
        let mut observers = self.observers.lock().unwrap_or_else(|e| e.into_inner());
        observers.retain(|(root, tx)| {
            if !state.contains(*root, id) {
                return true;
            }
            tx.send(MutationBatch { added: vec![id] }).is_ok()
        });
        Some(id)
    }

    /// Drop the sender side of every mutation subscription. Observers drain
    /// whatever batches were already delivered and then see the stream
    /// close.
    pub fn close_observers(&self) {
        self.observers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl RenderHost for InMemoryPage {
    fn resolve(&self, selector: &str) -> Option<NodeId> {
        let state = self.read();
        state
            .nodes
            .iter()
            .position(|n| matches(n, selector))
            .map(|i| NodeId(i as u32))
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.read().get(node).and_then(|n| n.parent)
    }

    fn tag_name(&self, node: NodeId) -> String {
        self.read().get(node).map(|n| n.tag.clone()).unwrap_or_default()
    }

    fn text_content(&self, node: NodeId) -> String {
        self.read().text_content(node)
    }

    fn child_count(&self, node: NodeId) -> usize {
        self.read().get(node).map(|n| n.children.len()).unwrap_or(0)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.read().get(node).and_then(|n| n.attrs.get(name).cloned())
    }

    fn computed_style(&self, node: NodeId) -> ComputedStyle {
        self.read()
            .get(node)
            .map(|n| n.style.clone())
            .unwrap_or_default()
    }

    fn bounding_rect(&self, node: NodeId) -> Rect {
        self.read().get(node).map(|n| n.rect).unwrap_or_default()
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn contains(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        self.read().contains(ancestor, descendant)
    }

    fn query_within(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        let state = self.read();
        (0..state.nodes.len() as u32)
            .map(NodeId)
            .filter(|&id| id != root && state.contains(root, id))
            .filter(|&id| state.get(id).map(|n| matches(n, selector)).unwrap_or(false))
            .collect()
    }

    fn element_at(&self, point: Point) -> Option<NodeId> {
        let state = self.read();
        (0..state.nodes.len())
            .filter_map(|i| state.nodes.get(i).map(|n| (i, n)))
            .filter(|(i, n)| {
                n.rect.contains(point)
                    && n.style.visibility != "hidden"
                    && n.style.pointer_events != "none"
                    && !state.in_hidden_subtree(NodeId(*i as u32))
            })
            .max_by_key(|(i, n)| (parse_z(&n.style), *i))
            .map(|(i, _)| NodeId(i as u32))
    }

    fn body(&self) -> Option<NodeId> {
        self.read().body
    }

    fn ready_signal(&self) -> watch::Receiver<bool> {
        self.ready_tx.subscribe()
    }

    fn observe(&self, root: NodeId) -> mpsc::UnboundedReceiver<MutationBatch> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((root, tx));
        rx
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        if let Some(data) = self.write().get_mut(node) {
            data.attrs.insert(name.to_string(), value.to_string());
        }
    }

    fn set_style(&self, node: NodeId, property: &str, value: &str) {
        let mut state = self.write();
        let Some(data) = state.get_mut(node) else {
            return;
        };
        let style = &mut data.style;
        match property {
            "display" => style.display = value.to_string(),
            "visibility" => style.visibility = value.to_string(),
            "opacity" => style.opacity = value.to_string(),
            "color" => style.color = value.to_string(),
            "background-color" => style.background_color = value.to_string(),
            "background-image" => style.background_image = value.to_string(),
            "font-size" => style.font_size = value.to_string(),
            "cursor" => style.cursor = value.to_string(),
            "position" => style.position = value.to_string(),
            "z-index" => style.z_index = value.to_string(),
            "pointer-events" => style.pointer_events = value.to_string(),
            "border" => style.border = value.to_string(),
            other => debug!(property = %other, "ignoring unsupported style write"),
        }
    }

    fn append_label(&self, parent: NodeId, text: &str, style: ComputedStyle) -> Option<NodeId> {
        let anchor = self.bounding_rect(parent);
        let spec = NodeSpec::new("div")
            .text(text)
            .rect(anchor.left, anchor.top, 220.0, 24.0)
            .style(|s| *s = style);
        self.insert(parent, &spec)
    }
}
