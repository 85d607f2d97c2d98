use sentinel_core::{ComputedStyle, Rect, SentinelError, SentinelResult, Viewport};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Declarative description of one element and its subtree, used both for
/// page snapshots loaded from disk and for nodes injected at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSpec {
    pub tag: String,
    /// Direct text of this node (descendant text lives on the children).
    pub text: String,
    pub attrs: HashMap<String, String>,
    pub style: ComputedStyle,
    pub rect: Rect,
    pub children: Vec<NodeSpec>,
}

impl Default for NodeSpec {
    fn default() -> Self {
        Self {
            tag: "div".to_string(),
            text: String::new(),
            attrs: HashMap::new(),
            style: ComputedStyle::default(),
            rect: Rect::default(),
            children: Vec::new(),
        }
    }
}

impl NodeSpec {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn rect(mut self, left: f64, top: f64, width: f64, height: f64) -> Self {
        self.rect = Rect::new(left, top, width, height);
        self
    }

    pub fn style(mut self, f: impl FnOnce(&mut ComputedStyle)) -> Self {
        f(&mut self.style);
        self
    }

    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }
}

/// A captured page: viewport plus the body subtree. Serialized as JSON so
/// the CLI can scan pages recorded by an external harness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    #[serde(default)]
    pub page: String,
    #[serde(default)]
    pub viewport: Viewport,
    pub body: NodeSpec,
}

impl PageSnapshot {
    pub fn from_file(path: impl AsRef<Path>) -> SentinelResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&raw)
            .map_err(|e| SentinelError::Snapshot(format!("{}: {}", path.as_ref().display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_json_fills_defaults() {
        let snap: PageSnapshot = serde_json::from_str(
            r#"{"body": {"tag": "body", "children": [{"text": "hello"}]}}"#,
        )
        .unwrap();
        assert_eq!(snap.body.tag, "body");
        let child = &snap.body.children[0];
        assert_eq!(child.tag, "div");
        assert_eq!(child.text, "hello");
        assert_eq!(child.style.opacity, "1");
        assert_eq!(snap.viewport.width, 1280.0);
    }

    #[test]
    fn builder_composes() {
        let spec = NodeSpec::new("BUTTON")
            .text("Pay")
            .attr("id", "pay")
            .rect(10.0, 10.0, 80.0, 30.0)
            .style(|s| s.cursor = "pointer".to_string());
        assert_eq!(spec.tag, "button");
        assert_eq!(spec.attrs["id"], "pay");
        assert_eq!(spec.style.cursor, "pointer");
    }
}
