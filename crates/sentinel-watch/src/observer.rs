use sentinel_core::{Heuristics, MutationBatch, NodeId};
use sentinel_detect::assess_popup;
use sentinel_dom::RenderHost;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Lifecycle of the surveillance loop. The Unarmed -> Armed transition
/// happens at most once per page: immediately when a body already exists,
/// otherwise deferred until the host reports the container ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmState {
    Unarmed,
    Armed,
}

/// Watches the document body for injected subtrees and quarantines
/// phishing-popup candidates. Batches are processed synchronously to
/// completion, in delivery order, so mitigation writes from one batch are
/// visible to the next batch's detection logic.
pub struct SurveillanceLoop<H> {
    host: Arc<H>,
    heuristics: Heuristics,
    state: ArmState,
}

impl<H: RenderHost> SurveillanceLoop<H> {
    pub fn new(host: Arc<H>, heuristics: Heuristics) -> Self {
        Self {
            host,
            heuristics,
            state: ArmState::Unarmed,
        }
    }

    pub fn state(&self) -> ArmState {
        self.state
    }

    /// Ids of the nodes this batch got quarantined.
    pub fn process_batch(&self, batch: &MutationBatch) -> Vec<NodeId> {
        let mut flagged = Vec::new();
        for &node in &batch.added {
            let report = assess_popup(self.host.as_ref(), &self.heuristics, node);
            if report.suspicious(&self.heuristics) {
                warn!(
                    incident = %Uuid::new_v4(),
                    %node,
                    tag = %report.tag,
                    z_index = report.z_index,
                    fixed = report.fixed,
                    has_input = report.has_input,
                    has_button = report.has_button,
                    is_big = report.is_big,
                    "suspicious injected element"
                );
                sentinel_guard::flag_suspicious(self.host.as_ref(), node);
                flagged.push(node);
            } else {
                debug!(%node, tag = %report.tag, "injected element looks benign");
            }
        }
        flagged
    }

    /// Subscribe to the body's mutation stream, waiting for the body if it
    /// has not been attached yet. Returns `None` when the host goes away
    /// before a body appears. The Unarmed -> Armed transition is
    /// irreversible.
    pub async fn arm(&mut self) -> Option<mpsc::UnboundedReceiver<MutationBatch>> {
        let body = match self.host.body() {
            Some(body) => body,
            None => {
                debug!("no document body yet, deferring arm");
                let mut ready = self.host.ready_signal();
                loop {
                    if *ready.borrow() {
                        break;
                    }
                    if ready.changed().await.is_err() {
                        info!("host went away before a body appeared");
                        return None;
                    }
                }
                match self.host.body() {
                    Some(body) => body,
                    None => {
                        info!("ready signal fired without a body, surveillance disabled");
                        return None;
                    }
                }
            }
        };

        let batches = self.host.observe(body);
        self.state = ArmState::Armed;
        info!("mutation surveillance armed");
        Some(batches)
    }

    /// Consume mutation batches until the host drops the stream. Batches
    /// already delivered when the stream closes are still drained.
    pub async fn pump(self, mut batches: mpsc::UnboundedReceiver<MutationBatch>) {
        while let Some(batch) = batches.recv().await {
            self.process_batch(&batch);
        }
        info!("mutation stream closed, surveillance loop exiting");
    }

    /// Arm against the body (waiting for it if necessary), then consume
    /// mutation batches until the host drops the stream. Runs for the
    /// page's lifetime.
    pub async fn run(mut self) {
        if let Some(batches) = self.arm().await {
            self.pump(batches).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_dom::{InMemoryPage, NodeSpec};
    use sentinel_core::Viewport;
    use tokio::time::{sleep, timeout, Duration};

    fn phishing_popup() -> NodeSpec {
        NodeSpec::new("div")
            .attr("id", "fake-login")
            .rect(300.0, 200.0, 400.0, 300.0)
            .style(|s| {
                s.position = "fixed".to_string();
                s.z_index = "5000".to_string();
            })
            .child(NodeSpec::new("input").attr("type", "password"))
    }

    #[test]
    fn batch_processing_quarantines_popups() {
        let page = Arc::new(InMemoryPage::new(Viewport::default()));
        let body = page.attach_body(NodeSpec::new("body").rect(0.0, 0.0, 1280.0, 800.0));
        let watcher = SurveillanceLoop::new(page.clone(), Heuristics::default());

        let benign = page
            .insert(body, &NodeSpec::new("p").text("hello"))
            .unwrap();
        let popup = page.insert(body, &phishing_popup()).unwrap();

        let flagged = watcher.process_batch(&MutationBatch {
            added: vec![benign, popup],
        });
        assert_eq!(flagged, vec![popup]);
        assert_eq!(
            page.attribute(popup, sentinel_guard::SUSPICIOUS_MARKER).as_deref(),
            Some("true")
        );
        assert!(page.attribute(benign, sentinel_guard::SUSPICIOUS_MARKER).is_none());
    }

    #[test]
    fn dialog_role_survives_any_stacking() {
        let page = Arc::new(InMemoryPage::new(Viewport::default()));
        let body = page.attach_body(NodeSpec::new("body").rect(0.0, 0.0, 1280.0, 800.0));
        let watcher = SurveillanceLoop::new(page.clone(), Heuristics::default());

        let dialog = page
            .insert(
                body,
                &phishing_popup()
                    .attr("role", "dialog")
                    .rect(0.0, 0.0, 1280.0, 800.0)
                    .child(NodeSpec::new("button").text("OK")),
            )
            .unwrap();
        let flagged = watcher.process_batch(&MutationBatch { added: vec![dialog] });
        assert!(flagged.is_empty());
        assert!(page.attribute(dialog, sentinel_guard::SUSPICIOUS_MARKER).is_none());
    }

    #[tokio::test]
    async fn armed_loop_quarantines_live_insertions() {
        let page = Arc::new(InMemoryPage::new(Viewport::default()));
        let body = page.attach_body(NodeSpec::new("body").rect(0.0, 0.0, 1280.0, 800.0));
        let watcher = SurveillanceLoop::new(page.clone(), Heuristics::default());
        let handle = tokio::spawn(watcher.run());

        // give the loop a moment to subscribe before inserting
        sleep(Duration::from_millis(20)).await;
        let popup = page.insert(body, &phishing_popup()).unwrap();

        let deadline = timeout(Duration::from_secs(2), async {
            loop {
                if page.attribute(popup, sentinel_guard::SUSPICIOUS_MARKER).as_deref()
                    == Some("true")
                {
                    break;
                }
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(deadline.is_ok(), "popup was never quarantined");
        handle.abort();
    }

    #[tokio::test]
    async fn closed_stream_drains_pending_batches_before_exit() {
        let page = Arc::new(InMemoryPage::new(Viewport::default()));
        let body = page.attach_body(NodeSpec::new("body").rect(0.0, 0.0, 1280.0, 800.0));
        let mut watcher = SurveillanceLoop::new(page.clone(), Heuristics::default());
        let batches = watcher.arm().await.unwrap();
        assert_eq!(watcher.state(), ArmState::Armed);
        let handle = tokio::spawn(watcher.pump(batches));

        let popup = page.insert(body, &phishing_popup()).unwrap();
        page.close_observers();
        handle.await.unwrap();

        assert_eq!(
            page.attribute(popup, sentinel_guard::SUSPICIOUS_MARKER).as_deref(),
            Some("true")
        );
    }

    #[tokio::test]
    async fn unarmed_loop_arms_once_body_appears() {
        let page = Arc::new(InMemoryPage::new(Viewport::default()));
        let watcher = SurveillanceLoop::new(page.clone(), Heuristics::default());
        assert_eq!(watcher.state(), ArmState::Unarmed);
        let handle = tokio::spawn(watcher.run());

        sleep(Duration::from_millis(20)).await;
        let body = page.attach_body(NodeSpec::new("body").rect(0.0, 0.0, 1280.0, 800.0));
        sleep(Duration::from_millis(20)).await;
        let popup = page.insert(body, &phishing_popup()).unwrap();

        let deadline = timeout(Duration::from_secs(2), async {
            loop {
                if page.attribute(popup, sentinel_guard::SUSPICIOUS_MARKER).as_deref()
                    == Some("true")
                {
                    break;
                }
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(deadline.is_ok(), "loop never armed after body attach");
        handle.abort();
    }
}
