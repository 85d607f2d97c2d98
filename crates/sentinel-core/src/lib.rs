pub mod error;
pub mod heuristics;
pub mod types;

pub use error::{SentinelError, SentinelResult};
pub use heuristics::Heuristics;
pub use types::{
    Background, ComputedStyle, Finding, MutationBatch, NodeId, Point, Rect, ThreatKind,
    ThreatReport, Verdict, Viewport,
};
