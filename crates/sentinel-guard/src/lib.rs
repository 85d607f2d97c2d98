pub mod mitigate;

pub use mitigate::{flag_suspicious, neutralize, OVERLAY_MARKER, SUSPICIOUS_MARKER};
